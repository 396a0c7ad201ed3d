//! mudprog-run - compile and execute one prog file
//!
//! Builds a throwaway in-memory world from the command line, optionally
//! hydrates a snapshot of other progs, then compiles the file, coerces the
//! text arguments to the declared parameter types and runs it.

use clap::Parser;
use mudprog_compiler::DiagnosticFormatter;
use mudprog_engine::{
    Engine, EngineConfig, GameCalendar, MemoryWorld, ProgDefinition, Snapshot, coerce,
};
use mudprog_foundation::{
    ConcreteKind, Parameter, ProgSignature, ProgType, ReturnType, Value, WorldRegistry,
};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mudprog-run")]
#[command(about = "Compile and execute a prog file")]
struct Cli {
    /// Prog source file
    file: PathBuf,

    /// Prog name (defaults to the file stem)
    #[arg(long)]
    name: Option<String>,

    /// Return type, e.g. `Number` or `Void`
    #[arg(long, default_value = "Void", value_parser = parse_return_type)]
    returns: ReturnType,

    /// Parameter as `name:Type`, repeatable
    #[arg(long = "param", value_parser = parse_parameter)]
    params: Vec<Parameter>,

    /// Argument text, one per parameter
    #[arg(long = "arg")]
    args: Vec<String>,

    /// Character to create in the world, repeatable
    #[arg(long = "character")]
    characters: Vec<String>,

    /// Item to create in the world, repeatable
    #[arg(long = "item")]
    items: Vec<String>,

    /// Location to create in the world, repeatable
    #[arg(long = "location")]
    locations: Vec<String>,

    /// YAML snapshot with progs, hooks and register variables to load first
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Engine limits YAML
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_return_type(s: &str) -> Result<ReturnType, String> {
    if s.eq_ignore_ascii_case("void") {
        return Ok(ReturnType::Void);
    }
    s.parse::<ProgType>()
        .map(ReturnType::Value)
        .map_err(|e| e.to_string())
}

fn parse_parameter(s: &str) -> Result<Parameter, String> {
    let (name, ty) = s
        .split_once(':')
        .ok_or_else(|| format!("expected name:Type, got '{}'", s))?;
    let ty = ty.trim().parse::<ProgType>().map_err(|e| e.to_string())?;
    Ok(Parameter::new(name.trim(), ty))
}

/// A prog name from a file stem: anything but letters, digits and `_`
/// becomes `_`.
fn default_name(file: &std::path::Path) -> String {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name: String = stem
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    match name.chars().next() {
        Some(c) if c.is_alphabetic() || c == '_' => name,
        _ => format!("prog_{}", name),
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    error!("{}", message);
    std::process::exit(1);
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mudprog_run=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path).unwrap_or_else(|e| fail(e)),
        None => EngineConfig::default(),
    };

    let source = std::fs::read_to_string(&cli.file)
        .unwrap_or_else(|e| fail(format!("Failed to read {}: {}", cli.file.display(), e)));

    let world = MemoryWorld::new();
    for (kind, names) in [
        (ConcreteKind::Character, &cli.characters),
        (ConcreteKind::Item, &cli.items),
        (ConcreteKind::Location, &cli.locations),
    ] {
        for name in names {
            let entity = world.add(kind, name);
            info!("Created {} '{}'", entity, name);
        }
    }

    let mut engine = Engine::new(
        config,
        Box::new(world.clone()),
        Box::new(GameCalendar::default()),
    );

    if let Some(path) = &cli.snapshot {
        let yaml = std::fs::read_to_string(path)
            .unwrap_or_else(|e| fail(format!("Failed to read {}: {}", path.display(), e)));
        let snapshot = Snapshot::from_yaml_str(&yaml).unwrap_or_else(|e| fail(e));
        let report = engine.load_snapshot(snapshot).unwrap_or_else(|e| fail(e));
        info!("Snapshot loaded: {}", report);
        for prog in engine.failing_progs() {
            let formatter = DiagnosticFormatter::new(&prog.name, &prog.source);
            eprintln!("{}", formatter.format_all(prog.status.errors()));
        }
    }

    let name = cli.name.clone().unwrap_or_else(|| default_name(&cli.file));
    let signature = ProgSignature::typed(cli.returns, cli.params.clone());
    let id = engine
        .create_prog(ProgDefinition::new(name.as_str(), signature, source.as_str()))
        .unwrap_or_else(|e| fail(e));

    let Some(prog) = engine.prog(id) else {
        fail(format!("prog '{}' vanished after creation", name));
    };
    if !prog.is_executable() {
        let formatter = DiagnosticFormatter::new(&name, &source);
        eprintln!("{}", formatter.format_all(prog.status.errors()));
        fail(format!("'{}' does not compile", name));
    }

    if cli.args.len() != cli.params.len() {
        fail(format!(
            "'{}' takes {} argument(s), {} given",
            name,
            cli.params.len(),
            cli.args.len()
        ));
    }
    let args: Vec<Value> = cli
        .params
        .iter()
        .zip(&cli.args)
        .map(|(param, text)| {
            coerce(text, param.ty, &world)
                .unwrap_or_else(|e| fail(format!("argument '{}': {}", param.name, e)))
        })
        .collect();

    let result = engine.execute(id, &args).unwrap_or_else(|e| fail(e));

    for delivery in engine.take_output() {
        let recipient = world
            .name(delivery.target)
            .unwrap_or_else(|| delivery.target.to_string());
        println!("[{}] {}", recipient, delivery.message);
    }
    if !cli.returns.is_void() {
        println!("{}", result);
    }
}
