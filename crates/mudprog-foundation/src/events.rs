//! Static event table.
//!
//! Every event the world can raise has a fixed, ordered tuple of declared
//! parameter types. Hooks check their payload progs against this table at
//! attach time; nothing is discovered at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::ProgType;

/// One declared event parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventParameter {
    /// Parameter name
    pub name: &'static str,
    /// Declared type
    pub ty: ProgType,
}

const fn param(name: &'static str, ty: ProgType) -> EventParameter {
    EventParameter { name, ty }
}

const CHARACTER_ONLY: &[EventParameter] = &[param("character", ProgType::CHARACTER)];
const CHARACTER_CELL: &[EventParameter] = &[
    param("mover", ProgType::CHARACTER),
    param("location", ProgType::LOCATION),
];
const COMMAND_INPUT: &[EventParameter] = &[
    param("actor", ProgType::CHARACTER),
    param("command", ProgType::TEXT),
    param("arguments", ProgType::TEXT),
];
const CHARACTER_SPEAKS: &[EventParameter] = &[
    param("speaker", ProgType::CHARACTER),
    param("location", ProgType::LOCATION),
    param("message", ProgType::TEXT),
];
const ITEM_GIVEN: &[EventParameter] = &[
    param("giver", ProgType::CHARACTER),
    param("receiver", ProgType::CHARACTER),
    param("item", ProgType::ITEM),
];
const ITEM_DROPPED: &[EventParameter] = &[
    param("dropper", ProgType::CHARACTER),
    param("item", ProgType::ITEM),
    param("location", ProgType::LOCATION),
];
const CHARACTER_DIES: &[EventParameter] = &[param("victim", ProgType::CHARACTER)];
const TICK: &[EventParameter] = &[param("target", ProgType::PERCEIVABLE)];
const ITEM_DAMAGED: &[EventParameter] = &[
    param("item", ProgType::ITEM),
    param("damage", ProgType::NUMBER),
];

/// Events progs can be hooked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventType {
    /// A character logs in or is loaded into the world.
    CharacterEntersGame,
    /// A character logs out or is unloaded.
    CharacterLeavesGame,
    /// A character arrives in a location.
    CharacterEnterCell,
    /// A character leaves a location.
    CharacterLeaveCell,
    /// A character enters a command; carries the command keyword.
    CommandInput,
    /// A character says something aloud.
    CharacterSpeaks,
    /// An item changes hands.
    ItemGiven,
    /// An item is dropped on the ground.
    ItemDropped,
    /// A character dies.
    CharacterDies,
    /// Once per in-world minute.
    MinuteTick,
    /// Once per in-world hour.
    HourTick,
    /// An item takes damage.
    ItemDamaged,
}

impl EventType {
    /// Every event type.
    pub const ALL: [EventType; 12] = [
        EventType::CharacterEntersGame,
        EventType::CharacterLeavesGame,
        EventType::CharacterEnterCell,
        EventType::CharacterLeaveCell,
        EventType::CommandInput,
        EventType::CharacterSpeaks,
        EventType::ItemGiven,
        EventType::ItemDropped,
        EventType::CharacterDies,
        EventType::MinuteTick,
        EventType::HourTick,
        EventType::ItemDamaged,
    ];

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            EventType::CharacterEntersGame => "CharacterEntersGame",
            EventType::CharacterLeavesGame => "CharacterLeavesGame",
            EventType::CharacterEnterCell => "CharacterEnterCell",
            EventType::CharacterLeaveCell => "CharacterLeaveCell",
            EventType::CommandInput => "CommandInput",
            EventType::CharacterSpeaks => "CharacterSpeaks",
            EventType::ItemGiven => "ItemGiven",
            EventType::ItemDropped => "ItemDropped",
            EventType::CharacterDies => "CharacterDies",
            EventType::MinuteTick => "MinuteTick",
            EventType::HourTick => "HourTick",
            EventType::ItemDamaged => "ItemDamaged",
        }
    }

    /// Ordered declared parameters.
    pub fn parameters(self) -> &'static [EventParameter] {
        match self {
            EventType::CharacterEntersGame | EventType::CharacterLeavesGame => CHARACTER_ONLY,
            EventType::CharacterEnterCell | EventType::CharacterLeaveCell => CHARACTER_CELL,
            EventType::CommandInput => COMMAND_INPUT,
            EventType::CharacterSpeaks => CHARACTER_SPEAKS,
            EventType::ItemGiven => ITEM_GIVEN,
            EventType::ItemDropped => ITEM_DROPPED,
            EventType::CharacterDies => CHARACTER_DIES,
            EventType::MinuteTick | EventType::HourTick => TICK,
            EventType::ItemDamaged => ITEM_DAMAGED,
        }
    }

    /// Declared parameter types, in order.
    pub fn parameter_types(self) -> Vec<ProgType> {
        self.parameters().iter().map(|p| p.ty).collect()
    }

    /// Position of the `command` Text parameter, for command-triggered hooks.
    pub fn command_parameter(self) -> Option<usize> {
        self.parameters()
            .iter()
            .position(|p| p.name == "command" && p.ty == ProgType::TEXT)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|e| e.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown event type '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for event in EventType::ALL {
            assert_eq!(event.name().parse::<EventType>().unwrap(), event);
        }
        assert_eq!(
            "commandinput".parse::<EventType>().unwrap(),
            EventType::CommandInput
        );
        assert!("Teleported".parse::<EventType>().is_err());
    }

    #[test]
    fn test_command_parameter_only_on_command_events() {
        assert_eq!(EventType::CommandInput.command_parameter(), Some(1));
        assert_eq!(EventType::CharacterDies.command_parameter(), None);
    }

    #[test]
    fn test_tuple_order() {
        assert_eq!(
            EventType::ItemGiven.parameter_types(),
            vec![ProgType::CHARACTER, ProgType::CHARACTER, ProgType::ITEM]
        );
    }
}
