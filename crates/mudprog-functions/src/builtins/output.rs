use mudprog_foundation::{ProgType, ReturnType};

use super::nothing;
use crate::ReturnSpec;
use crate::args::{entity, text};

crate::builtin!(SEND, "send", "output", "Send a line of text to a character or item",
    [ProgType::union(mudprog_foundation::Capability::Perceiver), ProgType::TEXT]
        => ReturnSpec::Fixed(ReturnType::Void),
    |args, host| {
        let target = entity(args, 0, "send")?;
        let message = text(args, 1, "send")?;
        host.send(target, message);
        Ok(nothing())
    });
