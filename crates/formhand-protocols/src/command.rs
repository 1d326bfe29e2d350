//! The Injector's line-oriented command grammar.
//!
//! Every command is a single comma-delimited line terminated by CR LF on the
//! wire. The grammar is fixed by the firmware; this module only renders it.

use serde::{Deserialize, Serialize};

/// One command for the Injector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Relative pointer motion in pixels.
    Move { dx: i32, dy: i32 },
    /// Press-and-release primary button at the current position.
    Click,
    /// Wheel scroll; sign is direction.
    Scroll { units: i32 },
    /// Emit one character.
    Type { ch: char },
    /// Emit one named key (e.g. `Backspace`).
    Key { name: String },
    /// Modifier chord (e.g. `ctrl+a`).
    Combo { chord: String },
    /// Pre-rendered line forwarded verbatim.
    Raw(String),
}

impl Command {
    pub fn key(name: impl Into<String>) -> Self {
        Command::Key { name: name.into() }
    }

    pub fn combo(chord: impl Into<String>) -> Self {
        Command::Combo {
            chord: chord.into(),
        }
    }

    /// Render the wire form, without the trailing CR LF.
    pub fn wire(&self) -> String {
        match self {
            Command::Move { dx, dy } => format!("MOVE,{},{}", dx, dy),
            Command::Click => "CLICK".to_string(),
            Command::Scroll { units } => format!("SCROLL,{}", units),
            Command::Type { ch } => format!("TYPE,{}", ch),
            Command::Key { name } => format!("KEY,{}", name),
            Command::Combo { chord } => format!("COMBO,{}", chord),
            Command::Raw(line) => line.clone(),
        }
    }

    /// Whether the host refuses to transmit this command.
    ///
    /// `Enter` reaches the OS as a real keypress and can trigger keyboard
    /// shortcuts outside the browser, so it is blocked at the link layer.
    pub fn is_blocked(&self) -> bool {
        match self {
            Command::Key { name } => name.eq_ignore_ascii_case("enter"),
            Command::Raw(line) => {
                let upper = line.trim().to_ascii_uppercase();
                upper == "KEY,ENTER"
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire())
    }
}
