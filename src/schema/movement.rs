use serde::{Deserialize, Serialize};

/// A movement written onto a stage direction as its `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Movement {
    Entrance,
    Exit,
}

impl Movement {
    /// The `type` attribute value ("entrance" / "exit").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entrance => "entrance",
            Self::Exit => "exit",
        }
    }
}

/// What the classifier decided for one sentence.
///
/// `Alone` is left to the driver, which settles it against the current
/// stage set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    Entrance,
    Exit,
    Alone,
    None,
}
