//! Position: the simulated holding state for a bar.

use serde::{Deserialize, Serialize};

/// Long-only holding state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Flat,
    Long,
}

impl Position {
    /// Numeric encoding: Flat = 0, Long = 1.
    pub fn value(self) -> u8 {
        match self {
            Position::Flat => 0,
            Position::Long => 1,
        }
    }

    /// Multiplier applied to a price delta.
    pub fn exposure(self) -> f64 {
        f64::from(self.value())
    }

    pub fn is_long(self) -> bool {
        self == Position::Long
    }
}
