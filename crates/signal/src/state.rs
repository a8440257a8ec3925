use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Accuracy below this is a normal fix (meters).
pub const NORMAL_ACCURACY_M: f64 = 30.0;

/// Accuracy below this (and at least [`NORMAL_ACCURACY_M`]) is a weak fix.
pub const WEAK_ACCURACY_M: f64 = 100.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalState {
    #[default]
    Normal,
    Weak,
    Lost,
}

impl SignalState {
    /// Maps a horizontal accuracy (meters) to a signal state.
    ///
    /// Negative accuracy means the fix is invalid and is treated as lost.
    #[must_use]
    pub fn classify(accuracy: f64) -> Self {
        if accuracy < 0.0 || accuracy.is_nan() {
            Self::Lost
        } else if accuracy < NORMAL_ACCURACY_M {
            Self::Normal
        } else if accuracy < WEAK_ACCURACY_M {
            Self::Weak
        } else {
            Self::Lost
        }
    }

    #[must_use]
    pub const fn is_lost(self) -> bool {
        matches!(self, Self::Lost)
    }
}

impl Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normal => "normal",
            Self::Weak => "weak",
            Self::Lost => "lost",
        };
        f.write_str(name)
    }
}
