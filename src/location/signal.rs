use serde::{Deserialize, Serialize};

const GOOD_ACCURACY_M: f64 = 15.0;
const MEDIOCRE_ACCURACY_M: f64 = 40.0;

/// Display-only classification of horizontal accuracy. Never consulted by the gates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SignalQuality {
    Good,
    Mediocre,
    Weak,
    None,
}

impl Default for SignalQuality {
    fn default() -> Self {
        SignalQuality::None
    }
}

impl SignalQuality {
    pub fn from_accuracy(horizontal_accuracy: f64) -> Self {
        if !horizontal_accuracy.is_finite() || horizontal_accuracy <= 0.0 {
            SignalQuality::None
        } else if horizontal_accuracy <= GOOD_ACCURACY_M {
            SignalQuality::Good
        } else if horizontal_accuracy <= MEDIOCRE_ACCURACY_M {
            SignalQuality::Mediocre
        } else {
            SignalQuality::Weak
        }
    }
}
