use std::fmt;

use serde::{Deserialize, Serialize};

/// Remote model tier. `Fast` is cheap and quick, `Detailed` is used for the
/// one-shot escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Fast,
    Detailed,
}

impl ModelTier {
    pub fn as_str(&self) -> &str {
        match self {
            ModelTier::Fast => "fast",
            ModelTier::Detailed => "detailed",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            ModelTier::Fast => "Flash (Fast)",
            ModelTier::Detailed => "Pro (Detailed)",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
