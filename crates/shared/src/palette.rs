//! Display attributes handed out to joining sessions.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Colors a session may be assigned at join time.
pub const PALETTE: [&str; 5] = ["#FF5733", "#33FF57", "#3357FF", "#FF33A5", "#33FFF5"];

/// Color used for system notices and anonymous senders.
pub const NEUTRAL_COLOR: &str = "#000000";

/// Label used for connections that never announced a display name.
pub const ANONYMOUS_LABEL: &str = "Anonymous";

/// A display color, serialized as its hex string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn neutral() -> Self {
        Self::new(NEUTRAL_COLOR)
    }

    /// Samples uniformly from [`PALETTE`], with replacement.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        let value = PALETTE.choose(&mut rng).copied().unwrap_or(NEUTRAL_COLOR);
        Self::new(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
