// haptic_core/src/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;

// --- Core Identifier ---
/// Index of a rigid link in the robot a sensor is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkHandle(pub usize);

impl LinkHandle {
    /// Returns true if this handle indexes one of `num_links` links.
    pub fn is_valid_for(self, num_links: usize) -> bool {
        self.0 < num_links
    }
}

impl fmt::Display for LinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
