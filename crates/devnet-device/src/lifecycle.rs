//! Device lifecycle state machine
//!
//! ```text
//! Issued ──first transfer──▶ Trading ──redeem──▶ Redeemed
//!    └───────────────redeem──────────────────────▲
//! ```
//!
//! States only move forward. Redeemed is terminal.

use devnet_core::{DevnetError, DevnetResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a device record, ordered by progression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Freshly issued, never transferred
    Issued,
    /// Ownership has changed hands at least once
    Trading,
    /// Returned to the issuer; terminal
    Redeemed,
}

impl LifecycleState {
    /// Whether a record may move from `self` to `target`
    ///
    /// Staying in the current state is allowed for every state except
    /// Redeemed, where no further mutation of the lifecycle is legal.
    pub fn can_transition_to(self, target: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, target),
            (Issued, Issued)
                | (Issued, Trading)
                | (Issued, Redeemed)
                | (Trading, Trading)
                | (Trading, Redeemed)
        )
    }

    /// Check a transition, naming the record in the error
    pub fn ensure_transition(self, target: LifecycleState, subject: &str) -> DevnetResult<()> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(DevnetError::illegal_transition(format!(
                "{subject}: cannot move from {self} to {target}"
            )))
        }
    }

    /// No further transfer or redeem is possible
    pub fn is_terminal(self) -> bool {
        self == LifecycleState::Redeemed
    }

    /// Lowercase state name
    pub fn name(self) -> &'static str {
        match self {
            Self::Issued => "issued",
            Self::Trading => "trading",
            Self::Redeemed => "redeemed",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
