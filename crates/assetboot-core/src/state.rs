//! Boot state machine.
//!
//! ```text
//! Idle -> Probing (auto only) -> Loading(0) .. Loading(n-1) -> ImportingApp -> Ready
//!                                     \__________________________\_________-> Failed
//! ```

use serde::Serialize;

/// Current phase of a bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum BootState {
    Idle,
    /// Waiting for the CDN reachability probe.
    Probing,
    /// Loading the asset at `index` of the catalog.
    Loading { index: usize, asset: String },
    ImportingApp,
    Ready,
    Failed { reason: String },
}

impl BootState {
    /// `Ready` and `Failed` end a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BootState::Ready | BootState::Failed { .. })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, BootState::Ready)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: &BootState) -> bool {
        use BootState::*;
        match (self, next) {
            (Idle, Probing) | (Idle, Loading { index: 0, .. }) | (Idle, ImportingApp) => true,
            (Probing, Loading { index: 0, .. }) | (Probing, ImportingApp) => true,
            (Loading { index: a, .. }, Loading { index: b, .. }) => *b == a + 1,
            (Loading { .. }, ImportingApp) => true,
            (Loading { .. }, Failed { .. }) | (ImportingApp, Failed { .. }) => true,
            (ImportingApp, Ready) => true,
            _ => false,
        }
    }
}
