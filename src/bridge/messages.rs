//! Remote-control message shapes.

use serde::{Deserialize, Serialize};

/// Sent from the experience host to the render collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Switch the scene to `state` over `duration` seconds.
    Transition {
        /// Scene state, the phase name
        state: String,
        /// Animation duration in seconds
        duration: f64,
    },
    /// Progress through the current phase.
    Progress {
        /// Catalog index of the phase
        phase: usize,
        /// Normalized progress in `[0, 1]`
        progress: f64,
    },
}

impl OutboundMessage {
    /// Value of the `type` tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Transition { .. } => "transition",
            Self::Progress { .. } => "progress",
        }
    }
}

/// Acknowledgements from the render collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// The scene finished loading.
    SceneReady {
        /// State the scene is showing
        #[serde(default, skip_serializing_if = "Option::is_none")]
        state: Option<String>,
    },
    /// A transition animation finished.
    TransitionComplete {
        /// State transitioned to
        #[serde(default, skip_serializing_if = "Option::is_none")]
        state: Option<String>,
    },
    /// The collaborator reported a problem.
    Error {
        /// Description
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}
