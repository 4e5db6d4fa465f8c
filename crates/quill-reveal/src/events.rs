//! Reveal event types

use crate::entry::SessionStatus;
use serde::{Deserialize, Serialize};

/// Events emitted while the animator reveals entries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RevealEvent {
    /// An entry became visible without animation
    Revealed { index: usize },

    /// A typing reveal started for the visible entry at `index`
    TypingStarted { index: usize },

    /// The typing reveal at `index` finished (completion signal or
    /// force-complete)
    TypingFinished { index: usize },

    /// The run reached a terminal status; pending entries were flushed and
    /// the marker set was cleared
    RunFinished { status: SessionStatus },
}

impl RevealEvent {
    /// Check if this is a terminal event
    pub fn is_terminal(&self) -> bool {
        matches!(self, RevealEvent::RunFinished { .. })
    }
}
