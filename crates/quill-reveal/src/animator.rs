//! Incremental reveal state machine for streamed agent logs
//!
//! Consumes wholesale snapshots of a monotonically-growing log list and
//! reveals entries strictly in arrival order: not-yet-seen text entries get
//! a typing reveal (completed by an external signal), everything else is
//! shown statically. Already-animated entries are tracked in an
//! [`AnimatedMarker`](crate::marker::AnimatedMarker) that survives remounts
//! and is cleared when a run ends.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::entry::{EntryIdentity, LogEntry, SessionStatus};
use crate::events::RevealEvent;
use crate::marker::AnimatedMarker;

/// Reveal pacing and filtering configuration
#[derive(Debug, Clone)]
pub struct RevealConfig {
    /// Producer names whose entries are never surfaced
    pub excluded_agents: Vec<String>,
    /// Delay between consecutive static reveals
    pub static_delay: Duration,
    /// Reveal interval while the host tab is hidden
    pub background_interval: Duration,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            excluded_agents: vec![],
            static_delay: Duration::from_millis(150),
            background_interval: Duration::from_secs(1),
        }
    }
}

/// A log entry that has been revealed, with the mode it was revealed in
#[derive(Debug, Clone)]
pub struct RevealedEntry {
    /// The underlying entry
    pub entry: LogEntry,
    /// De-duplication identity at reveal time
    pub identity: EntryIdentity,
    /// Whether this entry was revealed via a typing animation
    pub animated: bool,
}

/// The reveal state machine
pub struct LogAnimator {
    config: RevealConfig,
    marker: Arc<dyn AnimatedMarker>,
    visible: Vec<RevealedEntry>,
    pending: VecDeque<(LogEntry, EntryIdentity)>,
    typing: Option<usize>,
    status: SessionStatus,
    is_loading: bool,
    hidden: bool,
    event_tx: broadcast::Sender<RevealEvent>,
}

impl LogAnimator {
    /// Create a new animator over a marker collaborator
    pub fn new(config: RevealConfig, marker: Arc<dyn AnimatedMarker>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            config,
            marker,
            visible: Vec::new(),
            pending: VecDeque::new(),
            typing: None,
            status: SessionStatus::Processing,
            is_loading: false,
            hidden: false,
            event_tx,
        }
    }

    /// Subscribe to reveal events
    pub fn subscribe(&self) -> broadcast::Receiver<RevealEvent> {
        self.event_tx.subscribe()
    }

    /// Entries revealed so far, in arrival order. Append-only: an entry is
    /// never removed or reordered once visible.
    pub fn visible(&self) -> &[RevealedEntry] {
        &self.visible
    }

    /// Index of the entry currently mid-typing, if any
    pub fn typing_index(&self) -> Option<usize> {
        self.typing
    }

    /// Current session status
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Whether the consumer should show a "working" indicator: loading, not
    /// terminal, and nothing currently typing
    pub fn show_thinking(&self) -> bool {
        self.is_loading && !self.status.is_terminal() && self.typing.is_none()
    }

    /// Consume one snapshot of the log list.
    ///
    /// Snapshots replace wholesale; entries already visible or already
    /// queued (by identity) are skipped, so a superset snapshot only
    /// contributes its genuinely new tail. A snapshot that moves the
    /// session into a terminal status force-completes any in-progress
    /// typing, flushes everything pending as static reveals in one batch,
    /// and clears the marker set for the next run.
    pub async fn ingest(&mut self, snapshot: Vec<LogEntry>, is_loading: bool) {
        let dropped = snapshot
            .iter()
            .filter(|e| !e.payload.is_displayable())
            .count();
        if dropped > 0 {
            tracing::debug!("dropped {dropped} non-displayable log entries");
        }

        let eligible: Vec<LogEntry> = snapshot
            .into_iter()
            .filter(|e| e.payload.is_displayable())
            .filter(|e| !self.config.excluded_agents.iter().any(|a| a == &e.agent))
            .collect();

        let status = infer_status(&eligible, is_loading);
        let newly_terminal = status.is_terminal() && !self.status.is_terminal();
        self.status = status;
        self.is_loading = is_loading;

        for (index, entry) in eligible.into_iter().enumerate() {
            let identity = entry.identity(index);
            let known = self.visible.iter().any(|r| r.identity == identity)
                || self.pending.iter().any(|(_, id)| *id == identity);
            if !known {
                self.pending.push_back((entry, identity));
            }
        }

        if newly_terminal {
            self.finish_typing();
            self.flush_pending();
            self.marker.clear();
            let _ = self.event_tx.send(RevealEvent::RunFinished {
                status: self.status,
            });
        } else {
            self.drain().await;
        }
    }

    /// External signal that the in-progress typing animation finished:
    /// records the entry in the marker, clears the typing slot, and resumes
    /// revealing pending entries.
    pub async fn complete_typing(&mut self) {
        self.finish_typing();
        self.drain().await;
    }

    /// Host visibility signal. Hidden: force-complete any in-progress
    /// typing and keep revealing statically on the background interval.
    /// Visible: force-complete whatever was mid-animation and resume normal
    /// pacing.
    pub async fn set_hidden(&mut self, hidden: bool) {
        if self.hidden == hidden {
            return;
        }
        self.hidden = hidden;
        self.finish_typing();
        self.drain().await;
    }

    /// Reveal pending entries in arrival order until one starts typing or
    /// the queue empties.
    async fn drain(&mut self) {
        while self.typing.is_none() {
            let Some((entry, identity)) = self.pending.pop_front() else {
                break;
            };
            let animate = self.should_animate(&entry, &identity);
            let index = self.visible.len();
            self.visible.push(RevealedEntry {
                entry,
                identity,
                animated: animate,
            });

            if animate {
                self.typing = Some(index);
                let _ = self.event_tx.send(RevealEvent::TypingStarted { index });
            } else {
                let _ = self.event_tx.send(RevealEvent::Revealed { index });
                // Pacing between consecutive static reveals; smoothness only
                if !self.pending.is_empty() {
                    let delay = if self.hidden {
                        self.config.background_interval
                    } else {
                        self.config.static_delay
                    };
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn should_animate(&self, entry: &LogEntry, identity: &EntryIdentity) -> bool {
        entry.payload.is_animatable()
            && !self.hidden
            && !self.status.is_terminal()
            && !self.marker.contains(identity)
    }

    /// Mark the entry mid-typing (if any) as animated and clear the slot.
    fn finish_typing(&mut self) {
        if let Some(index) = self.typing.take() {
            self.marker.insert(self.visible[index].identity.clone());
            let _ = self.event_tx.send(RevealEvent::TypingFinished { index });
        }
    }

    /// Reveal everything pending statically in one batch, no pacing.
    fn flush_pending(&mut self) {
        while let Some((entry, identity)) = self.pending.pop_front() {
            let index = self.visible.len();
            self.visible.push(RevealedEntry {
                entry,
                identity,
                animated: false,
            });
            let _ = self.event_tx.send(RevealEvent::Revealed { index });
        }
    }
}

/// Infer the session status for a snapshot: the last entry carrying an
/// explicit status wins; otherwise a settled non-empty list is complete and
/// anything else is still processing.
fn infer_status(eligible: &[LogEntry], is_loading: bool) -> SessionStatus {
    if let Some(status) = eligible.iter().rev().find_map(|e| e.status) {
        return status;
    }
    if !is_loading && !eligible.is_empty() {
        SessionStatus::Completed
    } else {
        SessionStatus::Processing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::InMemoryMarker;

    fn animator_with(marker: InMemoryMarker) -> LogAnimator {
        LogAnimator::new(RevealConfig::default(), Arc::new(marker))
    }

    fn animator() -> LogAnimator {
        animator_with(InMemoryMarker::new())
    }

    #[test]
    fn test_infer_status_last_explicit_wins() {
        let entries = vec![
            LogEntry::text("planner", "a").with_status(SessionStatus::Processing),
            LogEntry::text("planner", "b").with_status(SessionStatus::Completed),
        ];
        assert_eq!(infer_status(&entries, true), SessionStatus::Completed);
    }

    #[test]
    fn test_infer_status_settled_list_completes() {
        let entries = vec![LogEntry::text("planner", "a")];
        assert_eq!(infer_status(&entries, false), SessionStatus::Completed);
        assert_eq!(infer_status(&entries, true), SessionStatus::Processing);
        assert_eq!(infer_status(&[], false), SessionStatus::Processing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_entry_types_at_index_zero() {
        let marker = InMemoryMarker::new();
        let mut animator = animator_with(marker.clone());

        animator
            .ingest(vec![LogEntry::text("planner", "Step 1")], true)
            .await;

        assert_eq!(animator.visible().len(), 1);
        assert_eq!(animator.typing_index(), Some(0));
        assert!(animator.visible()[0].animated);
        // Something is typing, so the thinking indicator stays hidden
        assert!(!animator.show_thinking());
        assert!(marker.is_empty());

        animator.complete_typing().await;

        assert_eq!(animator.typing_index(), None);
        assert!(marker.contains(&animator.visible()[0].identity));
        assert!(animator.show_thinking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_animated_entry_reveals_static() {
        let marker = InMemoryMarker::new();
        let mut first = animator_with(marker.clone());
        first
            .ingest(vec![LogEntry::text("planner", "Step 1")], true)
            .await;
        first.complete_typing().await;

        // Remount: a fresh animator over the same marker sees the same data
        let mut second = animator_with(marker.clone());
        second
            .ingest(vec![LogEntry::text("planner", "Step 1")], true)
            .await;

        assert_eq!(second.visible().len(), 1);
        assert_eq!(second.typing_index(), None);
        assert!(!second.visible()[0].animated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_append_only_across_superset_snapshots() {
        let mut animator = animator();
        let e1 = LogEntry::data("planner", serde_json::json!({"step": 1}));
        let e2 = LogEntry::data("planner", serde_json::json!({"step": 2}));
        let e3 = LogEntry::data("planner", serde_json::json!({"step": 3}));

        animator.ingest(vec![e1.clone()], true).await;
        animator.ingest(vec![e1.clone(), e2.clone()], true).await;
        animator
            .ingest(vec![e1.clone(), e2.clone(), e3.clone()], true)
            .await;

        assert_eq!(animator.visible().len(), 3);
        assert_eq!(animator.visible()[0].entry.payload, e1.payload);
        assert_eq!(animator.visible()[1].entry.payload, e2.payload);
        assert_eq!(animator.visible()[2].entry.payload, e3.payload);

        // Re-ingesting the full snapshot adds nothing
        animator.ingest(vec![e1, e2, e3], true).await;
        assert_eq!(animator.visible().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_object_payload_never_types() {
        let mut animator = animator();
        animator
            .ingest(
                vec![LogEntry::data("planner", serde_json::json!({"k": 1}))],
                true,
            )
            .await;
        assert_eq!(animator.visible().len(), 1);
        assert_eq!(animator.typing_index(), None);
        assert!(!animator.visible()[0].animated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_entry_waits_for_typing() {
        let mut animator = animator();
        let e1 = LogEntry::text("planner", "Step 1");
        let e2 = LogEntry::data("planner", serde_json::json!({"step": 2}));

        animator.ingest(vec![e1.clone()], true).await;
        assert_eq!(animator.typing_index(), Some(0));

        // e2 arrives while e1 is still typing; it must wait its turn
        animator.ingest(vec![e1, e2], true).await;
        assert_eq!(animator.visible().len(), 1);

        animator.complete_typing().await;
        assert_eq!(animator.visible().len(), 2);
        assert!(!animator.visible()[1].animated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_flushes_and_clears_marker() {
        let marker = InMemoryMarker::new();
        let mut animator = animator_with(marker.clone());
        let e1 = LogEntry::text("planner", "Step 1");
        let e2 = LogEntry::text("planner", "Step 2");

        animator.ingest(vec![e1.clone()], true).await;
        assert_eq!(animator.typing_index(), Some(0));

        animator
            .ingest(
                vec![e1, e2.with_status(SessionStatus::Completed)],
                false,
            )
            .await;

        // Typing was force-completed, the new entry flushed static
        assert_eq!(animator.typing_index(), None);
        assert_eq!(animator.visible().len(), 2);
        assert!(!animator.visible()[1].animated);
        assert_eq!(animator.status(), SessionStatus::Completed);
        assert!(marker.is_empty());
        assert!(!animator.show_thinking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_marker_reset_allows_reanimation_next_run() {
        let marker = InMemoryMarker::new();
        let mut first = animator_with(marker.clone());
        let entry = LogEntry::text("planner", "Step 1");

        first
            .ingest(
                vec![entry.clone().with_status(SessionStatus::Completed)],
                false,
            )
            .await;
        assert!(marker.is_empty());

        // A brand-new run may animate a colliding identity again
        let mut second = animator_with(marker);
        second.ingest(vec![entry], true).await;
        assert_eq!(second.typing_index(), Some(0));
        assert!(second.visible()[0].animated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_takes_flush_path() {
        let marker = InMemoryMarker::new();
        let mut animator = animator_with(marker.clone());
        let mut events = animator.subscribe();

        animator
            .ingest(
                vec![LogEntry::text("planner", "boom").with_status(SessionStatus::Failed)],
                false,
            )
            .await;

        assert_eq!(animator.status(), SessionStatus::Failed);
        assert_eq!(animator.visible().len(), 1);
        assert!(!animator.visible()[0].animated);

        let mut finished = false;
        while let Ok(event) = events.try_recv() {
            if let RevealEvent::RunFinished { status } = event {
                assert_eq!(status, SessionStatus::Failed);
                finished = true;
            }
        }
        assert!(finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_excluded_agents_dropped() {
        let config = RevealConfig {
            excluded_agents: vec!["telemetry".into()],
            ..RevealConfig::default()
        };
        let mut animator = LogAnimator::new(config, Arc::new(InMemoryMarker::new()));

        animator
            .ingest(
                vec![
                    LogEntry::text("telemetry", "internal"),
                    LogEntry::text("planner", "Step 1"),
                ],
                true,
            )
            .await;

        assert_eq!(animator.visible().len(), 1);
        assert_eq!(animator.visible()[0].entry.agent, "planner");
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_displayable_dropped_silently() {
        let mut animator = animator();
        animator
            .ingest(
                vec![
                    LogEntry::text("planner", "   "),
                    LogEntry::data("planner", serde_json::json!({})),
                    LogEntry::text("planner", "real"),
                ],
                true,
            )
            .await;
        assert_eq!(animator.visible().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_force_completes_and_reveals_static() {
        let mut animator = animator();
        let e1 = LogEntry::text("planner", "Step 1");
        let e2 = LogEntry::text("planner", "Step 2");
        let e3 = LogEntry::text("planner", "Step 3");

        animator.ingest(vec![e1.clone(), e2.clone()], true).await;
        assert_eq!(animator.typing_index(), Some(0));

        animator.set_hidden(true).await;

        // Typing force-completed, the rest revealed without animation
        assert_eq!(animator.typing_index(), None);
        assert_eq!(animator.visible().len(), 2);
        assert!(!animator.visible()[1].animated);

        // Back to visible: new entries animate again
        animator.set_hidden(false).await;
        animator.ingest(vec![e1, e2, e3], true).await;
        assert_eq!(animator.typing_index(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_in_reveal_order() {
        let mut animator = animator();
        let mut events = animator.subscribe();

        animator
            .ingest(
                vec![
                    LogEntry::data("planner", serde_json::json!({"step": 1})),
                    LogEntry::text("planner", "Step 2"),
                ],
                true,
            )
            .await;
        animator.complete_typing().await;

        let mut seen = vec![];
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert!(matches!(seen[0], RevealEvent::Revealed { index: 0 }));
        assert!(matches!(seen[1], RevealEvent::TypingStarted { index: 1 }));
        assert!(matches!(seen[2], RevealEvent::TypingFinished { index: 1 }));
    }
}
