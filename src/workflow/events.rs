//! Change notifications for presentation layers.
//!
//! [`EventBus`] wraps a `tokio::sync::broadcast` channel. Every workbench
//! mutation publishes one or more [`WorkflowEvent`]s; a renderer subscribes
//! and re-reads whatever part of the state an event names.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::lang::Locale;
use crate::workflow::action::ActionTarget;
use crate::workflow::stage::Stage;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Non-blocking user-facing message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub level: NoticeLevel,
    pub target: Option<ActionTarget>,
    pub message: String,
}

impl Notice {
    pub fn warning(target: Option<ActionTarget>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            target,
            message: message.into(),
        }
    }

    pub fn error(target: Option<ActionTarget>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            target,
            message: message.into(),
        }
    }
}

/// Something in the workbench changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkflowEvent {
    StageChanged { from: Stage, to: Stage },
    #[serde(rename_all = "camelCase")]
    LocaleChanged { locale: Locale },
    /// Draft list, selection, or one draft's content changed.
    #[serde(rename_all = "camelCase")]
    ScriptChanged { draft_id: String },
    #[serde(rename_all = "camelCase")]
    StoryboardReplaced { shot_count: usize },
    /// Shots were inserted, removed or reordered.
    ShotsChanged,
    #[serde(rename_all = "camelCase")]
    ShotChanged { shot_id: String },
    #[serde(rename_all = "camelCase")]
    SelectionChanged { shot_id: Option<String> },
    #[serde(rename_all = "camelCase")]
    AssetsReplaced { asset_count: usize },
    /// Assets were added or removed.
    AssetsChanged,
    #[serde(rename_all = "camelCase")]
    AssetChanged { asset_id: String },
    #[serde(rename_all = "camelCase")]
    PreviewReady { shot_id: String },
    BusyChanged { target: ActionTarget, busy: bool },
    Notice(Notice),
}

/// Fan-out channel for [`WorkflowEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    /// Creates a bus with a specific channel capacity. Slow receivers lose
    /// the oldest events and observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes to all current subscribers. Dropped if there are none.
    pub fn publish(&self, event: WorkflowEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        bus.publish(WorkflowEvent::ShotsChanged);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_subscribers_receive_in_order() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.publish(WorkflowEvent::ShotsChanged);
        bus.publish(WorkflowEvent::AssetsChanged);
        assert_eq!(rx.try_recv().unwrap(), WorkflowEvent::ShotsChanged);
        assert_eq!(rx.try_recv().unwrap(), WorkflowEvent::AssetsChanged);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_event_wire_shape() {
        let event = WorkflowEvent::ShotChanged {
            shot_id: "s1".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "shotChanged");
        assert_eq!(json["shotId"], "s1");

        let event = WorkflowEvent::BusyChanged {
            target: ActionTarget::Shot("s1".into()),
            busy: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["target"]["kind"], "shot");
        assert_eq!(json["target"]["id"], "s1");

        let event = WorkflowEvent::Notice(Notice::error(None, "boom"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "notice");
        assert_eq!(json["level"], "error");
    }
}
