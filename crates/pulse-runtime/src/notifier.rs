//! Broadcast event sink. Emitting never blocks: when no one is subscribed
//! the event is dropped, and slow subscribers see `Lagged`.

use tokio::sync::broadcast;
use tracing::trace;

use pulse_core::models::DomainEvent;
use pulse_core::traits::IEventSink;

#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<DomainEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl IEventSink for BroadcastNotifier {
    fn emit(&self, event: DomainEvent) {
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            trace!(kind = ?event.kind, subject = %event.subject_id, "no subscribers for event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::models::EventKind;
    use test_fixtures::fixed_now;

    #[test]
    fn subscribers_receive_events() {
        let notifier = BroadcastNotifier::new(8);
        let mut rx = notifier.subscribe();
        notifier.emit(DomainEvent::new(EventKind::ReportAccepted, "r1", fixed_now()).with("trust_score", 0.2));
        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::ReportAccepted);
        assert_eq!(event.fields.get("trust_score"), Some(&0.2));
    }

    #[test]
    fn emitting_without_subscribers_is_harmless() {
        let notifier = BroadcastNotifier::new(1);
        notifier.emit(DomainEvent::new(EventKind::PulseTileExpired, "dr5reg", fixed_now()));
        assert_eq!(notifier.subscriber_count(), 0);
    }
}
