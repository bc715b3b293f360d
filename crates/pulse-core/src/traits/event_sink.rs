use crate::models::DomainEvent;

/// Outbound boundary for domain events. Implementations must not block:
/// emitting happens on request and job paths.
pub trait IEventSink: Send + Sync {
    fn emit(&self, event: DomainEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl IEventSink for NoopEventSink {
    fn emit(&self, _event: DomainEvent) {}
}
