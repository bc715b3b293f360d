mod event_sink;
mod storage;

pub use event_sink::{IEventSink, NoopEventSink};
pub use storage::{IPulseStorage, ReportMutation, VoteRemoval};
