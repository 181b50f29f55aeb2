//! Event channel factories and handles.

use super::types::ExecutorEvent;
use tokio::sync::mpsc;

/// Default buffer size for event channels.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for ExecutorEvent events.
pub type ExecutorEventSender = mpsc::Sender<ExecutorEvent>;
/// Receiver handle for ExecutorEvent events.
pub type ExecutorEventReceiver = mpsc::Receiver<ExecutorEvent>;

/// Create a new ExecutorEvent channel.
///
/// One channel per executor; the receiver usually belongs to the session or
/// UI bridge observing it.
pub fn executor_event_channel() -> (ExecutorEventSender, ExecutorEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
