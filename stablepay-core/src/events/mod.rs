//! Events published by the action executor.
//!
//! Observers receive `ExecutorEvent`s over a bounded mpsc channel instead of
//! polling executor state. Events are dropped, not awaited, when the
//! channel is full or closed: the executor never blocks on an observer.

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, ExecutorEventReceiver, ExecutorEventSender, executor_event_channel,
};
pub use types::ExecutorEvent;
