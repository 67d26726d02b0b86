pub mod context;
pub mod emitter;
pub mod scheduler;
pub mod window;

pub use context::{ClockWatcher, ContextChange, ContextChangeSender};
pub use emitter::{ChannelEmitter, CheckinEmitter, CheckinSignal, LoggingEmitter};
pub use scheduler::{CheckinScheduler, SchedulerState};
pub use window::{is_hour_allowed, next_allowed_instant, random_instant_within_hour};
