pub mod classifier;
pub mod service;

pub use classifier::classify_response;
pub use service::{CheckinError, CheckinService};
