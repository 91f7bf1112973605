pub mod dedup;
pub mod service;
pub mod sessions;

pub use service::{RelayError, RelayService};
pub use sessions::{SessionLimits, SessionRegistry};
