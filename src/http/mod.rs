use crate::{categories::CategoryStore, relay::RelayService};

pub mod error;
pub mod handlers;
pub mod router;

pub use router::http_router;

/// Shared state behind every route.
pub struct AppState {
    pub relay: RelayService,
    pub categories: CategoryStore,
}
