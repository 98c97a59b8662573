mod api;
mod errors;
mod merge;

pub use api::{ReconcileOutcome, ReconciliationApi};
pub use errors::ReconcileError;
pub use merge::{merge_update, MergeOutcome};
