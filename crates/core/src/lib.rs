//! Pure domain logic for the Signoff approval-workflow platform.
//!
//! Everything here is side-effect free: role ordinals, routing-table
//! resolution and validation, flow status vocabulary, deadline and
//! statistics arithmetic. Persistence lives in `signoff-db`, orchestration
//! in `signoff-engine`.

pub mod error;
pub mod flow;
pub mod roles;
pub mod routing;
pub mod stats;
pub mod types;
