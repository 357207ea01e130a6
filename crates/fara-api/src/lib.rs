//! # fara-api — HTTP surface for the Execution Governor
//!
//! Assembles the Lifecycle Coordinator, Approval Ticket Authority, and
//! Event Bus behind an Axum router implementing the wire contract from
//! spec §6.
//!
//! ## Crate Policy
//!
//! - Sits at the top of the dependency DAG — depends on every other
//!   `fara-*` crate.
//! - No business logic in route handlers — they validate the request shape
//!   and delegate to the Coordinator.
//! - All errors map to structured HTTP responses via `ApiError`.

pub mod approval;
pub mod auth;
pub mod bootstrap;
pub mod coordinator;
pub mod error;
pub mod event_bus;
pub mod routes;
pub mod settings;
pub mod state;

pub use bootstrap::{run, seed_demo_actions};
pub use coordinator::Coordinator;
pub use error::ApiError;
pub use event_bus::EventBus;
pub use settings::Settings;
pub use state::AppState;
