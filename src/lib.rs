//! Core library surface for the User Registry TUI application.
//!
//! The record store, the validator and the registration workflow are usable
//! without the terminal front-end, which is how the integration tests drive
//! them.
pub mod config;
pub mod ids;
pub mod models;
pub mod registry;
pub mod store;
pub mod telemetry;
pub mod ui;
pub mod validation;

/// The persistence entry points used by `main.rs` and the tests.
pub use store::{RecordStore, StoreError};

/// The domain types other layers manipulate.
pub use models::{FormFields, RecordField, UserId, UserRecord};

/// The registration workflow and its listing callback.
pub use registry::{EditOutcome, EditSession, ListingRenderer, Registry, Submission};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
