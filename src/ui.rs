//! Ratatui front-end: a listing of every registrant with a registration form,
//! an edit form that applies one field at a time, and a delete confirmation.
//! The screens only talk to the core through [`Registry`](crate::registry::Registry).

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
