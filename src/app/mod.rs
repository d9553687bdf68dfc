//! Application-Layer: Controller, State, Events und Feature-Handler.

pub mod command_log;
pub mod controller;
pub mod events;
pub mod handlers;
mod intent_mapping;
/// Application State
///
/// Szene, Routen, Session-Kontext und Optionen eines Clients.
pub mod state;

pub use command_log::CommandLog;
pub use controller::AppController;
pub use events::{AppCommand, AppIntent};
pub use state::AppState;
