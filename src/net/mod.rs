//! Laufzeit-Treiber: WebSocket-Relay und Headless-Wiedergabe.

pub mod player;
pub mod relay_server;

pub use player::{load_scene, PlayConfig, Player};
pub use relay_server::serve;
