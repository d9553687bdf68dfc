//! Trajectory OSC Studio Library.
//! Session-, OSC- und Application-Layer als Library exportiert für Tests und Wiederverwendung.

pub mod app;
pub mod net;
pub mod osc;
pub mod session;
pub mod shared;

pub use app::{AppCommand, AppController, AppIntent, AppState};
pub use osc::{EndpointConfig, EndpointPool, OscRoute, OscRouteTable, ScaleExpr};
pub use session::{ClientId, ClientMessage, Relay, ServerMessage, SessionSync};
pub use shared::{AuthorityPolicy, StudioOptions, ValidationError};
pub use trajectory_engine::{Scene, SceneSnapshot, SceneUpdate};
