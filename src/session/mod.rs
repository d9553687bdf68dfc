//! Multi-Client-Synchronisation: Wire-Protokoll, Relay und Client-Kontext.

pub mod client;
pub mod latency;
pub mod mirror;
pub mod protocol;
pub mod relay;

pub use client::{ChatEntry, SessionSync};
pub use latency::LatencyProbe;
pub use mirror::{RemoteMirror, SmoothingParams, TelemetryOutcome};
pub use protocol::{ClientId, ClientMessage, ServerMessage, TelemetryUpdate};
pub use relay::{Envelope, Relay, Role};
