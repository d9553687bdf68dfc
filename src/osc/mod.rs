//! OSC-Pipeline: Routen, Dispatch und UDP-Endpunkte.

pub mod address;
pub mod dispatch;
pub mod endpoint_pool;
pub mod message;
pub mod route;
pub mod scale;
pub mod transport;

pub use address::AddressTemplate;
pub use dispatch::{build_messages, dispatch_route};
pub use endpoint_pool::{
    EndpointConfig, EndpointFactory, EndpointPool, OpenOutcome, OscTransport, PoolError,
};
pub use message::OscOutgoing;
pub use route::{Axis, AxisSource, OscRoute, OscRouteTable};
pub use scale::{ScaleExpr, ScaleOp};
pub use transport::{
    LogEndpointFactory, LogTransport, MemoryEndpointFactory, MemoryTransport, SentPacket,
    UdpEndpointFactory, UdpTransport,
};

use std::net::Ipv4Addr;

/// Ziel der Dispatch-Pipeline: löst Port-Indizes auf und versendet.
pub trait OscSink {
    /// Endpunkt an Listen-Position `port_index`, falls vorhanden.
    fn endpoint(&self, port_index: usize) -> Option<EndpointConfig>;

    /// Sendet an alle passenden Endpunkte; liefert die Anzahl der Pakete.
    fn send(&mut self, message: &OscOutgoing, remote_port: u16, remote_address: Ipv4Addr) -> usize;
}
