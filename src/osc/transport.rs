//! Transporte: nicht-blockierende `std::net::UdpSocket`s, ein
//! In-Memory-Transport für Tests und ein protokollierender Trockenlauf.

use super::endpoint_pool::{EndpointConfig, EndpointFactory, OscTransport};
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use std::sync::{Arc, Mutex, PoisonError};

/// An einen lokalen Port gebundener Socket mit festem Ziel.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    remote: SocketAddrV4,
}

impl OscTransport for UdpTransport {
    fn send_packet(&mut self, bytes: &[u8]) -> io::Result<usize> {
        // WouldBlock → Paket verworfen, der nächste Takt sendet ohnehin neu
        self.socket.send_to(bytes, self.remote)
    }
}

/// Öffnet echte UDP-Sockets auf `0.0.0.0:<local_port>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpEndpointFactory;

impl EndpointFactory for UdpEndpointFactory {
    type Transport = UdpTransport;

    fn open(&mut self, config: &EndpointConfig) -> io::Result<Self::Transport> {
        let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, config.local_port))?;
        socket.set_nonblocking(true)?;
        Ok(UdpTransport {
            socket,
            remote: SocketAddrV4::new(config.remote_address, config.remote_port),
        })
    }
}

/// Von einem In-Memory-Endpunkt "gesendetes" Paket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPacket {
    pub local_port: u16,
    pub remote: SocketAddrV4,
    pub bytes: Vec<u8>,
}

type PacketLog = Arc<Mutex<Vec<SentPacket>>>;

/// Endpunkte ohne Netzwerk: Pakete werden nur gesammelt.
#[derive(Debug, Clone, Default)]
pub struct MemoryEndpointFactory {
    sent: PacketLog,
}

impl MemoryEndpointFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entnimmt alle bisher gesammelten Pakete.
    pub fn take_sent(&self) -> Vec<SentPacket> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Transport eines `MemoryEndpointFactory`-Endpunkts.
#[derive(Debug)]
pub struct MemoryTransport {
    local_port: u16,
    remote: SocketAddrV4,
    sent: PacketLog,
}

impl OscTransport for MemoryTransport {
    fn send_packet(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentPacket {
                local_port: self.local_port,
                remote: self.remote,
                bytes: bytes.to_vec(),
            });
        Ok(bytes.len())
    }
}

impl EndpointFactory for MemoryEndpointFactory {
    type Transport = MemoryTransport;

    fn open(&mut self, config: &EndpointConfig) -> io::Result<Self::Transport> {
        Ok(MemoryTransport {
            local_port: config.local_port,
            remote: SocketAddrV4::new(config.remote_address, config.remote_port),
            sent: Arc::clone(&self.sent),
        })
    }
}

/// Trockenlauf: dekodiert jedes Paket und schreibt es ins Log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEndpointFactory;

/// Transport eines `LogEndpointFactory`-Endpunkts.
#[derive(Debug)]
pub struct LogTransport {
    remote: SocketAddrV4,
}

impl OscTransport for LogTransport {
    fn send_packet(&mut self, bytes: &[u8]) -> io::Result<usize> {
        match rosc::decoder::decode_udp(bytes) {
            Ok((_, rosc::OscPacket::Message(msg))) => {
                log::info!("[{}] {} {:?}", self.remote, msg.addr, msg.args)
            }
            Ok((_, rosc::OscPacket::Bundle(bundle))) => {
                log::info!("[{}] Bundle mit {} Elementen", self.remote, bundle.content.len())
            }
            Err(e) => log::warn!("[{}] Paket nicht dekodierbar: {:?}", self.remote, e),
        }
        Ok(bytes.len())
    }
}

impl EndpointFactory for LogEndpointFactory {
    type Transport = LogTransport;

    fn open(&mut self, config: &EndpointConfig) -> io::Result<Self::Transport> {
        Ok(LogTransport {
            remote: SocketAddrV4::new(config.remote_address, config.remote_port),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osc::{EndpointPool, OscOutgoing};
    use std::time::Duration;

    #[test]
    fn test_udp_roundtrip_on_loopback() {
        let receiver = UdpSocket::bind("127.0.0.1:0").expect("Empfänger");
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .expect("Timeout");
        let remote_port = receiver.local_addr().expect("Adresse").port();
        if !(1024..=49151).contains(&remote_port) {
            // Ephemerer Port außerhalb des gültigen Bereichs: Test nicht aussagekräftig
            return;
        }

        let probe = UdpSocket::bind("0.0.0.0:0").expect("Probe");
        let local_port = probe.local_addr().expect("Adresse").port();
        drop(probe);
        if !(1024..=49151).contains(&local_port) {
            return;
        }

        let mut pool = EndpointPool::new(UdpEndpointFactory).with_ready_hook(|_| {});
        pool.open(local_port, remote_port, Ipv4Addr::LOCALHOST)
            .expect("Endpunkt");
        let message = OscOutgoing::new("/source/2/xyz", vec![0.25, 0.5, 0.75]);
        assert_eq!(pool.send(&message, remote_port, Ipv4Addr::LOCALHOST), 1);

        let mut buf = [0u8; 1024];
        let (len, _) = receiver.recv_from(&mut buf).expect("Paket");
        assert_eq!(&buf[..len], message.encode().expect("Kodierung").as_slice());
    }

    #[test]
    fn test_log_endpoint_counts_packets_without_network() {
        let mut pool = EndpointPool::new(LogEndpointFactory).with_ready_hook(|_| {});
        pool.open(5002, 7002, Ipv4Addr::LOCALHOST).expect("Endpunkt");
        let message = OscOutgoing::new("/source/1/xyz", vec![1.0, 2.0, 3.0]);
        assert_eq!(pool.send(&message, 7002, Ipv4Addr::LOCALHOST), 1);
    }
}
