//! Pool offener UDP-Endpunkte für OSC.
//!
//! Ein Endpunkt ist über seinen lokalen Port eindeutig. `send` verteilt eine
//! Nachricht an jeden Endpunkt mit passendem Ziel (Port + Adresse).

use super::message::OscOutgoing;
use super::OscSink;
use crate::shared::{validate_port, ValidationError};
use serde::{Deserialize, Serialize};
use std::io;
use std::net::Ipv4Addr;

/// Konfiguration eines Endpunkts, wie sie im Protokoll und in der UI erscheint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    pub local_port: u16,
    pub remote_port: u16,
    pub remote_address: Ipv4Addr,
}

impl EndpointConfig {
    /// Prüft beide Ports auf den gültigen Bereich.
    pub fn new(local_port: i64, remote_port: i64, remote_address: Ipv4Addr) -> Result<Self, ValidationError> {
        Ok(Self {
            local_port: validate_port(local_port)?,
            remote_port: validate_port(remote_port)?,
            remote_address,
        })
    }

    pub fn targets(&self, remote_port: u16, remote_address: Ipv4Addr) -> bool {
        self.remote_port == remote_port && self.remote_address == remote_address
    }
}

/// Sendekanal eines geöffneten Endpunkts (an sein konfiguriertes Ziel).
pub trait OscTransport {
    fn send_packet(&mut self, bytes: &[u8]) -> io::Result<usize>;
}

/// Öffnet Transporte; in Tests durch eine Attrappe ersetzbar.
pub trait EndpointFactory {
    type Transport: OscTransport;

    fn open(&mut self, config: &EndpointConfig) -> io::Result<Self::Transport>;
}

/// Fehler beim Öffnen eines Endpunkts.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("UDP-Port {port} konnte nicht geöffnet werden: {source}")]
    Io {
        port: u16,
        #[source]
        source: io::Error,
    },
}

/// Ergebnis von `open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    /// Lokaler Port bereits belegt: nichts geändert
    AlreadyOpen,
}

struct Endpoint<T> {
    config: EndpointConfig,
    transport: T,
}

/// Hook nach erfolgreichem Öffnen.
pub type ReadyHook = fn(&EndpointConfig);

/// Geordneter Pool; Routen adressieren Endpunkte über ihre Position.
pub struct EndpointPool<F: EndpointFactory> {
    factory: F,
    endpoints: Vec<Endpoint<F::Transport>>,
    on_ready: ReadyHook,
}

impl<F: EndpointFactory> EndpointPool<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            endpoints: Vec::new(),
            on_ready: log_local_ipv4,
        }
    }

    pub fn with_ready_hook(mut self, hook: ReadyHook) -> Self {
        self.on_ready = hook;
        self
    }

    /// Öffnet einen Endpunkt. Ein bereits belegter lokaler Port wird
    /// protokolliert und ignoriert.
    pub fn open(
        &mut self,
        local_port: u16,
        remote_port: u16,
        remote_address: Ipv4Addr,
    ) -> Result<OpenOutcome, PoolError> {
        let config = EndpointConfig::new(
            i64::from(local_port),
            i64::from(remote_port),
            remote_address,
        )?;

        if self.contains_local_port(local_port) {
            log::warn!(
                "UDP-Port {} ist bereits geöffnet, Anfrage ({} → {}:{}) ignoriert",
                local_port,
                local_port,
                remote_address,
                remote_port
            );
            return Ok(OpenOutcome::AlreadyOpen);
        }

        let transport = self
            .factory
            .open(&config)
            .map_err(|source| PoolError::Io {
                port: local_port,
                source,
            })?;
        self.endpoints.push(Endpoint { config, transport });
        log::info!(
            "UDP-Port {} geöffnet → {}:{}",
            local_port,
            remote_address,
            remote_port
        );
        (self.on_ready)(&config);
        Ok(OpenOutcome::Opened)
    }

    /// Schließt den Endpunkt mit exakt diesem (lokal, remote)-Paar.
    /// Der Transport wird dabei gedroppt; danach ist kein Senden mehr möglich.
    pub fn close(&mut self, local_port: u16, remote_port: u16) -> bool {
        let Some(pos) = self
            .endpoints
            .iter()
            .position(|e| e.config.local_port == local_port && e.config.remote_port == remote_port)
        else {
            log::debug!("Kein UDP-Port {} → {} zum Schließen", local_port, remote_port);
            return false;
        };
        self.endpoints.remove(pos);
        log::info!("UDP-Port {} geschlossen", local_port);
        true
    }

    /// Schließt alle Endpunkte.
    pub fn close_all(&mut self) {
        if !self.endpoints.is_empty() {
            log::info!("{} UDP-Ports geschlossen", self.endpoints.len());
        }
        self.endpoints.clear();
    }

    pub fn contains_local_port(&self, local_port: u16) -> bool {
        self.endpoints.iter().any(|e| e.config.local_port == local_port)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Konfiguration an Listen-Position `index` (Routen-Ziel).
    pub fn config(&self, index: usize) -> Option<EndpointConfig> {
        self.endpoints.get(index).map(|e| e.config)
    }

    pub fn configs(&self) -> Vec<EndpointConfig> {
        self.endpoints.iter().map(|e| e.config).collect()
    }

    /// Sendet an jeden Endpunkt mit passendem Ziel; liefert die Anzahl der Pakete.
    pub fn send(&mut self, message: &OscOutgoing, remote_port: u16, remote_address: Ipv4Addr) -> usize {
        let bytes = match message.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("OSC-Nachricht {} nicht kodierbar: {}", message.address, e);
                return 0;
            }
        };

        let mut sent = 0;
        for endpoint in self
            .endpoints
            .iter_mut()
            .filter(|e| e.config.targets(remote_port, remote_address))
        {
            match endpoint.transport.send_packet(&bytes) {
                Ok(_) => sent += 1,
                Err(e) => log::debug!(
                    "Senden über UDP-Port {} fehlgeschlagen: {}",
                    endpoint.config.local_port,
                    e
                ),
            }
        }
        sent
    }
}

impl<F: EndpointFactory> OscSink for EndpointPool<F> {
    fn endpoint(&self, port_index: usize) -> Option<EndpointConfig> {
        self.config(port_index)
    }

    fn send(&mut self, message: &OscOutgoing, remote_port: u16, remote_address: Ipv4Addr) -> usize {
        EndpointPool::send(self, message, remote_port, remote_address)
    }
}

/// Standard-Hook: listet lokale, nicht-Loopback IPv4-Adressen für den Operator.
pub fn log_local_ipv4(config: &EndpointConfig) {
    match if_addrs::get_if_addrs() {
        Ok(interfaces) => {
            for iface in interfaces
                .iter()
                .filter(|i| !i.is_loopback() && i.ip().is_ipv4())
            {
                log::info!(
                    "OSC-Endpunkt erreichbar unter {}:{} ({})",
                    iface.ip(),
                    config.local_port,
                    iface.name
                );
            }
        }
        Err(e) => log::debug!("Netzwerk-Interfaces nicht lesbar: {}", e),
    }
}
