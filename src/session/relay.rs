//! Relay-Zustandsmaschine (Server-Seite).
//!
//! Reine Ereignisverarbeitung: jeder Aufruf liefert die zu versendenden
//! Nachrichten als `Envelope`-Liste. Netzwerk-Treiber (WebSocket, Tests)
//! stellen sie zu. Der UDP-Endpunkt-Pool lebt im Relay, weil `addUDPPort`,
//! `removeUDPPort` und `sendOSC` über ihn laufen.
//!
//! Szenen-Payloads werden nicht validiert; der Relay verteilt nur.

use super::protocol::{ClientId, ClientMessage, ServerMessage};
use crate::osc::{EndpointFactory, EndpointPool, OscOutgoing};
use crate::shared::{parse_ipv4, validate_port, AuthorityPolicy, ValidationError};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;
use std::net::Ipv4Addr;

/// Zustellauftrag an genau einen Client.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub to: ClientId,
    pub message: ServerMessage,
}

impl Envelope {
    pub fn new(to: ClientId, message: ServerMessage) -> Self {
        Self { to, message }
    }
}

/// Rolle einer Verbindung.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Authority,
    Follower,
}

/// Relay-Zustand für eine gemeinsame Session.
pub struct Relay<F: EndpointFactory> {
    /// Verbundene Clients in Verbindungsreihenfolge
    sessions: IndexSet<ClientId>,
    authority: Option<ClientId>,
    /// Joiner, die noch auf ihren Snapshot warten
    pending: IndexMap<ClientId, bool>,
    live_routes: HashSet<(ClientId, usize)>,
    policy: AuthorityPolicy,
    ever_connected: bool,
    next_id: u64,
    pool: EndpointPool<F>,
}

impl<F: EndpointFactory> Relay<F> {
    pub fn new(pool: EndpointPool<F>, policy: AuthorityPolicy) -> Self {
        Self {
            sessions: IndexSet::new(),
            authority: None,
            pending: IndexMap::new(),
            live_routes: HashSet::new(),
            policy,
            ever_connected: false,
            next_id: 1,
            pool,
        }
    }

    pub fn authority(&self) -> Option<ClientId> {
        self.authority
    }

    pub fn role(&self, client: ClientId) -> Option<Role> {
        if !self.sessions.contains(&client) {
            return None;
        }
        Some(if self.authority == Some(client) {
            Role::Authority
        } else {
            Role::Follower
        })
    }

    pub fn clients(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.sessions.iter().copied()
    }

    pub fn client_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_pending(&self, client: ClientId) -> bool {
        self.pending.contains_key(&client)
    }

    pub fn pool(&self) -> &EndpointPool<F> {
        &self.pool
    }

    pub fn is_route_live(&self, client: ClientId, route_id: usize) -> bool {
        self.live_routes.contains(&(client, route_id))
    }

    /// Neue Verbindung. Liefert die vergebene ID und die Begrüßung.
    pub fn connect(&mut self) -> (ClientId, Vec<Envelope>) {
        let id = ClientId(self.next_id);
        self.next_id += 1;
        self.sessions.insert(id);

        let promote = self.authority.is_none()
            && (!self.ever_connected || self.policy == AuthorityPolicy::PromoteNextJoiner);
        self.ever_connected = true;

        let mut out = vec![Envelope::new(
            id,
            ServerMessage::Welcome {
                client_id: id,
                authority: promote,
                udp_ports: self.pool.configs(),
            },
        )];

        if promote {
            log::info!("Client {} verbunden (Authority)", id);
            out.extend(self.set_authority(id));
        } else {
            log::info!("Client {} verbunden (Follower)", id);
            self.pending.insert(id, false);
            out.extend(self.request_pending_scenes());
            if self.authority.is_none() {
                log::info!("Keine Authority: Client {} wartet auf Snapshot", id);
            }
        }
        (id, out)
    }

    /// Verbindung beendet: Spiegel, Routen und ggf. Authority aufräumen.
    pub fn disconnect(&mut self, client: ClientId) -> Vec<Envelope> {
        if !self.sessions.shift_remove(&client) {
            return Vec::new();
        }
        self.pending.shift_remove(&client);
        self.live_routes.retain(|(owner, _)| *owner != client);

        let mut out = self.broadcast_except(client, ServerMessage::ClientDisconnected { client_id: client });
        if self.authority == Some(client) {
            self.authority = None;
            // Offene Anfragen an die alte Authority sind verloren
            for requested in self.pending.values_mut() {
                *requested = false;
            }
            log::info!("Authority {} getrennt, Szene ohne Authority", client);
            out.extend(self.broadcast(ServerMessage::AuthorityChanged { client_id: None }));
        } else {
            log::info!("Client {} getrennt", client);
        }
        out
    }

    /// Verarbeitet eine Nachricht eines verbundenen Clients.
    pub fn handle(&mut self, from: ClientId, message: ClientMessage) -> Vec<Envelope> {
        if !self.sessions.contains(&from) {
            log::debug!("Nachricht von unbekanntem Client {} verworfen", from);
            return Vec::new();
        }

        match message {
            ClientMessage::SyncScene { target, scene } => self.forward_snapshot(from, target, scene),
            ClientMessage::UpdateScene(update) => {
                self.broadcast_except(from, ServerMessage::UpdateScene { from, update })
            }
            ClientMessage::ObjectTelemetry(telemetry) => {
                self.broadcast_except(from, ServerMessage::ObjectTelemetry { from, telemetry })
            }
            ClientMessage::AddUdpPort {
                local_port,
                remote_port,
                remote_address,
            } => self.add_udp_port(from, local_port, remote_port, &remote_address),
            ClientMessage::RemoveUdpPort {
                local_port,
                remote_port,
            } => self.remove_udp_port(from, local_port, remote_port),
            ClientMessage::SendOsc {
                route_id,
                port_index,
                messages,
            } => {
                self.send_osc(from, route_id, port_index, &messages);
                Vec::new()
            }
            ClientMessage::StartSendOsc { route_id } => {
                if self.live_routes.insert((from, route_id)) {
                    log::info!("Client {}: OSC-Route {} gestartet", from, route_id);
                }
                Vec::new()
            }
            ClientMessage::StopSendOsc { route_id } => {
                if self.live_routes.remove(&(from, route_id)) {
                    log::info!("Client {}: OSC-Route {} gestoppt", from, route_id);
                }
                Vec::new()
            }
            ClientMessage::PingCheck { sent_at_ms } => {
                vec![Envelope::new(from, ServerMessage::PongCheck { sent_at_ms })]
            }
            ClientMessage::Message { text } => self.broadcast(ServerMessage::Message { from, text }),
            ClientMessage::ClaimAuthority => self.claim_authority(from),
        }
    }

    fn forward_snapshot(&mut self, from: ClientId, target: ClientId, scene: serde_json::Value) -> Vec<Envelope> {
        if self.authority != Some(from) {
            log::warn!("Snapshot von Nicht-Authority {} ignoriert", from);
            return vec![Self::error(from, "Nur die Authority darf Szenen-Snapshots senden")];
        }
        if self.pending.shift_remove(&target).is_none() {
            log::debug!("Snapshot für {} ohne offene Anfrage verworfen", target);
            return Vec::new();
        }
        log::info!("Snapshot von {} an {} weitergeleitet", from, target);
        vec![Envelope::new(target, ServerMessage::SyncScene(scene))]
    }

    fn claim_authority(&mut self, from: ClientId) -> Vec<Envelope> {
        match self.authority {
            Some(current) if current == from => Vec::new(),
            Some(current) => vec![Self::error(
                from,
                &format!("Authority liegt bereits bei Client {}", current),
            )],
            None => {
                self.pending.shift_remove(&from);
                log::info!("Client {} übernimmt Authority", from);
                self.set_authority(from)
            }
        }
    }

    fn set_authority(&mut self, client: ClientId) -> Vec<Envelope> {
        self.authority = Some(client);
        let mut out = self.broadcast(ServerMessage::AuthorityChanged {
            client_id: Some(client),
        });
        out.extend(self.request_pending_scenes());
        out
    }

    /// Fordert für jeden wartenden Joiner genau einmal einen Snapshot an.
    fn request_pending_scenes(&mut self) -> Vec<Envelope> {
        let Some(authority) = self.authority else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for (joiner, requested) in self.pending.iter_mut() {
            if !*requested {
                *requested = true;
                out.push(Envelope::new(
                    authority,
                    ServerMessage::RequestScene { for_client: *joiner },
                ));
            }
        }
        out
    }

    fn add_udp_port(&mut self, from: ClientId, local_port: i64, remote_port: i64, remote_address: &str) -> Vec<Envelope> {
        let (local_port, remote_port, remote_address) =
            match parse_endpoint(local_port, remote_port, remote_address) {
                Ok(values) => values,
                Err(e) => return vec![Self::error(from, &e.to_string())],
            };

        match self.pool.open(local_port, remote_port, remote_address) {
            Ok(_) => self.broadcast(ServerMessage::UdpPorts(self.pool.configs())),
            Err(e) => {
                log::warn!("{}", e);
                vec![Self::error(from, &e.to_string())]
            }
        }
    }

    fn remove_udp_port(&mut self, from: ClientId, local_port: i64, remote_port: i64) -> Vec<Envelope> {
        let (local_port, remote_port) = match (validate_port(local_port), validate_port(remote_port)) {
            (Ok(local), Ok(remote)) => (local, remote),
            (Err(e), _) | (_, Err(e)) => return vec![Self::error(from, &e.to_string())],
        };
        if self.pool.close(local_port, remote_port) {
            self.broadcast(ServerMessage::UdpPorts(self.pool.configs()))
        } else {
            Vec::new()
        }
    }

    /// Versendet vom Client gebaute OSC-Nachrichten, solange seine Route läuft.
    /// Der Port-Index wird erst hier aufgelöst.
    fn send_osc(&mut self, from: ClientId, route_id: usize, port_index: usize, messages: &[OscOutgoing]) -> usize {
        if !self.live_routes.contains(&(from, route_id)) {
            log::debug!("sendOSC für gestoppte Route {} von {} verworfen", route_id, from);
            return 0;
        }
        let Some(target) = self.pool.config(port_index) else {
            log::debug!("sendOSC an fehlenden UDP-Port {} verworfen", port_index);
            return 0;
        };
        messages
            .iter()
            .map(|m| self.pool.send(m, target.remote_port, target.remote_address))
            .sum()
    }

    fn broadcast(&self, message: ServerMessage) -> Vec<Envelope> {
        self.sessions
            .iter()
            .map(|id| Envelope::new(*id, message.clone()))
            .collect()
    }

    fn broadcast_except(&self, sender: ClientId, message: ServerMessage) -> Vec<Envelope> {
        self.sessions
            .iter()
            .filter(|id| **id != sender)
            .map(|id| Envelope::new(*id, message.clone()))
            .collect()
    }

    fn error(to: ClientId, message: &str) -> Envelope {
        Envelope::new(
            to,
            ServerMessage::Error {
                message: message.to_string(),
            },
        )
    }
}

fn parse_endpoint(
    local_port: i64,
    remote_port: i64,
    remote_address: &str,
) -> Result<(u16, u16, Ipv4Addr), ValidationError> {
    Ok((
        validate_port(local_port)?,
        validate_port(remote_port)?,
        parse_ipv4(remote_address)?,
    ))
}
