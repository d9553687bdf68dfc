//! Client-seitige Session-Synchronisation.
//!
//! `SessionSync` ist der explizite Session-Kontext eines Clients: eigene ID,
//! Authority-Flag, Spiegel anderer Clients, Port-Liste, Latenz und Chat.
//! Eingehende `ServerMessage`s werden per Event-Tag auf Handler verteilt,
//! die Szene und Kontext mutieren und Antworten als Liste zurückgeben.

use super::latency::LatencyProbe;
use super::mirror::{RemoteMirror, SmoothingParams, TelemetryOutcome};
use super::protocol::{ClientId, ClientMessage, ServerMessage, TelemetryUpdate};
use crate::osc::EndpointConfig;
use indexmap::IndexMap;
use std::collections::VecDeque;
use trajectory_engine::{CurveSet, FrameSnapshot, Scene, SceneSnapshot, SceneUpdate};

/// Eintrag im Chat-/Log-Puffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    /// `None` = Systemmeldung (z.B. Relay-Fehler)
    pub from: Option<ClientId>,
    pub text: String,
}

/// Session-Kontext eines Clients.
#[derive(Debug, Clone)]
pub struct SessionSync {
    client_id: Option<ClientId>,
    authority: Option<ClientId>,
    mirrors: IndexMap<ClientId, RemoteMirror>,
    udp_ports: Vec<EndpointConfig>,
    latency: LatencyProbe,
    chat: VecDeque<ChatEntry>,
    chat_capacity: usize,
    smoothing: SmoothingParams,
}

impl SessionSync {
    pub fn new(smoothing: SmoothingParams, chat_capacity: usize) -> Self {
        Self {
            client_id: None,
            authority: None,
            mirrors: IndexMap::new(),
            udp_ports: Vec::new(),
            latency: LatencyProbe::new(),
            chat: VecDeque::new(),
            chat_capacity: chat_capacity.max(1),
            smoothing,
        }
    }

    pub fn client_id(&self) -> Option<ClientId> {
        self.client_id
    }

    pub fn is_connected(&self) -> bool {
        self.client_id.is_some()
    }

    pub fn is_authority(&self) -> bool {
        self.client_id.is_some() && self.authority == self.client_id
    }

    pub fn authority(&self) -> Option<ClientId> {
        self.authority
    }

    pub fn mirror(&self, client: ClientId) -> Option<&RemoteMirror> {
        self.mirrors.get(&client)
    }

    pub fn mirror_count(&self) -> usize {
        self.mirrors.len()
    }

    pub fn udp_ports(&self) -> &[EndpointConfig] {
        &self.udp_ports
    }

    pub fn latency(&self) -> &LatencyProbe {
        &self.latency
    }

    pub fn chat(&self) -> impl Iterator<Item = &ChatEntry> {
        self.chat.iter()
    }

    pub fn set_smoothing(&mut self, smoothing: SmoothingParams) {
        self.smoothing = smoothing;
    }

    /// Verbindung verloren: Session-Zustand verwerfen, Szene bleibt.
    pub fn reset(&mut self) {
        self.client_id = None;
        self.authority = None;
        self.mirrors.clear();
        self.udp_ports.clear();
    }

    /// Verarbeitet eine Relay-Nachricht; liefert Antworten an den Relay.
    pub fn handle(&mut self, scene: &mut Scene, message: ServerMessage, now_ms: u64) -> Vec<ClientMessage> {
        match message {
            ServerMessage::Welcome {
                client_id,
                authority,
                udp_ports,
            } => {
                self.on_welcome(client_id, authority, udp_ports);
                Vec::new()
            }
            ServerMessage::RequestScene { for_client } => self.on_request_scene(scene, for_client),
            ServerMessage::SyncScene(payload) => {
                self.on_sync_scene(scene, payload);
                Vec::new()
            }
            ServerMessage::UpdateScene { from, update } => {
                self.on_update_scene(scene, from, update);
                Vec::new()
            }
            ServerMessage::ObjectTelemetry { from, telemetry } => {
                self.on_telemetry(from, &telemetry);
                Vec::new()
            }
            ServerMessage::ClientDisconnected { client_id } => {
                if self.mirrors.shift_remove(&client_id).is_some() {
                    log::info!("Spiegel von Client {} entfernt", client_id);
                }
                Vec::new()
            }
            ServerMessage::AuthorityChanged { client_id } => {
                self.authority = client_id;
                log::info!(
                    "Authority: {}",
                    client_id.map_or_else(|| "keine".to_string(), |id| id.to_string())
                );
                Vec::new()
            }
            ServerMessage::PongCheck { sent_at_ms } => {
                let rtt = self.latency.record_pong(sent_at_ms, now_ms);
                log::debug!("RTT {} ms", rtt);
                Vec::new()
            }
            ServerMessage::Message { from, text } => {
                self.push_chat(Some(from), text);
                Vec::new()
            }
            ServerMessage::UdpPorts(ports) => {
                self.udp_ports = ports;
                Vec::new()
            }
            ServerMessage::Error { message } => {
                log::warn!("Relay meldet Fehler: {}", message);
                self.push_chat(None, message);
                Vec::new()
            }
        }
    }

    fn on_welcome(&mut self, client_id: ClientId, authority: bool, udp_ports: Vec<EndpointConfig>) {
        self.client_id = Some(client_id);
        if authority {
            self.authority = Some(client_id);
        }
        self.udp_ports = udp_ports;
        log::info!(
            "Mit Relay verbunden als {} ({})",
            client_id,
            if authority { "Authority" } else { "Follower" }
        );
    }

    fn on_request_scene(&self, scene: &Scene, for_client: ClientId) -> Vec<ClientMessage> {
        match serde_json::to_value(scene.snapshot()) {
            Ok(payload) => vec![ClientMessage::SyncScene {
                target: for_client,
                scene: payload,
            }],
            Err(e) => {
                log::error!("Szenen-Snapshot nicht serialisierbar: {}", e);
                Vec::new()
            }
        }
    }

    fn on_sync_scene(&mut self, scene: &mut Scene, payload: serde_json::Value) {
        let snapshot = match serde_json::from_value::<SceneSnapshot>(payload) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("Ungültiger Szenen-Snapshot verworfen: {}", e);
                return;
            }
        };
        if let Err(e) = scene.replace_with(snapshot) {
            log::warn!("Szenen-Snapshot nicht anwendbar: {}", e);
        }
    }

    fn on_update_scene(&mut self, scene: &mut Scene, from: ClientId, payload: serde_json::Value) {
        let update = match serde_json::from_value::<SceneUpdate>(payload) {
            Ok(update) => update,
            Err(e) => {
                log::warn!("Unbekannter Edit von {} verworfen: {}", from, e);
                return;
            }
        };
        if let Err(e) = scene.apply(&update) {
            log::warn!("Edit von {} nicht anwendbar: {}", from, e);
        }
    }

    fn on_telemetry(&mut self, from: ClientId, telemetry: &TelemetryUpdate) -> TelemetryOutcome {
        let smoothing = self.smoothing;
        let mirror = self.mirrors.entry(from).or_default();
        let outcome = mirror.apply(telemetry, &smoothing);
        if outcome == TelemetryOutcome::Rejected && mirror.is_empty() {
            self.mirrors.shift_remove(&from);
        }
        outcome
    }

    fn push_chat(&mut self, from: Option<ClientId>, text: String) {
        if self.chat.len() >= self.chat_capacity {
            self.chat.pop_front();
        }
        self.chat.push_back(ChatEntry { from, text });
    }

    /// Partielle Updates aller animierten eigenen Objekte und Trigger.
    pub fn telemetry(&self, scene: &Scene) -> Vec<ClientMessage> {
        let entries = scene
            .objects
            .iter()
            .map(|(index, o)| (index, o, false))
            .chain(scene.triggers.iter().map(|(index, t)| (index, t, true)));
        entries
            .filter(|(_, object, _)| object.animate)
            .map(|(index, object, trigger)| {
                ClientMessage::ObjectTelemetry(TelemetryUpdate {
                    index,
                    position: Some(object.position),
                    speed: Some(object.speed),
                    trajectory_index: Some(object.trajectory_index),
                    trigger,
                })
            })
            .collect()
    }

    /// Bewegt alle Spiegel lokal weiter.
    pub fn tick_mirrors(&mut self, curves: &CurveSet, step: f32) -> Vec<(ClientId, FrameSnapshot)> {
        self.mirrors
            .iter_mut()
            .map(|(id, mirror)| (*id, mirror.tick(curves, step)))
            .collect()
    }
}

impl Default for SessionSync {
    fn default() -> Self {
        Self::new(SmoothingParams::default(), crate::shared::options::CHAT_LOG_CAPACITY)
    }
}
