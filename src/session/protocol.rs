//! Relay-Wire-Protokoll (JSON über WebSocket).
//!
//! Jede Nachricht ist `{"event": "<name>", "data": ...}`. Szenen-Payloads
//! (`syncScene`, `updateScene`) bleiben für den Relay opak.

use crate::osc::{EndpointConfig, OscOutgoing};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Vom Relay vergebene Verbindungs-ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Partielles Update eines animierten Objekts (oder Triggers) eines anderen Clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryUpdate {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trajectory_index: Option<usize>,
    /// `true` = Trigger statt Objekt
    #[serde(default)]
    pub trigger: bool,
}

/// Client → Relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Antwort der Authority auf `requestScene`
    SyncScene {
        target: ClientId,
        scene: serde_json::Value,
    },
    /// Inkrementeller Edit, wird unverändert an alle anderen verteilt
    UpdateScene(serde_json::Value),
    ObjectTelemetry(TelemetryUpdate),
    /// Ports bleiben roh, damit der Relay sie selbst validiert
    #[serde(rename = "addUDPPort")]
    AddUdpPort {
        local_port: i64,
        remote_port: i64,
        remote_address: String,
    },
    #[serde(rename = "removeUDPPort")]
    RemoveUdpPort { local_port: i64, remote_port: i64 },
    #[serde(rename = "sendOSC")]
    SendOsc {
        route_id: usize,
        port_index: usize,
        messages: Vec<OscOutgoing>,
    },
    #[serde(rename = "startSendOSC")]
    StartSendOsc { route_id: usize },
    #[serde(rename = "stopSendOSC")]
    StopSendOsc { route_id: usize },
    PingCheck { sent_at_ms: u64 },
    Message { text: String },
    ClaimAuthority,
}

/// Relay → Client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    Welcome {
        client_id: ClientId,
        authority: bool,
        udp_ports: Vec<EndpointConfig>,
    },
    /// An die Authority: vollständigen Snapshot für `for_client` liefern
    RequestScene { for_client: ClientId },
    SyncScene(serde_json::Value),
    UpdateScene {
        from: ClientId,
        update: serde_json::Value,
    },
    ObjectTelemetry {
        from: ClientId,
        telemetry: TelemetryUpdate,
    },
    ClientDisconnected { client_id: ClientId },
    AuthorityChanged { client_id: Option<ClientId> },
    PongCheck { sent_at_ms: u64 },
    Message { from: ClientId, text: String },
    #[serde(rename = "udpPorts")]
    UdpPorts(Vec<EndpointConfig>),
    Error { message: String },
}

impl ClientMessage {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ServerMessage {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_names_on_the_wire() {
        let add = ClientMessage::AddUdpPort {
            local_port: 5002,
            remote_port: 7002,
            remote_address: "127.0.0.1".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&add).expect("JSON"),
            json!({
                "event": "addUDPPort",
                "data": {"localPort": 5002, "remotePort": 7002, "remoteAddress": "127.0.0.1"}
            })
        );

        let stop = ClientMessage::StopSendOsc { route_id: 3 };
        assert_eq!(
            serde_json::to_value(&stop).expect("JSON"),
            json!({"event": "stopSendOSC", "data": {"routeId": 3}})
        );

        let claim = ClientMessage::from_json(r#"{"event":"claimAuthority"}"#).expect("JSON");
        assert_eq!(claim, ClientMessage::ClaimAuthority);
    }

    #[test]
    fn test_update_scene_payload_is_opaque() {
        let payload = json!({"kind": "somethingNew", "extra": [1, 2, 3]});
        let text = json!({"event": "updateScene", "data": payload}).to_string();
        let parsed = ClientMessage::from_json(&text).expect("JSON");
        assert_eq!(parsed, ClientMessage::UpdateScene(payload));
    }

    #[test]
    fn test_server_message_roundtrip() {
        let message = ServerMessage::ObjectTelemetry {
            from: ClientId(4),
            telemetry: TelemetryUpdate {
                index: 1,
                position: Some(0.42),
                speed: None,
                trajectory_index: None,
                trigger: false,
            },
        };
        let text = message.to_json().expect("JSON");
        assert!(text.contains(r#""event":"objectTelemetry""#));
        assert!(!text.contains("speed"));
        assert_eq!(ServerMessage::from_json(&text).expect("JSON"), message);

        let ports = ServerMessage::UdpPorts(Vec::new()).to_json().expect("JSON");
        assert_eq!(ports, r#"{"event":"udpPorts","data":[]}"#);
    }

    #[test]
    fn test_unknown_event_rejected() {
        assert!(ClientMessage::from_json(r#"{"event":"dropTables","data":{}}"#).is_err());
        assert!(ClientMessage::from_json("not json").is_err());
    }
}
