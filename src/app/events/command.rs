use crate::osc::Axis;
use crate::session::ServerMessage;
use crate::shared::StudioOptions;
use trajectory_engine::{SceneSnapshot, SceneUpdate};

/// Commands sind mutierende Schritte, die zentral ausgeführt werden.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Lokalen Szenen-Edit anwenden und an die Session weitergeben
    ApplySceneEdit { update: SceneUpdate },
    /// Kurvenauswahl setzen
    SelectCurve { curve_index: Option<usize> },
    /// Szene vollständig ersetzen
    LoadScene { snapshot: SceneSnapshot },
    /// Szene leeren
    ClearScene,

    /// UDP-Port beim Relay anfordern (Eingaben noch ungeprüft)
    AddUdpPort {
        local_port: String,
        remote_port: String,
        remote_address: String,
    },
    /// UDP-Port beim Relay schließen
    RemoveUdpPort { local_port: u16, remote_port: u16 },

    /// Neue Route mit Standardwerten
    AddRoute,
    RemoveRoute { route_id: usize },
    SetRoutePort { route_id: usize, port_index: usize },
    SetRouteAddress { route_id: usize, address: String },
    SetRouteScale { route_id: usize, axis: Axis, expr: String },
    SetRouteSource { route_id: usize, axis: Axis, source: String },
    /// Route starten (idempotent)
    EnableRoute { route_id: usize },
    /// Route stoppen (idempotent)
    DisableRoute { route_id: usize },

    /// Relay-Nachricht auf Szene und Session anwenden
    ApplyServerMessage { message: ServerMessage },
    /// Session-Zustand nach Verbindungsverlust verwerfen
    ResetSession,
    SendPing,
    SendChat { text: String },
    ClaimAuthority,

    /// Neue Optionen übernehmen
    ApplyOptions { options: Box<StudioOptions> },
}
