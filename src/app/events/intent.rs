use crate::osc::Axis;
use crate::session::ServerMessage;
use crate::shared::StudioOptions;
use glam::Vec3;
use trajectory_engine::{Direction, SceneSnapshot};

/// Intents sind Eingaben aus UI/System ohne direkte Mutationslogik.
#[derive(Debug, Clone)]
pub enum AppIntent {
    // ── Kurven ──────────────────────────────────────────────────
    /// Neue Kurve aus mindestens zwei Punkten
    CurveAddRequested { points: Vec<Vec3>, closed: bool },
    /// Kontrollpunkt an Kurve anhängen
    ControlPointAddRequested { curve_index: usize, position: Vec3 },
    /// Kontrollpunkt gezogen (globaler Punkt-Index)
    ControlPointMoved { point_index: usize, position: Vec3 },
    /// Kontrollpunkt löschen (globaler Punkt-Index)
    ControlPointDeleteRequested { point_index: usize },
    /// Kurve löschen
    CurveDeleteRequested { curve_index: usize },
    /// Tension-Slider geändert
    TensionChanged { curve_index: usize, tension: f32 },
    /// Geschlossen/offen umgeschaltet
    ClosedToggled { curve_index: usize, closed: bool },
    /// Kurve in der UI ausgewählt
    CurveSelected { curve_index: Option<usize> },

    // ── Objekte & Trigger ───────────────────────────────────────
    /// Neues Objekt auf Kurve (Standard: ausgewählte Kurve)
    ObjectAddRequested { trajectory_index: Option<usize> },
    ObjectDeleteRequested { index: usize },
    ObjectSpeedChanged { index: usize, speed: f32 },
    ObjectAnimateToggled { index: usize, animate: bool },
    ObjectLoopToggled { index: usize, looping: bool },
    ObjectDirectionChanged { index: usize, direction: Direction },
    ObjectTrajectoryChanged { index: usize, trajectory_index: usize },
    ObjectPositionChanged { index: usize, position: f32 },
    TriggerAddRequested { trajectory_index: Option<usize> },
    TriggerDeleteRequested { index: usize },

    // ── Szene ───────────────────────────────────────────────────
    /// Szene aus Datei geladen
    SceneLoaded { snapshot: SceneSnapshot },
    SceneClearRequested,

    // ── UDP-Ports (Texteingaben, werden validiert) ──────────────
    UdpPortAddRequested {
        local_port: String,
        remote_port: String,
        remote_address: String,
    },
    UdpPortRemoveRequested { local_port: u16, remote_port: u16 },

    // ── OSC-Routen ──────────────────────────────────────────────
    RouteAddRequested,
    RouteRemoveRequested { route_id: usize },
    RoutePortChanged { route_id: usize, port_index: usize },
    RouteAddressChanged { route_id: usize, address: String },
    RouteScaleChanged { route_id: usize, axis: Axis, expr: String },
    RouteSourceChanged { route_id: usize, axis: Axis, source: String },
    /// Sende-Checkbox einer Route
    RouteToggled { route_id: usize, enabled: bool },

    // ── Session ─────────────────────────────────────────────────
    /// Nachricht vom Relay empfangen
    ServerMessageReceived { message: ServerMessage },
    /// Verbindung zum Relay verloren
    ConnectionLost,
    PingRequested,
    ChatSubmitted { text: String },
    AuthorityClaimRequested,

    // ── Optionen ────────────────────────────────────────────────
    OptionsChanged { options: Box<StudioOptions> },
}
