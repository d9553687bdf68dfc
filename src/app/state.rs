//! Application State: Szene, Routen, Session und Optionen.

use super::CommandLog;
use crate::osc::OscRouteTable;
use crate::session::{ClientMessage, SessionSync, SmoothingParams};
use crate::shared::StudioOptions;
use std::time::{Duration, Instant};
use trajectory_engine::{FrameSnapshot, Scene};

/// Hauptzustand der Anwendung
pub struct AppState {
    /// Kurven, Objekte und Trigger
    pub scene: Scene,
    /// OSC-Routen inkl. Sende-Zeitplan
    pub routes: OscRouteTable,
    /// Session-Kontext (ID, Authority, Spiegel, Chat)
    pub session: SessionSync,
    /// Laufzeit-Optionen
    pub options: StudioOptions,
    /// Verlauf ausgeführter Commands
    pub command_log: CommandLog,
    /// Ausgehende Relay-Nachrichten; der Host holt sie mit `drain_outbox` ab
    pub outbox: Vec<ClientMessage>,
    /// In der UI ausgewählte Kurve
    pub selected_curve: Option<usize>,
    /// Positionen des letzten Animations-Ticks (Quelle der OSC-Pipeline)
    pub last_frame: FrameSnapshot,
    /// Zeitpunkt der letzten Telemetrie
    pub last_telemetry: Option<Instant>,
    started_at: Instant,
}

impl AppState {
    /// Erstellt einen leeren App-State mit Standard-Optionen
    pub fn new() -> Self {
        Self::with_options(StudioOptions::default())
    }

    pub fn with_options(options: StudioOptions) -> Self {
        Self {
            scene: Scene::new(options.sampling_settings()),
            routes: OscRouteTable::new(options.osc_interval()),
            session: SessionSync::new(
                SmoothingParams::from_options(&options),
                options.chat_log_capacity,
            ),
            options,
            command_log: CommandLog::new(),
            outbox: Vec::new(),
            selected_curve: None,
            last_frame: FrameSnapshot::default(),
            last_telemetry: None,
            started_at: Instant::now(),
        }
    }

    /// Millisekunden seit Start (Zeitbasis für `pingCheck`).
    pub fn now_ms(&self) -> u64 {
        Self::millis(Instant::now().saturating_duration_since(self.started_at))
    }

    fn millis(duration: Duration) -> u64 {
        u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
    }

    /// Entnimmt alle ausstehenden Relay-Nachrichten.
    pub fn drain_outbox(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.outbox)
    }

    pub fn curve_count(&self) -> usize {
        self.scene.curves.len()
    }

    pub fn object_count(&self) -> usize {
        self.scene.objects.len()
    }

    /// Nur online senden wir Edits; offline bleibt alles lokal.
    pub(crate) fn publish(&mut self, message: ClientMessage) {
        if self.session.is_connected() {
            self.outbox.push(message);
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
