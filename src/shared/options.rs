//! Zentrale Konfiguration für das Trajectory OSC Studio.
//!
//! `StudioOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use trajectory_engine::SamplingSettings;

// ── OSC ─────────────────────────────────────────────────────────────

/// Standard-Port, auf dem lokale OSC-Endpunkte gebunden werden.
pub const DEFAULT_OSC_LOCAL_PORT: u16 = 7400;
/// Standard-Zielport für ausgehende OSC-Nachrichten.
pub const DEFAULT_OSC_REMOTE_PORT: u16 = 7500;
/// Standard-Zieladresse für ausgehende OSC-Nachrichten.
pub const DEFAULT_OSC_REMOTE_ADDRESS: Ipv4Addr = Ipv4Addr::LOCALHOST;
/// Sende-Intervall einer aktiven OSC-Route in Millisekunden.
pub const OSC_INTERVAL_MS: u64 = 20;
/// Offset zwischen Objekt-Index und Source-ID in OSC-Adressen (1 = Zählung ab 1).
pub const SOURCE_ID_OFFSET: usize = 1;
/// Kleinster gültiger Port (unterhalb liegen System-Ports).
pub const PORT_MIN: u16 = 1024;
/// Größter gültiger Port (oberhalb liegen dynamische/ephemere Ports).
pub const PORT_MAX: u16 = 49151;

// ── Animation ───────────────────────────────────────────────────────

/// Animations-Tick in Millisekunden (~60 Hz).
pub const ANIMATION_TICK_MS: u64 = 17;
/// Stützstellen der Arc-Length-Tabelle pro Kurve.
pub const ARC_LENGTH_DIVISIONS: usize = 200;
/// Polyline-Punkte pro Spline-Segment für das Rendering.
pub const RENDER_DIVISIONS_PER_SEGMENT: usize = 16;

// ── Session ─────────────────────────────────────────────────────────

/// Standard-Port des Relay-Servers (überschreibbar per `PORT`).
pub const DEFAULT_RELAY_PORT: u16 = 3000;
/// Glättungsfaktor für empfangene Geschwindigkeiten entfernter Objekte.
pub const SPEED_SMOOTHING: f32 = 0.1;
/// Glättungsfaktor für empfangene Positionen entfernter Objekte.
pub const POSITION_SMOOTHING: f32 = 0.01;
/// Positions-Sprünge oberhalb dieser Schwelle gelten als Netzwerk-Glitch.
pub const TELEMETRY_GUARD: f32 = 0.5;
/// Intervall, in dem eigene Objekte als Telemetrie verschickt werden.
pub const TELEMETRY_INTERVAL_MS: u64 = 100;
/// Maximale Anzahl gehaltener Chat-/Log-Nachrichten.
pub const CHAT_LOG_CAPACITY: usize = 200;

/// Wer nach dem Verlust der Authority neue Authority wird.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityPolicy {
    /// Nächster verbindender Client wird Authority, falls keine existiert
    #[default]
    PromoteNextJoiner,
    /// Nur die allererste Verbindung des Prozesses wird automatisch Authority
    FirstConnectionOnly,
}

// ── Laufzeit-Optionen (serialisierbar) ─────────────────────────────

/// Alle zur Laufzeit änderbaren Studio-Optionen.
/// Wird als `trajectory_osc_studio.toml` neben der Binary gespeichert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioOptions {
    // ── OSC ─────────────────────────────────────────────────────
    /// Lokaler Port für neue UDP-Endpunkte
    pub osc_local_port: u16,
    /// Zielport für neue UDP-Endpunkte
    pub osc_remote_port: u16,
    /// Zieladresse für neue UDP-Endpunkte
    pub osc_remote_address: Ipv4Addr,
    /// Sende-Intervall aktiver Routen (ms)
    pub osc_interval_ms: u64,
    /// Offset Objekt-Index → Source-ID
    pub source_id_offset: usize,

    // ── Animation ───────────────────────────────────────────────
    /// Animations-Tick (ms)
    pub animation_tick_ms: u64,
    /// Stützstellen der Arc-Length-Tabelle
    pub arc_length_divisions: usize,
    /// Render-Punkte pro Segment
    pub render_divisions_per_segment: usize,

    // ── Session ─────────────────────────────────────────────────
    /// Port des Relay-Servers
    pub relay_port: u16,
    /// Authority-Vergabe nach Disconnect
    pub authority_policy: AuthorityPolicy,
    /// Telemetrie-Intervall (ms)
    pub telemetry_interval_ms: u64,
    /// Glättung Geschwindigkeit (0..1)
    pub speed_smoothing: f32,
    /// Glättung Position (0..1)
    pub position_smoothing: f32,
    /// Verwerfungs-Schwelle für Positions-Sprünge
    pub telemetry_guard: f32,
    /// Kapazität des Chat-/Log-Puffers
    pub chat_log_capacity: usize,
}

impl Default for StudioOptions {
    fn default() -> Self {
        Self {
            osc_local_port: DEFAULT_OSC_LOCAL_PORT,
            osc_remote_port: DEFAULT_OSC_REMOTE_PORT,
            osc_remote_address: DEFAULT_OSC_REMOTE_ADDRESS,
            osc_interval_ms: OSC_INTERVAL_MS,
            source_id_offset: SOURCE_ID_OFFSET,

            animation_tick_ms: ANIMATION_TICK_MS,
            arc_length_divisions: ARC_LENGTH_DIVISIONS,
            render_divisions_per_segment: RENDER_DIVISIONS_PER_SEGMENT,

            relay_port: DEFAULT_RELAY_PORT,
            authority_policy: AuthorityPolicy::default(),
            telemetry_interval_ms: TELEMETRY_INTERVAL_MS,
            speed_smoothing: SPEED_SMOOTHING,
            position_smoothing: POSITION_SMOOTHING,
            telemetry_guard: TELEMETRY_GUARD,
            chat_log_capacity: CHAT_LOG_CAPACITY,
        }
    }
}

impl StudioOptions {
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    pub fn config_path() -> std::path::PathBuf {
        std::env::current_exe()
            .unwrap_or_else(|_| std::path::PathBuf::from("trajectory_osc_studio"))
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join("trajectory_osc_studio.toml")
    }

    /// Abtast-Einstellungen für die Engine.
    pub fn sampling_settings(&self) -> SamplingSettings {
        SamplingSettings {
            arc_length_divisions: self.arc_length_divisions.max(1),
            render_divisions_per_segment: self.render_divisions_per_segment.max(1),
        }
    }

    pub fn osc_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.osc_interval_ms.max(1))
    }

    pub fn animation_tick(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.animation_tick_ms.max(1))
    }

    pub fn telemetry_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.telemetry_interval_ms.max(1))
    }
}
