//! Handler für Relay-Nachrichten, Latenz, Chat, Authority und Optionen.

use crate::app::AppState;
use crate::session::{ClientMessage, ServerMessage, SmoothingParams};
use crate::shared::StudioOptions;
use trajectory_engine::Scene;

/// Leitet eine Relay-Nachricht an den Session-Kontext weiter.
pub fn apply_server_message(state: &mut AppState, message: ServerMessage) {
    let welcome = matches!(message, ServerMessage::Welcome { .. });
    let now_ms = state.now_ms();
    let replies = state.session.handle(&mut state.scene, message, now_ms);
    state.outbox.extend(replies);

    // Offline gestartete Routen beim Relay anmelden
    if welcome {
        let live: Vec<usize> = state
            .routes
            .iter()
            .filter(|(_, route)| route.enabled)
            .map(|(id, _)| id)
            .collect();
        for route_id in live {
            state.publish(ClientMessage::StartSendOsc { route_id });
        }
    }
}

pub fn reset(state: &mut AppState) {
    state.session.reset();
    state.outbox.clear();
    log::info!("Verbindung zum Relay verloren");
}

pub fn send_ping(state: &mut AppState) {
    let sent_at_ms = state.now_ms();
    state.publish(ClientMessage::PingCheck { sent_at_ms });
}

pub fn send_chat(state: &mut AppState, text: String) {
    state.publish(ClientMessage::Message { text });
}

pub fn claim_authority(state: &mut AppState) {
    if state.session.is_authority() {
        return;
    }
    state.publish(ClientMessage::ClaimAuthority);
}

/// Übernimmt neue Optionen. Abtastung und Routen-Intervall greifen sofort.
pub fn apply_options(state: &mut AppState, options: StudioOptions) -> anyhow::Result<()> {
    let sampling = options.sampling_settings();
    if sampling != *state.scene.curves.settings() {
        let snapshot = state.scene.snapshot();
        state.scene = Scene::from_snapshot(snapshot, sampling)?;
    }
    state.routes.set_interval(options.osc_interval());
    state
        .session
        .set_smoothing(SmoothingParams::from_options(&options));
    state.options = options;
    log::info!("Optionen übernommen");
    Ok(())
}
