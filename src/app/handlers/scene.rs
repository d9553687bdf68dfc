//! Handler für Kurven-, Objekt- und Szenen-Edits.

use crate::app::AppState;
use crate::session::ClientMessage;
use trajectory_engine::{SceneSnapshot, SceneUpdate};

/// Wendet einen lokalen Edit an und gibt ihn an die Session weiter.
/// Entfernte Edits laufen über `session::apply_server_message` und werden
/// nicht erneut verschickt.
pub fn apply_edit(state: &mut AppState, update: SceneUpdate) -> anyhow::Result<()> {
    state.scene.apply(&update)?;
    log::debug!("Lokaler Edit: {:?}", update);

    match serde_json::to_value(&update) {
        Ok(payload) => state.publish(ClientMessage::UpdateScene(payload)),
        Err(e) => log::error!("Edit nicht serialisierbar: {}", e),
    }
    Ok(())
}

/// Setzt die Kurvenauswahl; ungültige Indizes heben die Auswahl auf.
pub fn select_curve(state: &mut AppState, curve_index: Option<usize>) {
    state.selected_curve = curve_index.filter(|&i| i < state.scene.curves.len());
}

/// Ersetzt die Szene und verteilt sie als `replaceScene`. Online nur als
/// Authority, sonst würde der Stand beim nächsten Joiner-Snapshot wieder
/// überschrieben.
pub fn load(state: &mut AppState, snapshot: SceneSnapshot) -> anyhow::Result<()> {
    if state.session.is_connected() && !state.session.is_authority() {
        anyhow::bail!("Szene laden ist nur für die Authority möglich");
    }
    apply_edit(state, SceneUpdate::ReplaceScene { scene: snapshot })?;
    reset_view(state);
    Ok(())
}

pub fn clear(state: &mut AppState) -> anyhow::Result<()> {
    apply_edit(state, SceneUpdate::ClearScene)?;
    reset_view(state);
    log::info!("Szene geleert");
    Ok(())
}

fn reset_view(state: &mut AppState) {
    state.selected_curve = None;
    state.last_frame = Default::default();
}
