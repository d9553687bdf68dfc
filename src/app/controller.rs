//! Application Controller für zentrale Event-Verarbeitung.

use super::{AppCommand, AppIntent, AppState};
use crate::osc::build_messages;
use crate::session::ClientMessage;
use std::time::Instant;
use trajectory_engine::FrameSnapshot;

/// Orchestriert UI-Events, periodische Ticks und Use-Cases auf den AppState.
#[derive(Default)]
pub struct AppController;

impl AppController {
    /// Erstellt einen neuen Controller.
    pub fn new() -> Self {
        Self
    }

    /// Verarbeitet einen Intent über Intent->Command Mapping.
    pub fn handle_intent(&mut self, state: &mut AppState, intent: AppIntent) -> anyhow::Result<()> {
        let commands = self.map_intent_to_commands(state, intent);
        for command in commands {
            self.handle_command(state, command)?;
        }

        Ok(())
    }

    fn map_intent_to_commands(&self, state: &AppState, intent: AppIntent) -> Vec<AppCommand> {
        super::intent_mapping::map_intent_to_commands(state, intent)
    }

    /// Führt mutierende Commands auf dem AppState aus.
    /// Dispatcht an Feature-Handler in `handlers/`.
    pub fn handle_command(
        &mut self,
        state: &mut AppState,
        command: AppCommand,
    ) -> anyhow::Result<()> {
        state.command_log.record(&command);
        use super::handlers;

        match command {
            // === Szene ===
            AppCommand::ApplySceneEdit { update } => handlers::scene::apply_edit(state, update)?,
            AppCommand::SelectCurve { curve_index } => {
                handlers::scene::select_curve(state, curve_index)
            }
            AppCommand::LoadScene { snapshot } => handlers::scene::load(state, snapshot)?,
            AppCommand::ClearScene => handlers::scene::clear(state)?,

            // === UDP & OSC ===
            AppCommand::AddUdpPort {
                local_port,
                remote_port,
                remote_address,
            } => handlers::osc::add_udp_port(state, &local_port, &remote_port, &remote_address)?,
            AppCommand::RemoveUdpPort {
                local_port,
                remote_port,
            } => handlers::osc::remove_udp_port(state, local_port, remote_port),
            AppCommand::AddRoute => {
                handlers::osc::add_route(state);
            }
            AppCommand::RemoveRoute { route_id } => handlers::osc::remove_route(state, route_id)?,
            AppCommand::SetRoutePort {
                route_id,
                port_index,
            } => handlers::osc::set_port(state, route_id, port_index)?,
            AppCommand::SetRouteAddress { route_id, address } => {
                handlers::osc::set_address(state, route_id, &address)?
            }
            AppCommand::SetRouteScale {
                route_id,
                axis,
                expr,
            } => handlers::osc::set_scale(state, route_id, axis, &expr)?,
            AppCommand::SetRouteSource {
                route_id,
                axis,
                source,
            } => handlers::osc::set_source(state, route_id, axis, &source)?,
            AppCommand::EnableRoute { route_id } => handlers::osc::enable_route(state, route_id)?,
            AppCommand::DisableRoute { route_id } => handlers::osc::disable_route(state, route_id),

            // === Session ===
            AppCommand::ApplyServerMessage { message } => {
                handlers::session::apply_server_message(state, message)
            }
            AppCommand::ResetSession => handlers::session::reset(state),
            AppCommand::SendPing => handlers::session::send_ping(state),
            AppCommand::SendChat { text } => handlers::session::send_chat(state, text),
            AppCommand::ClaimAuthority => handlers::session::claim_authority(state),

            // === Optionen ===
            AppCommand::ApplyOptions { options } => {
                handlers::session::apply_options(state, *options)?
            }
        }

        Ok(())
    }

    /// Ein Animations-Frame: dirty Kurven neu aufbauen, eigene Objekte und
    /// Spiegel bewegen. Das Ergebnis ist die Quelle der OSC-Pipeline.
    pub fn tick_animation<'a>(&mut self, state: &'a mut AppState, step: f32) -> &'a FrameSnapshot {
        state.last_frame = state.scene.tick(step);
        state.session.tick_mirrors(&state.scene.curves, step);
        &state.last_frame
    }

    /// Baut für jede fällige Route die Nachrichten aus dem letzten Frame.
    /// Blockiert nie auf die Animation; liefert die Zahl der Nachrichten.
    pub fn tick_osc(&mut self, state: &mut AppState, now: Instant) -> usize {
        let offset = state.options.source_id_offset;
        let mut count = 0;
        for route_id in state.routes.due(now) {
            let Some(route) = state.routes.get(route_id) else {
                continue;
            };
            let messages = build_messages(route, &state.last_frame.objects, offset);
            if messages.is_empty() {
                continue;
            }
            count += messages.len();
            let port_index = route.port_index;
            state.publish(ClientMessage::SendOsc {
                route_id,
                port_index,
                messages,
            });
        }
        count
    }

    /// Veröffentlicht Telemetrie eigener Objekte im Telemetrie-Intervall.
    pub fn tick_telemetry(&mut self, state: &mut AppState, now: Instant) {
        let interval = state.options.telemetry_interval();
        if state
            .last_telemetry
            .is_some_and(|last| now.saturating_duration_since(last) < interval)
        {
            return;
        }
        state.last_telemetry = Some(now);
        let messages = state.session.telemetry(&state.scene);
        for message in messages {
            state.publish(message);
        }
    }
}
