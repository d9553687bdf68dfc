//! Handler für UDP-Ports und OSC-Routen.
//!
//! Eingaben werden hier validiert; Fehler gehen nur an die auslösende Aktion.

use crate::app::AppState;
use crate::osc::{Axis, OscRoute};
use crate::session::ClientMessage;
use crate::shared::{parse_ipv4, parse_port};
use std::time::Instant;

/// Fordert einen UDP-Endpunkt beim Relay an.
pub fn add_udp_port(
    state: &mut AppState,
    local_port: &str,
    remote_port: &str,
    remote_address: &str,
) -> anyhow::Result<()> {
    let local_port = parse_port(local_port)?;
    let remote_port = parse_port(remote_port)?;
    let remote_address = parse_ipv4(remote_address)?;

    if state
        .session
        .udp_ports()
        .iter()
        .any(|p| p.local_port == local_port)
    {
        log::warn!("UDP-Port {} ist bereits geöffnet", local_port);
        return Ok(());
    }
    state.publish(ClientMessage::AddUdpPort {
        local_port: i64::from(local_port),
        remote_port: i64::from(remote_port),
        remote_address: remote_address.to_string(),
    });
    Ok(())
}

pub fn remove_udp_port(state: &mut AppState, local_port: u16, remote_port: u16) {
    state.publish(ClientMessage::RemoveUdpPort {
        local_port: i64::from(local_port),
        remote_port: i64::from(remote_port),
    });
}

pub fn add_route(state: &mut AppState) -> usize {
    state.routes.add(OscRoute::default(), Instant::now())
}

pub fn remove_route(state: &mut AppState, route_id: usize) -> anyhow::Result<()> {
    state.routes.remove(route_id)?;
    Ok(())
}

pub fn set_port(state: &mut AppState, route_id: usize, port_index: usize) -> anyhow::Result<()> {
    state.routes.set_port_index(route_id, port_index)?;
    Ok(())
}

pub fn set_address(state: &mut AppState, route_id: usize, address: &str) -> anyhow::Result<()> {
    state.routes.set_address(route_id, address)?;
    Ok(())
}

pub fn set_scale(state: &mut AppState, route_id: usize, axis: Axis, expr: &str) -> anyhow::Result<()> {
    state.routes.set_scale(route_id, axis, expr)?;
    Ok(())
}

pub fn set_source(state: &mut AppState, route_id: usize, axis: Axis, source: &str) -> anyhow::Result<()> {
    state.routes.set_source(route_id, axis, source)?;
    Ok(())
}

/// Startet den Sender einer Route; mehrfaches Aktivieren ist wirkungslos.
pub fn enable_route(state: &mut AppState, route_id: usize) -> anyhow::Result<()> {
    if state.routes.enable(route_id, Instant::now())? {
        state.publish(ClientMessage::StartSendOsc { route_id });
    }
    Ok(())
}

/// Stoppt den Sender; nach Rückkehr verschickt diese Route nichts mehr.
/// Unbekannte oder nie gestartete Routen sind kein Fehler.
pub fn disable_route(state: &mut AppState, route_id: usize) {
    match state.routes.disable(route_id) {
        Ok(true) => state.publish(ClientMessage::StopSendOsc { route_id }),
        Ok(false) => {}
        Err(e) => log::debug!("{}", e),
    }
}
