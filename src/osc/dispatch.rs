//! Positions-Snapshot → OSC-Nachrichten einer Route.
//!
//! Broadcast (alle Achsen `all*`): eine Nachricht pro Objekt, Objekte exakt
//! im Ursprung (Löcher, nicht initialisiert) werden ausgelassen.
//! Composite: genau eine Nachricht, jede Achse aus ihrem eigenen Objekt.
//! Nicht definierte Achsen fehlen in der Argumentliste.

use super::message::OscOutgoing;
use super::route::{Axis, AxisSource, OscRoute};
use super::OscSink;
use glam::Vec3;
use trajectory_engine::PositionSnapshot;

/// Baut alle Nachrichten einer Route aus dem aktuellen Snapshot.
pub fn build_messages(route: &OscRoute, snapshot: &PositionSnapshot, source_id_offset: usize) -> Vec<OscOutgoing> {
    if route.is_broadcast() {
        build_broadcast(route, snapshot, source_id_offset)
    } else {
        build_composite(route, snapshot, source_id_offset)
            .into_iter()
            .collect()
    }
}

fn build_broadcast(route: &OscRoute, snapshot: &PositionSnapshot, source_id_offset: usize) -> Vec<OscOutgoing> {
    snapshot
        .iter()
        .filter_map(|(index, position)| {
            let position = position.filter(|p| *p != Vec3::ZERO)?;
            let args = Axis::ALL
                .iter()
                .map(|axis| route.scale[axis.index()].apply(axis.component(position)))
                .collect();
            Some(OscOutgoing::new(route.address.render(index + source_id_offset), args))
        })
        .collect()
}

fn build_composite(route: &OscRoute, snapshot: &PositionSnapshot, source_id_offset: usize) -> Option<OscOutgoing> {
    // ID der Adresse: erste explizite Quelle in Achsen-Reihenfolge
    let id_source = route.sources.iter().find_map(|s| match s {
        AxisSource::Object(index) => Some(*index),
        AxisSource::All => None,
    })?;

    let args: Vec<f32> = Axis::ALL
        .iter()
        .filter_map(|axis| {
            let AxisSource::Object(index) = route.sources[axis.index()] else {
                return None;
            };
            let position = snapshot.get(index)?;
            Some(route.scale[axis.index()].apply(axis.component(position)))
        })
        .collect();

    if args.is_empty() {
        return None;
    }
    Some(OscOutgoing::new(route.address.render(id_source + source_id_offset), args))
}

/// Baut die Nachrichten und sendet sie über den Endpunkt an `route.port_index`.
///
/// Der Endpunkt wird erst jetzt aufgelöst; fehlt er, wird nichts gesendet.
/// Liefert die Anzahl versendeter Pakete.
pub fn dispatch_route<S: OscSink + ?Sized>(
    route: &OscRoute,
    snapshot: &PositionSnapshot,
    source_id_offset: usize,
    sink: &mut S,
) -> usize {
    let Some(target) = sink.endpoint(route.port_index) else {
        log::debug!("Route zeigt auf fehlenden UDP-Port {}, übersprungen", route.port_index);
        return 0;
    };
    build_messages(route, snapshot, source_id_offset)
        .iter()
        .map(|message| sink.send(message, target.remote_port, target.remote_address))
        .sum()
}
