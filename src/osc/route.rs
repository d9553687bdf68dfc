//! OSC-Routen und ihr Sende-Zeitplan.
//!
//! Eine Route verweist per Index auf einen UDP-Endpunkt (Auflösung erst beim
//! Senden), trägt ein Adress-Template sowie pro Achse Skalierung und Quelle.
//! Die `OscRouteTable` hält zusätzlich pro Route den nächsten Sende-Zeitpunkt;
//! Deaktivieren löscht ihn sofort.

use super::address::AddressTemplate;
use super::scale::ScaleExpr;
use crate::shared::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use trajectory_engine::SlotMap;

/// Koordinatenachse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn component(self, value: glam::Vec3) -> f32 {
        value[self.index()]
    }

    fn all_label(self) -> &'static str {
        match self {
            Axis::X => "allX",
            Axis::Y => "allY",
            Axis::Z => "allZ",
        }
    }
}

/// Quelle einer Achse: alle Objekte (Broadcast) oder ein bestimmtes Objekt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "AxisSourceRepr", into = "AxisSourceRepr")]
pub enum AxisSource {
    #[default]
    All,
    Object(usize),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AxisSourceRepr {
    Index(usize),
    Name(String),
}

impl AxisSource {
    /// Parst `allX`/`allY`/`allZ`/`all` oder einen Objekt-Index.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        match trimmed {
            "all" | "allX" | "allY" | "allZ" => Ok(AxisSource::All),
            _ => trimmed
                .parse::<usize>()
                .map(AxisSource::Object)
                .map_err(|_| ValidationError::InvalidAxisSource(trimmed.to_string())),
        }
    }

    /// Anzeige-Text für eine bestimmte Achse (`allY` statt `all`).
    pub fn label(self, axis: Axis) -> String {
        match self {
            AxisSource::All => axis.all_label().to_string(),
            AxisSource::Object(index) => index.to_string(),
        }
    }
}

impl TryFrom<AxisSourceRepr> for AxisSource {
    type Error = ValidationError;

    fn try_from(repr: AxisSourceRepr) -> Result<Self, Self::Error> {
        match repr {
            AxisSourceRepr::Index(index) => Ok(AxisSource::Object(index)),
            AxisSourceRepr::Name(name) => AxisSource::parse(&name),
        }
    }
}

impl From<AxisSource> for AxisSourceRepr {
    fn from(source: AxisSource) -> Self {
        match source {
            AxisSource::All => AxisSourceRepr::Name("all".to_string()),
            AxisSource::Object(index) => AxisSourceRepr::Index(index),
        }
    }
}

impl fmt::Display for AxisSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisSource::All => f.write_str("all"),
            AxisSource::Object(index) => write!(f, "{}", index),
        }
    }
}

/// Konfiguration einer Route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OscRoute {
    /// Index in die Endpunkt-Liste, erst beim Senden aufgelöst
    #[serde(default)]
    pub port_index: usize,
    #[serde(default)]
    pub address: AddressTemplate,
    #[serde(default)]
    pub scale: [ScaleExpr; 3],
    #[serde(default)]
    pub sources: [AxisSource; 3],
    #[serde(default)]
    pub enabled: bool,
}

impl Default for OscRoute {
    fn default() -> Self {
        Self {
            port_index: 0,
            address: AddressTemplate::default(),
            scale: [ScaleExpr::IDENTITY; 3],
            sources: [AxisSource::All; 3],
            enabled: false,
        }
    }
}

impl OscRoute {
    /// Alle drei Achsen auf `all*` → eine Nachricht pro Objekt.
    pub fn is_broadcast(&self) -> bool {
        self.sources.iter().all(|s| *s == AxisSource::All)
    }
}

#[derive(Debug, Clone)]
struct RouteEntry {
    route: OscRoute,
    next_due: Option<Instant>,
}

/// Routen mit stabilen IDs (Slot-Map) und festem Sende-Intervall.
#[derive(Debug, Clone)]
pub struct OscRouteTable {
    entries: SlotMap<RouteEntry>,
    interval: Duration,
}

impl OscRouteTable {
    pub fn new(interval: Duration) -> Self {
        Self {
            entries: SlotMap::new(),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Neues Intervall; gilt ab dem nächsten Takt jeder Route.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Fügt eine Route hinzu. Bereits aktivierte Routen feuern ab `now`.
    pub fn add(&mut self, route: OscRoute, now: Instant) -> usize {
        let next_due = route.enabled.then_some(now);
        let id = self.entries.insert(RouteEntry { route, next_due });
        log::info!("OSC-Route {} angelegt", id);
        id
    }

    /// Entfernt eine Route; ihr Timer verschwindet mit ihr.
    pub fn remove(&mut self, id: usize) -> Result<OscRoute, ValidationError> {
        let entry = self
            .entries
            .remove(id)
            .ok_or(ValidationError::UnknownRoute(id))?;
        log::info!("OSC-Route {} entfernt", id);
        Ok(entry.route)
    }

    pub fn get(&self, id: usize) -> Option<&OscRoute> {
        self.entries.get(id).map(|e| &e.route)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &OscRoute)> + '_ {
        self.entries.iter().map(|(id, e)| (id, &e.route))
    }

    fn entry_mut(&mut self, id: usize) -> Result<&mut RouteEntry, ValidationError> {
        self.entries
            .get_mut(id)
            .ok_or(ValidationError::UnknownRoute(id))
    }

    /// Startet den Sender. Erneutes Aktivieren verschiebt den Takt nicht.
    pub fn enable(&mut self, id: usize, now: Instant) -> Result<bool, ValidationError> {
        let entry = self.entry_mut(id)?;
        if entry.route.enabled && entry.next_due.is_some() {
            return Ok(false);
        }
        entry.route.enabled = true;
        entry.next_due = Some(now);
        log::info!("OSC-Route {} gestartet", id);
        Ok(true)
    }

    /// Stoppt den Sender; nach Rückkehr wird diese Route nie mehr fällig.
    /// Auch für nie aktivierte Routen zulässig.
    pub fn disable(&mut self, id: usize) -> Result<bool, ValidationError> {
        let entry = self.entry_mut(id)?;
        let was_enabled = entry.route.enabled;
        entry.route.enabled = false;
        entry.next_due = None;
        if was_enabled {
            log::info!("OSC-Route {} gestoppt", id);
        }
        Ok(was_enabled)
    }

    pub fn is_enabled(&self, id: usize) -> bool {
        self.entries.get(id).is_some_and(|e| e.route.enabled)
    }

    /// Stoppt alle Routen (z.B. beim Schließen der Endpunkte).
    pub fn disable_all(&mut self) {
        for (_, entry) in self.entries.iter_mut() {
            entry.route.enabled = false;
            entry.next_due = None;
        }
    }

    pub fn set_port_index(&mut self, id: usize, port_index: usize) -> Result<(), ValidationError> {
        self.entry_mut(id)?.route.port_index = port_index;
        Ok(())
    }

    pub fn set_address(&mut self, id: usize, address: &str) -> Result<(), ValidationError> {
        let address = AddressTemplate::parse(address)?;
        self.entry_mut(id)?.route.address = address;
        Ok(())
    }

    pub fn set_scale(&mut self, id: usize, axis: Axis, expr: &str) -> Result<(), ValidationError> {
        let expr = ScaleExpr::parse(expr)?;
        self.entry_mut(id)?.route.scale[axis.index()] = expr;
        Ok(())
    }

    pub fn set_source(&mut self, id: usize, axis: Axis, source: &str) -> Result<(), ValidationError> {
        let source = AxisSource::parse(source)?;
        self.entry_mut(id)?.route.sources[axis.index()] = source;
        Ok(())
    }

    /// Liefert alle fälligen Routen und plant sie neu.
    ///
    /// Verpasste Takte werden übersprungen statt nachgeholt.
    pub fn due(&mut self, now: Instant) -> Vec<usize> {
        let interval = self.interval;
        let mut due = Vec::new();
        for (id, entry) in self.entries.iter_mut() {
            let Some(next) = entry.next_due else {
                continue;
            };
            if next > now {
                continue;
            }
            let mut following = next + interval;
            if following <= now {
                following = now + interval;
            }
            entry.next_due = Some(following);
            due.push(id);
        }
        due
    }

    /// Frühester anstehender Sende-Zeitpunkt über alle aktiven Routen.
    pub fn next_due(&self) -> Option<Instant> {
        self.entries.iter().filter_map(|(_, e)| e.next_due).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(20);

    #[test]
    fn test_axis_source_parse_and_serde() {
        assert_eq!(AxisSource::parse("allY"), Ok(AxisSource::All));
        assert_eq!(AxisSource::parse(" 4 "), Ok(AxisSource::Object(4)));
        assert!(AxisSource::parse("-1").is_err());
        assert!(AxisSource::parse("allW").is_err());
        assert_eq!(AxisSource::All.label(Axis::Z), "allZ");

        let json = serde_json::to_string(&[AxisSource::All, AxisSource::Object(2)]).expect("JSON");
        assert_eq!(json, r#"["all",2]"#);
        let back: Vec<AxisSource> = serde_json::from_str(r#"["allX",7]"#).expect("JSON");
        assert_eq!(back, vec![AxisSource::All, AxisSource::Object(7)]);
    }

    #[test]
    fn test_enable_is_idempotent() {
        let start = Instant::now();
        let mut table = OscRouteTable::new(TICK);
        let id = table.add(OscRoute::default(), start);
        assert_eq!(table.next_due(), None);

        assert_eq!(table.enable(id, start), Ok(true));
        assert_eq!(table.due(start), vec![id]);
        // Zweites Enable darf den Takt nicht zurücksetzen
        assert_eq!(table.enable(id, start + Duration::from_millis(5)), Ok(false));
        assert_eq!(table.next_due(), Some(start + TICK));
    }

    #[test]
    fn test_disable_cancels_and_is_idempotent() {
        let start = Instant::now();
        let mut table = OscRouteTable::new(TICK);
        let id = table.add(OscRoute::default(), start);

        // Nie aktiviert: trotzdem zulässig
        assert_eq!(table.disable(id), Ok(false));

        table.enable(id, start).expect("enable");
        assert_eq!(table.disable(id), Ok(true));
        assert_eq!(table.disable(id), Ok(false));
        assert!(table.due(start + TICK * 10).is_empty());
        assert_eq!(table.next_due(), None);
        assert_eq!(table.disable(99), Err(ValidationError::UnknownRoute(99)));
    }

    #[test]
    fn test_due_runs_on_fixed_interval_and_skips_missed() {
        let start = Instant::now();
        let mut table = OscRouteTable::new(TICK);
        let id = table.add(
            OscRoute {
                enabled: true,
                ..OscRoute::default()
            },
            start,
        );

        assert_eq!(table.due(start), vec![id]);
        assert!(table.due(start + Duration::from_millis(19)).is_empty());
        assert_eq!(table.due(start + TICK), vec![id]);

        // Lange Pause: genau ein Takt, danach wieder im Raster ab jetzt
        let late = start + Duration::from_millis(200);
        assert_eq!(table.due(late), vec![id]);
        assert_eq!(table.next_due(), Some(late + TICK));
    }

    #[test]
    fn test_setters_validate_before_mutating() {
        let mut table = OscRouteTable::new(TICK);
        let id = table.add(OscRoute::default(), Instant::now());

        assert!(table.set_scale(id, Axis::Y, "/0").is_err());
        assert!(table.get(id).is_some_and(|r| r.scale[1].is_identity()));

        table.set_scale(id, Axis::Y, "*2").expect("Skalierung");
        table.set_source(id, Axis::X, "3").expect("Quelle");
        table.set_address(id, "/obj/{id}").expect("Adresse");
        let route = table.get(id).expect("Route");
        assert_eq!(route.sources[0], AxisSource::Object(3));
        assert!(!route.is_broadcast());
        assert_eq!(route.address.render(4), "/obj/4");
    }

    #[test]
    fn test_removed_route_keeps_other_ids() {
        let now = Instant::now();
        let mut table = OscRouteTable::new(TICK);
        let first = table.add(OscRoute::default(), now);
        let second = table.add(OscRoute::default(), now);
        table.remove(first).expect("Entfernen");
        assert!(table.get(second).is_some());
        assert_eq!(table.len(), 1);
        assert!(table.remove(first).is_err());
    }
}
