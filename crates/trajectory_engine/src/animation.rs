//! Animations-Engine: bewegt Objekte entlang ihrer Kurven.
//!
//! Pro Tick wird die normierte Position jedes animierten Objekts um
//! `speed / arc_length * direction` weitergeschoben. `looping` bestimmt das
//! Verhalten an den Rändern: Wrap-around oder Abprallen mit Vorzeichenwechsel.

use crate::curve_set::CurveSet;
use crate::slot_map::SlotMap;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Laufrichtung entlang der Kurve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Vorwärts (Faktor +1)
    #[default]
    Ltr,
    /// Rückwärts (Faktor −1)
    Rtl,
}

impl Direction {
    pub fn sign(self) -> f32 {
        match self {
            Direction::Ltr => 1.0,
            Direction::Rtl => -1.0,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Direction::Ltr => Direction::Rtl,
            Direction::Rtl => Direction::Ltr,
        }
    }
}

/// Animiertes Objekt (auch für Trigger verwendet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimatedObject {
    /// Index der Kurve; darf nach Kurven-Löschung ins Leere zeigen
    pub trajectory_index: usize,
    /// Normierte Position auf der Kurve, [0, 1)
    pub position: f32,
    /// Geschwindigkeit in Welteinheiten pro Tick; Vorzeichen = Laufrichtung
    pub speed: f32,
    /// Wrap-around statt Abprallen
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Eingefroren (false) oder in Bewegung (true)
    pub animate: bool,
    pub direction: Direction,
}

impl AnimatedObject {
    /// Standard-Geschwindigkeit neuer Objekte (Welteinheiten pro Tick).
    pub const DEFAULT_SPEED: f32 = 0.05;

    /// Erstellt ein ruhendes Objekt am Kurvenanfang.
    pub fn new(trajectory_index: usize) -> Self {
        Self {
            trajectory_index,
            position: 0.0,
            speed: Self::DEFAULT_SPEED,
            looping: true,
            animate: false,
            direction: Direction::Ltr,
        }
    }

    /// Trigger: immer vorwärts, immer im Loop.
    pub fn trigger(trajectory_index: usize) -> Self {
        Self {
            animate: true,
            ..Self::new(trajectory_index)
        }
    }

    /// Position und Geschwindigkeit sind endliche Zahlen.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.speed.is_finite()
    }

    /// Schiebt die Position um einen Tick weiter.
    ///
    /// `step` skaliert den Tick (1.0 = ein Referenz-Frame). Kurven ohne
    /// messbare Länge bewegen nichts.
    pub fn advance(&mut self, arc_length: f32, step: f32) {
        if !self.animate || arc_length <= f32::EPSILON || !self.position.is_finite() {
            return;
        }

        self.position += self.speed / arc_length * self.direction.sign() * step;

        if self.looping {
            self.position = wrap_unit(self.position);
        } else if self.position > 1.0 {
            self.position = 1.0;
            self.speed = -self.speed;
        } else if self.position < 0.0 {
            self.position = 0.0;
            self.speed = -self.speed;
        }
    }

    /// Kurvenparameter für die Abtastung: `|position|`, oberhalb von 1 modulo 1.
    ///
    /// Exakt 1.0 (Abprall-Grenze) bleibt am Kurvenende statt auf den Anfang zu springen.
    pub fn sample_parameter(&self) -> f32 {
        let p = self.position.abs();
        if p > 1.0 { p % 1.0 } else { p }
    }
}

/// Bringt einen Wert in [0, 1): Modulo, negative Ergebnisse +1.
pub fn wrap_unit(value: f32) -> f32 {
    let mut wrapped = value % 1.0;
    if wrapped < 0.0 {
        wrapped += 1.0;
    }
    // -ε + 1.0 kann in f32 exakt 1.0 ergeben
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// Positionen aller Slots nach einem Tick; Löcher und verwaiste Objekte sind `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionSnapshot {
    positions: Vec<Option<Vec3>>,
}

impl PositionSnapshot {
    pub fn new(positions: Vec<Option<Vec3>>) -> Self {
        Self { positions }
    }

    pub fn get(&self, index: usize) -> Option<Vec3> {
        self.positions.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn as_slice(&self) -> &[Option<Vec3>] {
        &self.positions
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<Vec3>)> + '_ {
        self.positions.iter().copied().enumerate()
    }
}

/// Ein Animations-Tick über alle Slots.
///
/// Verwaiste Objekte (Kurve gelöscht) werden für diesen Tick übersprungen
/// und liefern `None`; es wird nie abgebrochen.
pub fn tick(objects: &mut SlotMap<AnimatedObject>, curves: &CurveSet, step: f32) -> PositionSnapshot {
    let mut positions = vec![None; objects.slot_count()];
    for (index, object) in objects.iter_mut() {
        let Some(arc_length) = curves.arc_length(object.trajectory_index) else {
            log::debug!(
                "Objekt {} verweist auf fehlende Kurve {}, übersprungen",
                index,
                object.trajectory_index
            );
            continue;
        };
        object.advance(arc_length, step);
        positions[index] = curves.sample(object.trajectory_index, object.sample_parameter());
    }
    PositionSnapshot::new(positions)
}

/// Positionen ohne Bewegung (z.B. für eingefrorene Frames oder Mirror-Rendering).
pub fn sample_positions(objects: &SlotMap<AnimatedObject>, curves: &CurveSet) -> PositionSnapshot {
    let mut positions = vec![None; objects.slot_count()];
    for (index, object) in objects.iter() {
        positions[index] = curves.sample(object.trajectory_index, object.sample_parameter());
    }
    PositionSnapshot::new(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::SamplingSettings;

    fn straight_curves(length: f32) -> CurveSet {
        let mut set = CurveSet::new(SamplingSettings::default());
        set.add_curve(vec![Vec3::ZERO, Vec3::new(length, 0.0, 0.0)], false)
            .expect("Kurve");
        set.refresh();
        set
    }

    fn moving(speed: f32, looping: bool) -> AnimatedObject {
        AnimatedObject {
            speed,
            looping,
            animate: true,
            ..AnimatedObject::new(0)
        }
    }

    #[test]
    fn test_wrap_unit_range() {
        assert_eq!(wrap_unit(0.25), 0.25);
        assert!((wrap_unit(1.25) - 0.25).abs() < 1e-6);
        assert!((wrap_unit(-0.25) - 0.75).abs() < 1e-6);
        assert_eq!(wrap_unit(-f32::EPSILON * 0.1), 0.0);
        assert_eq!(wrap_unit(1.0), 0.0);
    }

    #[test]
    fn test_loop_stays_in_unit_interval() {
        let mut obj = moving(3.7, true);
        for _ in 0..10_000 {
            obj.advance(10.0, 1.0);
            assert!((0.0..1.0).contains(&obj.position), "position {}", obj.position);
        }
        let mut backwards = moving(-2.3, true);
        backwards.direction = Direction::Rtl;
        for _ in 0..10_000 {
            backwards.advance(10.0, 1.0);
            assert!((0.0..1.0).contains(&backwards.position));
        }
    }

    #[test]
    fn test_bounce_flips_speed_once_per_crossing() {
        let mut obj = moving(3.0, false);
        let mut flips = 0;
        let mut last_sign = obj.speed.signum();
        for _ in 0..100 {
            obj.advance(10.0, 1.0);
            assert!((0.0..=1.0).contains(&obj.position));
            if obj.speed.signum() != last_sign {
                flips += 1;
                last_sign = obj.speed.signum();
            }
        }
        // 0.3 pro Tick: Grenze bei Tick 4, 8, 11, ... → mehrere Abpraller, jeweils genau ein Flip
        assert!(flips >= 10);
        assert_eq!(obj.speed.abs(), 3.0);
    }

    #[test]
    fn test_bounce_clamps_to_crossed_boundary() {
        let mut obj = moving(4.0, false);
        obj.position = 0.9;
        obj.advance(10.0, 1.0);
        assert_eq!(obj.position, 1.0);
        assert_eq!(obj.speed, -4.0);

        obj.position = 0.1;
        obj.advance(10.0, 1.0);
        assert_eq!(obj.position, 0.0);
        assert_eq!(obj.speed, 4.0);
    }

    #[test]
    fn test_direction_rtl_inverts_movement() {
        let mut obj = moving(1.0, true);
        obj.position = 0.5;
        obj.direction = Direction::Rtl;
        obj.advance(10.0, 1.0);
        assert!((obj.position - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_frozen_object_does_not_move() {
        let mut obj = AnimatedObject::new(0);
        obj.position = 0.3;
        obj.advance(10.0, 1.0);
        assert_eq!(obj.position, 0.3);
    }

    #[test]
    fn test_sample_parameter_abs_mod() {
        let mut obj = AnimatedObject::new(0);
        obj.position = -0.2;
        assert!((obj.sample_parameter() - 0.2).abs() < 1e-6);
        obj.position = 1.0;
        assert_eq!(obj.sample_parameter(), 1.0);
        obj.position = 1.5;
        assert!((obj.sample_parameter() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_tick_preserves_holes_and_skips_dangling() {
        let curves = straight_curves(10.0);
        let mut objects = SlotMap::new();
        objects.insert(moving(1.0, true));
        objects.insert(moving(1.0, true));
        objects.insert(AnimatedObject {
            trajectory_index: 5,
            ..moving(1.0, true)
        });
        objects.remove(1);

        let snapshot = tick(&mut objects, &curves, 1.0);
        assert_eq!(snapshot.len(), 3);
        let first = snapshot.get(0).expect("Objekt 0");
        assert!((first.x - 1.0).abs() < 1e-2);
        assert!(snapshot.get(1).is_none(), "Loch bleibt None");
        assert!(snapshot.get(2).is_none(), "Verwaistes Objekt liefert None");
        // Verwaistes Objekt wurde nicht bewegt
        assert_eq!(objects.get(2).map(|o| o.position), Some(0.0));
    }

    #[test]
    fn test_serde_uses_wire_field_names() {
        let json = serde_json::to_value(AnimatedObject::new(2)).expect("Serialisierung");
        assert_eq!(json["trajectoryIndex"], 2);
        assert_eq!(json["loop"], true);
        assert_eq!(json["direction"], "ltr");
    }
}
