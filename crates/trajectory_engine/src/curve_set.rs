//! Verwaltung aller Kurven und der globalen Kontrollpunkt-Liste.
//!
//! Kontrollpunkte werden global (über alle Kurven hinweg) indiziert, so wie
//! der View-Layer sie als ziehbare Griffe anzeigt. Jeder Griff trägt eine
//! Rückreferenz `(curve_index, point_index)` auf seine Kurve. Löschungen
//! nummerieren die betroffenen Rückreferenzen in genau einem expliziten Pass
//! um, innerhalb derselben `&mut self`-Operation wie die Löschung selbst.

use crate::curve::{Curve, CurveGeometry, SamplingSettings};
use crate::error::{EngineError, EngineResult};
use glam::Vec3;

/// Griff auf einen Kontrollpunkt (schwache Rückreferenz, kein Besitz).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlPoint {
    /// Index der besitzenden Kurve
    pub curve_index: usize,
    /// Position innerhalb der Punktliste dieser Kurve
    pub point_index: usize,
}

/// Ergebnis von `delete_control_point`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointRemoval {
    /// Nur der Punkt wurde entfernt, die Kurve bleibt bestehen
    PointRemoved { curve_index: usize },
    /// Die Kurve hatte nur noch zwei Punkte und wurde komplett gelöscht
    CurveRemoved { curve_index: usize },
}

/// Einfüge-geordnete Kurvensammlung.
#[derive(Debug, Clone, Default)]
pub struct CurveSet {
    curves: Vec<Curve>,
    control_points: Vec<ControlPoint>,
    settings: SamplingSettings,
}

impl CurveSet {
    /// Erstellt eine leere Sammlung.
    pub fn new(settings: SamplingSettings) -> Self {
        Self {
            curves: Vec::new(),
            control_points: Vec::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &SamplingSettings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Curve> {
        self.curves.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Curve> {
        self.curves.iter()
    }

    /// Alle Kontrollpunkt-Griffe in globaler Reihenfolge.
    pub fn control_points(&self) -> &[ControlPoint] {
        &self.control_points
    }

    /// Weltposition eines globalen Kontrollpunkts.
    pub fn control_point_position(&self, point: usize) -> Option<Vec3> {
        let handle = self.control_points.get(point)?;
        self.curves
            .get(handle.curve_index)?
            .points()
            .get(handle.point_index)
            .copied()
    }

    /// Legt eine neue Kurve mit Standard-Tension an.
    pub fn add_curve(&mut self, points: Vec<Vec3>, closed: bool) -> EngineResult<usize> {
        let curve = Curve::new(points, closed)?;
        Ok(self.push_curve(curve))
    }

    /// Legt eine neue Kurve mit expliziter Tension an.
    pub fn add_curve_with_tension(
        &mut self,
        points: Vec<Vec3>,
        closed: bool,
        tension: f32,
    ) -> EngineResult<usize> {
        let curve = Curve::with_tension(points, closed, tension)?;
        Ok(self.push_curve(curve))
    }

    fn push_curve(&mut self, curve: Curve) -> usize {
        let curve_index = self.curves.len();
        self.control_points
            .extend((0..curve.point_count()).map(|point_index| ControlPoint {
                curve_index,
                point_index,
            }));
        self.curves.push(curve);
        log::debug!("Kurve {} angelegt", curve_index);
        curve_index
    }

    /// Hängt einen Kontrollpunkt ans Ende einer Kurve an.
    /// Liefert den globalen Index des neuen Punkts.
    pub fn add_control_point(&mut self, curve_index: usize, position: Vec3) -> EngineResult<usize> {
        let curve = self
            .curves
            .get_mut(curve_index)
            .ok_or(EngineError::UnknownCurve(curve_index))?;
        curve.push_point(position);
        let point_index = curve.point_count() - 1;
        self.control_points.push(ControlPoint {
            curve_index,
            point_index,
        });
        Ok(self.control_points.len() - 1)
    }

    /// Verschiebt einen globalen Kontrollpunkt.
    pub fn move_control_point(&mut self, point: usize, position: Vec3) -> EngineResult<()> {
        let handle = *self
            .control_points
            .get(point)
            .ok_or(EngineError::UnknownControlPoint(point))?;
        let moved = self
            .curves
            .get_mut(handle.curve_index)
            .is_some_and(|curve| curve.set_point(handle.point_index, position));
        if moved {
            Ok(())
        } else {
            Err(EngineError::UnknownControlPoint(point))
        }
    }

    /// Löscht einen globalen Kontrollpunkt.
    ///
    /// Hat die Kurve nur noch zwei Punkte, wird die gesamte Kurve gelöscht
    /// (Invariante: jede Kurve hat ≥ 2 Punkte).
    pub fn delete_control_point(&mut self, point: usize) -> EngineResult<PointRemoval> {
        let handle = *self
            .control_points
            .get(point)
            .ok_or(EngineError::UnknownControlPoint(point))?;
        let curve = self
            .curves
            .get_mut(handle.curve_index)
            .ok_or(EngineError::UnknownCurve(handle.curve_index))?;

        if curve.point_count() <= 2 {
            self.delete_curve(handle.curve_index)?;
            return Ok(PointRemoval::CurveRemoved {
                curve_index: handle.curve_index,
            });
        }

        curve.remove_point(handle.point_index);
        self.control_points.remove(point);
        for cp in self
            .control_points
            .iter_mut()
            .filter(|cp| cp.curve_index == handle.curve_index && cp.point_index > handle.point_index)
        {
            cp.point_index -= 1;
        }
        Ok(PointRemoval::PointRemoved {
            curve_index: handle.curve_index,
        })
    }

    /// Löscht eine Kurve samt ihrer Kontrollpunkte und nummeriert
    /// alle Rückreferenzen auf spätere Kurven um −1 um.
    pub fn delete_curve(&mut self, curve_index: usize) -> EngineResult<()> {
        if curve_index >= self.curves.len() {
            return Err(EngineError::UnknownCurve(curve_index));
        }
        self.curves.remove(curve_index);
        self.control_points
            .retain(|cp| cp.curve_index != curve_index);
        for cp in self
            .control_points
            .iter_mut()
            .filter(|cp| cp.curve_index > curve_index)
        {
            cp.curve_index -= 1;
        }
        log::debug!("Kurve {} gelöscht, {} verbleibend", curve_index, self.curves.len());
        Ok(())
    }

    pub fn set_tension(&mut self, curve_index: usize, tension: f32) -> EngineResult<()> {
        self.curve_mut(curve_index)?.set_tension(tension)
    }

    pub fn set_closed(&mut self, curve_index: usize, closed: bool) -> EngineResult<()> {
        self.curve_mut(curve_index)?.set_closed(closed);
        Ok(())
    }

    fn curve_mut(&mut self, curve_index: usize) -> EngineResult<&mut Curve> {
        self.curves
            .get_mut(curve_index)
            .ok_or(EngineError::UnknownCurve(curve_index))
    }

    /// Weltpunkt bei Bogenlängen-Anteil `u`. `None` bei unbekannter Kurve.
    pub fn sample(&self, curve_index: usize, u: f32) -> Option<Vec3> {
        self.curves
            .get(curve_index)
            .map(|curve| curve.sample(u, &self.settings))
    }

    /// Bogenlänge einer Kurve. `None` bei unbekannter Kurve.
    pub fn arc_length(&self, curve_index: usize) -> Option<f32> {
        self.curves
            .get(curve_index)
            .map(|curve| curve.arc_length(&self.settings))
    }

    /// Render-Geometrie einer Kurve aus dem letzten `refresh`.
    pub fn curve_geometry(&self, curve_index: usize) -> Option<&CurveGeometry> {
        self.curves.get(curve_index)?.geometry()
    }

    /// Baut Geometrie und Arc-Length aller dirty Kurven neu auf.
    /// Wird einmal pro Animations-Tick aufgerufen. Liefert die Anzahl neu berechneter Kurven.
    pub fn refresh(&mut self) -> usize {
        let settings = self.settings;
        self.curves
            .iter_mut()
            .map(|curve| curve.refresh(&settings))
            .filter(|refreshed| *refreshed)
            .count()
    }

    pub fn clear(&mut self) {
        self.curves.clear();
        self.control_points.clear();
    }
}
