//! Einzelne Kurve: Kontrollpunkte, Parameter und Arc-Length-Cache.

use crate::error::{EngineError, EngineResult};
use crate::spline::{self, DEFAULT_TENSION};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Auflösung der Arc-Length-Tabelle und der Render-Geometrie.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingSettings {
    /// Stützstellen der Arc-Length-Tabelle pro Kurve
    pub arc_length_divisions: usize,
    /// Polyline-Punkte pro Spline-Segment für den View-Layer
    pub render_divisions_per_segment: usize,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            arc_length_divisions: 200,
            render_divisions_per_segment: 16,
        }
    }
}

/// Kumulierte Bogenlängen über gleichmäßig verteilte Kurvenparameter.
///
/// `lengths[i]` ist die Länge von `t = 0` bis `t = i / (len - 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcLengthTable {
    lengths: Vec<f32>,
}

impl ArcLengthTable {
    /// Baut die Tabelle durch Abtasten der Spline auf.
    pub fn build(points: &[Vec3], closed: bool, tension: f32, divisions: usize) -> Self {
        let samples = spline::sample_uniform(points, closed, tension, divisions);
        let mut lengths = Vec::with_capacity(samples.len());
        let mut sum = 0.0f32;
        lengths.push(0.0);
        for w in samples.windows(2) {
            sum += w[0].distance(w[1]);
            lengths.push(sum);
        }
        Self { lengths }
    }

    /// Gesamtlänge der Kurve.
    pub fn total(&self) -> f32 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    /// Bildet den Bogenlängen-Anteil `u` auf den Kurvenparameter `t` ab.
    pub fn u_to_t(&self, u: f32) -> f32 {
        let count = self.lengths.len();
        let total = self.total();
        if count < 2 || total <= f32::EPSILON {
            return u.clamp(0.0, 1.0);
        }

        let target = u.clamp(0.0, 1.0) * total;
        // Erster Index mit lengths[i] >= target
        let upper = self.lengths.partition_point(|&l| l < target);
        if upper == 0 {
            return 0.0;
        }
        if upper >= count {
            return 1.0;
        }

        let lower = upper - 1;
        let seg_len = self.lengths[upper] - self.lengths[lower];
        let fraction = if seg_len > f32::EPSILON {
            (target - self.lengths[lower]) / seg_len
        } else {
            0.0
        };
        (lower as f32 + fraction) / (count - 1) as f32
    }
}

/// Gecachte Geometrie einer Kurve (nach `refresh` gültig).
#[derive(Debug, Clone, PartialEq)]
pub struct CurveGeometry {
    /// Dichte Polyline für das Rendering
    pub polyline: Vec<Vec3>,
    /// Arc-Length-Tabelle für gleichmäßige Abtastung
    pub arc_lengths: ArcLengthTable,
}

/// Catmull-Rom-Kurve mit mindestens zwei Kontrollpunkten.
#[derive(Debug, Clone)]
pub struct Curve {
    points: Vec<Vec3>,
    tension: f32,
    closed: bool,
    needs_update: bool,
    geometry: Option<CurveGeometry>,
}

impl Curve {
    /// Erstellt eine Kurve mit Standard-Tension.
    pub fn new(points: Vec<Vec3>, closed: bool) -> EngineResult<Self> {
        Self::with_tension(points, closed, DEFAULT_TENSION)
    }

    /// Erstellt eine Kurve mit expliziter Tension.
    pub fn with_tension(points: Vec<Vec3>, closed: bool, tension: f32) -> EngineResult<Self> {
        if points.len() < 2 {
            return Err(EngineError::TooFewPoints(points.len()));
        }
        validate_tension(tension)?;
        Ok(Self {
            points,
            tension,
            closed,
            needs_update: true,
            geometry: None,
        })
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn tension(&self) -> f32 {
        self.tension
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// `true` solange Geometrie/Arc-Length nach einer Mutation noch nicht neu berechnet wurden.
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Gecachte Geometrie aus dem letzten `refresh` (kann veraltet sein, siehe `needs_update`).
    pub fn geometry(&self) -> Option<&CurveGeometry> {
        self.geometry.as_ref()
    }

    pub fn set_tension(&mut self, tension: f32) -> EngineResult<()> {
        validate_tension(tension)?;
        self.tension = tension;
        self.needs_update = true;
        Ok(())
    }

    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
        self.needs_update = true;
    }

    pub(crate) fn push_point(&mut self, position: Vec3) {
        self.points.push(position);
        self.needs_update = true;
    }

    pub(crate) fn set_point(&mut self, index: usize, position: Vec3) -> bool {
        let Some(point) = self.points.get_mut(index) else {
            return false;
        };
        *point = position;
        self.needs_update = true;
        true
    }

    /// Entfernt einen Punkt. Der Aufrufer garantiert, dass danach noch ≥ 2 Punkte bleiben.
    pub(crate) fn remove_point(&mut self, index: usize) {
        debug_assert!(self.points.len() > 2);
        self.points.remove(index);
        self.needs_update = true;
    }

    /// Baut Geometrie und Arc-Length neu auf, falls die Kurve dirty ist.
    /// Gibt `true` zurück wenn neu berechnet wurde.
    pub fn refresh(&mut self, settings: &SamplingSettings) -> bool {
        if !self.needs_update && self.geometry.is_some() {
            return false;
        }
        let segments = if self.closed {
            self.points.len()
        } else {
            self.points.len() - 1
        };
        let polyline = spline::sample_uniform(
            &self.points,
            self.closed,
            self.tension,
            segments * settings.render_divisions_per_segment.max(1),
        );
        let arc_lengths = ArcLengthTable::build(
            &self.points,
            self.closed,
            self.tension,
            settings.arc_length_divisions,
        );
        self.geometry = Some(CurveGeometry {
            polyline,
            arc_lengths,
        });
        self.needs_update = false;
        true
    }

    /// Bogenlänge der Kurve. Bei veraltetem Cache wird frisch gerechnet.
    pub fn arc_length(&self, settings: &SamplingSettings) -> f32 {
        match self.fresh_table() {
            Some(table) => table.total(),
            None => self.build_table(settings).total(),
        }
    }

    /// Weltpunkt bei Bogenlängen-Anteil `u` ∈ [0, 1] (annähernd konstante Geschwindigkeit).
    pub fn sample(&self, u: f32, settings: &SamplingSettings) -> Vec3 {
        let t = match self.fresh_table() {
            Some(table) => table.u_to_t(u),
            None => self.build_table(settings).u_to_t(u),
        };
        // points.len() >= 2 ist Invariante, spline_point liefert daher immer Some
        spline::spline_point(&self.points, self.closed, self.tension, t).unwrap_or(self.points[0])
    }

    fn fresh_table(&self) -> Option<&ArcLengthTable> {
        if self.needs_update {
            return None;
        }
        self.geometry.as_ref().map(|g| &g.arc_lengths)
    }

    fn build_table(&self, settings: &SamplingSettings) -> ArcLengthTable {
        ArcLengthTable::build(
            &self.points,
            self.closed,
            self.tension,
            settings.arc_length_divisions,
        )
    }
}

fn validate_tension(tension: f32) -> EngineResult<()> {
    if (0.0..=1.0).contains(&tension) {
        Ok(())
    } else {
        Err(EngineError::TensionOutOfRange(tension))
    }
}
