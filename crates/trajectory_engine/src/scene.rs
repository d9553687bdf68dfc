//! Szene: Kurven, animierte Objekte und Trigger als eine Einheit.
//!
//! Die Szene ist der Kontext, auf dem alle Mutationen laufen – lokal aus
//! der UI ebenso wie über das Netzwerk empfangene Edits (`SceneUpdate`).
//! `SceneSnapshot` ist der vollständige, serialisierbare Zustand für
//! Joiner-Synchronisation und Szenen-Dateien.

use crate::animation::{self, AnimatedObject, PositionSnapshot};
use crate::curve::SamplingSettings;
use crate::curve_set::{CurveSet, PointRemoval};
use crate::error::{EngineError, EngineResult};
use crate::slot_map::SlotMap;
use crate::spline::DEFAULT_TENSION;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Serialisierbare Kurvenbeschreibung.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSnapshot {
    pub points: Vec<Vec3>,
    #[serde(default = "default_tension")]
    pub tension: f32,
    #[serde(default)]
    pub closed: bool,
}

fn default_tension() -> f32 {
    DEFAULT_TENSION
}

/// Vollständiger Szenenzustand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub curves: Vec<CurveSnapshot>,
    #[serde(default)]
    pub objects: SlotMap<AnimatedObject>,
    #[serde(default)]
    pub triggers: SlotMap<AnimatedObject>,
}

/// Inkrementeller Edit, identisch für lokale und entfernte Mutationen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SceneUpdate {
    AddCurve {
        points: Vec<Vec3>,
        #[serde(default)]
        closed: bool,
        #[serde(default = "default_tension")]
        tension: f32,
    },
    AddControlPoint {
        curve_index: usize,
        position: Vec3,
    },
    MoveControlPoint {
        point_index: usize,
        position: Vec3,
    },
    DeleteControlPoint {
        point_index: usize,
    },
    DeleteCurve {
        curve_index: usize,
    },
    SetTension {
        curve_index: usize,
        tension: f32,
    },
    SetClosed {
        curve_index: usize,
        closed: bool,
    },
    /// Objekt an Slot setzen (anlegen oder ersetzen)
    PutObject {
        index: usize,
        object: AnimatedObject,
    },
    DeleteObject {
        index: usize,
    },
    PutTrigger {
        index: usize,
        trigger: AnimatedObject,
    },
    DeleteTrigger {
        index: usize,
    },
    /// Gesamte Szene ersetzen (Laden einer Szenen-Datei)
    ReplaceScene {
        scene: SceneSnapshot,
    },
    ClearScene,
}

/// Ergebnis eines Szenen-Ticks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSnapshot {
    pub objects: PositionSnapshot,
    pub triggers: PositionSnapshot,
}

/// Laufzeit-Szene.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub curves: CurveSet,
    pub objects: SlotMap<AnimatedObject>,
    pub triggers: SlotMap<AnimatedObject>,
}

impl Scene {
    /// Erstellt eine leere Szene.
    pub fn new(settings: SamplingSettings) -> Self {
        Self {
            curves: CurveSet::new(settings),
            objects: SlotMap::new(),
            triggers: SlotMap::new(),
        }
    }

    /// Baut eine Szene aus einem Snapshot auf.
    pub fn from_snapshot(snapshot: SceneSnapshot, settings: SamplingSettings) -> EngineResult<Self> {
        let mut scene = Self::new(settings);
        scene.replace_with(snapshot)?;
        Ok(scene)
    }

    /// Ersetzt den gesamten Inhalt. Bei Fehler bleibt die Szene unverändert.
    pub fn replace_with(&mut self, snapshot: SceneSnapshot) -> EngineResult<()> {
        let mut curves = CurveSet::new(*self.curves.settings());
        for curve in snapshot.curves {
            curves.add_curve_with_tension(curve.points, curve.closed, curve.tension)?;
        }
        self.curves = curves;
        self.objects = snapshot.objects;
        self.triggers = snapshot.triggers;
        log::info!(
            "Szene ersetzt: {} Kurven, {} Objekte, {} Trigger",
            self.curves.len(),
            self.objects.len(),
            self.triggers.len()
        );
        Ok(())
    }

    /// Vollständiger, serialisierbarer Zustand.
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            curves: self
                .curves
                .iter()
                .map(|c| CurveSnapshot {
                    points: c.points().to_vec(),
                    tension: c.tension(),
                    closed: c.is_closed(),
                })
                .collect(),
            objects: self.objects.clone(),
            triggers: self.triggers.clone(),
        }
    }

    /// Wendet einen Edit an.
    pub fn apply(&mut self, update: &SceneUpdate) -> EngineResult<()> {
        match update {
            SceneUpdate::AddCurve {
                points,
                closed,
                tension,
            } => {
                self.curves
                    .add_curve_with_tension(points.clone(), *closed, *tension)?;
            }
            SceneUpdate::AddControlPoint {
                curve_index,
                position,
            } => {
                self.curves.add_control_point(*curve_index, *position)?;
            }
            SceneUpdate::MoveControlPoint {
                point_index,
                position,
            } => self.curves.move_control_point(*point_index, *position)?,
            SceneUpdate::DeleteControlPoint { point_index } => {
                if let PointRemoval::CurveRemoved { curve_index } =
                    self.curves.delete_control_point(*point_index)?
                {
                    log::debug!("Letzte Punkte gelöscht, Kurve {} entfernt", curve_index);
                }
            }
            SceneUpdate::DeleteCurve { curve_index } => self.curves.delete_curve(*curve_index)?,
            SceneUpdate::SetTension {
                curve_index,
                tension,
            } => self.curves.set_tension(*curve_index, *tension)?,
            SceneUpdate::SetClosed {
                curve_index,
                closed,
            } => self.curves.set_closed(*curve_index, *closed)?,
            SceneUpdate::PutObject { index, object } => {
                if !object.is_finite() {
                    return Err(EngineError::NonFiniteObject(*index));
                }
                self.objects.insert_at(*index, object.clone())?;
            }
            SceneUpdate::DeleteObject { index } => {
                self.objects
                    .remove(*index)
                    .ok_or(EngineError::EmptySlot(*index))?;
            }
            SceneUpdate::PutTrigger { index, trigger } => {
                if !trigger.is_finite() {
                    return Err(EngineError::NonFiniteObject(*index));
                }
                self.triggers.insert_at(*index, trigger.clone())?;
            }
            SceneUpdate::DeleteTrigger { index } => {
                self.triggers
                    .remove(*index)
                    .ok_or(EngineError::EmptySlot(*index))?;
            }
            SceneUpdate::ReplaceScene { scene } => self.replace_with(scene.clone())?,
            SceneUpdate::ClearScene => self.clear(),
        }
        Ok(())
    }

    /// Ein Frame: dirty Kurven neu aufbauen, dann Objekte und Trigger bewegen.
    pub fn tick(&mut self, step: f32) -> FrameSnapshot {
        self.curves.refresh();
        FrameSnapshot {
            objects: animation::tick(&mut self.objects, &self.curves, step),
            triggers: animation::tick(&mut self.triggers, &self.curves, step),
        }
    }

    pub fn clear(&mut self) {
        self.curves.clear();
        self.objects.clear();
        self.triggers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_scene() -> Scene {
        let mut scene = Scene::default();
        scene
            .apply(&SceneUpdate::AddCurve {
                points: vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)],
                closed: false,
                tension: 0.5,
            })
            .expect("Kurve");
        scene
            .apply(&SceneUpdate::PutObject {
                index: 0,
                object: AnimatedObject {
                    animate: true,
                    speed: 1.0,
                    ..AnimatedObject::new(0)
                },
            })
            .expect("Objekt");
        scene
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_holes() {
        let mut scene = sample_scene();
        scene
            .apply(&SceneUpdate::PutObject {
                index: 2,
                object: AnimatedObject::new(0),
            })
            .expect("Objekt 2");

        let json = serde_json::to_string(&scene.snapshot()).expect("Serialisierung");
        let snapshot: SceneSnapshot = serde_json::from_str(&json).expect("Deserialisierung");
        assert_eq!(snapshot.objects.slot_count(), 3);
        assert!(snapshot.objects.get(1).is_none());

        let rebuilt = Scene::from_snapshot(snapshot, SamplingSettings::default()).expect("Szene");
        assert_eq!(rebuilt.curves.len(), 1);
        assert_eq!(rebuilt.curves.control_points().len(), 2);
    }

    #[test]
    fn test_replace_with_invalid_snapshot_keeps_scene() {
        let mut scene = sample_scene();
        let broken = SceneSnapshot {
            curves: vec![CurveSnapshot {
                points: vec![Vec3::ZERO],
                tension: 0.5,
                closed: false,
            }],
            ..SceneSnapshot::default()
        };
        assert!(scene.replace_with(broken).is_err());
        assert_eq!(scene.curves.len(), 1);
        assert_eq!(scene.objects.len(), 1);
    }

    #[test]
    fn test_update_wire_format() {
        let update = SceneUpdate::SetTension {
            curve_index: 1,
            tension: 0.25,
        };
        let json = serde_json::to_value(&update).expect("Serialisierung");
        assert_eq!(json["kind"], "setTension");
        assert_eq!(json["curveIndex"], 1);

        let parsed: SceneUpdate = serde_json::from_str(
            r#"{"kind":"addCurve","points":[[0,0,0],[1,2,3]]}"#,
        )
        .expect("Deserialisierung");
        assert_eq!(
            parsed,
            SceneUpdate::AddCurve {
                points: vec![Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0)],
                closed: false,
                tension: DEFAULT_TENSION,
            }
        );
    }

    #[test]
    fn test_tick_refreshes_and_moves() {
        let mut scene = sample_scene();
        assert!(scene.curves.get(0).is_some_and(|c| c.needs_update()));
        let frame = scene.tick(1.0);
        assert!(!scene.curves.get(0).is_some_and(|c| c.needs_update()));
        let pos = frame.objects.get(0).expect("Position");
        assert!((pos.x - 1.0).abs() < 1e-2);
        assert!(frame.triggers.is_empty());
    }

    #[test]
    fn test_delete_empty_slot_errors() {
        let mut scene = sample_scene();
        assert_eq!(
            scene.apply(&SceneUpdate::DeleteObject { index: 4 }),
            Err(EngineError::EmptySlot(4))
        );
        assert_eq!(
            scene.apply(&SceneUpdate::DeleteTrigger { index: 0 }),
            Err(EngineError::EmptySlot(0))
        );
    }

    #[test]
    fn test_far_or_non_finite_slots_are_rejected() {
        let mut scene = sample_scene();

        let far = scene.apply(&SceneUpdate::PutObject {
            index: usize::MAX,
            object: AnimatedObject::new(0),
        });
        assert!(matches!(far, Err(EngineError::SlotOutOfRange { .. })));

        let far_trigger = scene.apply(&SceneUpdate::PutTrigger {
            index: 1_000_000_000_000,
            trigger: AnimatedObject::trigger(0),
        });
        assert!(matches!(far_trigger, Err(EngineError::SlotOutOfRange { .. })));

        let nan = scene.apply(&SceneUpdate::PutObject {
            index: 1,
            object: AnimatedObject {
                position: f32::NAN,
                ..AnimatedObject::new(0)
            },
        });
        assert_eq!(nan, Err(EngineError::NonFiniteObject(1)));

        assert_eq!(scene.objects.slot_count(), 1);
        assert_eq!(scene.triggers.slot_count(), 0);
    }

    #[test]
    fn test_replace_and_clear_updates() {
        let mut scene = Scene::default();
        let snapshot = sample_scene().snapshot();

        scene
            .apply(&SceneUpdate::ReplaceScene {
                scene: snapshot.clone(),
            })
            .expect("Ersetzen");
        assert_eq!(scene.snapshot(), snapshot);

        let json = serde_json::to_value(&SceneUpdate::ClearScene).expect("Serialisierung");
        assert_eq!(json["kind"], "clearScene");
        let parsed: SceneUpdate = serde_json::from_value(json).expect("Deserialisierung");
        scene.apply(&parsed).expect("Leeren");
        assert!(scene.curves.is_empty());
        assert!(scene.objects.is_empty());
    }

    #[test]
    fn test_object_survives_curve_deletion() {
        let mut scene = sample_scene();
        scene
            .apply(&SceneUpdate::DeleteCurve { curve_index: 0 })
            .expect("Löschen");
        let frame = scene.tick(1.0);
        assert!(frame.objects.get(0).is_none());
        assert!(scene.objects.contains(0));
    }
}
