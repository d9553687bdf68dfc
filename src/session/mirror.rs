//! Lokale Spiegel der animierten Objekte anderer Clients.
//!
//! Empfangene Telemetrie wird nicht übernommen, sondern per linearer
//! Interpolation angenähert. Positions-Sprünge über der Schwelle gelten als
//! Netzwerk-Glitch und werden verworfen; die Geschwindigkeit wird immer geglättet.

use super::protocol::TelemetryUpdate;
use crate::shared::StudioOptions;
use trajectory_engine::{
    animation, AnimatedObject, CurveSet, FrameSnapshot, SlotMap,
};

/// Glättungs-Parameter für eingehende Telemetrie.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingParams {
    pub speed_alpha: f32,
    pub position_alpha: f32,
    pub guard: f32,
}

impl SmoothingParams {
    pub fn from_options(options: &StudioOptions) -> Self {
        Self {
            speed_alpha: options.speed_smoothing.clamp(0.0, 1.0),
            position_alpha: options.position_smoothing.clamp(0.0, 1.0),
            guard: options.telemetry_guard,
        }
    }
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self::from_options(&StudioOptions::default())
    }
}

/// Was mit einem Telemetrie-Update passiert ist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryOutcome {
    /// Unbekanntes Objekt: mit den empfangenen Werten angelegt
    Created,
    Smoothed,
    /// Position verworfen (Sprung > Schwelle), Geschwindigkeit geglättet
    PositionDiscarded,
    /// Update komplett verworfen (Index außerhalb, NaN/unendlich)
    Rejected,
}

fn lerp(current: f32, target: f32, alpha: f32) -> f32 {
    current + (target - current) * alpha
}

/// Gespiegelte Objekte und Trigger eines entfernten Clients.
#[derive(Debug, Clone, Default)]
pub struct RemoteMirror {
    pub objects: SlotMap<AnimatedObject>,
    pub triggers: SlotMap<AnimatedObject>,
}

impl RemoteMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, update: &TelemetryUpdate, params: &SmoothingParams) -> TelemetryOutcome {
        let finite = update.position.is_none_or(f32::is_finite) && update.speed.is_none_or(f32::is_finite);
        if !finite {
            log::warn!("Telemetrie für Objekt {} mit ungültigen Werten verworfen", update.index);
            return TelemetryOutcome::Rejected;
        }

        let slots = if update.trigger {
            &mut self.triggers
        } else {
            &mut self.objects
        };

        let Some(object) = slots.get_mut(update.index) else {
            let mut object = AnimatedObject {
                animate: true,
                ..AnimatedObject::new(update.trajectory_index.unwrap_or(0))
            };
            if let Some(position) = update.position {
                object.position = position;
            }
            if let Some(speed) = update.speed {
                object.speed = speed;
            }
            return match slots.insert_at(update.index, object) {
                Ok(_) => TelemetryOutcome::Created,
                Err(e) => {
                    log::warn!("Telemetrie verworfen: {}", e);
                    TelemetryOutcome::Rejected
                }
            };
        };

        if let Some(trajectory_index) = update.trajectory_index {
            object.trajectory_index = trajectory_index;
        }
        if let Some(speed) = update.speed {
            object.speed = lerp(object.speed, speed, params.speed_alpha);
        }

        match update.position {
            Some(position) if (position - object.position).abs() > params.guard => {
                log::debug!(
                    "Telemetrie verworfen: Sprung {:.3} → {:.3} bei Objekt {}",
                    object.position,
                    position,
                    update.index
                );
                TelemetryOutcome::PositionDiscarded
            }
            Some(position) => {
                object.position = lerp(object.position, position, params.position_alpha);
                TelemetryOutcome::Smoothed
            }
            None => TelemetryOutcome::Smoothed,
        }
    }

    /// Bewegt die Spiegel lokal weiter, damit sie zwischen Updates nicht stehen.
    pub fn tick(&mut self, curves: &CurveSet, step: f32) -> FrameSnapshot {
        FrameSnapshot {
            objects: animation::tick(&mut self.objects, curves, step),
            triggers: animation::tick(&mut self.triggers, curves, step),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.triggers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn update(index: usize, position: Option<f32>, speed: Option<f32>) -> TelemetryUpdate {
        TelemetryUpdate {
            index,
            position,
            speed,
            trajectory_index: None,
            trigger: false,
        }
    }

    #[test]
    fn test_unknown_object_is_created_from_update() {
        let mut mirror = RemoteMirror::new();
        let outcome = mirror.apply(&update(2, Some(0.4), Some(0.2)), &SmoothingParams::default());
        assert_eq!(outcome, TelemetryOutcome::Created);
        let object = mirror.objects.get(2).expect("Objekt");
        assert_eq!(object.position, 0.4);
        assert_eq!(object.speed, 0.2);
        assert!(mirror.objects.get(0).is_none());
    }

    #[test]
    fn test_guard_discards_jump_then_smooths() {
        let params = SmoothingParams::default();
        let mut mirror = RemoteMirror::new();
        mirror.apply(&update(0, Some(0.40), None), &params);

        assert_eq!(
            mirror.apply(&update(0, Some(0.95), None), &params),
            TelemetryOutcome::PositionDiscarded
        );
        assert_eq!(mirror.objects.get(0).map(|o| o.position), Some(0.40));

        assert_eq!(
            mirror.apply(&update(0, Some(0.42), None), &params),
            TelemetryOutcome::Smoothed
        );
        let position = mirror.objects.get(0).map(|o| o.position).expect("Objekt");
        assert_relative_eq!(position, 0.4002, epsilon = 1e-6);
    }

    #[test]
    fn test_speed_smoothed_even_when_position_discarded() {
        let params = SmoothingParams::default();
        let mut mirror = RemoteMirror::new();
        mirror.apply(&update(0, Some(0.1), Some(1.0)), &params);
        mirror.apply(&update(0, Some(0.9), Some(2.0)), &params);
        let object = mirror.objects.get(0).expect("Objekt");
        assert_eq!(object.position, 0.1);
        assert_relative_eq!(object.speed, 1.1, epsilon = 1e-6);
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let params = SmoothingParams::default();
        let mut mirror = RemoteMirror::new();

        assert_eq!(
            mirror.apply(&update(usize::MAX, Some(0.5), None), &params),
            TelemetryOutcome::Rejected
        );
        assert_eq!(
            mirror.apply(&update(1_000_000_000_000, Some(0.5), None), &params),
            TelemetryOutcome::Rejected
        );
        assert!(mirror.is_empty());
        assert_eq!(mirror.objects.slot_count(), 0);
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let params = SmoothingParams::default();
        let mut mirror = RemoteMirror::new();
        mirror.apply(&update(0, Some(0.3), Some(1.0)), &params);

        for (position, speed) in [
            (Some(f32::NAN), None),
            (None, Some(f32::INFINITY)),
            (Some(f32::NEG_INFINITY), Some(1.0)),
        ] {
            assert_eq!(
                mirror.apply(&update(0, position, speed), &params),
                TelemetryOutcome::Rejected
            );
        }
        let object = mirror.objects.get(0).expect("Objekt");
        assert_eq!(object.position, 0.3);
        assert_eq!(object.speed, 1.0);

        assert_eq!(
            mirror.apply(&update(1, Some(f32::NAN), None), &params),
            TelemetryOutcome::Rejected
        );
        assert!(mirror.objects.get(1).is_none());
    }

    #[test]
    fn test_negative_position_is_smoothed_not_rejected() {
        let params = SmoothingParams::default();
        let mut mirror = RemoteMirror::new();
        mirror.apply(&update(0, Some(-0.2), Some(-0.5)), &params);
        let object = mirror.objects.get(0).expect("Objekt");
        assert_eq!(object.position, -0.2);
        assert_eq!(object.speed, -0.5);
    }

    #[test]
    fn test_triggers_are_mirrored_separately() {
        let mut mirror = RemoteMirror::new();
        let trigger = TelemetryUpdate {
            trigger: true,
            ..update(0, Some(0.5), None)
        };
        mirror.apply(&trigger, &SmoothingParams::default());
        assert_eq!(mirror.triggers.len(), 1);
        assert!(mirror.objects.is_empty());
    }
}
