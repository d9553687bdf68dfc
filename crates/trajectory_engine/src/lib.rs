//! Trajectory Engine: Kurven, Arc-Length-Abtastung und Animation.
//!
//! Reine Berechnung ohne I/O. Wird vom Studio (OSC-Pipeline, Session-Sync)
//! und vom Headless-Player genutzt.

pub mod animation;
pub mod curve;
pub mod curve_set;
pub mod error;
pub mod scene;
pub mod slot_map;
pub mod spline;

pub use animation::{AnimatedObject, Direction, PositionSnapshot};
pub use curve::{ArcLengthTable, Curve, CurveGeometry, SamplingSettings};
pub use curve_set::{ControlPoint, CurveSet, PointRemoval};
pub use error::{EngineError, EngineResult};
pub use scene::{CurveSnapshot, FrameSnapshot, Scene, SceneSnapshot, SceneUpdate};
pub use slot_map::{SlotMap, MAX_SLOT_GAP};
pub use glam::Vec3;
