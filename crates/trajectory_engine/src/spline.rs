//! Reine Geometrie-Funktionen für Catmull-Rom-Splines im Raum.
//!
//! Layer-neutral: wird von `curve`, Benchmarks und dem View-Layer genutzt,
//! ohne Abhängigkeit zu Kurven-Verwaltung oder Animation.

use glam::Vec3;

/// Standard-Tension (entspricht der klassischen, uniformen Catmull-Rom-Spline).
pub const DEFAULT_TENSION: f32 = 0.5;

/// Berechnet einen Punkt auf einem Catmull-Rom-Segment (t ∈ [0, 1]).
///
/// p0, p1, p2, p3: vier aufeinanderfolgende Kontrollpunkte.
/// Die Kurve verläuft von p1 nach p2. `tension` skaliert die Tangenten;
/// bei 0.5 ergibt sich exakt die klassische Catmull-Rom-Form.
pub fn catmull_rom_point(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, tension: f32, t: f32) -> Vec3 {
    let m1 = tension * (p2 - p0);
    let m2 = tension * (p3 - p1);
    let t2 = t * t;
    let t3 = t2 * t;
    p1 + m1 * t
        + (-3.0 * p1 + 3.0 * p2 - 2.0 * m1 - m2) * t2
        + (2.0 * p1 - 2.0 * p2 + m1 + m2) * t3
}

/// Punkt auf der gesamten Spline durch `points` für den Kurvenparameter `t` ∈ [0, 1].
///
/// Offene Kurven spiegeln Phantom-Punkte an den Rändern, damit die Kurve
/// durch den ersten und letzten Punkt läuft. Geschlossene Kurven laufen
/// zyklisch über alle Punkte, sodass `t = 0` und `t = 1` zusammenfallen.
pub fn spline_point(points: &[Vec3], closed: bool, tension: f32, t: f32) -> Option<Vec3> {
    let n = points.len();
    match n {
        0 => return None,
        1 => return Some(points[0]),
        _ => {}
    }

    let segments = if closed { n } else { n - 1 };
    let scaled = segments as f32 * t.clamp(0.0, 1.0);
    let mut seg = scaled.floor() as usize;
    let mut weight = scaled - seg as f32;
    if seg >= segments {
        // t == 1: Ende des letzten Segments
        seg = segments - 1;
        weight = 1.0;
    }

    let (p0, p1, p2, p3) = if closed {
        (
            points[(seg + n - 1) % n],
            points[seg % n],
            points[(seg + 1) % n],
            points[(seg + 2) % n],
        )
    } else {
        let p0 = if seg == 0 {
            2.0 * points[0] - points[1]
        } else {
            points[seg - 1]
        };
        let p3 = if seg + 2 < n {
            points[seg + 2]
        } else {
            2.0 * points[n - 1] - points[n - 2]
        };
        (p0, points[seg], points[seg + 1], p3)
    };

    Some(catmull_rom_point(p0, p1, p2, p3, tension, weight))
}

/// Tastet die Spline gleichmäßig im Kurvenparameter ab (`divisions + 1` Punkte).
pub fn sample_uniform(points: &[Vec3], closed: bool, tension: f32, divisions: usize) -> Vec<Vec3> {
    let divisions = divisions.max(1);
    (0..=divisions)
        .filter_map(|i| spline_point(points, closed, tension, i as f32 / divisions as f32))
        .collect()
}

/// Approximierte Länge einer Polyline.
pub fn polyline_length(points: &[Vec3]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}
