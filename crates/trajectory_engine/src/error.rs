//! Fehlertypen der Engine.

/// Fehler bei Kurven- und Objekt-Mutationen.
///
/// Alle Varianten sind lokal behandelbar: der Aufrufer verwirft die
/// Mutation, die Szene bleibt unverändert.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// Kurve mit weniger als zwei Kontrollpunkten angefordert
    #[error("Kurve benötigt mindestens 2 Kontrollpunkte, erhalten: {0}")]
    TooFewPoints(usize),
    /// Tension außerhalb von [0, 1]
    #[error("Tension {0} liegt außerhalb von [0, 1]")]
    TensionOutOfRange(f32),
    /// Kurven-Index existiert nicht (mehr)
    #[error("Kurve {0} existiert nicht")]
    UnknownCurve(usize),
    /// Globaler Kontrollpunkt-Index existiert nicht
    #[error("Kontrollpunkt {0} existiert nicht")]
    UnknownControlPoint(usize),
    /// Slot ist leer (Objekt oder Trigger wurde gelöscht)
    #[error("Slot {0} ist leer")]
    EmptySlot(usize),
    /// Slot-Index zu weit hinter dem Ende der Sammlung
    #[error("Slot {index} liegt außerhalb des erlaubten Bereichs (< {limit})")]
    SlotOutOfRange { index: usize, limit: usize },
    /// Objekt mit NaN/unendlicher Position oder Geschwindigkeit
    #[error("Objekt {0} hat ungültige Position oder Geschwindigkeit")]
    NonFiniteObject(usize),
}

/// Kurzform für Engine-Ergebnisse.
pub type EngineResult<T> = Result<T, EngineError>;
