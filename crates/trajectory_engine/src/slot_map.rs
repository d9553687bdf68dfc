//! Slot-Map mit stabilen Integer-Schlüsseln.
//!
//! Gelöschte Einträge hinterlassen ein Loch statt nachzurücken, damit externe
//! Konsumenten (OSC-Routen, View-Layer, entfernte Clients) Objekte dauerhaft
//! über ihren Index adressieren können.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Maximaler Abstand hinter dem letzten Slot, den `insert_at` mit Löchern auffüllt.
pub const MAX_SLOT_GAP: usize = 1024;

/// Stabile Index-Sammlung mit optionalen Einträgen.
///
/// Serialisiert als Array mit `null` für Löcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotMap<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for SlotMap<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> SlotMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hängt einen Eintrag an und liefert seinen Index.
    pub fn insert(&mut self, value: T) -> usize {
        self.slots.push(Some(value));
        self.slots.len() - 1
    }

    /// Setzt den Eintrag an `index`, füllt fehlende Slots mit Löchern auf.
    /// Liefert den vorherigen Eintrag.
    ///
    /// Indizes mehr als [`MAX_SLOT_GAP`] hinter dem Ende werden abgelehnt,
    /// die Sammlung bleibt dann unverändert.
    pub fn insert_at(&mut self, index: usize, value: T) -> EngineResult<Option<T>> {
        let limit = self.slots.len().saturating_add(MAX_SLOT_GAP);
        if index >= limit {
            return Err(EngineError::SlotOutOfRange { index, limit });
        }
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        Ok(self.slots[index].replace(value))
    }

    /// Entfernt den Eintrag und hinterlässt ein Loch.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Anzahl belegter Slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Anzahl Slots inklusive Löcher (= nächster Index für `insert`).
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Rohsicht inklusive Löcher.
    pub fn slots(&self) -> &[Option<T>] {
        &self.slots
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|v| (i, v)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, s)| s.as_mut().map(|v| (i, v)))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_leaves_hole_and_keeps_indices() {
        let mut map = SlotMap::new();
        let a = map.insert("a");
        let b = map.insert("b");
        let c = map.insert("c");
        assert_eq!((a, b, c), (0, 1, 2));

        assert_eq!(map.remove(b), Some("b"));
        assert_eq!(map.len(), 2);
        assert_eq!(map.slot_count(), 3);
        assert_eq!(map.get(c), Some(&"c"));
        assert!(map.remove(b).is_none(), "Doppeltes Löschen ist no-op");

        // Neue Einträge füllen keine Löcher
        assert_eq!(map.insert("d"), 3);
    }

    #[test]
    fn test_insert_at_grows_with_holes() {
        let mut map: SlotMap<u32> = SlotMap::new();
        assert_eq!(map.insert_at(3, 7), Ok(None));
        assert_eq!(map.slot_count(), 4);
        assert_eq!(map.len(), 1);
        assert_eq!(map.insert_at(3, 9), Ok(Some(7)));
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![(3, &9)]);
    }

    #[test]
    fn test_insert_at_rejects_far_indices() {
        let mut map: SlotMap<u32> = SlotMap::new();
        map.insert(1);

        assert_eq!(
            map.insert_at(usize::MAX, 7),
            Err(EngineError::SlotOutOfRange {
                index: usize::MAX,
                limit: 1 + MAX_SLOT_GAP,
            })
        );
        assert!(map.insert_at(1_000_000_000_000, 7).is_err());
        assert!(map.insert_at(1 + MAX_SLOT_GAP, 7).is_err());
        assert_eq!(map.slot_count(), 1);

        // Letzter erlaubter Index
        assert_eq!(map.insert_at(MAX_SLOT_GAP, 7), Ok(None));
        assert_eq!(map.slot_count(), MAX_SLOT_GAP + 1);
    }

    #[test]
    fn test_serializes_holes_as_null() {
        let mut map = SlotMap::new();
        map.insert(1);
        map.insert(2);
        map.remove(0);
        let json = serde_json::to_string(&map).expect("Serialisierung");
        assert_eq!(json, "[null,2]");
        let back: SlotMap<i32> = serde_json::from_str(&json).expect("Deserialisierung");
        assert_eq!(back, map);
    }
}
