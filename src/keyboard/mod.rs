//! The physical-keyboard abstraction and the mutable chord layout built on
//! top of it (§4.5 "Keyboard").
//!
//! [`PhysicalLayout`] is the seam the spec calls out explicitly: swapping in
//! a different physical board must never require touching the optimizers in
//! [`crate::greedy`] or [`crate::optimizer`]. [`Keyboard`] owns the mutable
//! stroke <-> phoneme assignment; it asks its `PhysicalLayout` for geometry
//! (which keys exist, which strokes are reachable, what they cost) but never
//! assumes anything about finger anatomy itself.

pub mod starboard;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::KeyboardError;
use crate::phoneme::SyllabicPosition;
use crate::syllable::SyllableParts;

pub type KeyId = u16;

/// Describes a fixed physical chorded keyboard: which keys exist, how they
/// are partitioned between the three syllabic positions, which strokes a
/// stroke-composer may draw from that partition, and how much each stroke
/// costs to perform.
pub trait PhysicalLayout: Send + Sync {
    /// The keys allocated to `position`, in a stable order.
    fn keys_in_position(&self, position: SyllabicPosition) -> &[KeyId];

    /// The total number of physical keys this layout declares, independent
    /// of how `keys_in_position` partitions them (§8 "Keyboard partition
    /// mismatch"). A mismatch between this and the partition sum is fatal
    /// at [`Keyboard::new`].
    fn total_keys(&self) -> usize;

    /// The largest number of keys a single phoneme may ever claim at
    /// `position` (§4.5 "maxKeysPerPhoneme").
    fn max_keys_per_phoneme(&self, position: SyllabicPosition) -> usize;

    /// Every stroke of exactly `len` keys that the layout can physically
    /// produce at `position`.
    fn possible_strokes(&self, position: SyllabicPosition, len: usize) -> Vec<Vec<KeyId>>;

    /// The ergonomic cost of performing `stroke` (already sorted ascending)
    /// at `position` (§4.5 "Stroke cost").
    fn stroke_cost(&self, position: SyllabicPosition, stroke: &[KeyId]) -> i64;
}

/// Total order over strokes used to give deterministic iteration and
/// display order (§4.5 "strokeIsLowerThen"): shorter strokes first in the
/// upstream comparison is not implied — this only orders strokes of the
/// same arity by their key sequence, recursing on the middle slice when the
/// first and last keys tie.
pub fn stroke_is_lower_than(a: &[KeyId], b: &[KeyId]) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a.first(), b.first()) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(fa), Some(fb)) => match fa.cmp(fb) {
            Ordering::Equal => match (a.last(), b.last()) {
                (Some(la), Some(lb)) if la != lb => la.cmp(lb),
                _ => {
                    if a.len() <= 2 {
                        Ordering::Equal
                    } else {
                        stroke_is_lower_than(&a[1..a.len() - 1], &b[1..b.len() - 1])
                    }
                }
            },
            other => other,
        },
    }
}

pub fn strokes_to_string(stroke: &[KeyId]) -> String {
    stroke
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join("-")
}

/// The mutable chord assignment: which stroke, at each syllabic position,
/// produces which phoneme(s). Holds a shared [`PhysicalLayout`] for
/// geometry but owns all assignment state itself.
#[derive(Clone)]
pub struct Keyboard {
    layout: Arc<dyn PhysicalLayout>,
    strokes: [HashMap<Vec<KeyId>, Vec<char>>; 3],
}

impl std::fmt::Debug for Keyboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keyboard").field("strokes", &self.strokes).finish()
    }
}

fn slot(position: SyllabicPosition) -> usize {
    match position {
        SyllabicPosition::Onset => 0,
        SyllabicPosition::Nucleus => 1,
        SyllabicPosition::Coda => 2,
    }
}

impl Keyboard {
    /// Validates that the layout's three key partitions are pairwise
    /// disjoint and sum to the layout's declared total (§8 "Keyboard
    /// partition", "Keyboard partition mismatch") before returning an empty
    /// keyboard.
    pub fn new(layout: Arc<dyn PhysicalLayout>) -> Result<Self, KeyboardError> {
        let mut seen = HashMap::new();
        let mut declared = 0usize;
        for &position in &SyllabicPosition::ALL {
            for &key in layout.keys_in_position(position) {
                if seen.insert(key, position).is_some() {
                    return Err(KeyboardError::OverlappingKey { key });
                }
                declared += 1;
            }
        }
        let allowed = layout.total_keys();
        if declared != allowed {
            return Err(KeyboardError::PartitionMismatch { allowed, declared });
        }
        Ok(Keyboard {
            layout,
            strokes: [HashMap::new(), HashMap::new(), HashMap::new()],
        })
    }

    pub fn layout(&self) -> &Arc<dyn PhysicalLayout> {
        &self.layout
    }

    pub fn possible_strokes(&self, position: SyllabicPosition, len: usize) -> Vec<Vec<KeyId>> {
        self.layout.possible_strokes(position, len)
    }

    pub fn stroke_cost(&self, position: SyllabicPosition, stroke: &[KeyId]) -> i64 {
        self.layout.stroke_cost(position, stroke)
    }

    pub fn max_keys_per_phoneme(&self, position: SyllabicPosition) -> usize {
        self.layout.max_keys_per_phoneme(position)
    }

    /// Assigns `stroke` to `phonemes` at `position`, replacing whatever was
    /// assigned there before.
    pub fn add_to_layout(&mut self, position: SyllabicPosition, stroke: Vec<KeyId>, phonemes: Vec<char>) {
        self.strokes[slot(position)].insert(stroke, phonemes);
    }

    pub fn remove_from_layout(&mut self, position: SyllabicPosition, stroke: &[KeyId]) -> Option<Vec<char>> {
        self.strokes[slot(position)].remove(stroke)
    }

    pub fn clear_layout(&mut self, position: SyllabicPosition) {
        self.strokes[slot(position)].clear();
    }

    /// Takes ownership of the stroke assignment at `position`, leaving it
    /// empty behind (§5 #1, #4: merging per-position keyboards built
    /// concurrently back into the shared one).
    pub fn take_position(&mut self, position: SyllabicPosition) -> HashMap<Vec<KeyId>, Vec<char>> {
        std::mem::take(&mut self.strokes[slot(position)])
    }

    /// Replaces the entire stroke assignment at `position`.
    pub fn replace_position(&mut self, position: SyllabicPosition, strokes: HashMap<Vec<KeyId>, Vec<char>>) {
        self.strokes[slot(position)] = strokes;
    }

    pub fn phonemes_of_stroke(&self, position: SyllabicPosition, stroke: &[KeyId]) -> Option<&[char]> {
        self.strokes[slot(position)].get(stroke).map(|v| v.as_slice())
    }

    /// All strokes currently assigned at `position`, together with their
    /// phonemes, sorted by [`stroke_is_lower_than`].
    pub fn assignments(&self, position: SyllabicPosition) -> Vec<(&Vec<KeyId>, &Vec<char>)> {
        let mut entries: Vec<_> = self.strokes[slot(position)].iter().collect();
        entries.sort_by(|a, b| stroke_is_lower_than(a.0, b.0));
        entries
    }

    /// The stroke(s) currently producing `phoneme` at `position`.
    pub fn strokes_of_phoneme(&self, position: SyllabicPosition, phoneme: char) -> Vec<&Vec<KeyId>> {
        self.strokes[slot(position)]
            .iter()
            .filter(|(_, phonemes)| phonemes.contains(&phoneme))
            .map(|(stroke, _)| stroke)
            .collect()
    }

    /// Concatenates, per position, the strokes assigned to each of the
    /// syllable's phonemes at that position: every distinct stroke among
    /// them (phonemes sharing a multi-key stroke contribute it once),
    /// ordered by [`stroke_is_lower_than`] and flattened into one key
    /// tuple, failing if any phoneme in the syllable has no assigned
    /// stroke (§4.5 "stroke_of_syllable_by_part").
    pub fn stroke_of_syllable_by_part(&self, parts: &SyllableParts) -> Option<HashMap<SyllabicPosition, Vec<KeyId>>> {
        let mut out = HashMap::new();
        for &position in &SyllabicPosition::ALL {
            let phonemes = parts.part(position);
            if phonemes.is_empty() {
                continue;
            }
            let mut seen = HashSet::new();
            let mut strokes: Vec<Vec<KeyId>> = Vec::new();
            for &phoneme in phonemes {
                let stroke = self.strokes_of_phoneme(position, phoneme).first().copied()?.clone();
                if seen.insert(stroke.clone()) {
                    strokes.push(stroke);
                }
            }
            strokes.sort_by(|a, b| stroke_is_lower_than(a, b));
            out.insert(position, strokes.into_iter().flatten().collect());
        }
        Some(out)
    }

    /// Serializes the current assignment (not the physical geometry, which
    /// is supplied independently when reloading) to a JSON value (§6
    /// "Keyboard JSON").
    pub fn to_json(&self) -> serde_json::Value {
        let mut positions = serde_json::Map::new();
        for &position in &SyllabicPosition::ALL {
            let mut entries = Vec::new();
            for (stroke, phonemes) in &self.strokes[slot(position)] {
                entries.push(StrokeEntry {
                    stroke: stroke.clone(),
                    phonemes: phonemes.iter().collect(),
                });
            }
            positions.insert(
                position.as_str().to_owned(),
                serde_json::to_value(entries).expect("stroke entries are always serializable"),
            );
        }
        serde_json::Value::Object(positions)
    }

    /// Rebuilds the assignment from a value produced by [`Keyboard::to_json`],
    /// paired with the [`PhysicalLayout`] it was designed for.
    pub fn from_json(layout: Arc<dyn PhysicalLayout>, value: &serde_json::Value) -> Result<Self, KeyboardError> {
        let mut keyboard = Keyboard::new(layout)?;
        for &position in &SyllabicPosition::ALL {
            let Some(entries) = value.get(position.as_str()) else {
                continue;
            };
            let entries: Vec<StrokeEntry> =
                serde_json::from_value(entries.clone()).unwrap_or_default();
            for entry in entries {
                keyboard.add_to_layout(position, entry.stroke, entry.phonemes.chars().collect());
            }
        }
        Ok(keyboard)
    }
}

#[derive(Serialize, Deserialize)]
struct StrokeEntry {
    stroke: Vec<KeyId>,
    phonemes: String,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keyboard::starboard::Starboard;

    #[test]
    fn rejects_overlapping_partitions() {
        struct Bad;
        impl PhysicalLayout for Bad {
            fn keys_in_position(&self, position: SyllabicPosition) -> &[KeyId] {
                match position {
                    SyllabicPosition::Onset => &[0, 1],
                    SyllabicPosition::Nucleus => &[1, 2],
                    SyllabicPosition::Coda => &[3],
                }
            }
            fn total_keys(&self) -> usize {
                4
            }
            fn max_keys_per_phoneme(&self, _position: SyllabicPosition) -> usize {
                2
            }
            fn possible_strokes(&self, _position: SyllabicPosition, _len: usize) -> Vec<Vec<KeyId>> {
                vec![]
            }
            fn stroke_cost(&self, _position: SyllabicPosition, _stroke: &[KeyId]) -> i64 {
                0
            }
        }
        let err = Keyboard::new(Arc::new(Bad)).unwrap_err();
        assert!(matches!(err, KeyboardError::OverlappingKey { key: 1 }));
    }

    #[test]
    fn rejects_partition_sum_mismatch() {
        struct Undersized;
        impl PhysicalLayout for Undersized {
            fn keys_in_position(&self, position: SyllabicPosition) -> &[KeyId] {
                match position {
                    SyllabicPosition::Onset => &[0, 1],
                    SyllabicPosition::Nucleus => &[2],
                    SyllabicPosition::Coda => &[3],
                }
            }
            fn total_keys(&self) -> usize {
                5
            }
            fn max_keys_per_phoneme(&self, _position: SyllabicPosition) -> usize {
                2
            }
            fn possible_strokes(&self, _position: SyllabicPosition, _len: usize) -> Vec<Vec<KeyId>> {
                vec![]
            }
            fn stroke_cost(&self, _position: SyllabicPosition, _stroke: &[KeyId]) -> i64 {
                0
            }
        }
        let err = Keyboard::new(Arc::new(Undersized)).unwrap_err();
        assert!(matches!(
            err,
            KeyboardError::PartitionMismatch {
                allowed: 5,
                declared: 4
            }
        ));
    }

    #[test]
    fn assignment_round_trips_through_json() {
        let mut keyboard = Keyboard::new(Arc::new(Starboard::default())).unwrap();
        keyboard.add_to_layout(SyllabicPosition::Onset, vec![0, 1], vec!['t']);
        let json = keyboard.to_json();
        let restored = Keyboard::from_json(Arc::new(Starboard::default()), &json).unwrap();
        assert_eq!(
            restored.phonemes_of_stroke(SyllabicPosition::Onset, &[0, 1]),
            Some(['t'].as_slice())
        );
    }

    #[test]
    fn stroke_is_lower_than_orders_by_first_then_last_key() {
        assert_eq!(stroke_is_lower_than(&[0, 1], &[0, 2]), std::cmp::Ordering::Less);
        assert_eq!(stroke_is_lower_than(&[1, 2], &[0, 5]), std::cmp::Ordering::Greater);
    }
}
