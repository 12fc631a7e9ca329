//! `Starboard`, the reference [`PhysicalLayout`] (§4.5, grounded on
//! `keyboard.py`'s `Starboard` subclass and `keyboardtemplate.py`'s
//! `FingerWeights`/`PositionWeights` dataclasses).
//!
//! The original Starboard is a specific two-hand, many-row key diagram;
//! replicating its exact row/column geometry is out of scope (§1 — the
//! physical-keyboard description is a value the core consumes, not a fact
//! about French phonology). What *is* grounded here is the cost model: the
//! same per-finger weight table, the same "2 keys on one finger is cheaper
//! than 2 keys split across fingers" shape, and the same zig-zag/row-gap
//! penalties, applied to a simplified topology of one "home" and one
//! "off-home" key per finger.

use std::collections::HashMap;

use crate::keyboard::{KeyId, PhysicalLayout};
use crate::phoneme::SyllabicPosition;

/// Per-finger keypress weights, grounded on `keyboard.py`'s `FingerWeights`
/// constants.
#[derive(Debug, Clone, Copy)]
pub struct FingerWeights {
    pub pinky_1key_home: i64,
    pub pinky_1key_off_home: i64,
    pub pinky_2keys: i64,
    pub ring_mid_1key: i64,
    pub ring_mid_2keys: i64,
    pub index_1key_home: i64,
    pub index_1key_off_home: i64,
    pub index_2keys: i64,
    pub thumb_1key: i64,
    pub thumb_2keys: i64,
}

impl Default for FingerWeights {
    fn default() -> Self {
        FingerWeights {
            pinky_1key_home: 125,
            pinky_1key_off_home: 150,
            pinky_2keys: 175,
            ring_mid_1key: 125,
            ring_mid_2keys: 175,
            index_1key_home: 100,
            index_1key_off_home: 125,
            index_2keys: 150,
            thumb_1key: 100,
            thumb_2keys: 150,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FingerRole {
    Pinky,
    RingOrMiddle,
    Index,
    Thumb,
}

#[derive(Debug, Clone, Copy)]
struct Finger {
    role: FingerRole,
    home: KeyId,
    off_home: KeyId,
}

impl Finger {
    fn keys(&self) -> [KeyId; 2] {
        [self.home, self.off_home]
    }

    /// Every non-empty keypress this finger can make, with its weight.
    fn keypresses(&self, weights: &FingerWeights) -> Vec<(Vec<KeyId>, i64)> {
        match self.role {
            FingerRole::Pinky => vec![
                (vec![self.home], weights.pinky_1key_home),
                (vec![self.off_home], weights.pinky_1key_off_home),
                (vec![self.home, self.off_home], weights.pinky_2keys),
            ],
            FingerRole::RingOrMiddle => vec![
                (vec![self.home], weights.ring_mid_1key),
                (vec![self.off_home], weights.ring_mid_1key),
                (vec![self.home, self.off_home], weights.ring_mid_2keys),
            ],
            FingerRole::Index => vec![
                (vec![self.home], weights.index_1key_home),
                (vec![self.off_home], weights.index_1key_off_home),
                (vec![self.home, self.off_home], weights.index_2keys),
            ],
            FingerRole::Thumb => vec![
                (vec![self.home], weights.thumb_1key),
                (vec![self.off_home], weights.thumb_1key),
                (vec![self.home, self.off_home], weights.thumb_2keys),
            ],
        }
    }
}

fn fingers_for(position: SyllabicPosition, base_key: KeyId) -> Vec<Finger> {
    let roles: &[FingerRole] = match position {
        SyllabicPosition::Onset => &[
            FingerRole::Pinky,
            FingerRole::RingOrMiddle,
            FingerRole::RingOrMiddle,
            FingerRole::Index,
        ],
        SyllabicPosition::Nucleus => &[FingerRole::Thumb, FingerRole::Thumb],
        SyllabicPosition::Coda => &[
            FingerRole::Index,
            FingerRole::RingOrMiddle,
            FingerRole::RingOrMiddle,
            FingerRole::Pinky,
            FingerRole::Pinky,
        ],
    };
    roles
        .iter()
        .enumerate()
        .map(|(i, &role)| Finger {
            role,
            home: base_key + (2 * i) as KeyId,
            off_home: base_key + (2 * i) as KeyId + 1,
        })
        .collect()
}

/// Sum of zig-zag and row-gap penalties over every adjacent pair of a
/// sorted stroke's keys (§4.5 "Stroke cost" geometry terms), treating even
/// key ids as the home row and odd key ids as the off-home row, which
/// matches this layout's `(home, off_home)` assignment per finger.
fn shape_cost(stroke: &[KeyId]) -> i64 {
    let mut cost = 0;
    for pair in stroke.windows(2) {
        let (k1, k2) = (pair[0], pair[1]);
        if k2 - k1 == 1 {
            continue; // same finger, already priced by the keypress weight
        }
        let row1 = k1 % 2;
        let row2 = k2 % 2;
        if row1 != row2 {
            cost += 100; // zig-zag between rows
        }
        let finger_gap = (k2 / 2) as i64 - (k1 / 2) as i64;
        if finger_gap >= 2 {
            cost += 100; // skips over an unused finger
        }
    }
    if stroke.len() >= 3 {
        let consecutive = stroke.windows(2).all(|w| w[1] - w[0] == 1);
        if consecutive {
            cost += if stroke[0].is_multiple_of(2) { -50 } else { 50 };
        }
    }
    cost
}

/// The default reference keyboard: onset (8 keys / 4 fingers), nucleus (4
/// keys / 2 thumbs), coda (10 keys / 5 fingers), matching
/// `keyboardtemplate.py`'s `nbKeysPerSyllabicPart` default of `(8, 4, 10)`.
#[derive(Debug, Clone)]
pub struct Starboard {
    weights: FingerWeights,
    onset_keys: Vec<KeyId>,
    nucleus_keys: Vec<KeyId>,
    coda_keys: Vec<KeyId>,
    onset_fingers: Vec<Finger>,
    nucleus_fingers: Vec<Finger>,
    coda_fingers: Vec<Finger>,
}

impl Default for Starboard {
    fn default() -> Self {
        let onset_fingers = fingers_for(SyllabicPosition::Onset, 0);
        let nucleus_fingers = fingers_for(SyllabicPosition::Nucleus, 8);
        let coda_fingers = fingers_for(SyllabicPosition::Coda, 12);
        Starboard {
            weights: FingerWeights::default(),
            onset_keys: onset_fingers.iter().flat_map(|f| f.keys()).collect(),
            nucleus_keys: nucleus_fingers.iter().flat_map(|f| f.keys()).collect(),
            coda_keys: coda_fingers.iter().flat_map(|f| f.keys()).collect(),
            onset_fingers,
            nucleus_fingers,
            coda_fingers,
        }
    }
}

impl Starboard {
    pub fn with_weights(weights: FingerWeights) -> Self {
        Starboard {
            weights,
            ..Starboard::default()
        }
    }

    fn fingers(&self, position: SyllabicPosition) -> &[Finger] {
        match position {
            SyllabicPosition::Onset => &self.onset_fingers,
            SyllabicPosition::Nucleus => &self.nucleus_fingers,
            SyllabicPosition::Coda => &self.coda_fingers,
        }
    }

    /// Recursively combines at most one keypress per finger, collecting
    /// every combination whose total key count is `len` (§4.5
    /// "possible_strokes").
    fn compose(fingers: &[Finger], weights: &FingerWeights, len: usize) -> Vec<Vec<KeyId>> {
        fn go(
            fingers: &[Finger],
            weights: &FingerWeights,
            remaining: usize,
            acc: &mut Vec<KeyId>,
            out: &mut Vec<Vec<KeyId>>,
        ) {
            if remaining == 0 {
                out.push(acc.clone());
                return;
            }
            let Some((finger, rest)) = fingers.split_first() else {
                return;
            };
            // Skip this finger entirely.
            go(rest, weights, remaining, acc, out);
            // Or use one of its keypresses.
            for (keys, _weight) in finger.keypresses(weights) {
                if keys.len() > remaining {
                    continue;
                }
                acc.extend_from_slice(&keys);
                go(rest, weights, remaining - keys.len(), acc, out);
                acc.truncate(acc.len() - keys.len());
            }
        }
        let mut out = Vec::new();
        go(fingers, weights, len, &mut Vec::new(), &mut out);
        for stroke in &mut out {
            stroke.sort_unstable();
        }
        out.sort();
        out.dedup();
        out
    }
}

impl PhysicalLayout for Starboard {
    fn keys_in_position(&self, position: SyllabicPosition) -> &[KeyId] {
        match position {
            SyllabicPosition::Onset => &self.onset_keys,
            SyllabicPosition::Nucleus => &self.nucleus_keys,
            SyllabicPosition::Coda => &self.coda_keys,
        }
    }

    fn total_keys(&self) -> usize {
        self.onset_keys.len() + self.nucleus_keys.len() + self.coda_keys.len()
    }

    fn max_keys_per_phoneme(&self, position: SyllabicPosition) -> usize {
        match position {
            SyllabicPosition::Onset => 5,
            SyllabicPosition::Nucleus => 4,
            SyllabicPosition::Coda => 5,
        }
    }

    fn possible_strokes(&self, position: SyllabicPosition, len: usize) -> Vec<Vec<KeyId>> {
        if len == 0 {
            return vec![];
        }
        Starboard::compose(self.fingers(position), &self.weights, len)
    }

    fn stroke_cost(&self, position: SyllabicPosition, stroke: &[KeyId]) -> i64 {
        let fingers = self.fingers(position);
        let mut by_finger: HashMap<usize, Vec<KeyId>> = HashMap::new();
        for &key in stroke {
            for (i, finger) in fingers.iter().enumerate() {
                if finger.keys().contains(&key) {
                    by_finger.entry(i).or_default().push(key);
                }
            }
        }
        let mut cost = 0i64;
        for (i, keys) in &by_finger {
            let finger = &fingers[*i];
            let mut keys = keys.clone();
            keys.sort_unstable();
            let weight = finger
                .keypresses(&self.weights)
                .into_iter()
                .find(|(k, _)| *k == keys)
                .map(|(_, w)| w)
                .unwrap_or(0);
            cost += weight;
        }
        let fingers_used = by_finger.len();
        if matches!(position, SyllabicPosition::Onset | SyllabicPosition::Coda) {
            let mut sorted = stroke.to_vec();
            sorted.sort_unstable();
            cost += shape_cost(&sorted);
        }
        let discount = 0.85f64.powi(fingers_used as i32);
        (cost as f64 * discount).round() as i64
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn key_partitions_are_disjoint_and_total_twenty_two() {
        let board = Starboard::default();
        let mut all: Vec<KeyId> = board
            .onset_keys
            .iter()
            .chain(board.nucleus_keys.iter())
            .chain(board.coda_keys.iter())
            .copied()
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 22);
        assert_eq!(board.onset_keys.len(), 8);
        assert_eq!(board.nucleus_keys.len(), 4);
        assert_eq!(board.coda_keys.len(), 10);
    }

    #[test]
    fn possible_strokes_respects_requested_length() {
        let board = Starboard::default();
        let strokes = board.possible_strokes(SyllabicPosition::Onset, 2);
        assert!(!strokes.is_empty());
        for stroke in &strokes {
            assert_eq!(stroke.len(), 2);
        }
    }

    #[test]
    fn single_finger_stroke_is_cheaper_than_a_two_finger_stroke() {
        let board = Starboard::default();
        // Same finger (pinky home + off-home).
        let same_finger_cost = board.stroke_cost(SyllabicPosition::Onset, &[0, 1]);
        // Different fingers (pinky home + next finger's home).
        let cross_finger_cost = board.stroke_cost(SyllabicPosition::Onset, &[0, 2]);
        assert!(same_finger_cost < cross_finger_cost);
    }
}
