//! Greedy seed chord assignment (§4.6): a feasible starting layout that
//! the local-search optimizer (§4.7) then refines.

use std::collections::HashMap;

use crate::keyboard::{Keyboard, KeyId};
use crate::phoneme::{PhonemeCollection, SyllabicPosition};

/// The reference overuse threshold, `2 + 2·(len−2)` (§4.6 step 2), exposed
/// so `PipelineConfig` can override it.
pub fn default_overuse_threshold(len: usize) -> usize {
    2 + 2 * len.saturating_sub(2)
}

/// Phonemes ordered by the optimized permutation first, frequency-sorted
/// stragglers appended (§4.6 step 1, "phonemes absent from the
/// permutation appended at the end").
fn priority_order(phonemes: &PhonemeCollection, best_permutation: &str) -> Vec<char> {
    let mut ordered: Vec<char> = best_permutation.chars().filter(|c| phonemes.get(*c).is_some()).collect();
    let mut seen: std::collections::HashSet<char> = ordered.iter().copied().collect();
    for symbol in phonemes.by_frequency_desc() {
        if seen.insert(symbol) {
            ordered.push(symbol);
        }
    }
    ordered
}

/// Builds the greedy seed layout for a single syllabic position, mutating
/// `keyboard` in place.
pub fn build_seed_layout(
    position: SyllabicPosition,
    phonemes: &PhonemeCollection,
    best_permutation: &str,
    lexical_ambiguity: &[((char, char), f64)],
    keyboard: &mut Keyboard,
    overuse_threshold: &dyn Fn(usize) -> usize,
) -> Vec<char> {
    let order = priority_order(phonemes, best_permutation);
    let mut remaining: Vec<char> = order.clone();
    let mut key_usage: HashMap<KeyId, usize> = HashMap::new();

    // Step 1: single-key strokes.
    let single_key_strokes = keyboard.possible_strokes(position, 1);
    let single_key_count = single_key_strokes.len().min(remaining.len());
    for (stroke, &phoneme) in single_key_strokes.into_iter().zip(order.iter()).take(single_key_count) {
        for &key in &stroke {
            *key_usage.entry(key).or_insert(0) += 1;
        }
        keyboard.add_to_layout(position, stroke, vec![phoneme]);
    }
    remaining.drain(0..single_key_count);

    // Step 2: multi-key strokes, shortest first.
    for len in 2..=4usize {
        if remaining.is_empty() {
            break;
        }
        let threshold = overuse_threshold(len);
        let mut pool = keyboard.possible_strokes(position, len);
        pool.sort_by(|a, b| crate::keyboard::stroke_is_lower_than(a, b));

        let mut still_remaining = Vec::new();
        for phoneme in remaining.drain(..) {
            let slot = pool.iter().position(|stroke| {
                stroke
                    .iter()
                    .all(|key| *key_usage.get(key).unwrap_or(&0) < threshold)
            });
            match slot {
                Some(i) => {
                    let stroke = pool.remove(i);
                    for &key in &stroke {
                        *key_usage.entry(key).or_insert(0) += 1;
                    }
                    keyboard.add_to_layout(position, stroke, vec![phoneme]);
                }
                None => still_remaining.push(phoneme),
            }
        }
        remaining = still_remaining;
    }

    // Step 3: share a stroke with the lowest-ambiguity already-placed partner.
    let mut unplaceable = Vec::new();
    for phoneme in remaining {
        let partner = lexical_ambiguity
            .iter()
            .filter(|((a, b), _)| *a == phoneme || *b == phoneme)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        let shared = partner.and_then(|((a, b), _)| {
            let other = if *a == phoneme { *b } else { *a };
            let strokes = keyboard.strokes_of_phoneme(position, other);
            strokes
                .into_iter()
                .find(|stroke| keyboard.phonemes_of_stroke(position, stroke).map(|p| p.len()) == Some(1))
                .cloned()
        });
        match shared {
            Some(stroke) => {
                let mut phonemes = keyboard.phonemes_of_stroke(position, &stroke).unwrap().to_vec();
                phonemes.push(phoneme);
                keyboard.add_to_layout(position, stroke, phonemes);
            }
            None => unplaceable.push(phoneme),
        }
    }

    unplaceable
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keyboard::starboard::Starboard;
    use std::sync::Arc;

    #[test]
    fn single_key_strokes_are_filled_by_frequency_order() {
        let mut phonemes = PhonemeCollection::new(SyllabicPosition::Nucleus);
        phonemes.register('a', 5.0, 0, 1);
        phonemes.register('e', 3.0, 0, 1);
        let mut keyboard = Keyboard::new(Arc::new(Starboard::default())).unwrap();
        let unplaceable = build_seed_layout(
            SyllabicPosition::Nucleus,
            &phonemes,
            "",
            &[],
            &mut keyboard,
            &default_overuse_threshold,
        );
        assert!(unplaceable.is_empty());
        assert!(!keyboard.strokes_of_phoneme(SyllabicPosition::Nucleus, 'a').is_empty());
        assert!(!keyboard.strokes_of_phoneme(SyllabicPosition::Nucleus, 'e').is_empty());
    }

    #[test]
    fn overuse_threshold_matches_reference_formula() {
        assert_eq!(default_overuse_threshold(2), 2);
        assert_eq!(default_overuse_threshold(3), 4);
        assert_eq!(default_overuse_threshold(4), 6);
    }
}
