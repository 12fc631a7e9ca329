//! Chord-assignment local-search optimizer (§4.7), substituting the
//! reference CP-SAT model: no ILP/CP-SAT crate exists anywhere in this
//! crate's corpus, so the same state, constraints, and objective are
//! minimized by a windowed stochastic search seeded from the greedy
//! layout (§4.6), generalized from [`crate::order`]'s permutation moves to
//! reassignment moves.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;

use crate::biphoneme::BiphonemeCollection;
use crate::keyboard::{stroke_is_lower_than, Keyboard, KeyId};
use crate::phoneme::SyllabicPosition;

pub const W_AMB: f64 = 30_000.0;
pub const W_STROKE: f64 = 1.0;
pub const MAX_MULTIPHONEMES: usize = 2_000;
pub const DEFAULT_MOVE_BUDGET: usize = 2_000;

#[derive(Debug, Clone, Copy)]
pub struct OptimizerConfig {
    pub w_amb: f64,
    pub w_stroke: f64,
    pub max_multiphonemes: usize,
    pub move_budget: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            w_amb: W_AMB,
            w_stroke: W_STROKE,
            max_multiphonemes: MAX_MULTIPHONEMES,
            move_budget: DEFAULT_MOVE_BUDGET,
        }
    }
}

/// A multiphoneme ambiguity pair already ranked and truncated to
/// `max_multiphonemes` entries (§4.7 "Use only the top `MAX_MULTIPHONEMES`
/// ... ranked by ambiguity").
pub type MultiphonemePair = ((Vec<char>, Vec<char>), f64);

fn keys_of(stroke_of: &HashMap<char, Vec<KeyId>>, phonemes: &[char]) -> Vec<KeyId> {
    let mut keys: Vec<KeyId> = phonemes
        .iter()
        .filter_map(|p| stroke_of.get(p))
        .flatten()
        .copied()
        .collect();
    keys.sort_unstable();
    keys.dedup();
    keys
}

/// The weighted-sum objective (§4.7 "Objective"), lower is better.
fn objective(
    position: SyllabicPosition,
    stroke_of: &HashMap<char, Vec<KeyId>>,
    keyboard: &Keyboard,
    freq: &dyn Fn(char) -> f64,
    biphonemes: &BiphonemeCollection,
    multiphoneme_pairs: &[MultiphonemePair],
    config: &OptimizerConfig,
) -> f64 {
    let mut stroke_freq: HashMap<&Vec<KeyId>, f64> = HashMap::new();
    for (phoneme, stroke) in stroke_of {
        *stroke_freq.entry(stroke).or_insert(0.0) += freq(*phoneme);
    }
    let stroke_term: f64 = stroke_freq
        .iter()
        .map(|(stroke, total_freq)| keyboard.stroke_cost(position, stroke) as f64 * total_freq)
        .sum();

    let phonemes: Vec<char> = stroke_of.keys().copied().collect();
    let mut order_term = 0.0;
    for i in 0..phonemes.len() {
        for j in (i + 1)..phonemes.len() {
            let (p, q) = (phonemes[i], phonemes[j]);
            let (sp, sq) = (&stroke_of[&p], &stroke_of[&q]);
            if sp == sq {
                continue; // share(p,q): (score(p,q)+score(q,p))/2 == 0, antisymmetric
            }
            order_term += if stroke_is_lower_than(sp, sq) == std::cmp::Ordering::Less {
                biphonemes.order_score(p, q)
            } else {
                biphonemes.order_score(q, p)
            };
        }
    }

    let amb_term: f64 = multiphoneme_pairs
        .iter()
        .map(|((m1, m2), score)| {
            if keys_of(stroke_of, m1) == keys_of(stroke_of, m2) {
                *score
            } else {
                0.0
            }
        })
        .sum();

    config.w_amb * amb_term + config.w_stroke * stroke_term + order_term
}

/// Runs the windowed local search for a single syllabic position, seeded
/// from whatever assignment `keyboard` currently holds at `position`
/// (normally the §4.6 greedy layout), and rewrites the layout with the
/// best assignment found.
#[allow(clippy::too_many_arguments)]
pub fn optimize_chord_assignment(
    position: SyllabicPosition,
    phonemes: &[char],
    freq: &dyn Fn(char) -> f64,
    biphonemes: &BiphonemeCollection,
    multiphoneme_pairs: &[MultiphonemePair],
    keyboard: &mut Keyboard,
    config: &OptimizerConfig,
    seed: u64,
) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut stroke_of: HashMap<char, Vec<KeyId>> = phonemes
        .iter()
        .filter_map(|&p| {
            keyboard
                .strokes_of_phoneme(position, p)
                .into_iter()
                .next()
                .map(|s| (p, s.clone()))
        })
        .collect();
    if stroke_of.is_empty() || phonemes.len() < 2 {
        return;
    }

    let mut best_score = objective(position, &stroke_of, keyboard, freq, biphonemes, multiphoneme_pairs, config);
    let mut scan_without_improvement = 0usize;
    let max_len = keyboard.max_keys_per_phoneme(position).max(1);

    for _ in 0..config.move_budget {
        if scan_without_improvement >= phonemes.len() {
            break;
        }
        let Some(&p) = phonemes.choose(&mut rng) else { break };
        let len = rng.gen_range(1..=max_len);
        let mut candidates = keyboard.possible_strokes(position, len);
        candidates.shuffle(&mut rng);
        let Some(candidate) = candidates.into_iter().next() else {
            scan_without_improvement += 1;
            continue;
        };

        let previous = stroke_of.insert(p, candidate);
        let candidate_score = objective(position, &stroke_of, keyboard, freq, biphonemes, multiphoneme_pairs, config);
        if candidate_score <= best_score {
            best_score = candidate_score;
            scan_without_improvement = 0;
        } else {
            match previous {
                Some(s) => {
                    stroke_of.insert(p, s);
                }
                None => {
                    stroke_of.remove(&p);
                }
            }
            scan_without_improvement += 1;
        }
    }

    keyboard.clear_layout(position);
    let mut grouped: HashMap<Vec<KeyId>, Vec<char>> = HashMap::new();
    for (phoneme, stroke) in stroke_of {
        grouped.entry(stroke).or_default().push(phoneme);
    }
    for (stroke, phonemes) in grouped {
        keyboard.add_to_layout(position, stroke, phonemes);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keyboard::starboard::Starboard;
    use std::sync::Arc;

    #[test]
    fn optimizer_never_increases_the_objective() {
        let position = SyllabicPosition::Onset;
        let mut keyboard = Keyboard::new(Arc::new(Starboard::default())).unwrap();
        let phonemes = ['t', 'r', 'a'];
        for (i, &p) in phonemes.iter().enumerate() {
            keyboard.add_to_layout(position, vec![i as KeyId], vec![p]);
        }
        let mut biphonemes = BiphonemeCollection::new(position);
        biphonemes.pairwise_order_score.insert(('t', 'r'), 5.0);

        let freq = |c: char| match c {
            't' => 10.0,
            'r' => 5.0,
            _ => 1.0,
        };
        let config = OptimizerConfig {
            move_budget: 200,
            ..OptimizerConfig::default()
        };
        let before = objective(
            position,
            &phonemes.iter().map(|&p| (p, keyboard.strokes_of_phoneme(position, p)[0].clone())).collect(),
            &keyboard,
            &freq,
            &biphonemes,
            &[],
            &config,
        );
        optimize_chord_assignment(position, &phonemes, &freq, &biphonemes, &[], &mut keyboard, &config, 11);
        let stroke_of: HashMap<char, Vec<KeyId>> = phonemes
            .iter()
            .map(|&p| (p, keyboard.strokes_of_phoneme(position, p)[0].clone()))
            .collect();
        let after = objective(position, &stroke_of, &keyboard, &freq, &biphonemes, &[], &config);
        assert!(after <= before);
    }
}
