//! Stochastic phoneme-order optimizer (§4.3).

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;

use crate::biphoneme::{BiphonemeCollection, Order};
use crate::phoneme::PhonemeCollection;

pub const WINDOW_SCANS: usize = 400;
pub const WINDOW_SIZE: usize = 4;
pub const MIN_SHUFFLE: usize = 2;
pub const MAX_SHUFFLE: usize = 7;

/// `score(π) = Σ freq(a,b) · sign(π(b) − π(a))` (§4.3).
pub fn score_permutation(permutation: &[char], biphonemes: &BiphonemeCollection) -> f64 {
    let position: std::collections::HashMap<char, usize> = permutation
        .iter()
        .enumerate()
        .map(|(i, &c)| (c, i))
        .collect();
    biphonemes
        .iter()
        .map(|pair| {
            let (a, b) = pair.pair;
            match (position.get(&a), position.get(&b)) {
                (Some(&pa), Some(&pb)) if pa != pb => {
                    pair.frequency * if pb > pa { 1.0 } else { -1.0 }
                }
                _ => 0.0,
            }
        })
        .sum()
}

fn all_permutations_4(window: &[char; WINDOW_SIZE]) -> Vec<[char; WINDOW_SIZE]> {
    let mut items = *window;
    let mut out = Vec::with_capacity(24);
    permute(&mut items, 0, &mut out);
    out
}

fn permute(items: &mut [char; WINDOW_SIZE], k: usize, out: &mut Vec<[char; WINDOW_SIZE]>) {
    if k == items.len() {
        out.push(*items);
        return;
    }
    for i in k..items.len() {
        items.swap(k, i);
        permute(items, k + 1, out);
        items.swap(k, i);
    }
}

/// Slides a length-4 window across `permutation`, left to right, trying
/// every window permutation and keeping the best-scoring reassembly.
fn window_scan(
    permutation: &[char],
    biphonemes: &BiphonemeCollection,
    reverse: bool,
) -> (Vec<char>, f64) {
    let mut best = permutation.to_vec();
    let mut best_score = score_permutation(&best, biphonemes);
    if best.len() < WINDOW_SIZE {
        return (best, best_score);
    }

    let positions: Vec<usize> = if reverse {
        (0..=best.len() - WINDOW_SIZE).rev().collect()
    } else {
        (0..=best.len() - WINDOW_SIZE).collect()
    };

    for start in positions {
        let window: [char; WINDOW_SIZE] = best[start..start + WINDOW_SIZE].try_into().unwrap();
        for candidate_window in all_permutations_4(&window) {
            let mut candidate = best.clone();
            candidate[start..start + WINDOW_SIZE].copy_from_slice(&candidate_window);
            let candidate_score = score_permutation(&candidate, biphonemes);
            if candidate_score > best_score {
                best = candidate;
                best_score = candidate_score;
            }
        }
    }
    (best, best_score)
}

/// Randomly rotates `k` contiguous positions of `permutation`, starting at
/// a random offset.
fn random_rotation(permutation: &[char], k: usize, rng: &mut StdRng) -> Vec<char> {
    if permutation.len() < 2 || k < 2 {
        return permutation.to_vec();
    }
    let k = k.min(permutation.len());
    let start = (0..permutation.len()).collect::<Vec<_>>();
    let offset = *start.choose(rng).unwrap();
    let mut result = permutation.to_vec();
    let mut segment: Vec<char> = (0..k).map(|i| permutation[(offset + i) % permutation.len()]).collect();
    segment.rotate_left(1);
    for (i, c) in segment.into_iter().enumerate() {
        result[(offset + i) % permutation.len()] = c;
    }
    result
}

/// Runs the windowed stochastic search for a single syllabic position and
/// returns `(best_permutation, best_score)` (§4.3 "Algorithm").
pub fn optimize_order(phonemes: &PhonemeCollection, biphonemes: &BiphonemeCollection, seed: u64) -> (Vec<char>, f64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut symbols: Vec<char> = phonemes.symbols().collect();
    symbols.shuffle(&mut rng);

    if symbols.len() <= 1 {
        return (symbols, 0.0);
    }

    let mut best = symbols;
    let mut best_score = score_permutation(&best, biphonemes);

    for _ in 0..WINDOW_SCANS {
        let k = rng.gen_range(MIN_SHUFFLE..MAX_SHUFFLE);
        let candidate = random_rotation(&best, k, &mut rng);
        let (forward, forward_score) = window_scan(&candidate, biphonemes, false);
        let (backward, backward_score) = window_scan(&candidate, biphonemes, true);
        let (round_best, round_score) = if forward_score >= backward_score {
            (forward, forward_score)
        } else {
            (backward, backward_score)
        };
        if round_score > best_score {
            best = round_best;
            best_score = round_score;
        }
    }

    (best, best_score)
}

/// Derives the pairwise order matrix from the optimized permutation (§4.3
/// "Pairwise matrix"): for every unordered pair, swap the two symbols in
/// the best permutation and compare the two resulting scores.
pub fn build_order_matrix(permutation: &[char], biphonemes: &mut BiphonemeCollection) {
    for i in 0..permutation.len() {
        for j in (i + 1)..permutation.len() {
            let a = permutation[i];
            let b = permutation[j];
            let mut swapped = permutation.to_vec();
            swapped.swap(i, j);
            let score_a_before_b = score_permutation(permutation, biphonemes);
            let score_b_before_a = score_permutation(&swapped, biphonemes);
            let delta = score_a_before_b - score_b_before_a;
            let order = if delta > 0.0 {
                Order::Greater
            } else if delta < 0.0 {
                Order::Less
            } else {
                Order::Equal
            };
            biphonemes.pairwise_order.insert((a, b), order);
            biphonemes.pairwise_order_score.insert((a, b), delta);
        }
    }
    biphonemes.best_permutation = permutation.iter().collect();
    biphonemes.best_permutation_score = score_permutation(permutation, biphonemes);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::phoneme::SyllabicPosition;

    #[test]
    fn single_phoneme_position_scores_zero() {
        let mut phonemes = PhonemeCollection::new(SyllabicPosition::Onset);
        phonemes.register('a', 1.0, 0, 1);
        let biphonemes = BiphonemeCollection::new(SyllabicPosition::Onset);
        let (perm, score) = optimize_order(&phonemes, &biphonemes, 42);
        assert_eq!(perm, vec!['a']);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn optimizer_is_no_worse_than_a_random_start() {
        let mut phonemes = PhonemeCollection::new(SyllabicPosition::Onset);
        for c in ['a', 'b', 'c', 'd', 'e'] {
            phonemes.register(c, 1.0, 0, 1);
        }
        let mut biphonemes = BiphonemeCollection::new(SyllabicPosition::Onset);
        biphonemes.register('a', 'b', 10.0);
        biphonemes.register('b', 'c', 8.0);
        biphonemes.register('c', 'd', 6.0);
        biphonemes.register('d', 'e', 4.0);

        let mut rng = StdRng::seed_from_u64(7);
        let mut initial: Vec<char> = phonemes.symbols().collect();
        initial.shuffle(&mut rng);
        let initial_score = score_permutation(&initial, &biphonemes);

        let (_, optimized_score) = optimize_order(&phonemes, &biphonemes, 7);
        assert!(optimized_score >= initial_score);
    }

    #[test]
    fn build_order_matrix_is_antisymmetric() {
        let permutation = vec!['a', 'b', 'c'];
        let mut biphonemes = BiphonemeCollection::new(SyllabicPosition::Onset);
        biphonemes.register('a', 'b', 5.0);
        build_order_matrix(&permutation, &mut biphonemes);
        let score_ab = *biphonemes.pairwise_order_score.get(&('a', 'b')).unwrap();
        assert!(score_ab > 0.0);
        assert_eq!(biphonemes.order('a', 'b'), Order::Greater);
        assert_eq!(biphonemes.order('b', 'a'), Order::Less);
    }
}
