//! Syllabic, lexical, and multiphoneme ambiguity analyzers (§4.4).

use std::collections::HashMap;

use rayon::prelude::*;

use crate::lexicon::Dictionary;
use crate::phoneme::SyllabicPosition;
use crate::syllable::SyllableCollection;

fn two_smallest_sum(mut values: [f64; 3]) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    values[0] + values[1]
}

/// Syllable-level ambiguity between two patterns (single phonemes in the
/// public API; multiphoneme tuples share this same implementation, §4.4
/// "Multiphoneme ambiguity").
fn syllabic_ambiguity_pattern(
    p1: &[char],
    p2: &[char],
    position: SyllabicPosition,
    syllables: &SyllableCollection,
) -> f64 {
    if p1 == p2 {
        return 0.0;
    }
    let mut score = 0.0;
    for syllable in syllables.iter() {
        if !syllable.parts.contains(position, p1) {
            continue;
        }
        let freq_s = syllable.frequency;
        if syllable.parts.contains(position, p2) {
            let removed_p1 = syllable
                .parts
                .substitute(position, p1, &[])
                .map(|parts| syllables.frequency(&parts.name()))
                .unwrap_or(0.0);
            let removed_p2 = syllable
                .parts
                .substitute(position, p2, &[])
                .map(|parts| syllables.frequency(&parts.name()))
                .unwrap_or(0.0);
            score += freq_s + removed_p1 + removed_p2 - freq_s.max(removed_p1).max(removed_p2);
        } else {
            let substituted = syllable
                .parts
                .substitute(position, p1, p2)
                .map(|parts| syllables.frequency(&parts.name()))
                .unwrap_or(0.0);
            score += freq_s.min(substituted);
        }
    }
    score
}

/// Word-group frequency for a syllable's phonology entry, after an
/// optional substitution of `pattern` -> `replacement` at `position`
/// within that syllable. Returns 0.0 when the substituted syllable is not
/// attested in the collection.
fn group_frequency(
    syllable_name: &str,
    phonology: &str,
    position: SyllabicPosition,
    pattern: &[char],
    replacement: &[char],
    syllables: &SyllableCollection,
    dictionary: &Dictionary,
) -> f64 {
    let syllable = match syllables.get(syllable_name) {
        Some(s) => s,
        None => return 0.0,
    };
    let substituted_name = match syllable.parts.substitute(position, pattern, replacement) {
        Some(parts) => parts.name(),
        None => return 0.0,
    };
    let substituted_phonology = crate::lexicon::word::replace_syllables(
        phonology,
        syllable_name,
        &substituted_name,
    );
    let target = match syllables.get(&substituted_name) {
        Some(s) => s,
        None => return 0.0,
    };
    target
        .phono_words
        .get(&substituted_phonology)
        .map(|indices| {
            indices
                .iter()
                .filter_map(|&i| dictionary.get(i))
                .map(|w| w.frequency())
                .sum()
        })
        .unwrap_or(0.0)
}

fn lexical_ambiguity_pattern(
    p1: &[char],
    p2: &[char],
    position: SyllabicPosition,
    syllables: &SyllableCollection,
    dictionary: &Dictionary,
) -> f64 {
    if p1 == p2 {
        return 0.0;
    }
    let mut score = 0.0;
    for syllable in syllables.iter() {
        if !syllable.parts.contains(position, p1) {
            continue;
        }
        let name = syllable.name();
        let has_p2 = syllable.parts.contains(position, p2);
        for (phonology, indices) in syllable.phono_words.iter() {
            let base: f64 = indices
                .iter()
                .filter_map(|&i| dictionary.get(i))
                .map(|w| w.frequency())
                .sum();

            if has_p2 {
                let removed_p1 = group_frequency(&name, phonology, position, p1, &[], syllables, dictionary);
                let removed_p2 = group_frequency(&name, phonology, position, p2, &[], syllables, dictionary);
                score += two_smallest_sum([base, removed_p1, removed_p2]);
            } else {
                let substituted = group_frequency(&name, phonology, position, p1, p2, syllables, dictionary);
                if substituted > 0.0 {
                    score += base.min(substituted);
                }
            }
        }
    }
    score
}

/// Syllabic ambiguity between two single phonemes (§4.4 "Syllabic
/// ambiguity").
pub fn syllabic_ambiguity_score(
    p1: char,
    p2: char,
    position: SyllabicPosition,
    syllables: &SyllableCollection,
) -> f64 {
    syllabic_ambiguity_pattern(&[p1], &[p2], position, syllables)
}

/// Lexical ambiguity between two single phonemes (§4.4 "Lexical
/// ambiguity").
pub fn lexical_ambiguity_score(
    p1: char,
    p2: char,
    position: SyllabicPosition,
    syllables: &SyllableCollection,
    dictionary: &Dictionary,
) -> f64 {
    lexical_ambiguity_pattern(&[p1], &[p2], position, syllables, dictionary)
}

/// Lexical ambiguity between two ordered multiphoneme tuples of equal
/// arity from the same position (§4.4 "Multiphoneme ambiguity").
pub fn multiphoneme_lexical_ambiguity(
    m1: &[char],
    m2: &[char],
    position: SyllabicPosition,
    syllables: &SyllableCollection,
    dictionary: &Dictionary,
) -> f64 {
    lexical_ambiguity_pattern(m1, m2, position, syllables, dictionary)
}

/// Every phoneme pair present at `position`, ranked by increasing
/// syllabic ambiguity (§4.4 "All three analyses emit ... sorted by
/// increasing ambiguity").
pub fn syllabic_ambiguity_table(
    position: SyllabicPosition,
    phonemes: &[char],
    syllables: &SyllableCollection,
) -> Vec<((char, char), f64)> {
    let pairs: Vec<(char, char)> = phoneme_pairs(phonemes);
    let mut table: Vec<((char, char), f64)> = pairs
        .par_iter()
        .map(|&(a, b)| ((a, b), syllabic_ambiguity_score(a, b, position, syllables)))
        .collect();
    table.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    table
}

pub fn lexical_ambiguity_table(
    position: SyllabicPosition,
    phonemes: &[char],
    syllables: &SyllableCollection,
    dictionary: &Dictionary,
) -> Vec<((char, char), f64)> {
    let pairs: Vec<(char, char)> = phoneme_pairs(phonemes);
    let mut table: Vec<((char, char), f64)> = pairs
        .par_iter()
        .map(|&(a, b)| ((a, b), lexical_ambiguity_score(a, b, position, syllables, dictionary)))
        .collect();
    table.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    table
}

fn phoneme_pairs(phonemes: &[char]) -> Vec<(char, char)> {
    let mut pairs = Vec::new();
    for i in 0..phonemes.len() {
        for j in (i + 1)..phonemes.len() {
            pairs.push((phonemes[i], phonemes[j]));
        }
    }
    pairs
}

/// Runs the three per-position syllabic-ambiguity sweeps in parallel
/// (§5 item 2), returning one table per position.
pub fn analyse_syllabic_ambiguity(
    phonemes_by_position: &HashMap<SyllabicPosition, Vec<char>>,
    syllables: &SyllableCollection,
) -> HashMap<SyllabicPosition, Vec<((char, char), f64)>> {
    SyllabicPosition::ALL
        .par_iter()
        .map(|&position| {
            let phonemes = phonemes_by_position.get(&position).cloned().unwrap_or_default();
            (position, syllabic_ambiguity_table(position, &phonemes, syllables))
        })
        .collect()
}

/// Runs the three per-position lexical-ambiguity sweeps in parallel
/// (§5 item 3).
pub fn analyse_lexical_ambiguity(
    phonemes_by_position: &HashMap<SyllabicPosition, Vec<char>>,
    syllables: &SyllableCollection,
    dictionary: &Dictionary,
) -> HashMap<SyllabicPosition, Vec<((char, char), f64)>> {
    SyllabicPosition::ALL
        .par_iter()
        .map(|&position| {
            let phonemes = phonemes_by_position.get(&position).cloned().unwrap_or_default();
            (
                position,
                lexical_ambiguity_table(position, &phonemes, syllables, dictionary),
            )
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexicon::word::{GramCat, Word};
    use crate::stats::StatsContext;

    fn make_word(ortho: &str, phonology: &str, freq: f64) -> Word {
        Word {
            ortho: ortho.to_owned(),
            phonology: phonology.to_owned(),
            lemma: ortho.to_owned(),
            gram_cat: GramCat::Nom,
            cgram_ortho: vec!["NOM".to_owned()],
            gender: None,
            number: None,
            conjugations: vec![],
            syll_cv: vec![],
            orthosyll_cv: vec![],
            freq_books: freq,
            freq_films: freq,
        }
    }

    #[test]
    fn ambiguity_of_identical_phoneme_is_zero() {
        let syllables = SyllableCollection::new();
        assert_eq!(
            syllabic_ambiguity_score('a', 'a', SyllabicPosition::Onset, &syllables),
            0.0
        );
    }

    #[test]
    fn syllabic_ambiguity_detects_substitution_collision() {
        let mut stats = StatsContext::new();
        let mut syllables = SyllableCollection::new();
        let ta: Vec<char> = "ta".chars().collect();
        let ma: Vec<char> = "ma".chars().collect();
        syllables
            .update_syllable(&ta, "ta", 10.0, "ta", 0, &mut stats, "w1")
            .unwrap();
        syllables
            .update_syllable(&ma, "ma", 1.0, "ma", 1, &mut stats, "w2")
            .unwrap();
        let score = syllabic_ambiguity_score('t', 'm', SyllabicPosition::Onset, &syllables);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn lexical_ambiguity_counts_word_frequency_of_substituted_group() {
        let mut stats = StatsContext::new();
        let mut syllables = SyllableCollection::new();
        let mut dictionary = Dictionary::new();
        let ta: Vec<char> = "ta".chars().collect();
        let ma: Vec<char> = "ma".chars().collect();

        let idx0 = dictionary.push(make_word("ta", "ta", 10.0));
        syllables
            .update_syllable(&ta, "ta", 10.0, "ta", idx0, &mut stats, "ta")
            .unwrap();

        let idx1 = dictionary.push(make_word("ma", "ma", 4.0));
        syllables
            .update_syllable(&ma, "ma", 4.0, "ma", idx1, &mut stats, "ma")
            .unwrap();

        let score = lexical_ambiguity_score('t', 'm', SyllabicPosition::Onset, &syllables, &dictionary);
        assert_eq!(score, 4.0);
    }
}
