//! Syllable partitioning and the collection that tracks which words
//! realize which syllable (§3 "Syllable", §9 "Cyclic and shared graphs").

use std::collections::HashMap;

use crate::error::LexiconError;
use crate::phoneme::SyllabicPosition;
use crate::stats::StatsContext;

/// Vowel alphabet (nucleus phonemes). Grounded on `grammar.py`'s
/// `nucleusPhonemes` constant (original_source).
pub const VOWELS: &str = "aeiE@o°§uy5O9821";
/// Consonant alphabet, shared between onset and coda. Grounded on
/// `grammar.py`'s `consonantPhonemes` constant (original_source).
pub const CONSONANTS: &str = "RtsplkmdvjnfbZwzSgNG";

pub fn is_vowel(c: char) -> bool {
    VOWELS.contains(c)
}

pub fn is_consonant(c: char) -> bool {
    CONSONANTS.contains(c)
}

pub fn is_known_phoneme(c: char) -> bool {
    is_vowel(c) || is_consonant(c)
}

/// A syllable's phonemes split by position. Invariant: exactly one
/// contiguous nucleus region (§3, §8 "Syllable partition").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyllableParts {
    pub onset: Vec<char>,
    pub nucleus: Vec<char>,
    pub coda: Vec<char>,
}

impl SyllableParts {
    /// Partitions `phonemes` by locating the first and last vowel index.
    /// Returns `None` if there is no vowel at all (rejected at ingestion,
    /// §8 "Empty nucleus").
    pub fn partition(phonemes: &[char]) -> Option<SyllableParts> {
        let first_vowel = phonemes.iter().position(|&c| is_vowel(c))?;
        let last_vowel = phonemes.iter().rposition(|&c| is_vowel(c))?;
        Some(SyllableParts {
            onset: phonemes[..first_vowel].to_vec(),
            nucleus: phonemes[first_vowel..=last_vowel].to_vec(),
            coda: phonemes[last_vowel + 1..].to_vec(),
        })
    }

    pub fn part(&self, position: SyllabicPosition) -> &[char] {
        match position {
            SyllabicPosition::Onset => &self.onset,
            SyllabicPosition::Nucleus => &self.nucleus,
            SyllabicPosition::Coda => &self.coda,
        }
    }

    /// Concatenation of onset + nucleus + coda, equal to the original
    /// phonemic name by construction (§8 "Syllable partition").
    pub fn name(&self) -> String {
        self.onset
            .iter()
            .chain(self.nucleus.iter())
            .chain(self.coda.iter())
            .collect()
    }

    /// Replaces the first contiguous occurrence of `pattern` within
    /// `position`'s substring with `replacement` (possibly empty, for
    /// removal), returning the resulting parts. Used by the ambiguity
    /// analyzer's `replace(s, a, b, pos)` (§4.4).
    pub fn substitute(&self, position: SyllabicPosition, pattern: &[char], replacement: &[char]) -> Option<SyllableParts> {
        let part = self.part(position);
        let start = find_subsequence(part, pattern)?;
        let mut new_part = part[..start].to_vec();
        new_part.extend_from_slice(replacement);
        new_part.extend_from_slice(&part[start + pattern.len()..]);

        let mut result = self.clone();
        match position {
            SyllabicPosition::Onset => result.onset = new_part,
            SyllabicPosition::Nucleus => result.nucleus = new_part,
            SyllabicPosition::Coda => result.coda = new_part,
        }
        Some(result)
    }

    pub fn contains(&self, position: SyllabicPosition, pattern: &[char]) -> bool {
        find_subsequence(self.part(position), pattern).is_some()
    }
}

fn find_subsequence(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[derive(Debug, Clone)]
pub struct Syllable {
    pub parts: SyllableParts,
    pub frequency: f64,
    pub spellings: HashMap<String, f64>,
    /// phonology string (the owning word's full phonetic transcription) ->
    /// indices into the word arena.
    pub phono_words: HashMap<String, Vec<usize>>,
}

impl Syllable {
    fn new(parts: SyllableParts) -> Self {
        Syllable {
            parts,
            frequency: 0.0,
            spellings: HashMap::new(),
            phono_words: HashMap::new(),
        }
    }

    pub fn name(&self) -> String {
        self.parts.name()
    }

    pub fn track_word(&mut self, phonology: &str, word_index: usize) {
        self.phono_words
            .entry(phonology.to_owned())
            .or_default()
            .push(word_index);
    }
}

/// All syllables observed during ingestion, keyed by phonemic name.
#[derive(Debug, Clone, Default)]
pub struct SyllableCollection {
    syllables: HashMap<String, Syllable>,
}

impl SyllableCollection {
    pub fn new() -> Self {
        SyllableCollection {
            syllables: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Syllable> {
        self.syllables.get(name)
    }

    pub fn frequency(&self, name: &str) -> f64 {
        self.syllables.get(name).map(|s| s.frequency).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.syllables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.syllables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Syllable> {
        self.syllables.values()
    }

    /// Registers one occurrence of a syllable, growing the process-wide
    /// phoneme/biphoneme statistics (§4.2) and recording the spelling,
    /// frequency, and owning word.
    #[allow(clippy::too_many_arguments)]
    pub fn update_syllable(
        &mut self,
        phonemes: &[char],
        spelling: &str,
        amount: f64,
        phonology: &str,
        word_index: usize,
        stats: &mut StatsContext,
        word_for_errors: &str,
    ) -> Result<&mut Syllable, LexiconError> {
        for &symbol in phonemes {
            if !is_known_phoneme(symbol) {
                return Err(LexiconError::UnknownPhoneme {
                    word: word_for_errors.to_owned(),
                    symbol,
                });
            }
        }
        let parts = SyllableParts::partition(phonemes).ok_or_else(|| LexiconError::EmptyNucleus {
            word: word_for_errors.to_owned(),
            syllable: phonemes.iter().collect(),
        })?;
        let name = parts.name();
        let syllable = self
            .syllables
            .entry(name)
            .or_insert_with(|| Syllable::new(parts));
        syllable.frequency += amount;
        *syllable.spellings.entry(spelling.to_owned()).or_insert(0.0) += amount;
        syllable.track_word(phonology, word_index);

        // Propagate the increment to every embedded phoneme/biphoneme
        // exactly once, whether the syllable was just created or is being
        // re-observed with another spelling (§4.2).
        for position in SyllabicPosition::ALL {
            let part = syllable.parts.part(position);
            stats.register_part(position, part, amount);
        }
        Ok(syllable)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partition_finds_onset_nucleus_coda() {
        let phonemes: Vec<char> = "tra".chars().collect();
        let parts = SyllableParts::partition(&phonemes).unwrap();
        assert_eq!(parts.onset, vec!['t', 'r']);
        assert_eq!(parts.nucleus, vec!['a']);
        assert!(parts.coda.is_empty());
        assert_eq!(parts.name(), "tra");
    }

    #[test]
    fn partition_rejects_empty_nucleus() {
        let phonemes: Vec<char> = "trs".chars().collect();
        assert!(SyllableParts::partition(&phonemes).is_none());
    }

    #[test]
    fn update_syllable_accumulates_frequency_across_spellings() {
        let mut stats = StatsContext::new();
        let mut syllables = SyllableCollection::new();
        let phonemes: Vec<char> = "tRa".chars().collect();
        syllables
            .update_syllable(&phonemes, "tra", 3.0, "tRa", 0, &mut stats, "word")
            .unwrap();
        syllables
            .update_syllable(&phonemes, "trah", 2.0, "tRa", 1, &mut stats, "word")
            .unwrap();
        assert_eq!(syllables.frequency("tRa"), 5.0);
        let syllable = syllables.get("tRa").unwrap();
        assert_eq!(syllable.spellings.get("tra"), Some(&3.0));
        assert_eq!(syllable.spellings.get("trah"), Some(&2.0));
    }

    #[test]
    fn update_syllable_rejects_unknown_phoneme() {
        let mut stats = StatsContext::new();
        let mut syllables = SyllableCollection::new();
        let phonemes: Vec<char> = "tqa".chars().collect();
        let err = syllables
            .update_syllable(&phonemes, "tqa", 1.0, "tqa", 0, &mut stats, "word")
            .unwrap_err();
        assert!(matches!(err, LexiconError::UnknownPhoneme { .. }));
    }
}
