//! Theory builder (§4.8): maps every lexicon word to its chord sequence
//! and groups homophones.

use std::collections::HashMap;

use crate::error::TheoryError;
use crate::keyboard::{strokes_to_string, Keyboard, KeyId};
use crate::lexicon::Dictionary;
use crate::phoneme::SyllabicPosition;
use crate::syllable::SyllableParts;

/// A word's full chord sequence: one concatenated key tuple per syllable.
pub type ChordSequence = Vec<Vec<KeyId>>;

/// Renders a chord sequence the same way [`Theory::render_tsv`] does, for
/// the CLI's final summary (§7 "User-visible behavior").
pub fn render_chord_sequence(sequence: &ChordSequence) -> String {
    sequence
        .iter()
        .map(|stroke| strokes_to_string(stroke))
        .collect::<Vec<_>>()
        .join(" / ")
}

#[derive(Debug, Default)]
pub struct Theory {
    /// chord-sequence -> indices of words producing it.
    pub groups: HashMap<ChordSequence, Vec<usize>>,
    pub max_ambiguity_key: Option<ChordSequence>,
    pub max_frequency_ambiguity_key: Option<ChordSequence>,
}

impl Theory {
    /// Homophone groups: entries whose word list contains more than one
    /// distinct orthograph (§3 "Theory").
    pub fn homophone_groups<'a>(&'a self, dictionary: &'a Dictionary) -> Vec<(&'a ChordSequence, Vec<usize>)> {
        self.groups
            .iter()
            .filter(|(_, indices)| {
                let mut orthographs: Vec<&str> = indices
                    .iter()
                    .filter_map(|&i| dictionary.get(i))
                    .map(|w| w.ortho.as_str())
                    .collect();
                orthographs.sort_unstable();
                orthographs.dedup();
                orthographs.len() > 1
            })
            .map(|(k, v)| (k, v.clone()))
            .collect()
    }

    pub fn render_tsv(&self, dictionary: &Dictionary) -> String {
        let mut out = String::from("strokes\twords\n");
        let mut rows: Vec<(String, String)> = self
            .groups
            .iter()
            .map(|(sequence, indices)| {
                let strokes = sequence
                    .iter()
                    .map(|stroke| strokes_to_string(stroke))
                    .collect::<Vec<_>>()
                    .join(" / ");
                let mut words: Vec<&str> = indices
                    .iter()
                    .filter_map(|&i| dictionary.get(i))
                    .map(|w| w.ortho.as_str())
                    .collect();
                words.sort_unstable();
                words.dedup();
                (strokes, words.join(","))
            })
            .collect();
        rows.sort();
        for (strokes, words) in rows {
            out.push_str(&strokes);
            out.push('\t');
            out.push_str(&words);
            out.push('\n');
        }
        out
    }
}

/// Builds the theory map for every word in `dictionary`, given each word's
/// pre-split syllable parts (caller derives these from `syll_cv` via
/// [`SyllableParts::partition`]).
pub fn build_theory(
    dictionary: &Dictionary,
    keyboard: &Keyboard,
    word_syllables: &HashMap<usize, Vec<SyllableParts>>,
) -> Result<Theory, TheoryError> {
    let mut theory = Theory::default();
    let mut group_frequency: HashMap<ChordSequence, f64> = HashMap::new();

    for (&word_index, syllables) in word_syllables {
        let word = match dictionary.get(word_index) {
            Some(w) => w,
            None => continue,
        };
        let mut sequence = ChordSequence::new();
        for parts in syllables {
            let strokes = keyboard.stroke_of_syllable_by_part(parts).ok_or_else(|| {
                let missing = SyllabicPosition::ALL
                    .into_iter()
                    .find(|&position| {
                        let phonemes = parts.part(position);
                        !phonemes.is_empty() && keyboard.strokes_of_phoneme(position, phonemes[0]).is_empty()
                    })
                    .unwrap_or(SyllabicPosition::Onset);
                TheoryError::MissingStroke {
                    word: word.ortho.clone(),
                    phoneme: parts.part(missing).first().copied().unwrap_or('?'),
                    position: missing.as_str(),
                }
            })?;
            let mut concatenated: Vec<KeyId> = Vec::new();
            for &position in &SyllabicPosition::ALL {
                if let Some(stroke) = strokes.get(&position) {
                    concatenated.extend_from_slice(stroke);
                }
            }
            sequence.push(concatenated);
        }

        theory.groups.entry(sequence.clone()).or_default().push(word_index);
        *group_frequency.entry(sequence).or_insert(0.0) += word.frequency();
    }

    theory.max_ambiguity_key = theory
        .groups
        .iter()
        .max_by_key(|(_, words)| words.len())
        .map(|(key, _)| key.clone());
    theory.max_frequency_ambiguity_key = group_frequency
        .iter()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .map(|(key, _)| key.clone());

    Ok(theory)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keyboard::starboard::Starboard;
    use crate::lexicon::word::{GramCat, Word};
    use crate::phoneme::SyllabicPosition as Pos;
    use std::sync::Arc;

    fn make_word(ortho: &str) -> Word {
        Word {
            ortho: ortho.to_owned(),
            phonology: ortho.to_owned(),
            lemma: ortho.to_owned(),
            gram_cat: GramCat::Nom,
            cgram_ortho: vec!["NOM".to_owned()],
            gender: None,
            number: None,
            conjugations: vec![],
            syll_cv: vec![],
            orthosyll_cv: vec![],
            freq_books: 1.0,
            freq_films: 1.0,
        }
    }

    #[test]
    fn two_words_sharing_a_chord_sequence_form_a_homophone_group() {
        let mut keyboard = Keyboard::new(Arc::new(Starboard::default())).unwrap();
        keyboard.add_to_layout(Pos::Onset, vec![0], vec!['t']);
        keyboard.add_to_layout(Pos::Nucleus, vec![8], vec!['a']);

        let mut dictionary = Dictionary::new();
        let idx_a = dictionary.push(make_word("ta"));
        let idx_b = dictionary.push(make_word("tha"));

        let parts = SyllableParts::partition(&['t', 'a']).unwrap();
        let mut word_syllables = HashMap::new();
        word_syllables.insert(idx_a, vec![parts.clone()]);
        word_syllables.insert(idx_b, vec![parts]);

        let theory = build_theory(&dictionary, &keyboard, &word_syllables).unwrap();
        assert_eq!(theory.groups.len(), 1);
        let homophones = theory.homophone_groups(&dictionary);
        assert_eq!(homophones.len(), 1);
        assert_eq!(homophones[0].1.len(), 2);
    }

    #[test]
    fn missing_stroke_is_reported_as_theory_error() {
        let keyboard = Keyboard::new(Arc::new(Starboard::default())).unwrap();
        let mut dictionary = Dictionary::new();
        let idx = dictionary.push(make_word("ta"));
        let parts = SyllableParts::partition(&['t', 'a']).unwrap();
        let mut word_syllables = HashMap::new();
        word_syllables.insert(idx, vec![parts]);

        let err = build_theory(&dictionary, &keyboard, &word_syllables).unwrap_err();
        assert!(matches!(err, TheoryError::MissingStroke { .. }));
    }
}
