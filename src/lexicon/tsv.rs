//! Lexicon TSV ingestion (§6 "Lexicon TSV (wordSource)").

use std::collections::{HashMap, HashSet};
use std::io::Read;

use crate::error::LexiconError;
use crate::lexicon::word::{fix_e_n_en, parse_info_verb, split_phonemes, split_syllabified};
use crate::lexicon::{Dictionary, GramCat, Gender, Number, Word};
use crate::stats::StatsContext;
use crate::syllable::SyllableCollection;

const REQUIRED_COLUMNS: &[&str] = &[
    "ortho",
    "phon",
    "lemme",
    "cgram",
    "cgramortho",
    "genre",
    "nombre",
    "infover",
    "syll_cv",
    "orthosyll_cv",
    "freqlivres",
    "freqfilms2",
];

pub struct IngestResult {
    pub dictionary: Dictionary,
    pub syllables: SyllableCollection,
    pub stats: StatsContext,
    pub errors: Vec<LexiconError>,
}

/// Parses a tab-separated lexicon stream into a [`Dictionary`], the
/// syllable/phoneme statistics it produces, and the list of rows skipped
/// for malformed data (§7 "Malformed lexicon row").
///
/// `frequent_words` names orthographs that still count toward the word
/// total but are excluded from syllable-frequency statistics (§6
/// "Frequent-word file").
pub fn ingest_lexicon<R: Read>(reader: R, frequent_words: &HashSet<String>) -> Result<IngestResult, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column_index: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect();

    let mut dictionary = Dictionary::new();
    let mut syllables = SyllableCollection::new();
    let mut stats = StatsContext::new();
    let mut errors = Vec::new();

    for (row_number, record) in csv_reader.records().enumerate() {
        let record = record?;
        let row = row_number + 2; // 1-indexed, header occupies line 1

        let field = |name: &'static str| -> Result<&str, LexiconError> {
            column_index
                .get(name)
                .and_then(|&i| record.get(i))
                .filter(|s| !s.is_empty())
                .ok_or(LexiconError::MissingColumn { row, column: name })
        };

        let ortho = match field("ortho") {
            Ok(v) => v,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };
        if ortho.starts_with('#') {
            continue;
        }

        match parse_row(row, ortho, &field) {
            Ok(word) => {
                let word_phonology = word.phonology.clone();
                let word_ortho = word.ortho.clone();
                let syll_cv = word.syll_cv.clone();
                let orthosyll_cv = word.orthosyll_cv.clone();
                let freq = word.frequency();
                let is_frequent = frequent_words.contains(&word_ortho);
                let word_index = dictionary.push(word);

                if !is_frequent {
                    for (syllable_phonemes, syllable_graphemes) in
                        syll_cv.iter().zip(orthosyll_cv.iter())
                    {
                        let spelling: String = syllable_graphemes.concat();
                        match syllables.update_syllable(
                            syllable_phonemes,
                            &spelling,
                            freq,
                            &word_phonology,
                            word_index,
                            &mut stats,
                            &word_ortho,
                        ) {
                            Ok(_) => {}
                            Err(e) => errors.push(e),
                        }
                    }
                }
            }
            Err(e) => errors.push(e),
        }
    }

    Ok(IngestResult {
        dictionary,
        syllables,
        stats,
        errors,
    })
}

fn parse_row<'a>(
    row: usize,
    ortho: &str,
    field: &impl Fn(&'static str) -> Result<&'a str, LexiconError>,
) -> Result<Word, LexiconError> {
    let phon = field("phon")?;
    let lemme = field("lemme")?;
    let cgram = field("cgram")?;
    let cgramortho = field("cgramortho")?;
    let genre = field("genre").ok();
    let nombre = field("nombre").ok();
    let infover = field("infover").unwrap_or("");
    let syll_cv_raw = field("syll_cv")?;
    let orthosyll_cv_raw = field("orthosyll_cv")?;
    let freqlivres = field("freqlivres")?;
    let freqfilms2 = field("freqfilms2")?;

    let gram_cat = GramCat::parse(cgram).ok_or_else(|| LexiconError::UnknownGramCat {
        row,
        value: cgram.to_owned(),
    })?;
    let cgram_ortho: Vec<String> = cgramortho.split(',').map(|s| s.trim().to_owned()).collect();
    let gender = genre.and_then(Gender::parse);
    let number = nombre.and_then(Number::parse);
    let conjugations = parse_info_verb(infover);

    let freq_books: f64 = freqlivres
        .replace(',', ".")
        .parse()
        .map_err(|_| LexiconError::UnparsableFrequency {
            row,
            value: freqlivres.to_owned(),
        })?;
    let freq_films: f64 =
        freqfilms2
            .replace(',', ".")
            .parse()
            .map_err(|_| LexiconError::UnparsableFrequency {
                row,
                value: freqfilms2.to_owned(),
            })?;

    let syll_cv = split_phonemes(syll_cv_raw);
    let orthosyll_cv = split_syllabified(orthosyll_cv_raw);
    let phonology = fix_e_n_en(phon);

    Ok(Word {
        ortho: ortho.to_owned(),
        phonology,
        lemma: lemme.to_owned(),
        gram_cat,
        cgram_ortho,
        gender,
        number,
        conjugations,
        syll_cv,
        orthosyll_cv,
        freq_books,
        freq_films,
    })
}

pub fn required_columns() -> &'static [&'static str] {
    REQUIRED_COLUMNS
}

/// Rebuilds a [`SyllableCollection`] from an already-ingested [`Dictionary`]
/// without re-parsing the raw TSV, for the CLI's snapshot-reload path (§5
/// "Persistence": the cached snapshot stores the dictionary and frozen
/// phoneme/biphoneme stats but not the syllable collection, so it is
/// recomputed from the words alone on a cache hit). The phoneme/biphoneme
/// statistics this replay would normally produce are discarded; the real
/// ones already came from the snapshot.
pub fn rebuild_syllables(dictionary: &Dictionary, frequent_words: &HashSet<String>) -> (SyllableCollection, Vec<LexiconError>) {
    let mut syllables = SyllableCollection::new();
    let mut scratch_stats = StatsContext::new();
    let mut errors = Vec::new();

    for (word_index, word) in dictionary.iter().enumerate() {
        if frequent_words.contains(&word.ortho) {
            continue;
        }
        let freq = word.frequency();
        for (syllable_phonemes, syllable_graphemes) in word.syll_cv.iter().zip(word.orthosyll_cv.iter()) {
            let spelling: String = syllable_graphemes.concat();
            match syllables.update_syllable(
                syllable_phonemes,
                &spelling,
                freq,
                &word.phonology,
                word_index,
                &mut scratch_stats,
                &word.ortho,
            ) {
                Ok(_) => {}
                Err(e) => errors.push(e),
            }
        }
    }

    (syllables, errors)
}

#[cfg(test)]
mod test {
    use super::*;

    const HEADER: &str =
        "ortho\tphon\tlemme\tcgram\tcgramortho\tgenre\tnombre\tinfover\tsyll_cv\torthosyll_cv\tfreqlivres\tfreqfilms2\n";

    #[test]
    fn ingest_skips_comment_rows() {
        let data = format!("{HEADER}#comment\t\t\t\t\t\t\t\t\t\t\t\n");
        let result = ingest_lexicon(data.as_bytes(), &HashSet::new()).unwrap();
        assert!(result.dictionary.is_empty());
    }

    #[test]
    fn ingest_parses_a_simple_row() {
        let data = format!(
            "{HEADER}tra\ttRa\ttra\tNOM\tNOM\tm\ts\t\tt_R_a\tt_r_a\t1.0\t2.0\n"
        );
        let result = ingest_lexicon(data.as_bytes(), &HashSet::new()).unwrap();
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(result.dictionary.len(), 1);
        let word = result.dictionary.get(0).unwrap();
        assert_eq!(word.ortho, "tra");
        assert_eq!(word.frequency(), 2.0);
        assert_eq!(result.syllables.frequency("tRa"), 2.0);
    }

    #[test]
    fn ingest_skips_row_with_unknown_gram_cat() {
        let data = format!("{HEADER}tra\ttRa\ttra\tXYZ\tXYZ\tm\ts\t\tt_R_a\tt_r_a\t1.0\t2.0\n");
        let result = ingest_lexicon(data.as_bytes(), &HashSet::new()).unwrap();
        assert!(result.dictionary.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(result.errors[0], LexiconError::UnknownGramCat { .. }));
    }

    #[test]
    fn frequent_words_count_toward_dictionary_but_not_syllable_stats() {
        let data = format!(
            "{HEADER}de\tdə\tde\tPRE\tPRE\t\t\t\td_e\td_e\t1.0\t2.0\n\
             tra\ttRa\ttra\tNOM\tNOM\tm\ts\t\tt_R_a\tt_r_a\t1.0\t2.0\n"
        );
        let mut frequent = HashSet::new();
        frequent.insert("de".to_owned());

        let result = ingest_lexicon(data.as_bytes(), &frequent).unwrap();
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(result.dictionary.len(), 2);
        assert_eq!(result.syllables.frequency("de"), 0.0);
        assert_eq!(result.syllables.frequency("tRa"), 2.0);
    }
}
