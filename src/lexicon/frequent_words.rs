//! Frequent-word list ingestion (§6 "Frequent-word file").
//!
//! These words contribute to the word total but are excluded from
//! syllable-frequency statistics, since they would otherwise dominate and
//! distort the phoneme-order search.

use std::collections::HashSet;
use std::io::{BufRead, BufReader, Read};

pub const NB_FREQUENT_WORDS: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct FrequentWord {
    pub word: String,
    pub frequency: f64,
}

#[derive(Debug, Clone, Default)]
pub struct FrequentWordList {
    pub total_frequency: f64,
    pub words: Vec<FrequentWord>,
}

impl FrequentWordList {
    /// The orthographs alone, for ingestion's syllable-exclusion check
    /// (§6 "Frequent-word file").
    pub fn orthographs(&self) -> HashSet<String> {
        self.words.iter().map(|w| w.word.clone()).collect()
    }
}

/// Parses a frequent-word file: the first line's last tab-separated field
/// is the total-frequency constant, subsequent lines are
/// `word<TAB>frequency`, truncated to [`NB_FREQUENT_WORDS`] entries.
pub fn load_frequent_words<R: Read>(reader: R) -> FrequentWordList {
    let mut lines = BufReader::new(reader).lines();
    let total_frequency = lines
        .next()
        .and_then(|line| line.ok())
        .and_then(|line| {
            line.split('\t')
                .next_back()
                .and_then(|field| field.trim().parse::<f64>().ok())
        })
        .unwrap_or(0.0);

    let words = lines
        .map_while(Result::ok)
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let word = fields.next()?.to_owned();
            let frequency: f64 = fields.next()?.trim().parse().ok()?;
            Some(FrequentWord { word, frequency })
        })
        .take(NB_FREQUENT_WORDS)
        .collect();

    FrequentWordList {
        total_frequency,
        words,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_total_and_truncates_to_limit() {
        let mut data = String::from("header\tfield\t12345.0\n");
        for i in 0..(NB_FREQUENT_WORDS + 10) {
            data.push_str(&format!("word{i}\t{i}.0\n"));
        }
        let list = load_frequent_words(data.as_bytes());
        assert_eq!(list.total_frequency, 12345.0);
        assert_eq!(list.words.len(), NB_FREQUENT_WORDS);
        assert_eq!(list.words[0].word, "word0");
    }
}
