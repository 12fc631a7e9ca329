use thiserror::Error;

/// A single malformed row skipped during lexicon ingestion.
///
/// Collected and returned alongside the parsed dictionary rather than
/// aborting the run (§7 "Malformed lexicon row").
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexiconError {
    #[error("row {row}: missing column {column}")]
    MissingColumn { row: usize, column: &'static str },
    #[error("row {row}: unparsable frequency {value:?}")]
    UnparsableFrequency { row: usize, value: String },
    #[error("row {row}: unknown grammatical category {value:?}")]
    UnknownGramCat { row: usize, value: String },
    #[error("word {word:?}: unknown phoneme symbol {symbol:?}")]
    UnknownPhoneme { word: String, symbol: char },
    #[error("word {word:?}: syllable {syllable:?} has no nucleus")]
    EmptyNucleus { word: String, syllable: String },
}

#[derive(Error, Debug)]
pub enum KeyboardError {
    #[error(
        "keyboard partition mismatch: {allowed} allowed keys but positions sum to {declared}"
    )]
    PartitionMismatch { allowed: usize, declared: usize },
    #[error("key {key} is assigned to more than one syllabic position")]
    OverlappingKey { key: u16 },
}

#[derive(Error, Debug)]
pub enum TheoryError {
    #[error("word {word:?}: no stroke assigned to phoneme {phoneme:?} in position {position:?}")]
    MissingStroke {
        word: String,
        phoneme: char,
        position: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum ChordPhonError {
    #[error(transparent)]
    Keyboard(#[from] KeyboardError),
    #[error(transparent)]
    Theory(#[from] TheoryError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] rusqlite::Error),
}

pub type Result<T, E = ChordPhonError> = std::result::Result<T, E>;
