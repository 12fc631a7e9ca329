//! Binary cache of the ingested dictionary and phoneme/biphoneme
//! statistics (§5 "Persistence", §9 "Snapshot round-trip").
//!
//! Grounded on the teacher's `dictionary/sqlite.rs` (`SqliteDictionary::open`,
//! WAL pragma, `ensure_tables`/`initialize_tables` split), adapted to store
//! a single serialized blob rather than a phrase-dictionary schema — this
//! crate's ingested state is a handful of collections, not a query-served
//! table.

use std::path::Path;

use rusqlite::{params, Connection, OpenFlags};
use serde::{Deserialize, Serialize};

use crate::biphoneme::Biphoneme;
use crate::lexicon::word::{ConjugationTuple, Gender, GramCat, Number};
use crate::lexicon::{Dictionary, Word};
use crate::phoneme::{Phoneme, SyllabicPosition};
use crate::stats::{FrozenStats, StatsContext};

#[derive(Debug, Serialize, Deserialize)]
struct WordRecord {
    ortho: String,
    phonology: String,
    lemma: String,
    gram_cat: String,
    cgram_ortho: Vec<String>,
    gender: Option<String>,
    number: Option<String>,
    conjugations: Vec<Vec<String>>,
    syll_cv: Vec<Vec<char>>,
    orthosyll_cv: Vec<Vec<String>>,
    freq_books: f64,
    freq_films: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PhonemeRecord {
    symbol: char,
    frequency: f64,
    pos_frequency: [f64; 7],
    inv_pos_frequency: [f64; 7],
}

#[derive(Debug, Serialize, Deserialize)]
struct BiphonemeRecord {
    a: char,
    b: char,
    frequency: f64,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct PositionStats {
    phonemes: Vec<PhonemeRecord>,
    biphonemes: Vec<BiphonemeRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotData {
    words: Vec<WordRecord>,
    stats: [PositionStats; 3],
}

fn slot(position: SyllabicPosition) -> usize {
    match position {
        SyllabicPosition::Onset => 0,
        SyllabicPosition::Nucleus => 1,
        SyllabicPosition::Coda => 2,
    }
}

fn encode(dictionary: &Dictionary, stats: &FrozenStats) -> SnapshotData {
    let words = dictionary
        .iter()
        .map(|w| WordRecord {
            ortho: w.ortho.clone(),
            phonology: w.phonology.clone(),
            lemma: w.lemma.clone(),
            gram_cat: w.gram_cat.as_str().to_owned(),
            cgram_ortho: w.cgram_ortho.clone(),
            gender: w.gender.map(|g| g.as_str().to_owned()),
            number: w.number.map(|n| n.as_str().to_owned()),
            conjugations: w.conjugations.iter().map(|c| c.0.clone()).collect(),
            syll_cv: w.syll_cv.clone(),
            orthosyll_cv: w.orthosyll_cv.clone(),
            freq_books: w.freq_books,
            freq_films: w.freq_films,
        })
        .collect();

    let stats_records = SyllabicPosition::ALL.map(|position| PositionStats {
        phonemes: stats
            .phonemes(position)
            .iter()
            .map(|p| PhonemeRecord {
                symbol: p.symbol,
                frequency: p.frequency,
                pos_frequency: p.pos_frequency,
                inv_pos_frequency: p.inv_pos_frequency,
            })
            .collect(),
        biphonemes: stats
            .biphonemes(position)
            .iter()
            .map(|b| BiphonemeRecord {
                a: b.pair.0,
                b: b.pair.1,
                frequency: b.frequency,
            })
            .collect(),
    });

    SnapshotData {
        words,
        stats: stats_records,
    }
}

fn decode(data: SnapshotData) -> (Dictionary, FrozenStats) {
    let mut dictionary = Dictionary::new();
    for record in data.words {
        dictionary.push(Word {
            ortho: record.ortho,
            phonology: record.phonology,
            lemma: record.lemma,
            gram_cat: GramCat::parse(&record.gram_cat).unwrap_or(GramCat::Nom),
            cgram_ortho: record.cgram_ortho,
            gender: record.gender.as_deref().and_then(Gender::parse),
            number: record.number.as_deref().and_then(Number::parse),
            conjugations: record.conjugations.into_iter().map(ConjugationTuple).collect(),
            syll_cv: record.syll_cv,
            orthosyll_cv: record.orthosyll_cv,
            freq_books: record.freq_books,
            freq_films: record.freq_films,
        });
    }

    let mut stats = StatsContext::new();
    for &position in &SyllabicPosition::ALL {
        let records = &data.stats[slot(position)];
        let phonemes = stats.phonemes_mut(position);
        for r in &records.phonemes {
            phonemes.insert_raw(Phoneme {
                symbol: r.symbol,
                frequency: r.frequency,
                pos_frequency: r.pos_frequency,
                inv_pos_frequency: r.inv_pos_frequency,
            });
        }
        let biphonemes = stats.biphonemes_mut(position);
        for r in &records.biphonemes {
            biphonemes.insert_raw(Biphoneme {
                pair: (r.a, r.b),
                frequency: r.frequency,
            });
        }
    }

    (dictionary, stats.freeze())
}

pub struct Snapshot {
    conn: Connection,
}

impl Snapshot {
    pub fn open<P: AsRef<Path>>(path: P) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        Self::initialize_tables(&conn)?;
        Ok(Snapshot { conn })
    }

    pub fn open_read_only<P: AsRef<Path>>(path: P) -> rusqlite::Result<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Snapshot { conn })
    }

    fn initialize_tables(conn: &Connection) -> rusqlite::Result<()> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS snapshot_v1 (id INTEGER PRIMARY KEY, data BLOB NOT NULL)",
            [],
        )?;
        Ok(())
    }

    /// Persists exactly one snapshot blob (§10 open question iii),
    /// replacing whatever was stored before.
    pub fn save(&self, dictionary: &Dictionary, stats: &FrozenStats) -> crate::error::Result<()> {
        let data = encode(dictionary, stats);
        let bytes = serde_json::to_vec(&data)?;
        self.conn
            .execute("DELETE FROM snapshot_v1", [])
            .map_err(crate::error::ChordPhonError::Snapshot)?;
        self.conn
            .execute(
                "INSERT INTO snapshot_v1 (id, data) VALUES (1, ?1)",
                params![bytes],
            )
            .map_err(crate::error::ChordPhonError::Snapshot)?;
        Ok(())
    }

    /// Loads the stored snapshot, if any.
    pub fn load(&self) -> crate::error::Result<Option<(Dictionary, FrozenStats)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT data FROM snapshot_v1 WHERE id = 1")
            .map_err(crate::error::ChordPhonError::Snapshot)?;
        let mut rows = stmt.query([]).map_err(crate::error::ChordPhonError::Snapshot)?;
        match rows.next().map_err(crate::error::ChordPhonError::Snapshot)? {
            Some(row) => {
                let bytes: Vec<u8> = row.get(0).map_err(crate::error::ChordPhonError::Snapshot)?;
                let data: SnapshotData = serde_json::from_slice(&bytes)?;
                Ok(Some(decode(data)))
            }
            None => Ok(None),
        }
    }
}

/// Resolves the default snapshot path under the platform cache directory
/// (teacher's `dirs-next` usage for its own default dictionary path).
pub fn default_snapshot_path() -> std::path::PathBuf {
    dirs_next::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("chordphon")
        .join("snapshot.sqlite3")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn snapshot_round_trips_dictionary_and_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.sqlite3");
        let snapshot = Snapshot::open(&path).unwrap();

        let mut dictionary = Dictionary::new();
        dictionary.push(Word {
            ortho: "tra".to_owned(),
            phonology: "tRa".to_owned(),
            lemma: "tra".to_owned(),
            gram_cat: GramCat::Nom,
            cgram_ortho: vec!["NOM".to_owned()],
            gender: None,
            number: None,
            conjugations: vec![],
            syll_cv: vec![vec!['t', 'R', 'a']],
            orthosyll_cv: vec![vec!["t".to_owned(), "r".to_owned(), "a".to_owned()]],
            freq_books: 1.0,
            freq_films: 2.0,
        });

        let mut ctx = StatsContext::new();
        ctx.register_part(SyllabicPosition::Onset, &['t', 'R'], 2.0);
        let stats = ctx.freeze();

        snapshot.save(&dictionary, &stats).unwrap();
        let (restored_dict, restored_stats) = snapshot.load().unwrap().expect("snapshot present");

        assert_eq!(restored_dict.len(), 1);
        assert_eq!(restored_dict.get(0).unwrap().ortho, "tra");
        assert_eq!(
            restored_stats.phonemes(SyllabicPosition::Onset).frequency('t'),
            2.0
        );
        assert_eq!(
            restored_stats.biphonemes(SyllabicPosition::Onset).frequency('t', 'R'),
            2.0
        );
    }
}
