//! Orchestrates the full forward data flow: ingest a lexicon, optimize
//! phoneme order, analyze ambiguity, seed and refine a chord assignment,
//! then build the theory and disambiguator (§4).

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::sync::Arc;

use crate::ambiguity::analyse_lexical_ambiguity;
use crate::disambiguator::{disambiguate, Disambiguation};
use crate::error::Result;
use crate::greedy::{build_seed_layout, default_overuse_threshold};
use crate::keyboard::{Keyboard, PhysicalLayout};
use crate::lexicon::tsv::ingest_lexicon;
use crate::lexicon::Dictionary;
use crate::optimizer::{optimize_chord_assignment, MultiphonemePair, OptimizerConfig};
use crate::order::{build_order_matrix, optimize_order};
use crate::phoneme::{PhonemeCollection, SyllabicPosition};
use crate::stats::FrozenStats;
use crate::syllable::{SyllableCollection, SyllableParts};
use crate::theory::{build_theory, Theory};

/// Tuning knobs for a full pipeline run (§4.3, §4.6, §4.7).
#[derive(Clone)]
pub struct PipelineConfig {
    pub order_seed: u64,
    pub optimizer_seed: u64,
    pub optimizer: OptimizerConfig,
    /// §4.6 step 2's per-length usage cap. A named field rather than a
    /// hardcoded literal (DESIGN.md open question 5).
    pub overuse_threshold: fn(usize) -> usize,
    /// Skips the chord-assignment local search (§7 CLI's `--no-optimize`),
    /// leaving the greedy seed layout as the final assignment.
    pub skip_optimize: bool,
    /// Orthographs excluded from syllable-frequency statistics during
    /// ingestion, while still counting toward the word total (§6
    /// "Frequent-word file", §8 "Frequent-word exclusion").
    pub frequent_words: HashSet<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            order_seed: 0,
            optimizer_seed: 0,
            optimizer: OptimizerConfig::default(),
            overuse_threshold: default_overuse_threshold,
            skip_optimize: false,
            frequent_words: HashSet::new(),
        }
    }
}

pub struct PipelineOutput {
    pub dictionary: Dictionary,
    pub stats: FrozenStats,
    pub syllables: SyllableCollection,
    pub keyboard: Keyboard,
    pub theory: Theory,
    pub disambiguation: Disambiguation,
    /// Malformed lexicon rows skipped during ingestion (§7 "error handling").
    pub skipped_rows: usize,
}

fn word_syllables(dictionary: &Dictionary) -> HashMap<usize, Vec<SyllableParts>> {
    dictionary
        .iter()
        .enumerate()
        .map(|(index, word)| {
            let parts = word
                .syll_cv
                .iter()
                .filter_map(|syllable| SyllableParts::partition(syllable))
                .collect();
            (index, parts)
        })
        .collect()
}

/// Collects same-length phoneme tuples that actually share a stroke or
/// appear adjacent in the current assignment, for the optimizer's
/// ambiguity term (§4.7), capped at `max_multiphonemes`.
pub fn multiphoneme_pairs(
    position: SyllabicPosition,
    keyboard: &Keyboard,
    syllables: &SyllableCollection,
    dictionary: &Dictionary,
    max_multiphonemes: usize,
) -> Vec<MultiphonemePair> {
    let groups: Vec<Vec<char>> = keyboard
        .assignments(position)
        .into_iter()
        .map(|(_, phonemes)| phonemes.clone())
        .filter(|phonemes| phonemes.len() > 1)
        .collect();

    let mut pairs = Vec::new();
    'outer: for i in 0..groups.len() {
        for j in (i + 1)..groups.len() {
            if groups[i].len() != groups[j].len() {
                continue;
            }
            let score = crate::ambiguity::multiphoneme_lexical_ambiguity(
                &groups[i], &groups[j], position, syllables, dictionary,
            );
            pairs.push(((groups[i].clone(), groups[j].clone()), score));
            if pairs.len() >= max_multiphonemes {
                break 'outer;
            }
        }
    }
    pairs
}

/// Runs the complete pipeline over a TSV lexicon stream, producing a
/// finished keyboard layout, theory, and disambiguator.
pub fn run<R: Read>(
    reader: R,
    layout: Arc<dyn PhysicalLayout>,
    config: &PipelineConfig,
) -> Result<PipelineOutput> {
    let ingested = ingest_lexicon(reader, &config.frequent_words)?;
    for err in &ingested.errors {
        tracing::warn!(%err, "skipped malformed lexicon row");
    }
    let skipped_rows = ingested.errors.len();
    let crate::lexicon::tsv::IngestResult {
        dictionary,
        syllables,
        stats,
        ..
    } = ingested;

    run_from_parts(dictionary, syllables, stats.freeze(), layout, config, skipped_rows)
}

/// Resumes the pipeline from an already-loaded snapshot (§5 "Persistence"):
/// the dictionary and frozen statistics reload verbatim, skipping the raw
/// TSV parse and phoneme/biphoneme aggregation (§4.1–§4.3); only the
/// syllable collection, which the snapshot does not persist, is
/// recomputed from the restored words.
pub fn run_from_snapshot(
    dictionary: Dictionary,
    stats: FrozenStats,
    layout: Arc<dyn PhysicalLayout>,
    config: &PipelineConfig,
) -> Result<PipelineOutput> {
    let (syllables, errors) = crate::lexicon::tsv::rebuild_syllables(&dictionary, &config.frequent_words);
    for err in &errors {
        tracing::warn!(%err, "skipped malformed syllable while rebuilding from snapshot");
    }
    run_from_parts(dictionary, syllables, stats, layout, config, errors.len())
}

fn run_from_parts(
    dictionary: Dictionary,
    syllables: SyllableCollection,
    mut stats: FrozenStats,
    layout: Arc<dyn PhysicalLayout>,
    config: &PipelineConfig,
    skipped_rows: usize,
) -> Result<PipelineOutput> {
    let mut keyboard = Keyboard::new(layout)?;

    let phoneme_snapshots: [PhonemeCollection; 3] =
        std::array::from_fn(|i| stats.phonemes(SyllabicPosition::ALL[i]).clone());
    let biphoneme_refs = stats.biphonemes_triplet_mut();
    let [onset_biphonemes, nucleus_biphonemes, coda_biphonemes] = biphoneme_refs;
    let [onset_phonemes, nucleus_phonemes, coda_phonemes] = &phoneme_snapshots;
    rayon::scope(|s| {
        for ((position, phonemes), biphonemes) in SyllabicPosition::ALL
            .into_iter()
            .zip([onset_phonemes, nucleus_phonemes, coda_phonemes])
            .zip([onset_biphonemes, nucleus_biphonemes, coda_biphonemes])
        {
            let order_seed = config.order_seed;
            s.spawn(move |_| {
                let (permutation, _) = optimize_order(phonemes, biphonemes, order_seed);
                build_order_matrix(&permutation, biphonemes);
                tracing::debug!(position = position.as_str(), len = permutation.len(), "optimized phoneme order");
            });
        }
    });

    let phonemes_by_position: HashMap<SyllabicPosition, Vec<char>> = SyllabicPosition::ALL
        .into_iter()
        .map(|position| (position, stats.phonemes(position).symbols().collect()))
        .collect();
    let lexical_ambiguity = analyse_lexical_ambiguity(&phonemes_by_position, &syllables, &dictionary);

    // Each position's greedy seeding runs against its own scratch keyboard
    // (built on the same physical layout) so onset/nucleus/coda can run
    // concurrently (§4.3, §5 #1); the results are merged back afterwards.
    {
        let layout = Arc::clone(keyboard.layout());
        let run_seed = |position: SyllabicPosition| {
            let phonemes = stats.phonemes(position);
            let best_permutation = stats.biphonemes(position).best_permutation.clone();
            let table = lexical_ambiguity
                .get(&position)
                .expect("analyse_lexical_ambiguity covers every syllabic position");
            let mut local = Keyboard::new(Arc::clone(&layout)).expect("layout already validated by Keyboard::new above");
            let unplaceable = build_seed_layout(
                position,
                phonemes,
                &best_permutation,
                table,
                &mut local,
                &config.overuse_threshold,
            );
            (position, local, unplaceable)
        };

        let (onset_result, (nucleus_result, coda_result)) = rayon::join(
            || run_seed(SyllabicPosition::Onset),
            || rayon::join(|| run_seed(SyllabicPosition::Nucleus), || run_seed(SyllabicPosition::Coda)),
        );

        for (position, mut local, unplaceable) in [onset_result, nucleus_result, coda_result] {
            keyboard.replace_position(position, local.take_position(position));
            if !unplaceable.is_empty() {
                tracing::warn!(position = position.as_str(), ?unplaceable, "phonemes left unplaced after greedy seeding");
            }
        }
    }

    if !config.skip_optimize {
        // Same per-position scratch-keyboard pattern for the local-search
        // optimizer (§4.3, §5 #4): each position explores candidate strokes
        // against its own copy, seeded from the merged greedy layout above.
        let run_optimize = |position: SyllabicPosition| {
            let phonemes: Vec<char> = stats.phonemes(position).symbols().collect();
            let pairs = multiphoneme_pairs(position, &keyboard, &syllables, &dictionary, config.optimizer.max_multiphonemes);
            let freq = |c: char| stats.phonemes(position).frequency(c);
            let mut local = keyboard.clone();
            optimize_chord_assignment(
                position,
                &phonemes,
                &freq,
                stats.biphonemes(position),
                &pairs,
                &mut local,
                &config.optimizer,
                config.optimizer_seed,
            );
            (position, local)
        };

        let (onset_result, (nucleus_result, coda_result)) = rayon::join(
            || run_optimize(SyllabicPosition::Onset),
            || rayon::join(|| run_optimize(SyllabicPosition::Nucleus), || run_optimize(SyllabicPosition::Coda)),
        );

        for (position, mut local) in [onset_result, nucleus_result, coda_result] {
            keyboard.replace_position(position, local.take_position(position));
        }
    } else {
        tracing::info!("skipping chord-assignment optimizer (--no-optimize)");
    }

    let syllables_by_word = word_syllables(&dictionary);
    let theory = build_theory(&dictionary, &keyboard, &syllables_by_word)?;
    let disambiguation = disambiguate(&theory, &dictionary);

    Ok(PipelineOutput {
        dictionary,
        stats,
        syllables,
        keyboard,
        theory,
        disambiguation,
        skipped_rows,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keyboard::starboard::Starboard;

    const LEXICON: &str = "ortho\tphon\tlemme\tcgram\tcgramortho\tgenre\tnombre\tinfover\tsyll_cv\torthosyll_cv\tfreqlivres\tfreqfilms2\n\
        tra\ttRa\ttra\tNOM\tNOM\tm\ts\t\tt_R_a\tt_r_a\t10.0\t10.0\n\
        ami\tami\tami\tNOM\tNOM\tm\ts\t\ta_m_i\ta_m_i\t5.0\t5.0\n";

    #[test]
    fn pipeline_runs_end_to_end_on_a_small_lexicon() {
        let layout: Arc<dyn PhysicalLayout> = Arc::new(Starboard::default());
        let config = PipelineConfig::default();
        let output = run(LEXICON.as_bytes(), layout, &config).unwrap();
        assert_eq!(output.dictionary.len(), 2);
        assert!(!output.theory.groups.is_empty());
    }

    #[test]
    fn resuming_from_a_snapshot_matches_a_fresh_run() {
        let config = PipelineConfig::default();
        let layout: Arc<dyn PhysicalLayout> = Arc::new(Starboard::default());
        let fresh = run(LEXICON.as_bytes(), Arc::clone(&layout), &config).unwrap();

        let resumed = run_from_snapshot(fresh.dictionary, fresh.stats, layout, &config).unwrap();
        assert_eq!(resumed.dictionary.len(), 2);
        assert!(!resumed.theory.groups.is_empty());
        assert_eq!(resumed.syllables.frequency("tRa"), 10.0);
    }
}
