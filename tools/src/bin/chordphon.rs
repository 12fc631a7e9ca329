//! Command-line entry point: ingest a lexicon, run the full layout
//! pipeline, and report or persist the result (§7 "CLI surface").

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use chordphon::keyboard::starboard::Starboard;
use chordphon::keyboard::PhysicalLayout;
use chordphon::lexicon::frequent_words::load_frequent_words;
use chordphon::lexicon::tsv::ingest_lexicon;
use chordphon::pipeline::{multiphoneme_pairs, run as run_pipeline, run_from_snapshot, PipelineConfig, PipelineOutput};
use chordphon::snapshot::{default_snapshot_path, Snapshot};

fn load_frequent_word_set(path: &Option<PathBuf>) -> Result<std::collections::HashSet<String>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening frequent-words file at {}", path.display()))?;
            Ok(load_frequent_words(BufReader::new(file)).orthographs())
        }
        None => Ok(std::collections::HashSet::new()),
    }
}

#[derive(Parser)]
#[command(name = "chordphon", about = "Designs phonetic chorded keyboard layouts", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline over a lexicon TSV and cache the result.
    Build(BuildArgs),
    /// Ingest a lexicon and print phoneme/ambiguity diagnostics only.
    Stats(StatsArgs),
    /// Write phoneme_order.csv and multi_phoneme_ambiguity.csv.
    ExportConstraints(ExportArgs),
}

#[derive(Parser)]
struct BuildArgs {
    /// Path to the Lexique-style TSV lexicon.
    lexicon: PathBuf,

    /// Where to write the snapshot cache (defaults to the platform cache dir).
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Where to write the theory TSV (defaults to "theory.tsv").
    #[arg(long, default_value = "theory.tsv")]
    theory_out: PathBuf,

    /// Seed for the phoneme-order optimizer.
    #[arg(long, default_value_t = 0)]
    order_seed: u64,

    /// Seed for the chord-assignment optimizer.
    #[arg(long, default_value_t = 0)]
    optimizer_seed: u64,

    /// Skip the chord-assignment local search, keeping the greedy seed layout.
    #[arg(long)]
    no_optimize: bool,

    /// Rebuild even if a valid snapshot is already cached at --snapshot.
    #[arg(long)]
    force_rebuild: bool,

    /// Words excluded from syllable-frequency statistics (§6 "Frequent-word file").
    #[arg(long)]
    frequent_words: Option<PathBuf>,
}

#[derive(Parser)]
struct StatsArgs {
    /// Path to the Lexique-style TSV lexicon.
    lexicon: PathBuf,

    /// Words excluded from syllable-frequency statistics (§6 "Frequent-word file").
    #[arg(long)]
    frequent_words: Option<PathBuf>,
}

#[derive(Parser)]
struct ExportArgs {
    /// Path to the Lexique-style TSV lexicon.
    lexicon: PathBuf,

    /// Directory to write the two CSV files into (defaults to the current directory).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Seed for the phoneme-order optimizer.
    #[arg(long, default_value_t = 0)]
    order_seed: u64,

    /// Seed for the chord-assignment optimizer.
    #[arg(long, default_value_t = 0)]
    optimizer_seed: u64,

    /// Words excluded from syllable-frequency statistics (§6 "Frequent-word file").
    #[arg(long)]
    frequent_words: Option<PathBuf>,
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("CHORDPHON_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Command::Build(args) => build(args),
        Command::Stats(args) => stats(args),
        Command::ExportConstraints(args) => export_constraints(args),
    }
}

fn build(args: BuildArgs) -> Result<()> {
    let progress = ProgressBar::new_spinner();
    progress.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    progress.enable_steady_tick(std::time::Duration::from_millis(120));

    let layout: Arc<dyn PhysicalLayout> = Arc::new(Starboard::default());
    let config = PipelineConfig {
        order_seed: args.order_seed,
        optimizer_seed: args.optimizer_seed,
        skip_optimize: args.no_optimize,
        frequent_words: load_frequent_word_set(&args.frequent_words)?,
        ..PipelineConfig::default()
    };

    let snapshot_path = args.snapshot.unwrap_or_else(default_snapshot_path);
    if let Some(parent) = snapshot_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating snapshot directory {}", parent.display()))?;
    }
    let snapshot = Snapshot::open(&snapshot_path)
        .with_context(|| format!("opening snapshot at {}", snapshot_path.display()))?;

    let cached = if args.force_rebuild { None } else { snapshot.load().context("loading cached snapshot")? };

    let output = match cached {
        Some((dictionary, stats)) => {
            progress.set_message("loaded cached snapshot, resuming layout optimization");
            run_from_snapshot(dictionary, stats, layout, &config).context("running the layout pipeline")?
        }
        None => {
            progress.set_message("ingesting lexicon and optimizing layout");
            let lexicon = File::open(&args.lexicon)
                .with_context(|| format!("opening lexicon at {}", args.lexicon.display()))?;
            let output = run_pipeline(BufReader::new(lexicon), layout, &config)
                .context("running the layout pipeline")?;
            snapshot.save(&output.dictionary, &output.stats)?;
            output
        }
    };
    progress.finish_with_message("done");

    let theory_tsv = output.theory.render_tsv(&output.dictionary);
    std::fs::write(&args.theory_out, theory_tsv)
        .with_context(|| format!("writing theory TSV to {}", args.theory_out.display()))?;

    print_summary(&output);
    println!("Snapshot at {}", snapshot_path.display());
    println!("Theory written to {}", args.theory_out.display());
    Ok(())
}

fn stats(args: StatsArgs) -> Result<()> {
    let lexicon = File::open(&args.lexicon)
        .with_context(|| format!("opening lexicon at {}", args.lexicon.display()))?;
    let frequent_words = load_frequent_word_set(&args.frequent_words)?;
    let ingested = ingest_lexicon(BufReader::new(lexicon), &frequent_words).context("ingesting lexicon")?;
    for err in &ingested.errors {
        tracing::warn!(%err, "skipped malformed lexicon row");
    }

    let stats = ingested.stats.freeze();
    let phonemes_by_position: std::collections::HashMap<_, _> = chordphon::phoneme::SyllabicPosition::ALL
        .into_iter()
        .map(|position| (position, stats.phonemes(position).symbols().collect::<Vec<char>>()))
        .collect();
    let lexical_ambiguity =
        chordphon::ambiguity::analyse_lexical_ambiguity(&phonemes_by_position, &ingested.syllables, &ingested.dictionary);

    println!("words: {}", ingested.dictionary.len());
    println!("skipped rows: {}", ingested.errors.len());
    for &position in &chordphon::phoneme::SyllabicPosition::ALL {
        let table = &lexical_ambiguity[&position];
        let top = table
            .iter()
            .rev()
            .take(3)
            .map(|((a, b), score)| format!("{a}{b}={score:.2}"))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{}: {} phonemes, {} biphonemes, most ambiguous pairs: [{top}]",
            position.as_str(),
            stats.phonemes(position).len(),
            stats.biphonemes(position).iter().count(),
        );
    }
    Ok(())
}

fn export_constraints(args: ExportArgs) -> Result<()> {
    let lexicon = File::open(&args.lexicon)
        .with_context(|| format!("opening lexicon at {}", args.lexicon.display()))?;
    let layout: Arc<dyn PhysicalLayout> = Arc::new(Starboard::default());
    let config = PipelineConfig {
        order_seed: args.order_seed,
        optimizer_seed: args.optimizer_seed,
        frequent_words: load_frequent_word_set(&args.frequent_words)?,
        ..PipelineConfig::default()
    };
    let output =
        run_pipeline(BufReader::new(lexicon), layout, &config).context("running the layout pipeline")?;

    let out_dir = args.out_dir.unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let mut order_csv = String::from("position,p1,p2,score\n");
    for &position in &chordphon::phoneme::SyllabicPosition::ALL {
        let biphonemes = output.stats.biphonemes(position);
        for (&(p1, p2), &score) in &biphonemes.pairwise_order_score {
            order_csv.push_str(&format!("{},{p1},{p2},{score}\n", position.as_str()));
        }
    }
    let order_path = out_dir.join("phoneme_order.csv");
    std::fs::write(&order_path, order_csv)
        .with_context(|| format!("writing {}", order_path.display()))?;

    let mut ambiguity_csv = String::from("position,m1,m2,score\n");
    for &position in &chordphon::phoneme::SyllabicPosition::ALL {
        let pairs = multiphoneme_pairs(
            position,
            &output.keyboard,
            &output.syllables,
            &output.dictionary,
            config.optimizer.max_multiphonemes,
        );
        for ((m1, m2), score) in pairs {
            let m1: String = m1.into_iter().collect();
            let m2: String = m2.into_iter().collect();
            ambiguity_csv.push_str(&format!("{},{m1},{m2},{score}\n", position.as_str()));
        }
    }
    let ambiguity_path = out_dir.join("multi_phoneme_ambiguity.csv");
    std::fs::write(&ambiguity_path, ambiguity_csv)
        .with_context(|| format!("writing {}", ambiguity_path.display()))?;

    println!("Wrote {}", order_path.display());
    println!("Wrote {}", ambiguity_path.display());
    Ok(())
}

fn print_summary(output: &PipelineOutput) {
    println!("words: {}", output.dictionary.len());
    println!("skipped rows: {}", output.skipped_rows);
    println!("homophone groups: {}", output.theory.homophone_groups(&output.dictionary).len());
    println!("discriminating features selected: {}", output.disambiguation.selected_features.len());

    if let Some(key) = &output.theory.max_ambiguity_key {
        let count = output.theory.groups.get(key).map(|words| words.len()).unwrap_or(0);
        println!(
            "max-ambiguity chord: {} ({count} words)",
            chordphon::theory::render_chord_sequence(key)
        );
    }
    if let Some(key) = &output.theory.max_frequency_ambiguity_key {
        println!(
            "max-frequency-ambiguity chord: {}",
            chordphon::theory::render_chord_sequence(key)
        );
    }

    println!("top discriminating features:");
    for (features, groups) in output.disambiguation.featureset_words.iter().take(5) {
        let word_count: usize = groups.iter().map(|g| g.len()).sum();
        let label = if features.is_empty() {
            "(none)".to_owned()
        } else {
            features.join("+")
        };
        println!("  {label}: {word_count} words discriminated");
    }
}
