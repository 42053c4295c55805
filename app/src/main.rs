mod classifier;
mod io;
mod sink;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::Path;
use std::path::PathBuf;

use classifier::{DistanceMetric, NearestCentroid};
use fold_assign::{FoldAssigner, Strategy};
use fold_train::{FoldTrainer, TrainError};
use sink::JsonSink;
use xval::{Distance, FoldedFrame, L1Dist, L2Dist, LInfDist};

#[derive(Parser)]
#[command(name = "fold-runner", version, about = "k-fold cross-validation over CSV datasets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assign every row of a CSV dataset to a fold and write the result
    /// with a `kfold` column appended.
    Split(SplitArgs),
    /// Train and evaluate one model per fold of a fold-augmented CSV,
    /// persisting each model as JSON.
    Train(TrainArgs),
}

#[derive(Args)]
struct SplitArgs {
    /// Input CSV file with a header row.
    #[arg(long)]
    input: PathBuf,
    /// Output CSV file; same columns plus `kfold`.
    #[arg(long)]
    output: PathBuf,
    /// Name of the label column.
    #[arg(long)]
    label: String,
    /// Number of folds.
    #[arg(long, default_value_t = 5)]
    folds: usize,
    /// Balance each label's rows across the folds.
    #[arg(long)]
    stratified: bool,
    /// Seed for reproducible shuffling.
    #[arg(long)]
    seed: Option<u64>,
    /// Keep the input row order instead of shuffling.
    #[arg(long)]
    no_shuffle: bool,
}

#[derive(Args)]
struct TrainArgs {
    /// Input CSV file carrying a `kfold` column.
    #[arg(long)]
    input: PathBuf,
    /// Name of the label column.
    #[arg(long)]
    label: String,
    /// Directory to write model artifacts into.
    #[arg(long, default_value = "models")]
    model_dir: PathBuf,
    /// Artifact file name prefix: `{prefix}_{fold}.json`.
    #[arg(long, default_value = "model")]
    prefix: String,
    /// Run a single fold instead of all of them.
    #[arg(long)]
    fold: Option<usize>,
    /// Distance metric for the nearest-centroid classifier.
    #[arg(long, value_enum, default_value = "l2")]
    metric: DistanceMetric,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Split(args) => run_split(&args),
        Command::Train(args) => run_train(&args),
    }
}

fn run_split(args: &SplitArgs) -> Result<()> {
    let dataset = io::read_dataset(&args.input, &args.label)?;
    let strategy = if args.stratified {
        Strategy::Stratified
    } else {
        Strategy::Plain
    };
    let assigner = FoldAssigner::new(args.folds, strategy).with_shuffle(!args.no_shuffle);
    let folded = match args.seed {
        Some(seed) => assigner.assign_with_seed(&dataset.frame, seed),
        None => assigner.assign(&dataset.frame),
    }
    .context("fold assignment failed")?;
    io::write_folds(&args.output, &folded, &dataset.headers)?;
    log::info!(
        "assigned {} rows to {} folds, wrote {}",
        folded.frame().n_rows(),
        folded.k(),
        args.output.display()
    );
    Ok(())
}

fn run_train(args: &TrainArgs) -> Result<()> {
    let folded = io::read_folded(&args.input, &args.label)?;
    log::info!(
        "loaded {} rows, {} folds, metric {}",
        folded.frame().n_rows(),
        folded.k(),
        args.metric
    );
    std::fs::create_dir_all(&args.model_dir)
        .with_context(|| format!("cannot create {}", args.model_dir.display()))?;
    match args.metric {
        DistanceMetric::L1 => train_with(L1Dist, &folded, args.fold, &args.model_dir, &args.prefix),
        DistanceMetric::L2 => train_with(L2Dist, &folded, args.fold, &args.model_dir, &args.prefix),
        DistanceMetric::LInf => {
            train_with(LInfDist, &folded, args.fold, &args.model_dir, &args.prefix)
        }
    }
}

fn train_with<D: Distance<f64>>(
    distance: D,
    folded: &FoldedFrame<String, f64>,
    fold: Option<usize>,
    model_dir: &Path,
    prefix: &str,
) -> Result<()> {
    let mut trainer = FoldTrainer::new(
        NearestCentroid::new(distance),
        JsonSink::new(model_dir, prefix),
    );
    let results = match fold {
        Some(fold) => vec![trainer.run_fold(folded, fold)],
        None => trainer.run_all(folded),
    };
    for result in &results {
        report(result);
    }

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        log::warn!("{} of {} folds failed", failed, results.len());
    }
    Ok(())
}

fn report(result: &Result<fold_train::FoldOutcome, TrainError>) {
    match result {
        Ok(outcome) => {
            println!("Fold={}, Accuracy={}", outcome.fold, outcome.accuracy);
            log::info!("fold {}: persisted {}", outcome.fold, outcome.artifact);
        }
        Err(error) => {
            eprintln!("Fold={}, Error={}", error.fold(), error);
        }
    }
}
