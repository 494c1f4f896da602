//! Train a transliteration model from aligned word pairs.

use std::ops::ControlFlow;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lipika_core::EncodingMode;
use lipika_trainer::{
    evaluate, init_tracing, load_aligned_dataset, save_model, Trainer, TrainerConfig,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "train")]
#[command(about = "Train a transliteration model with the averaged structured perceptron")]
#[command(version)]
struct Cli {
    /// Aligned training data: `input<TAB>output` per line, blank line between words
    #[arg(short, long)]
    data: PathBuf,

    /// Where to write the model (JSON)
    #[arg(short, long)]
    output: PathBuf,

    /// N-gram context order
    #[arg(long, default_value_t = 4)]
    order: usize,

    /// Passes over the training data
    #[arg(long, default_value_t = 15)]
    n_iter: usize,

    /// Learning-rate exponent: epoch i uses 1 / i^lr_exp
    #[arg(long, default_value_t = 0.1)]
    lr_exp: f64,

    /// Shuffle seed (default: derived from the clock)
    #[arg(long)]
    seed: Option<u64>,

    /// Encode features as dense bit vectors
    #[arg(long)]
    dense: bool,

    /// -v iterations, -vv error rates, -vvv first comparison per epoch
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose.saturating_sub(2));

    let mut config = TrainerConfig::default()
        .with_order(cli.order)
        .with_n_iter(cli.n_iter)
        .with_lr_exp(cli.lr_exp)
        .with_verbose(cli.verbose);
    if let Some(seed) = cli.seed {
        config = config.with_random_state(seed);
    }
    if cli.dense {
        config = config.with_encoding(EncodingMode::Dense);
    }

    let words = load_aligned_dataset(&cli.data)
        .with_context(|| format!("reading training data {}", cli.data.display()))?;
    if words.is_empty() {
        anyhow::bail!("no training words found in {}", cli.data.display());
    }
    info!(words = words.len(), "loaded training data");

    let trainer = Trainer::new(config);
    let run = trainer.train_with(&words, |report| {
        info!(
            epoch = report.epoch,
            mistakes = report.mistakes,
            error_rate = report.error_rate,
            "epoch complete"
        );
        ControlFlow::Continue(())
    })?;

    let acc = evaluate(&run.model, &words)?;
    info!(
        epochs = run.epochs,
        seed = run.seed,
        word_accuracy = acc.word_accuracy(),
        symbol_accuracy = acc.symbol_accuracy(),
        "training finished"
    );

    save_model(&run.model, &cli.output)?;
    Ok(())
}
