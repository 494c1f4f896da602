//! Transliterate words read from stdin, one per line, with a trained model.
//!
//! Each character of a line is one input symbol. Output is one JSON object
//! per input line.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lipika_core::decode::DEFAULT_K_BEST;
use lipika_core::DecodeStrategy;
use lipika_trainer::{init_tracing, load_model, split_symbols};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "decode")]
#[command(about = "Transliterate words from stdin with a trained model")]
#[command(version)]
struct Cli {
    /// Model file written by `train`
    #[arg(short, long)]
    model: PathBuf,

    /// Decoder: `viterbi` or `beamsearch`
    #[arg(short, long, default_value = "viterbi")]
    decoder: String,

    /// Hypotheses kept by beam search (at least 2)
    #[arg(short, long, default_value_t = DEFAULT_K_BEST)]
    k_best: usize,

    /// Log debug output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct Hypothesis {
    text: String,
    score: f64,
}

#[derive(Serialize)]
struct DecodedWord<'a> {
    input: &'a str,
    outputs: Vec<Hypothesis>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let strategy = DecodeStrategy::from_name(&cli.decoder, cli.k_best)?;
    let model = load_model(&cli.model)?;
    info!(
        model = %cli.model.display(),
        %strategy,
        classes = model.classes().len(),
        "model ready"
    );

    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let word = line.trim();
        if word.is_empty() {
            continue;
        }

        let symbols = split_symbols(word);
        let outputs = model
            .decode(&symbols, &strategy)?
            .into_iter()
            .map(|seq| -> lipika_core::Result<Hypothesis> {
                Ok(Hypothesis {
                    text: model.render(&seq.labels)?,
                    score: seq.score,
                })
            })
            .collect::<lipika_core::Result<Vec<_>>>()?;
        debug!(word, hypotheses = outputs.len(), "decoded");

        serde_json::to_writer(&mut out, &DecodedWord { input: word, outputs })?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}
