use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use neuro_ensemble::utils::get_timestamp;
use neuro_ensemble::{Dataset, Ensemble, EnsembleOptions};

/// Evolve a Pareto ensemble on the tic-tac-toe endgame data and report its accuracy
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Tic-tac-toe endgame CSV file
    #[arg(long, default_value = "../tictactoe/tic-tac-toe.data")]
    data: PathBuf,

    /// JSON file with ensemble options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the number of epochs
    #[arg(long)]
    epochs: Option<usize>,

    /// Override the population size
    #[arg(long)]
    population: Option<usize>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Samples used for training; the rest are held out
    #[arg(long, default_value_t = 600)]
    training_size: usize,

    /// Held-out samples used to score networks between epochs
    #[arg(long, default_value_t = 100)]
    evaluation_size: usize,

    /// Write per-epoch reports to this JSON file
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut options = match &cli.config {
        Some(path) => EnsembleOptions::load_from_json(path)
            .with_context(|| format!("reading options from {}", path.display()))?,
        None => EnsembleOptions::default(),
    };
    if let Some(epochs) = cli.epochs {
        options.epochs = epochs;
    }
    if let Some(population) = cli.population {
        options.population_size = population;
    }

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut dataset = Dataset::from_tic_tac_toe(&cli.data)
        .with_context(|| format!("loading samples from {}", cli.data.display()))?;
    dataset.shuffle(&mut rng);
    let (training, test) = dataset.split(cli.training_size);
    let evaluation = &test.samples()[..cli.evaluation_size.min(test.len())];
    info!(
        "{} training samples, {} test samples, {} used for evaluation",
        training.len(),
        test.len(),
        evaluation.len()
    );

    let mut ensemble = Ensemble::new(options, &mut rng)?;
    ensemble
        .train(training.samples(), evaluation, &mut rng)
        .context("training the ensemble")?;

    let accuracy = ensemble.test(test.samples()).context("testing the ensemble")?;
    println!(
        "Pareto front of {} networks after {} epochs: {:.2}% accuracy",
        ensemble.networks().len(),
        ensemble.epoch(),
        accuracy * 100.0
    );

    if let Some(path) = cli.report {
        let path = if path.is_dir() {
            path.join(format!("epochs_{}.json", get_timestamp()))
        } else {
            path
        };
        ensemble.save_history(&path)?;
        println!("Epoch reports written to {:?}", path);
    }

    Ok(())
}
