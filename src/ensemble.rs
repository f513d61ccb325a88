use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info, trace};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::architecture::network::Network;
use crate::config::NetworkConfig;
use crate::dataset::Sample;
use crate::methods::mutation::{default_mutation_methods, select_mutation_method, MutationMethod};
use crate::methods::selection::{build_archive, non_dominated_sort, pareto_front};
use crate::utils::{load_from_json, save_to_json, EnsembleError, Result};

/// Options for creating an ensemble
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleOptions {
    /// Population size
    pub population_size: usize,

    /// Share of the population kept in the elite archive each epoch
    pub archive_fraction: f64,

    /// Number of training epochs
    pub epochs: usize,

    /// Leading training samples used for lifelong RPROP training
    pub training_window: usize,

    /// Mutation operators applied to each freshly bred child
    pub mutations_per_child: usize,

    /// Mutation methods with their relative probabilities
    pub mutation: Vec<(MutationMethod, f64)>,

    /// Topology and training constants of every network
    pub network: NetworkConfig,
}

impl Default for EnsembleOptions {
    fn default() -> Self {
        Self {
            population_size: 20,
            archive_fraction: 0.5,
            epochs: 100,
            training_window: 100,
            mutations_per_child: 10,
            mutation: default_mutation_methods(),
            network: NetworkConfig::default(),
        }
    }
}

impl EnsembleOptions {
    /// Number of networks kept in the archive each epoch
    pub fn archive_size(&self) -> usize {
        (self.population_size as f64 * self.archive_fraction).floor() as usize
    }

    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(EnsembleError::InvalidConfig(format!(
                "population_size must be at least 2, got {}",
                self.population_size
            )));
        }
        let archive = self.archive_size();
        if archive == 0 || archive >= self.population_size {
            return Err(EnsembleError::InvalidConfig(format!(
                "archive_fraction {} gives an archive of {} for a population of {}",
                self.archive_fraction, archive, self.population_size
            )));
        }
        if self.training_window == 0 {
            return Err(EnsembleError::InvalidConfig(
                "training_window must be at least 1".to_string(),
            ));
        }
        if self.mutation.iter().any(|(_, weight)| !(*weight >= 0.0))
            || !(self.mutation.iter().map(|(_, weight)| weight).sum::<f64>() > 0.0)
        {
            return Err(EnsembleError::InvalidConfig(
                "mutation weights must be non-negative with a positive sum".to_string(),
            ));
        }
        self.network.validate()
    }

    /// Load options from a JSON file; missing fields take their defaults
    pub fn load_from_json(path: &Path) -> Result<Self> {
        let options: Self = load_from_json(path)?;
        options.validate()?;
        Ok(options)
    }

    pub fn save_to_json(&self, path: &Path) -> Result<()> {
        save_to_json(self, path)
    }
}

/// Summary of one training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochReport {
    pub epoch: usize,

    /// Size of each non-dominated front, best first
    pub front_sizes: Vec<usize>,

    pub archive_size: usize,

    /// Networks dropped while building the archive
    pub discarded: usize,

    /// Lowest average error in the archive
    pub best_error: f64,

    pub mean_error: f64,

    pub min_complexity: usize,

    pub mean_complexity: f64,

    pub finished_at: DateTime<Utc>,
}

impl EpochReport {
    fn new(epoch: usize, front_sizes: Vec<usize>, archive: &[Network], discarded: usize) -> Self {
        let count = archive.len().max(1) as f64;
        Self {
            epoch,
            front_sizes,
            archive_size: archive.len(),
            discarded,
            best_error: archive
                .iter()
                .map(Network::average_error)
                .fold(f64::INFINITY, f64::min),
            mean_error: archive.iter().map(Network::average_error).sum::<f64>() / count,
            min_complexity: archive.iter().map(Network::complexity).min().unwrap_or(0),
            mean_complexity: archive.iter().map(Network::complexity).sum::<usize>() as f64 / count,
            finished_at: Utc::now(),
        }
    }
}

/// Share of `samples` the network gets wrong
pub fn compute_average_error(network: &mut Network, samples: &[Sample]) -> Result<f64> {
    if samples.is_empty() {
        return Err(EnsembleError::EmptyDataset("evaluation"));
    }
    let mut wrong = 0;
    for sample in samples {
        if network.apply_input(&sample.features, sample.class)? != sample.class {
            wrong += 1;
        }
    }
    Ok(wrong as f64 / samples.len() as f64)
}

/// Ensemble of networks evolved for accuracy and sparsity
#[derive(Debug)]
pub struct Ensemble {
    /// Configuration options
    pub options: EnsembleOptions,

    /// The working set: the initial population before training, the final
    /// Pareto front afterwards
    networks: Vec<Network>,

    /// Next free network id
    next_id: usize,

    /// Epochs run so far, across all `train` calls
    epoch: usize,

    history: Vec<EpochReport>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// End of the last `train` call
    pub last_trained_at: Option<DateTime<Utc>>,
}

impl Ensemble {
    /// Create an ensemble with `population_size` random networks
    pub fn new<R: Rng + ?Sized>(options: EnsembleOptions, rng: &mut R) -> Result<Self> {
        options.validate()?;

        let networks = (1..=options.population_size)
            .map(|id| Network::new(id, options.network.clone(), rng))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            next_id: options.population_size + 1,
            options,
            networks,
            epoch: 0,
            history: Vec::new(),
            created_at: Utc::now(),
            last_trained_at: None,
        })
    }

    fn check_samples(&self, samples: &[Sample], name: &'static str) -> Result<()> {
        if samples.is_empty() {
            return Err(EnsembleError::EmptyDataset(name));
        }
        let expected = self.options.network.input_size;
        for sample in samples {
            if sample.features.len() != expected {
                return Err(EnsembleError::InvalidInputSize {
                    expected,
                    actual: sample.features.len(),
                });
            }
            if sample.class > 1 {
                return Err(EnsembleError::InvalidClass(sample.class));
            }
        }
        Ok(())
    }

    /// Evolve the population for `options.epochs` epochs.
    ///
    /// `training` feeds lifelong RPROP training, `evaluation` scores the
    /// networks between epochs. Afterwards the working set is the Pareto
    /// front of the final population.
    pub fn train<R: Rng + ?Sized>(&mut self, training: &[Sample], evaluation: &[Sample], rng: &mut R) -> Result<()> {
        self.options.validate()?;
        let window = &training[..self.options.training_window.min(training.len())];
        self.check_samples(window, "training")?;
        self.check_samples(evaluation, "evaluation")?;

        let target = self.options.archive_size();
        let mut population = std::mem::take(&mut self.networks);

        for _ in 0..self.options.epochs {
            self.epoch += 1;

            // 1. Lifelong training
            lifelong_training(&mut population, window)?;

            // 2. Evaluate fitness
            evaluate_population(&mut population, evaluation)?;

            // 3. Rank and keep the elite
            let fronts = non_dominated_sort(population);
            let front_sizes: Vec<usize> = fronts.iter().map(Vec::len).collect();
            let (archive, discarded) = build_archive(fronts, target);

            let report = EpochReport::new(self.epoch, front_sizes, &archive, discarded.len());
            info!(
                "Epoch {}: {} fronts, best error {:.4}, mean error {:.4}, mean complexity {:.1}",
                report.epoch,
                report.front_sizes.len(),
                report.best_error,
                report.mean_error,
                report.mean_complexity
            );
            self.history.push(report);
            drop(discarded);

            // 4. Refill the population with mutated children
            let children = self.breed(&archive, self.options.population_size - archive.len(), rng)?;
            population = archive;
            population.extend(children);
        }

        // Children of the last epoch have never been scored
        evaluate_population(&mut population, evaluation)?;
        let (front, rest) = pareto_front(population);
        debug!("Final front holds {} networks, {} dominated", front.len(), rest.len());

        self.networks = front;
        self.last_trained_at = Some(Utc::now());
        Ok(())
    }

    /// Deep-copy archive members (cycling if needed) into `count` children
    /// and mutate each one.
    fn breed<R: Rng + ?Sized>(&mut self, parents: &[Network], count: usize, rng: &mut R) -> Result<Vec<Network>> {
        let mut children = Vec::with_capacity(count);
        for parent in parents.iter().cycle().take(count) {
            let mut child = Network::breed_from(parent, self.next_id);
            self.next_id += 1;

            for _ in 0..self.options.mutations_per_child {
                let method = select_mutation_method(&self.options.mutation, rng);
                child.mutate(method, rng)?;
            }
            trace!(
                "Bred network {} from {}: {} hidden, {} links",
                child.id,
                parent.id,
                child.hidden_neurons().len(),
                child.complexity()
            );
            children.push(child);
        }
        Ok(children)
    }

    fn vote(&mut self, features: &[f64]) -> Result<usize> {
        let mut votes = [0usize; 2];
        for network in &mut self.networks {
            votes[network.classify(features)?] += 1;
        }
        // Ties go to class 0
        Ok(if votes[1] > votes[0] { 1 } else { 0 })
    }

    /// Majority vote of the working set for one feature vector
    pub fn predict(&mut self, features: &[f64]) -> Result<usize> {
        self.vote(features)
    }

    /// Fraction of `samples` the majority vote classifies correctly
    pub fn test(&mut self, samples: &[Sample]) -> Result<f64> {
        self.check_samples(samples, "test")?;

        let mut right = 0;
        for sample in samples {
            if self.vote(&sample.features)? == sample.class {
                right += 1;
            }
        }

        info!(
            "Test results: {} right answers and {} wrong ones",
            right,
            samples.len() - right
        );
        Ok(right as f64 / samples.len() as f64)
    }

    /// Current working set
    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    /// Epochs run so far
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn history(&self) -> &[EpochReport] {
        &self.history
    }

    /// Write the per-epoch reports to a JSON file
    pub fn save_history(&self, path: &Path) -> Result<()> {
        save_to_json(&self.history, path)
    }
}

fn lifelong_training(population: &mut [Network], window: &[Sample]) -> Result<()> {
    for (iteration, sample) in window.iter().enumerate() {
        for network in population.iter_mut() {
            network.apply_input(&sample.features, sample.class)?;

            // The first sample has no previous gradient to compare against
            if iteration > 0 {
                network.update_by_rprop();
            }
        }
    }
    Ok(())
}

fn evaluate_population(population: &mut [Network], evaluation: &[Sample]) -> Result<()> {
    for network in population.iter_mut() {
        let error = compute_average_error(network, evaluation)?;
        network.set_average_error(error);
        trace!(
            "Network {}: error {:.4}, complexity {}",
            network.id,
            error,
            network.complexity()
        );
    }
    Ok(())
}
