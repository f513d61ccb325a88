// neuro-ensemble: evolves a Pareto ensemble of small feed-forward classifiers.
// Networks are trained with RPROP+ between generations, mutated structurally
// when bred, and ranked on classification error against link count.

pub mod architecture;
pub mod config;
pub mod dataset;
pub mod ensemble;
pub mod methods;
pub mod utils;

pub use crate::architecture::network::Network;
pub use crate::config::NetworkConfig;
pub use crate::dataset::{Dataset, Sample};
pub use crate::ensemble::{Ensemble, EnsembleOptions, EpochReport};
pub use crate::utils::{EnsembleError, Result};
