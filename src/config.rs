use serde::{Deserialize, Serialize};

use crate::methods::rprop::RpropParams;
use crate::utils::{EnsembleError, Result};

/// Half-open interval of reals used for random draws and clamping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn check(&self, name: &str) -> Result<()> {
        if !(self.max > self.min) {
            return Err(EnsembleError::InvalidConfig(format!(
                "{} must have max above min, got [{}, {})",
                name, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Problem and topology constants shared by every network of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Length of the feature vector (and number of input neurons)
    pub input_size: usize,

    /// Number of output neurons; a binary classifier uses exactly one
    pub output_size: usize,

    /// Hidden neurons created with a fresh network
    pub hidden_size: usize,

    /// RemoveNeuron keeps at least this many hidden neurons
    pub min_hidden: usize,

    /// AddNeuron never grows the hidden pool past this
    pub max_hidden: usize,

    /// RemoveLink only runs while the network has more links than this
    pub min_links: usize,

    /// Chance of wiring each candidate pair on construction and AddNeuron
    pub link_probability: f64,

    /// Initial weight of ordinary links
    pub weight_range: Interval,

    /// Initial weight of bias links
    pub bias_range: Interval,

    /// Bounds of the Gaussian weight-mutation offset
    pub perturbation_range: Interval,

    /// Random endpoint draws RemoveLink tries before giving up
    pub max_link_attempts: usize,

    /// RPROP+ step parameters
    pub rprop: RpropParams,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            input_size: 9,
            output_size: 1,
            hidden_size: 10,
            min_hidden: 4,
            max_hidden: 10,
            min_links: 15,
            link_probability: 0.5,
            weight_range: Interval::new(-0.2, 0.2),
            bias_range: Interval::new(-6.0, 1.0),
            perturbation_range: Interval::new(0.0, 0.05),
            max_link_attempts: 20,
            rprop: RpropParams::default(),
        }
    }
}

impl NetworkConfig {
    /// Config for a network with the given layer sizes and default bounds
    pub fn with_sizes(input_size: usize, hidden_size: usize) -> Self {
        let defaults = Self::default();
        Self {
            input_size,
            hidden_size,
            min_hidden: defaults.min_hidden.min(hidden_size),
            max_hidden: defaults.max_hidden.max(hidden_size),
            ..defaults
        }
    }

    /// Reject configurations the network code cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(EnsembleError::InvalidConfig(
                "input_size must be at least 1".to_string(),
            ));
        }
        if self.output_size != 1 {
            return Err(EnsembleError::InvalidConfig(format!(
                "a binary classifier has exactly one output neuron, got {}",
                self.output_size
            )));
        }
        if self.min_hidden == 0 {
            return Err(EnsembleError::InvalidConfig(
                "min_hidden must be at least 1".to_string(),
            ));
        }
        if self.min_hidden > self.hidden_size || self.hidden_size > self.max_hidden {
            return Err(EnsembleError::InvalidConfig(format!(
                "hidden sizes must satisfy min_hidden <= hidden_size <= max_hidden, got {} <= {} <= {}",
                self.min_hidden, self.hidden_size, self.max_hidden
            )));
        }
        if !(0.0..=1.0).contains(&self.link_probability) {
            return Err(EnsembleError::InvalidConfig(format!(
                "link_probability must lie in [0, 1], got {}",
                self.link_probability
            )));
        }
        if self.max_link_attempts == 0 {
            return Err(EnsembleError::InvalidConfig(
                "max_link_attempts must be at least 1".to_string(),
            ));
        }
        self.weight_range.check("weight_range")?;
        self.bias_range.check("bias_range")?;
        self.perturbation_range.check("perturbation_range")?;
        self.rprop.validate()
    }

    /// Identifier of the first hidden neuron
    pub fn first_hidden_id(&self) -> i32 {
        (self.input_size + self.output_size) as i32 + 1
    }
}
