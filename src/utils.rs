//! Utility functions for the neuro-ensemble crate

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnsembleError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid random range: maximum {max} is not above minimum {min}")]
    InvalidRange { min: f64, max: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input size: expected {expected}, got {actual}")]
    InvalidInputSize { expected: usize, actual: usize },

    #[error("Invalid class label {0}: only binary labels 0 and 1 are supported")]
    InvalidClass(usize),

    #[error("Empty {0} set")]
    EmptyDataset(&'static str),

    #[error("Unrecognized token {token:?} on line {line}")]
    UnknownToken { line: usize, token: String },

    #[error("No class label at the end of line {0}")]
    MissingLabel(usize),

    #[error("Line {line} has {actual} board cells, expected {expected}")]
    CellCount { line: usize, expected: usize, actual: usize },
}

/// Result type for ensemble operations
pub type Result<T> = std::result::Result<T, EnsembleError>;

/// Uniform integer in `[min, max)`.
pub fn random_integer<R: Rng + ?Sized>(rng: &mut R, min: i32, max: i32) -> Result<i32> {
    if max <= min {
        return Err(EnsembleError::InvalidRange {
            min: min as f64,
            max: max as f64,
        });
    }
    Ok(rng.gen_range(min..max))
}

/// Uniform real in `[min, max)`.
pub fn random_double<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> Result<f64> {
    // Also catches NaN bounds
    if !(max > min) {
        return Err(EnsembleError::InvalidRange { min, max });
    }
    Ok(min + rng.gen::<f64>() * (max - min))
}

fn normal_density(x: f64, sigma: f64, mu: f64) -> f64 {
    let factor = 1.0 / (sigma * (2.0 * PI).sqrt());
    let exponent = -0.5 * ((x - mu) / sigma).powi(2);
    factor * exponent.exp()
}

/// Weight offset for a Gaussian-shaped mutation.
///
/// The offset is the normal density at `x` (centred on `(high - low) / 2`,
/// spread `high - low`) clamped into `[low, high]`, so weights near the
/// centre get the full `high` nudge and far-away weights only `low`.
pub fn gaussian_offset(x: f64, low: f64, high: f64) -> f64 {
    let sigma = high - low;
    let mu = sigma / 2.0;
    normal_density(x, sigma, mu).max(low).min(high)
}

/// Helper function to save any serializable struct to JSON file
pub fn save_to_json<T: Serialize>(data: &T, path: &Path) -> Result<()> {
    let serialized = serde_json::to_string_pretty(data)?;
    let mut file = File::create(path)?;
    file.write_all(serialized.as_bytes())?;
    Ok(())
}

/// Helper function to load any deserializable struct from JSON file
pub fn load_from_json<T: for<'a> Deserialize<'a>>(path: &Path) -> Result<T> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    let deserialized = serde_json::from_str(&contents)?;
    Ok(deserialized)
}

/// Get current timestamp as string (YYYYMMDD_HHMMSS)
pub fn get_timestamp() -> String {
    use chrono::Local;
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}
