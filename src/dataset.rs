//! Labeled samples and the tic-tac-toe endgame loader.
//!
//! Each CSV row holds the nine board cells (`x`, `o` or `b` for blank) and
//! a `positive`/`negative` verdict on whether `x` wins.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::utils::{EnsembleError, Result};

/// Cells on a tic-tac-toe board, one feature each
pub const BOARD_CELLS: usize = 9;

/// One feature vector with its binary class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub features: Vec<f64>,
    pub class: usize,
}

impl Sample {
    pub fn new(features: Vec<f64>, class: usize) -> Self {
        Self { features, class }
    }
}

/// An ordered collection of samples owned by the caller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    samples: Vec<Sample>,
}

impl Dataset {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// Load the tic-tac-toe endgame file
    pub fn from_tic_tac_toe(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let dataset = Self::from_tic_tac_toe_reader(BufReader::new(file))?;
        info!("Loaded {} samples from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Parse tic-tac-toe rows from any reader.
    ///
    /// Every row must hold exactly [`BOARD_CELLS`] cells followed by the
    /// label; errors carry the 1-based row number.
    pub fn from_tic_tac_toe_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut samples = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let line = index + 1;
            let mut tokens: Vec<&str> = record.iter().collect();

            let class = match tokens.pop() {
                Some("positive") => 1,
                Some("negative") => 0,
                Some("x" | "o" | "b") | None => return Err(EnsembleError::MissingLabel(line)),
                Some(other) => {
                    return Err(EnsembleError::UnknownToken {
                        line,
                        token: other.to_string(),
                    })
                }
            };

            let features = tokens
                .iter()
                .map(|&token| match token {
                    "x" => Ok(-1.0),
                    "b" => Ok(0.0),
                    "o" => Ok(1.0),
                    other => Err(EnsembleError::UnknownToken {
                        line,
                        token: other.to_string(),
                    }),
                })
                .collect::<Result<Vec<f64>>>()?;

            if features.len() != BOARD_CELLS {
                return Err(EnsembleError::CellCount {
                    line,
                    expected: BOARD_CELLS,
                    actual: features.len(),
                });
            }
            samples.push(Sample::new(features, class));
        }
        Ok(Self { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Length of the feature vectors, taken from the first sample
    pub fn feature_len(&self) -> Option<usize> {
        self.samples.first().map(|sample| sample.features.len())
    }

    /// Put the samples in random order
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.samples.shuffle(rng);
    }

    /// Split into the first `at` samples and the rest
    pub fn split(mut self, at: usize) -> (Dataset, Dataset) {
        let rest = self.samples.split_off(at.min(self.samples.len()));
        (self, Dataset::new(rest))
    }
}

impl From<Vec<Sample>> for Dataset {
    fn from(samples: Vec<Sample>) -> Self {
        Self::new(samples)
    }
}
