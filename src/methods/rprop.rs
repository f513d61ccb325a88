//! RPROP+ weight update
//!
//! Every link keeps its own step size. The step grows while the gradient
//! keeps its sign and shrinks when it flips; on a flip the previous weight
//! change is undone if the network error went up.

use serde::{Deserialize, Serialize};

use crate::architecture::connection::Connection;
use crate::utils::{EnsembleError, Result};

/// Step size parameters for RPROP+
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpropParams {
    /// Step multiplier while the gradient keeps its sign
    pub positive_eta: f64,

    /// Step multiplier after a sign change
    pub negative_eta: f64,

    pub min_step: f64,
    pub max_step: f64,

    /// Step every new link starts from
    pub initial_step: f64,
}

impl Default for RpropParams {
    fn default() -> Self {
        Self {
            positive_eta: 1.2,
            negative_eta: 0.5,
            min_step: 1e-6,
            max_step: 50.0,
            initial_step: 0.0125,
        }
    }
}

impl RpropParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.positive_eta > 1.0) {
            return Err(EnsembleError::InvalidConfig(format!(
                "rprop positive_eta must exceed 1, got {}",
                self.positive_eta
            )));
        }
        if !(self.negative_eta > 0.0 && self.negative_eta < 1.0) {
            return Err(EnsembleError::InvalidConfig(format!(
                "rprop negative_eta must lie in (0, 1), got {}",
                self.negative_eta
            )));
        }
        if !(self.min_step >= 0.0 && self.min_step <= self.initial_step && self.initial_step <= self.max_step) {
            return Err(EnsembleError::InvalidConfig(format!(
                "rprop steps must satisfy 0 <= min_step <= initial_step <= max_step, got {} <= {} <= {}",
                self.min_step, self.initial_step, self.max_step
            )));
        }
        Ok(())
    }
}

/// Direction a weight moves against the gradient; a zero gradient counts
/// as non-positive and moves the weight up.
fn descent(gradient: f64, step: f64) -> f64 {
    if gradient > 0.0 {
        -step
    } else {
        step
    }
}

/// Apply one RPROP+ step to a single link.
///
/// `error_increased` tells whether the network error got worse since the
/// previous step; it drives the backtracking on a gradient sign change.
/// Returns the weight change that was applied.
pub fn update_link(link: &mut Connection, params: &RpropParams, error_increased: bool) -> f64 {
    let gradient = link.gradient;
    let sign_change = gradient * link.previous_gradient;
    let old_step = link.step;

    let (step, weight_change) = if sign_change > 0.0 {
        let step = (old_step * params.positive_eta).min(params.max_step);
        (step, descent(gradient, step))
    } else if sign_change < 0.0 {
        let step = (old_step * params.negative_eta).max(params.min_step);
        let revert = if error_increased { -descent(gradient, step) } else { 0.0 };
        // Zeroed so the next comparison does not see the same conflict again
        link.set_gradient(0.0);
        (step, revert)
    } else {
        (old_step, descent(gradient, old_step))
    };

    link.weight += weight_change;
    link.step = step;
    weight_change
}
