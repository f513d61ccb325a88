use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Mutation operators applied to networks when breeding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationMethod {
    /// Remove an existing input-hidden or hidden-output link
    RemoveLink,

    /// Add the first missing input-hidden or hidden-output link
    AddLink,

    /// Remove a hidden neuron and every link touching it
    RemoveNeuron,

    /// Add a hidden neuron wired to the inputs and the output
    AddNeuron,

    /// Nudge every weight by a Gaussian-shaped offset
    WeightMutation,
}

impl MutationMethod {
    pub const ALL: [MutationMethod; 5] = [
        MutationMethod::RemoveLink,
        MutationMethod::AddLink,
        MutationMethod::RemoveNeuron,
        MutationMethod::AddNeuron,
        MutationMethod::WeightMutation,
    ];
}

/// What a call to `Network::mutate` actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The requested operator changed the network
    Applied,

    /// A capacity bound blocked the operator; weights were mutated instead
    FellBack,

    /// No eligible link or neuron pair was found; nothing changed
    Skipped,
}

/// Default mutation methods with probabilities
pub fn default_mutation_methods() -> Vec<(MutationMethod, f64)> {
    MutationMethod::ALL.iter().map(|&m| (m, 1.0)).collect()
}

/// Select a mutation method based on probabilities
pub fn select_mutation_method<R: Rng + ?Sized>(
    methods: &[(MutationMethod, f64)],
    rng: &mut R,
) -> MutationMethod {
    // Calculate sum of all probabilities
    let sum: f64 = methods.iter().map(|(_, prob)| prob).sum();
    if !(sum > 0.0) {
        return MutationMethod::WeightMutation;
    }

    let mut r = rng.gen::<f64>() * sum;

    for (method, prob) in methods {
        r -= prob;
        if r < 0.0 {
            return *method;
        }
    }

    // Rounding can leave a sliver past the last bucket
    methods
        .iter()
        .rev()
        .find(|(_, prob)| *prob > 0.0)
        .map(|(m, _)| *m)
        .unwrap_or(MutationMethod::WeightMutation)
}
