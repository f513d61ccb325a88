// Algorithm methods used by the ensemble: activation, training, mutation
// and selection.

pub mod activation;
pub mod mutation;
pub mod rprop;
pub mod selection;

pub use activation::ActivationFunction;
pub use mutation::{MutationMethod, MutationOutcome};
pub use rprop::RpropParams;
pub use selection::Individual;
