/// Identifier of a neuron inside one network
pub type NeuronId = i32;

/// Identifier of the synthetic neuron every bias link starts from
pub const BIAS_ID: NeuronId = -1;

/// A directed, weighted link between two neurons.
///
/// The link also carries the value its predecessor produced in the current
/// forward pass, so the successor can read it, and the RPROP training state.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    /// Predecessor neuron; `None` for the passthrough feeding an input neuron
    pub from: Option<NeuronId>,
    pub to: NeuronId,
    pub weight: f64,
    /// Predecessor output from the last forward pass
    pub output: f64,
    pub gradient: f64,
    pub previous_gradient: f64,
    /// Adaptive RPROP step size
    pub step: f64,
}

impl Connection {
    pub fn new(from: Option<NeuronId>, to: NeuronId, weight: f64, initial_step: f64) -> Self {
        Connection {
            from,
            to,
            weight,
            output: 0.0,
            gradient: 0.0,
            previous_gradient: 0.0,
            step: initial_step,
        }
    }

    /// Link from the bias neuron; its output is always 1.0
    pub fn bias(to: NeuronId, weight: f64, initial_step: f64) -> Self {
        let mut link = Connection::new(Some(BIAS_ID), to, weight, initial_step);
        link.output = 1.0;
        link
    }

    /// Fixed unit-weight link that carries one feature into an input neuron
    pub fn passthrough(to: NeuronId, initial_step: f64) -> Self {
        Connection::new(None, to, 1.0, initial_step)
    }

    /// Store a new gradient, keeping the current one as the previous
    pub fn set_gradient(&mut self, gradient: f64) {
        self.previous_gradient = self.gradient;
        self.gradient = gradient;
    }

    /// Copy of this link for a child network: same endpoints, weight and
    /// cached output, fresh training state.
    pub fn inherit(&self, initial_step: f64) -> Self {
        Connection {
            output: self.output,
            ..Connection::new(self.from, self.to, self.weight, initial_step)
        }
    }

    /// Weighted contribution to the successor's input sum
    pub fn signal(&self) -> f64 {
        self.output * self.weight
    }
}
