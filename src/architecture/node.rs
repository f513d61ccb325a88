use crate::architecture::connection::{Connection, NeuronId};
use crate::architecture::connectivity::Connectivity;
use crate::methods::activation::ActivationFunction;

/// Layer a neuron belongs to; fixed for the neuron's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// The synthetic source of every bias link
    Bias,
    Input,
    Hidden,
    Output,
}

/// A neuron in the network graph.
///
/// Links are owned by the network's [`Connectivity`] index; a node only
/// records the ids of its neighbours. The exception is the passthrough link
/// of an input neuron, which lives on the node itself.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NeuronId,
    pub layer: Layer,
    pub squash: ActivationFunction,
    /// Output of the last `compute_output` call
    pub activation: f64,
    pub passthrough: Option<Connection>,
    /// Predecessors, i.e. keys `(pred, id)` in the index
    pub in_conns: Vec<NeuronId>,
    /// Successors, i.e. keys `(id, succ)` in the index
    pub out_conns: Vec<NeuronId>,
}

impl Node {
    /// Creates a new node; output neurons use the tangent, all others the sigmoid
    pub fn new(id: NeuronId, layer: Layer) -> Self {
        let squash = match layer {
            Layer::Output => ActivationFunction::Tangent,
            _ => ActivationFunction::Sigmoid,
        };
        Node {
            id,
            layer,
            squash,
            activation: 0.0,
            passthrough: None,
            in_conns: vec![],
            out_conns: vec![],
        }
    }

    /// Input neuron with its feature passthrough link
    pub fn input(id: NeuronId, initial_step: f64) -> Self {
        let mut node = Node::new(id, Layer::Input);
        node.passthrough = Some(Connection::passthrough(id, initial_step));
        node
    }

    /// Same layer, activation and passthrough as `self`, no neighbours
    pub fn detached(&self, initial_step: f64) -> Self {
        let mut node = Node::new(self.id, self.layer);
        node.squash = self.squash;
        node.passthrough = self
            .passthrough
            .as_ref()
            .map(|link| link.inherit(initial_step));
        node
    }

    pub fn add_in(&mut self, from: NeuronId) {
        if !self.in_conns.contains(&from) {
            self.in_conns.push(from);
        }
    }

    pub fn add_out(&mut self, to: NeuronId) {
        if !self.out_conns.contains(&to) {
            self.out_conns.push(to);
        }
    }

    pub fn remove_in(&mut self, from: NeuronId) {
        self.in_conns.retain(|&id| id != from);
    }

    pub fn remove_out(&mut self, to: NeuronId) {
        self.out_conns.retain(|&id| id != to);
    }

    /// Follow a neighbour that changed its id
    pub fn rename_neighbour(&mut self, old: NeuronId, new: NeuronId) {
        for id in self.in_conns.iter_mut().chain(self.out_conns.iter_mut()) {
            if *id == old {
                *id = new;
            }
        }
    }

    /// Overwrite the feature carried by the passthrough link
    pub fn set_feature(&mut self, value: f64) {
        if let Some(link) = self.passthrough.as_mut() {
            link.output = value;
        }
    }

    /// Activate from the incoming links and publish the result on the
    /// outgoing ones.
    pub fn compute_output(&mut self, links: &mut Connectivity) -> f64 {
        let mut z = self.passthrough.as_ref().map_or(0.0, Connection::signal);
        for &from in &self.in_conns {
            if let Some(link) = links.link(from, self.id) {
                z += link.signal();
            }
        }

        self.activation = self.squash.apply(z);

        for &to in &self.out_conns {
            if let Some(link) = links.link_mut(self.id, to) {
                link.output = self.activation;
            }
        }
        self.activation
    }
}
