use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use log::{debug, trace};
use rand::Rng;

use crate::architecture::connection::{Connection, NeuronId, BIAS_ID};
use crate::architecture::connectivity::Connectivity;
use crate::architecture::node::{Layer, Node};
use crate::config::NetworkConfig;
use crate::methods::activation::activation::output_slope;
use crate::methods::mutation::{MutationMethod, MutationOutcome};
use crate::methods::rprop;
use crate::methods::selection::Individual;
use crate::utils::{gaussian_offset, random_double, random_integer, EnsembleError, Result};

/// The two kinds of ordinary link a network may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkCategory {
    InputHidden,
    HiddenOutput,
}

impl LinkCategory {
    fn random<R: Rng + ?Sized>(rng: &mut R) -> Result<Self> {
        Ok(match random_integer(rng, 0, 2)? {
            0 => LinkCategory::InputHidden,
            _ => LinkCategory::HiddenOutput,
        })
    }
}

/// Feed-forward binary classifier with one pool of hidden neurons.
///
/// Neuron ids are laid out as inputs `1..=I`, outputs `I+1..=I+O` and hidden
/// neurons `I+O+1..=max_hidden_id`, with `-1` reserved for the bias source.
/// The hidden range stays contiguous through every mutation.
#[derive(Debug)]
pub struct Network {
    /// Unique ID for the network
    pub id: usize,

    config: NetworkConfig,

    input_neurons: Vec<NeuronId>,
    hidden_neurons: Vec<NeuronId>,
    output_neurons: Vec<NeuronId>,

    /// Every neuron, the bias source included
    neurons: BTreeMap<NeuronId, Node>,
    connectivity: Connectivity,
    max_hidden_id: NeuronId,

    /// Class predicted by the last training pass
    last_output: usize,
    last_error: f64,
    /// Error of the pass before the last one, for the RPROP+ backtracking test
    previous_error: f64,
    average_error: f64,
    sparsity: f64,
}

/// Activate one neuron in place.
fn activate(neurons: &mut BTreeMap<NeuronId, Node>, links: &mut Connectivity, id: NeuronId) -> f64 {
    neurons
        .get_mut(&id)
        .map_or(0.0, |node| node.compute_output(links))
}

impl Network {
    /// Create a network with `hidden_size` hidden neurons and every
    /// input-hidden and hidden-output pair linked with probability
    /// `link_probability`.
    pub fn new<R: Rng + ?Sized>(id: usize, config: NetworkConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let step = config.rprop.initial_step;
        let inputs = config.input_size as NeuronId;
        let outputs = config.output_size as NeuronId;

        let mut network = Network {
            id,
            max_hidden_id: config.first_hidden_id() - 1,
            config,
            input_neurons: Vec::new(),
            hidden_neurons: Vec::new(),
            output_neurons: Vec::new(),
            neurons: BTreeMap::new(),
            connectivity: Connectivity::new(),
            last_output: 0,
            last_error: 0.0,
            previous_error: 0.0,
            average_error: 0.0,
            sparsity: 0.0,
        };

        network.neurons.insert(BIAS_ID, Node::new(BIAS_ID, Layer::Bias));

        for neuron in 1..=inputs {
            network.neurons.insert(neuron, Node::input(neuron, step));
            network.input_neurons.push(neuron);
            network.add_bias_link(neuron, rng)?;
        }

        // Outputs take the ids below the hidden pool so that only hidden ids
        // ever change.
        for neuron in inputs + 1..=inputs + outputs {
            network.neurons.insert(neuron, Node::new(neuron, Layer::Output));
            network.output_neurons.push(neuron);
            network.add_bias_link(neuron, rng)?;
        }

        for _ in 0..network.config.hidden_size {
            network.push_hidden(rng)?;
        }

        let probability = network.config.link_probability;
        let hidden = network.hidden_range();
        for input in network.input_neurons.clone() {
            for neuron in hidden.clone() {
                if rng.gen_bool(probability) {
                    let weight = network.random_weight(rng)?;
                    network.connect(input, neuron, weight);
                }
            }
        }
        for neuron in hidden {
            for output in network.output_neurons.clone() {
                if rng.gen_bool(probability) {
                    let weight = network.random_weight(rng)?;
                    network.connect(neuron, output, weight);
                }
            }
        }

        Ok(network)
    }

    /// Deep copy of `parent` under a new id.
    ///
    /// Topology, weights and fitness carry over; the RPROP state of every
    /// link starts afresh and the sparsity is cleared. The child shares
    /// nothing with its parent.
    pub fn breed_from(parent: &Network, id: usize) -> Self {
        let step = parent.config.rprop.initial_step;
        let neurons = parent
            .neurons
            .iter()
            .map(|(&neuron, node)| (neuron, node.detached(step)))
            .collect();

        let mut child = Network {
            id,
            config: parent.config.clone(),
            input_neurons: parent.input_neurons.clone(),
            hidden_neurons: parent.hidden_neurons.clone(),
            output_neurons: parent.output_neurons.clone(),
            neurons,
            connectivity: Connectivity::new(),
            max_hidden_id: parent.max_hidden_id,
            last_output: parent.last_output,
            last_error: parent.last_error,
            previous_error: parent.previous_error,
            average_error: parent.average_error,
            sparsity: 0.0,
        };

        for link in parent.connectivity.links() {
            let copy = link.inherit(step);
            let (Some(from), to) = (copy.from, copy.to) else {
                continue;
            };
            if child.connectivity.add_link(copy) {
                child.hook(from, to);
            }
        }
        child
    }

    fn hidden_range(&self) -> RangeInclusive<NeuronId> {
        self.config.first_hidden_id()..=self.max_hidden_id
    }

    fn input_range(&self) -> RangeInclusive<NeuronId> {
        1..=self.config.input_size as NeuronId
    }

    fn output_range(&self) -> RangeInclusive<NeuronId> {
        let first = self.config.input_size as NeuronId + 1;
        first..=first + self.config.output_size as NeuronId - 1
    }

    fn endpoints(&self, category: LinkCategory) -> (RangeInclusive<NeuronId>, RangeInclusive<NeuronId>) {
        match category {
            LinkCategory::InputHidden => (self.input_range(), self.hidden_range()),
            LinkCategory::HiddenOutput => (self.hidden_range(), self.output_range()),
        }
    }

    fn random_weight<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        let range = self.config.weight_range;
        random_double(rng, range.min, range.max)
    }

    /// Register an indexed link with both endpoint nodes
    fn hook(&mut self, from: NeuronId, to: NeuronId) {
        if let Some(node) = self.neurons.get_mut(&from) {
            node.add_out(to);
        }
        if let Some(node) = self.neurons.get_mut(&to) {
            node.add_in(from);
        }
    }

    /// Link `from` to `to`; `false` if the pair is already linked
    fn connect(&mut self, from: NeuronId, to: NeuronId, weight: f64) -> bool {
        let link = Connection::new(Some(from), to, weight, self.config.rprop.initial_step);
        if !self.connectivity.add_link(link) {
            return false;
        }
        self.hook(from, to);
        true
    }

    fn disconnect(&mut self, from: NeuronId, to: NeuronId) -> bool {
        if self.connectivity.remove_link(from, to).is_none() {
            return false;
        }
        if let Some(node) = self.neurons.get_mut(&from) {
            node.remove_out(to);
        }
        if let Some(node) = self.neurons.get_mut(&to) {
            node.remove_in(from);
        }
        true
    }

    fn add_bias_link<R: Rng + ?Sized>(&mut self, neuron: NeuronId, rng: &mut R) -> Result<()> {
        let range = self.config.bias_range;
        let weight = random_double(rng, range.min, range.max)?;
        let link = Connection::bias(neuron, weight, self.config.rprop.initial_step);
        if self.connectivity.add_link(link) {
            self.hook(BIAS_ID, neuron);
        }
        Ok(())
    }

    /// Append a hidden neuron with only its bias link
    fn push_hidden<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<NeuronId> {
        let neuron = self.max_hidden_id + 1;
        self.neurons.insert(neuron, Node::new(neuron, Layer::Hidden));
        self.hidden_neurons.push(neuron);
        self.max_hidden_id = neuron;
        self.add_bias_link(neuron, rng)?;
        Ok(neuron)
    }

    /// Run one sample through the network and compute the gradients for it.
    ///
    /// Returns the predicted class (output above zero means class 1).
    pub fn apply_input(&mut self, features: &[f64], expected_class: usize) -> Result<usize> {
        if expected_class > 1 {
            return Err(EnsembleError::InvalidClass(expected_class));
        }
        self.last_output = self.forward(features)?;

        self.previous_error = self.last_error;
        self.last_error = if self.last_output == expected_class { 0.0 } else { 1.0 };

        self.compute_gradients(expected_class);
        Ok(self.last_output)
    }

    /// Predict the class of a feature vector without touching the error
    /// and gradient state used by training.
    pub fn classify(&mut self, features: &[f64]) -> Result<usize> {
        self.forward(features)
    }

    fn forward(&mut self, features: &[f64]) -> Result<usize> {
        if features.len() != self.input_neurons.len() {
            return Err(EnsembleError::InvalidInputSize {
                expected: self.input_neurons.len(),
                actual: features.len(),
            });
        }

        for (&neuron, &value) in self.input_neurons.iter().zip(features) {
            if let Some(node) = self.neurons.get_mut(&neuron) {
                node.set_feature(value);
                node.compute_output(&mut self.connectivity);
            }
        }

        // Hidden neurons never feed each other, so list order is enough
        for &neuron in &self.hidden_neurons {
            activate(&mut self.neurons, &mut self.connectivity, neuron);
        }

        let output = activate(&mut self.neurons, &mut self.connectivity, self.output_neurons[0]);
        Ok(if output > 0.0 { 1 } else { 0 })
    }

    /// Backpropagate the last forward pass into the link gradients
    fn compute_gradients(&mut self, expected_class: usize) {
        let target = if expected_class == 0 { -1.0 } else { 1.0 };
        let output_id = self.output_neurons[0];
        let Some(output) = self.neurons.get(&output_id) else {
            return;
        };

        let out = output.activation;
        let output_gradient = output_slope(out) * (target - out);
        for &from in &output.in_conns {
            if let Some(link) = self.connectivity.link_mut(from, output_id) {
                link.set_gradient(output_gradient);
            }
        }

        for &neuron in &self.hidden_neurons {
            let Some(node) = self.neurons.get(&neuron) else {
                continue;
            };
            let sum: f64 = node
                .out_conns
                .iter()
                .filter_map(|&to| self.connectivity.link(neuron, to))
                .map(|link| link.weight * output_gradient)
                .sum();
            let gradient = output_slope(node.activation) * sum;

            for &from in &node.in_conns {
                if let Some(link) = self.connectivity.link_mut(from, neuron) {
                    link.set_gradient(gradient);
                }
            }
        }
    }

    /// One RPROP+ step over every indexed link
    pub fn update_by_rprop(&mut self) {
        let error_increased = self.last_error > self.previous_error;
        for link in self.connectivity.links_mut() {
            rprop::update_link(link, &self.config.rprop, error_increased);
        }
    }

    /// Apply one mutation operator.
    ///
    /// Capacity bounds turn structural operators into a weight mutation;
    /// an operator that finds no eligible pair leaves the network untouched.
    pub fn mutate<R: Rng + ?Sized>(&mut self, method: MutationMethod, rng: &mut R) -> Result<MutationOutcome> {
        let outcome = match method {
            MutationMethod::RemoveLink => self.remove_random_link(rng)?,
            MutationMethod::AddLink => self.add_free_link(rng)?,
            MutationMethod::RemoveNeuron => self.remove_random_neuron(rng)?,
            MutationMethod::AddNeuron => self.add_hidden_neuron(rng)?,
            MutationMethod::WeightMutation => {
                self.apply_gaussian_mutation();
                MutationOutcome::Applied
            }
        };

        if outcome == MutationOutcome::Skipped {
            debug!("network {}: {:?} found nothing to change", self.id, method);
        }
        debug_assert!(self.check_topology().is_ok(), "{:?}", self.check_topology());
        Ok(outcome)
    }

    fn fall_back(&mut self, method: MutationMethod) -> MutationOutcome {
        debug!(
            "network {}: {:?} blocked at {} hidden / {} links, mutating weights",
            self.id,
            method,
            self.hidden_neurons.len(),
            self.complexity()
        );
        self.apply_gaussian_mutation();
        MutationOutcome::FellBack
    }

    fn remove_random_link<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<MutationOutcome> {
        if self.complexity() <= self.config.min_links {
            return Ok(self.fall_back(MutationMethod::RemoveLink));
        }

        let (preds, succs) = self.endpoints(LinkCategory::random(rng)?);
        for _ in 0..self.config.max_link_attempts {
            let from = random_integer(rng, *preds.start(), *preds.end() + 1)?;
            let to = random_integer(rng, *succs.start(), *succs.end() + 1)?;
            if self.disconnect(from, to) {
                trace!("network {}: removed link {} -> {}", self.id, from, to);
                return Ok(MutationOutcome::Applied);
            }
        }
        Ok(MutationOutcome::Skipped)
    }

    /// Adds the first missing link of a random category, scanning pairs in
    /// ascending order.
    fn add_free_link<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<MutationOutcome> {
        let (preds, succs) = self.endpoints(LinkCategory::random(rng)?);
        for from in preds {
            for to in succs.clone() {
                if !self.connectivity.connected(from, to) {
                    let weight = self.random_weight(rng)?;
                    self.connect(from, to, weight);
                    trace!("network {}: added link {} -> {}", self.id, from, to);
                    return Ok(MutationOutcome::Applied);
                }
            }
        }
        Ok(MutationOutcome::Skipped)
    }

    fn remove_random_neuron<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<MutationOutcome> {
        if self.hidden_neurons.len() <= self.config.min_hidden {
            return Ok(self.fall_back(MutationMethod::RemoveNeuron));
        }

        let victim = random_integer(rng, self.config.first_hidden_id(), self.max_hidden_id + 1)?;
        self.remove_hidden_neuron(victim);
        Ok(MutationOutcome::Applied)
    }

    /// Remove a hidden neuron and all its links.
    ///
    /// The hidden neuron with the highest id takes over the freed id so the
    /// hidden range stays contiguous. Returns `false` if `victim` is not a
    /// hidden neuron. Ignores the `min_hidden` floor.
    pub fn remove_hidden_neuron(&mut self, victim: NeuronId) -> bool {
        if !self.hidden_neurons.contains(&victim) {
            return false;
        }

        let removed = self.connectivity.remove_all_links(victim, &mut self.neurons);
        self.neurons.remove(&victim);
        self.hidden_neurons.retain(|&neuron| neuron != victim);

        let last = self.max_hidden_id;
        if victim != last {
            if let Some(mut node) = self.neurons.remove(&last) {
                node.id = victim;
                self.neurons.insert(victim, node);
            }
            self.connectivity.change_id(last, victim, &mut self.neurons);
            for neuron in self.hidden_neurons.iter_mut() {
                if *neuron == last {
                    *neuron = victim;
                }
            }
        }
        self.max_hidden_id -= 1;

        trace!(
            "network {}: removed hidden neuron {} with {} links, {} renumbered",
            self.id,
            victim,
            removed,
            last
        );
        true
    }

    fn add_hidden_neuron<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<MutationOutcome> {
        if self.hidden_neurons.len() >= self.config.max_hidden {
            return Ok(self.fall_back(MutationMethod::AddNeuron));
        }

        let neuron = self.push_hidden(rng)?;
        let probability = self.config.link_probability;

        for input in self.input_neurons.clone() {
            if rng.gen_bool(probability) {
                let weight = self.random_weight(rng)?;
                self.connect(input, neuron, weight);
            }
        }

        // Always reach the output; later mutations may cut the link again
        for output in self.output_neurons.clone() {
            let weight = self.random_weight(rng)?;
            self.connect(neuron, output, weight);
        }

        trace!("network {}: added hidden neuron {}", self.id, neuron);
        Ok(MutationOutcome::Applied)
    }

    /// Shift every link weight by its Gaussian-shaped offset
    pub fn apply_gaussian_mutation(&mut self) {
        let range = self.config.perturbation_range;
        for link in self.connectivity.links_mut() {
            link.weight += gaussian_offset(link.weight, range.min, range.max);
        }
    }

    /// Describe the first broken structural invariant, if any
    pub fn check_topology(&self) -> std::result::Result<(), String> {
        let hidden: BTreeSet<NeuronId> = self.hidden_neurons.iter().copied().collect();
        let expected: BTreeSet<NeuronId> = self.hidden_range().collect();
        if hidden.len() != self.hidden_neurons.len() || hidden != expected {
            return Err(format!(
                "hidden ids {:?} are not the contiguous range {:?}",
                self.hidden_neurons,
                self.hidden_range()
            ));
        }

        let layer_count = 1 + self.input_neurons.len() + self.output_neurons.len() + self.hidden_neurons.len();
        if self.neurons.len() != layer_count {
            return Err(format!(
                "{} neurons stored but {} listed in layers",
                self.neurons.len(),
                layer_count
            ));
        }

        for (&id, node) in &self.neurons {
            if node.id != id {
                return Err(format!("neuron stored under {} reports id {}", id, node.id));
            }
            if node.layer != Layer::Bias && !self.connectivity.contains(BIAS_ID, id) {
                return Err(format!("neuron {} has no bias link", id));
            }
        }

        let layer_of = |id: NeuronId| self.neurons.get(&id).map(|node| node.layer);
        let mut wiring = 0;
        for (from, to) in self.connectivity.keys() {
            match (layer_of(from), layer_of(to)) {
                (Some(Layer::Bias), Some(layer)) if layer != Layer::Bias => {}
                (Some(Layer::Input), Some(Layer::Hidden)) => {}
                (Some(Layer::Hidden), Some(Layer::Output)) => {}
                (a, b) => return Err(format!("illegal link {} -> {} ({:?} -> {:?})", from, to, a, b)),
            }
            let listed = self.neurons[&from].out_conns.contains(&to) && self.neurons[&to].in_conns.contains(&from);
            if !listed {
                return Err(format!("link {} -> {} missing from neighbour lists", from, to));
            }
            wiring += 1;
        }

        let listed: usize = self.neurons.values().map(|node| node.out_conns.len()).sum();
        if listed != wiring {
            return Err(format!("{} outgoing ids listed for {} links", listed, wiring));
        }
        Ok(())
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn input_neurons(&self) -> &[NeuronId] {
        &self.input_neurons
    }

    pub fn hidden_neurons(&self) -> &[NeuronId] {
        &self.hidden_neurons
    }

    pub fn output_neurons(&self) -> &[NeuronId] {
        &self.output_neurons
    }

    pub fn neuron(&self, id: NeuronId) -> Option<&Node> {
        self.neurons.get(&id)
    }

    pub fn neurons(&self) -> impl Iterator<Item = &Node> {
        self.neurons.values()
    }

    pub fn link(&self, from: NeuronId, to: NeuronId) -> Option<&Connection> {
        self.connectivity.link(from, to)
    }

    pub fn link_mut(&mut self, from: NeuronId, to: NeuronId) -> Option<&mut Connection> {
        self.connectivity.link_mut(from, to)
    }

    pub fn links(&self) -> impl Iterator<Item = &Connection> {
        self.connectivity.links()
    }

    pub fn max_hidden_id(&self) -> NeuronId {
        self.max_hidden_id
    }

    /// Number of links, bias links included
    pub fn complexity(&self) -> usize {
        self.connectivity.complexity()
    }

    /// Class predicted by the last `apply_input` call
    pub fn output(&self) -> usize {
        self.last_output
    }

    /// 0/1 error of the last forward pass
    pub fn error(&self) -> f64 {
        self.last_error
    }

    pub fn previous_error(&self) -> f64 {
        self.previous_error
    }

    pub fn average_error(&self) -> f64 {
        self.average_error
    }

    pub fn set_average_error(&mut self, error: f64) {
        self.average_error = error;
    }

    pub fn sparsity(&self) -> f64 {
        self.sparsity
    }

    pub fn set_sparsity(&mut self, sparsity: f64) {
        self.sparsity = sparsity;
    }
}

impl Individual for Network {
    fn objectives(&self) -> [f64; 2] {
        [self.average_error, self.complexity() as f64]
    }

    fn sparsity(&self) -> f64 {
        self.sparsity
    }

    fn set_sparsity(&mut self, sparsity: f64) {
        self.sparsity = sparsity;
    }
}
