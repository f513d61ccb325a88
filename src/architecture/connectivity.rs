//! Index of every link in a network, keyed by `(predecessor, successor)`.
//!
//! Neurons come and go during mutation, so links live in an ordered map
//! rather than an adjacency matrix. The map owns the links; nodes only keep
//! neighbour ids, which the bulk operations here keep in sync.

use std::collections::BTreeMap;

use crate::architecture::connection::{Connection, NeuronId};
use crate::architecture::node::Node;

#[derive(Debug, Clone, Default)]
pub struct Connectivity {
    links: BTreeMap<(NeuronId, NeuronId), Connection>,
}

impl Connectivity {
    pub fn new() -> Self {
        Self::default()
    }

    /// The link from `from` to `to`, if any
    pub fn link(&self, from: NeuronId, to: NeuronId) -> Option<&Connection> {
        self.links.get(&(from, to))
    }

    pub fn link_mut(&mut self, from: NeuronId, to: NeuronId) -> Option<&mut Connection> {
        self.links.get_mut(&(from, to))
    }

    pub fn contains(&self, from: NeuronId, to: NeuronId) -> bool {
        self.links.contains_key(&(from, to))
    }

    /// Whether `a` and `b` are linked in either direction
    pub fn connected(&self, a: NeuronId, b: NeuronId) -> bool {
        self.contains(a, b) || self.contains(b, a)
    }

    pub fn keys(&self) -> impl Iterator<Item = (NeuronId, NeuronId)> + '_ {
        self.links.keys().copied()
    }

    pub fn links(&self) -> impl Iterator<Item = &Connection> {
        self.links.values()
    }

    pub fn links_mut(&mut self) -> impl Iterator<Item = &mut Connection> {
        self.links.values_mut()
    }

    /// Number of links
    pub fn complexity(&self) -> usize {
        self.links.len()
    }

    /// Index a link under its endpoints.
    ///
    /// Returns `false` and drops nothing from the index when the link has
    /// no predecessor or the pair is already taken.
    pub fn add_link(&mut self, link: Connection) -> bool {
        let Some(from) = link.from else {
            return false;
        };
        let key = (from, link.to);
        if self.links.contains_key(&key) {
            return false;
        }
        self.links.insert(key, link);
        true
    }

    pub fn remove_link(&mut self, from: NeuronId, to: NeuronId) -> Option<Connection> {
        self.links.remove(&(from, to))
    }

    fn keys_touching(&self, neuron: NeuronId) -> Vec<(NeuronId, NeuronId)> {
        self.links
            .keys()
            .filter(|&&(from, to)| from == neuron || to == neuron)
            .copied()
            .collect()
    }

    /// Drop every link going to or coming from `neuron` and unhook it from
    /// the neighbours' lists. Returns how many links were removed.
    pub fn remove_all_links(
        &mut self,
        neuron: NeuronId,
        neurons: &mut BTreeMap<NeuronId, Node>,
    ) -> usize {
        let keys = self.keys_touching(neuron);
        for &(from, to) in &keys {
            self.links.remove(&(from, to));
            if from == neuron {
                if let Some(next) = neurons.get_mut(&to) {
                    next.remove_in(neuron);
                }
            } else if let Some(prev) = neurons.get_mut(&from) {
                prev.remove_out(neuron);
            }
        }
        keys.len()
    }

    /// Re-key every link of a neuron whose id changes from `old` to `new`,
    /// and point its neighbours at the new id.
    pub fn change_id(
        &mut self,
        old: NeuronId,
        new: NeuronId,
        neurons: &mut BTreeMap<NeuronId, Node>,
    ) {
        for (from, to) in self.keys_touching(old) {
            let Some(mut link) = self.links.remove(&(from, to)) else {
                continue;
            };
            let from = if from == old { new } else { from };
            let to = if to == old { new } else { to };
            link.from = Some(from);
            link.to = to;
            self.links.insert((from, to), link);

            let neighbour = if from == new { to } else { from };
            if let Some(node) = neurons.get_mut(&neighbour) {
                node.rename_neighbour(old, new);
            }
        }
    }
}
