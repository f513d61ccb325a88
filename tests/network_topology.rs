use std::collections::HashSet;

use neuro_ensemble::architecture::{Layer, NeuronId, BIAS_ID};
use neuro_ensemble::methods::{MutationMethod, MutationOutcome};
use neuro_ensemble::{EnsembleError, Network, NetworkConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

fn dense_config() -> NetworkConfig {
    NetworkConfig {
        link_probability: 1.0,
        ..NetworkConfig::default()
    }
}

fn assert_no_hidden_to_hidden(network: &Network) {
    let hidden: HashSet<NeuronId> = network.hidden_neurons().iter().copied().collect();
    for link in network.links() {
        let from = link.from.expect("indexed links have a predecessor");
        assert!(
            !(hidden.contains(&from) && hidden.contains(&link.to)),
            "hidden-to-hidden link {} -> {}",
            from,
            link.to
        );
    }
}

#[test]
fn test_construction_layout() {
    let network = Network::new(1, NetworkConfig::default(), &mut rng(1)).unwrap();

    assert_eq!(network.input_neurons(), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(network.output_neurons(), &[10]);
    assert_eq!(network.hidden_neurons(), &(11..=20).collect::<Vec<_>>()[..]);
    assert_eq!(network.max_hidden_id(), 20);

    let ids: Vec<NeuronId> = network.neurons().map(|node| node.id).collect();
    let unique: HashSet<NeuronId> = ids.iter().copied().collect();
    assert_eq!(ids.len(), unique.len());
    assert_eq!(ids.len(), 21);

    assert_eq!(network.neuron(BIAS_ID).unwrap().layer, Layer::Bias);
    for &input in network.input_neurons() {
        let node = network.neuron(input).unwrap();
        assert!(node.passthrough.is_some());
        assert!(network.link(BIAS_ID, input).is_some());
    }

    assert_no_hidden_to_hidden(&network);
    assert_eq!(network.check_topology(), Ok(()));
}

#[test]
fn test_dense_construction_links_every_pair() {
    let network = Network::new(1, dense_config(), &mut rng(2)).unwrap();

    // 20 bias links, 9 * 10 input-hidden and 10 hidden-output
    assert_eq!(network.complexity(), 20 + 90 + 10);
    for link in network.links() {
        if link.from == Some(BIAS_ID) {
            assert!(link.weight >= -6.0 && link.weight < 1.0);
            assert_eq!(link.output, 1.0);
        } else {
            assert!(link.weight >= -0.2 && link.weight < 0.2);
        }
    }
}

#[test]
fn test_zero_input_is_deterministic() {
    let features = [0.0; 9];

    let mut first = Network::new(1, NetworkConfig::default(), &mut rng(42)).unwrap();
    let mut second = Network::new(1, NetworkConfig::default(), &mut rng(42)).unwrap();

    let a = first.apply_input(&features, 0).unwrap();
    let b = second.apply_input(&features, 0).unwrap();

    assert!(a == 0 || a == 1);
    assert_eq!(a, b);
    assert_eq!(first.output(), a);

    let out_a = first.neuron(10).unwrap().activation;
    let out_b = second.neuron(10).unwrap().activation;
    assert_eq!(out_a, out_b);
    assert!(out_a > -1.0 && out_a < 1.0);
    assert_eq!(a, if out_a > 0.0 { 1 } else { 0 });
}

#[test]
fn test_classification_error() {
    let mut network = Network::new(1, NetworkConfig::default(), &mut rng(3)).unwrap();
    let features = [1.0, -1.0, 0.0, 1.0, 1.0, -1.0, 0.0, 0.0, 1.0];

    let predicted = network.apply_input(&features, 1).unwrap();
    assert_eq!(network.error(), if predicted == 1 { 0.0 } else { 1.0 });

    let first_error = network.error();
    network.apply_input(&features, 1 - predicted).unwrap();
    assert_eq!(network.error(), 1.0);
    assert_eq!(network.previous_error(), first_error);
}

#[test]
fn test_apply_input_rejects_bad_samples() {
    let mut network = Network::new(1, NetworkConfig::default(), &mut rng(4)).unwrap();

    let result = network.apply_input(&[0.0; 3], 0);
    assert!(matches!(
        result,
        Err(EnsembleError::InvalidInputSize { expected: 9, actual: 3 })
    ));

    let result = network.apply_input(&[0.0; 9], 2);
    assert!(matches!(result, Err(EnsembleError::InvalidClass(2))));
}

#[test]
fn test_gradients_reach_every_hidden_neuron() {
    let mut network = Network::new(1, dense_config(), &mut rng(5)).unwrap();
    network
        .apply_input(&[1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0, 1.0, 0.0], 1)
        .unwrap();

    for &hidden in network.hidden_neurons() {
        let bias = network.link(BIAS_ID, hidden).unwrap();
        assert_ne!(bias.gradient, 0.0, "hidden neuron {} got no gradient", hidden);
    }

    let output = network.output_neurons()[0];
    let out = network.neuron(output).unwrap().activation;
    let expected = (1.0 - out) * out * (1.0 - out);
    let gradient = network.link(BIAS_ID, output).unwrap().gradient;
    assert!((gradient - expected).abs() < 1e-12);
}

#[test]
fn test_rprop_moves_weights() {
    let mut network = Network::new(1, dense_config(), &mut rng(6)).unwrap();
    let features = [0.5; 9];

    network.apply_input(&features, 1).unwrap();
    let before: Vec<f64> = network.links().map(|link| link.weight).collect();
    network.apply_input(&features, 1).unwrap();
    network.update_by_rprop();
    let after: Vec<f64> = network.links().map(|link| link.weight).collect();

    assert_eq!(before.len(), after.len());
    assert!(before.iter().zip(&after).any(|(a, b)| a != b));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = NetworkConfig {
        output_size: 2,
        ..NetworkConfig::default()
    };
    assert!(matches!(
        Network::new(1, config, &mut rng(7)),
        Err(EnsembleError::InvalidConfig(_))
    ));

    let config = NetworkConfig {
        hidden_size: 12,
        ..NetworkConfig::default()
    };
    assert!(Network::new(1, config, &mut rng(7)).is_err());
}

#[test]
fn test_breed_from_copies_independently() {
    let parent = Network::new(1, NetworkConfig::default(), &mut rng(8)).unwrap();
    let mut child = Network::breed_from(&parent, 99);

    assert_eq!(child.id, 99);
    assert_ne!(child.id, parent.id);
    assert_eq!(child.complexity(), parent.complexity());
    assert_eq!(child.hidden_neurons(), parent.hidden_neurons());
    for link in parent.links() {
        let copy = child.link(link.from.unwrap(), link.to).unwrap();
        assert_eq!(copy.weight, link.weight);
    }
    assert_eq!(child.check_topology(), Ok(()));

    let parent_weights: Vec<f64> = parent.links().map(|link| link.weight).collect();
    let parent_complexity = parent.complexity();

    child.link_mut(BIAS_ID, 10).unwrap().weight += 1.0;
    child.apply_gaussian_mutation();
    assert!(child.remove_hidden_neuron(11));

    let weights_now: Vec<f64> = parent.links().map(|link| link.weight).collect();
    assert_eq!(weights_now, parent_weights);
    assert_eq!(parent.complexity(), parent_complexity);
    assert_eq!(parent.hidden_neurons().len(), 10);
    assert_eq!(child.hidden_neurons().len(), 9);
}

#[test]
fn test_remove_hidden_neuron_renumbers_last() {
    let mut network = Network::new(1, dense_config(), &mut rng(9)).unwrap();
    let moved_bias = network.link(BIAS_ID, 20).unwrap().weight;
    let moved_output = network.link(20, 10).unwrap().weight;
    let moved_input = network.link(3, 20).unwrap().weight;
    let before = network.complexity();

    assert!(network.remove_hidden_neuron(12));

    assert_eq!(network.max_hidden_id(), 19);
    assert_eq!(network.hidden_neurons().len(), 9);
    assert!(network.neuron(20).is_none());
    assert!(network.link(BIAS_ID, 20).is_none());
    assert_eq!(network.link(BIAS_ID, 12).unwrap().weight, moved_bias);
    assert_eq!(network.link(12, 10).unwrap().weight, moved_output);
    assert_eq!(network.link(3, 12).unwrap().weight, moved_input);
    assert_eq!(network.neuron(12).unwrap().id, 12);

    // Neuron 12 owned 1 bias + 9 input + 1 output link
    assert_eq!(network.complexity(), before - 11);
    assert_eq!(network.check_topology(), Ok(()));

    assert!(!network.remove_hidden_neuron(10));
    assert!(!network.remove_hidden_neuron(42));
}

#[test]
fn test_remove_highest_hidden_neuron() {
    let mut network = Network::new(1, dense_config(), &mut rng(10)).unwrap();
    assert!(network.remove_hidden_neuron(20));
    assert_eq!(network.max_hidden_id(), 19);
    assert_eq!(network.check_topology(), Ok(()));
}

#[test]
fn test_add_neuron_respects_ceiling() {
    let mut network = Network::new(1, NetworkConfig::default(), &mut rng(11)).unwrap();
    assert_eq!(network.hidden_neurons().len(), 10);

    let outcome = network.mutate(MutationMethod::AddNeuron, &mut rng(12)).unwrap();
    assert_eq!(outcome, MutationOutcome::FellBack);
    assert_eq!(network.hidden_neurons().len(), 10);
}

#[test]
fn test_add_neuron_wiring() {
    let config = NetworkConfig {
        hidden_size: 4,
        link_probability: 1.0,
        ..NetworkConfig::default()
    };
    let mut network = Network::new(1, config, &mut rng(13)).unwrap();
    assert_eq!(network.max_hidden_id(), 14);

    let outcome = network.mutate(MutationMethod::AddNeuron, &mut rng(14)).unwrap();
    assert_eq!(outcome, MutationOutcome::Applied);
    assert_eq!(network.max_hidden_id(), 15);
    assert!(network.link(BIAS_ID, 15).is_some());
    assert!(network.link(15, 10).is_some());
    for input in 1..=9 {
        assert!(network.link(input, 15).is_some());
    }
    assert_eq!(network.check_topology(), Ok(()));
}

#[test]
fn test_remove_neuron_respects_floor() {
    let config = NetworkConfig {
        hidden_size: 4,
        ..NetworkConfig::default()
    };
    let mut network = Network::new(1, config, &mut rng(15)).unwrap();

    let outcome = network.mutate(MutationMethod::RemoveNeuron, &mut rng(16)).unwrap();
    assert_eq!(outcome, MutationOutcome::FellBack);
    assert_eq!(network.hidden_neurons().len(), 4);
}

#[test]
fn test_remove_neuron_keeps_range_contiguous() {
    let mut network = Network::new(1, dense_config(), &mut rng(17)).unwrap();
    let outcome = network.mutate(MutationMethod::RemoveNeuron, &mut rng(18)).unwrap();

    assert_eq!(outcome, MutationOutcome::Applied);
    assert_eq!(network.max_hidden_id(), 19);
    let mut hidden = network.hidden_neurons().to_vec();
    hidden.sort();
    assert_eq!(hidden, (11..=19).collect::<Vec<_>>());
}

#[test]
fn test_remove_link_floor_and_removal() {
    let config = NetworkConfig {
        min_links: 1000,
        ..dense_config()
    };
    let mut network = Network::new(1, config, &mut rng(19)).unwrap();
    let outcome = network.mutate(MutationMethod::RemoveLink, &mut rng(20)).unwrap();
    assert_eq!(outcome, MutationOutcome::FellBack);
    assert_eq!(network.complexity(), 120);

    // Fully wired, so the first random pair always hits a link
    let mut network = Network::new(1, dense_config(), &mut rng(21)).unwrap();
    let outcome = network.mutate(MutationMethod::RemoveLink, &mut rng(22)).unwrap();
    assert_eq!(outcome, MutationOutcome::Applied);
    assert_eq!(network.complexity(), 119);
    assert_eq!(network.check_topology(), Ok(()));
}

#[test]
fn test_add_link_when_full_or_empty() {
    let mut full = Network::new(1, dense_config(), &mut rng(23)).unwrap();
    let outcome = full.mutate(MutationMethod::AddLink, &mut rng(24)).unwrap();
    assert_eq!(outcome, MutationOutcome::Skipped);
    assert_eq!(full.complexity(), 120);

    let sparse = NetworkConfig {
        link_probability: 0.0,
        ..NetworkConfig::default()
    };
    let mut empty = Network::new(1, sparse, &mut rng(25)).unwrap();
    assert_eq!(empty.complexity(), 20);
    let outcome = empty.mutate(MutationMethod::AddLink, &mut rng(26)).unwrap();
    assert_eq!(outcome, MutationOutcome::Applied);
    assert_eq!(empty.complexity(), 21);
    assert!(empty.link(1, 11).is_some() || empty.link(11, 10).is_some());
}

#[test]
fn test_random_mutations_preserve_invariants() {
    let config = NetworkConfig::default();
    let (min_hidden, max_hidden) = (config.min_hidden, config.max_hidden);
    let mut rng = rng(27);
    let mut network = Network::new(1, config, &mut rng).unwrap();

    for step in 0..500 {
        let method = MutationMethod::ALL[step % MutationMethod::ALL.len()];
        network.mutate(method, &mut rng).unwrap();

        let hidden = network.hidden_neurons().len();
        assert!(hidden >= min_hidden && hidden <= max_hidden);
        assert_eq!(network.check_topology(), Ok(()), "after {:?}", method);
        assert_no_hidden_to_hidden(&network);
    }

    let predicted = network.apply_input(&[0.0; 9], 0).unwrap();
    assert!(predicted <= 1);
}

#[test]
fn test_rprop_moves_links_without_gradient() {
    let mut network = Network::new(1, NetworkConfig::default(), &mut rng(28)).unwrap();
    let features = [0.0; 9];

    network.apply_input(&features, 0).unwrap();
    network.apply_input(&features, 0).unwrap();
    let before = network.link(BIAS_ID, 1).unwrap().weight;
    assert_eq!(network.link(BIAS_ID, 1).unwrap().gradient, 0.0);

    network.update_by_rprop();

    // Input bias links never receive a gradient and drift up by one step
    let link = network.link(BIAS_ID, 1).unwrap();
    assert!((link.weight - (before + 0.0125)).abs() < 1e-12);
    assert_eq!(link.step, 0.0125);
}

#[test]
fn test_classify_leaves_training_state() {
    let mut network = Network::new(1, dense_config(), &mut rng(29)).unwrap();
    let seen = [1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0, 1.0, 0.0];
    let unseen = [-1.0; 9];

    network.apply_input(&[0.5; 9], 0).unwrap();
    let predicted = network.apply_input(&seen, 1).unwrap();
    let error = network.error();
    let previous_error = network.previous_error();
    let gradients: Vec<(f64, f64)> = network
        .links()
        .map(|link| (link.gradient, link.previous_gradient))
        .collect();

    let other = network.classify(&unseen).unwrap();
    assert!(other <= 1);
    assert_eq!(network.classify(&seen).unwrap(), predicted);

    assert_eq!(network.output(), predicted);
    assert_eq!(network.error(), error);
    assert_eq!(network.previous_error(), previous_error);
    let after: Vec<(f64, f64)> = network
        .links()
        .map(|link| (link.gradient, link.previous_gradient))
        .collect();
    assert_eq!(after, gradients);

    assert!(matches!(
        network.classify(&[0.0; 2]),
        Err(EnsembleError::InvalidInputSize { expected: 9, actual: 2 })
    ));
}
