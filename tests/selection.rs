use neuro_ensemble::methods::selection::{
    assign_sparsity, build_archive, dominates, non_dominated_sort, pareto_front, truncate_by_sparsity,
};
use neuro_ensemble::methods::Individual;

#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    name: &'static str,
    error: f64,
    complexity: f64,
    sparsity: f64,
}

impl Candidate {
    fn new(name: &'static str, error: f64, complexity: f64) -> Self {
        Self {
            name,
            error,
            complexity,
            sparsity: 0.0,
        }
    }
}

impl Individual for Candidate {
    fn objectives(&self) -> [f64; 2] {
        [self.error, self.complexity]
    }

    fn sparsity(&self) -> f64 {
        self.sparsity
    }

    fn set_sparsity(&mut self, sparsity: f64) {
        self.sparsity = sparsity;
    }
}

fn names(individuals: &[Candidate]) -> Vec<&'static str> {
    individuals.iter().map(|c| c.name).collect()
}

/// Error rises while complexity falls, so no member dominates another
fn tradeoff_front() -> Vec<Candidate> {
    vec![
        Candidate::new("a", 0.0, 50.0),
        Candidate::new("b", 0.1, 40.0),
        Candidate::new("c", 0.15, 35.0),
        Candidate::new("d", 0.3, 20.0),
        Candidate::new("e", 0.5, 0.0),
    ]
}

fn mixed_population() -> Vec<Candidate> {
    vec![
        Candidate::new("p1", 0.10, 30.0),
        Candidate::new("p2", 0.20, 20.0),
        Candidate::new("p3", 0.25, 35.0),
        Candidate::new("p4", 0.05, 60.0),
        Candidate::new("p5", 0.30, 25.0),
        Candidate::new("p6", 0.40, 10.0),
        Candidate::new("p7", 0.45, 40.0),
        Candidate::new("p8", 0.20, 20.0),
    ]
}

#[test]
fn test_dominance() {
    let better = Candidate::new("x", 0.1, 10.0);
    let worse = Candidate::new("y", 0.2, 10.0);
    let tradeoff = Candidate::new("z", 0.05, 20.0);

    assert!(dominates(&better, &worse));
    assert!(!dominates(&worse, &better));
    assert!(!dominates(&better, &better.clone()));
    assert!(!dominates(&better, &tradeoff));
    assert!(!dominates(&tradeoff, &better));
}

#[test]
fn test_pareto_front_properties() {
    let (front, rest) = pareto_front(mixed_population());

    assert_eq!(names(&front), vec!["p1", "p2", "p4", "p6", "p8"]);
    assert_eq!(front.len() + rest.len(), 8);

    for a in &front {
        for b in &front {
            assert!(!dominates(a, b), "{} dominates {}", a.name, b.name);
        }
    }
    for loser in &rest {
        assert!(
            front.iter().any(|member| dominates(member, loser)),
            "{} is not dominated by the front",
            loser.name
        );
    }
}

#[test]
fn test_non_dominated_sort_partitions() {
    let fronts = non_dominated_sort(mixed_population());

    let sizes: Vec<usize> = fronts.iter().map(Vec::len).collect();
    assert_eq!(sizes.iter().sum::<usize>(), 8);
    assert_eq!(names(&fronts[0]), vec!["p1", "p2", "p4", "p6", "p8"]);
    assert_eq!(names(&fronts[1]), vec!["p3", "p5"]);
    assert_eq!(names(&fronts[2]), vec!["p7"]);

    for (rank, front) in fronts.iter().enumerate().skip(1) {
        for member in front {
            assert!(fronts[rank - 1].iter().any(|better| dominates(better, member)));
        }
    }
}

#[test]
fn test_crowding_distance() {
    let mut front = tradeoff_front();
    assign_sparsity(&mut front);

    let sparsity = |name: &str| front.iter().find(|c| c.name == name).unwrap().sparsity;
    assert!(sparsity("a").is_infinite());
    assert!(sparsity("e").is_infinite());
    assert!((sparsity("b") - 15.15).abs() < 1e-9);
    assert!((sparsity("c") - 20.2).abs() < 1e-9);
    assert!((sparsity("d") - 35.35).abs() < 1e-9);
}

#[test]
fn test_small_fronts_are_all_boundary() {
    let mut pair = vec![Candidate::new("a", 0.1, 20.0), Candidate::new("b", 0.2, 10.0)];
    assign_sparsity(&mut pair);
    assert!(pair.iter().all(|c| c.sparsity.is_infinite()));

    let mut single = vec![Candidate::new("a", 0.1, 20.0)];
    assign_sparsity(&mut single);
    assert!(single[0].sparsity.is_infinite());
}

#[test]
fn test_truncation_keeps_extremes() {
    let (kept, discarded) = truncate_by_sparsity(tradeoff_front(), 2);
    let mut kept_names = names(&kept);
    kept_names.sort();
    assert_eq!(kept_names, vec!["a", "e"]);
    assert_eq!(discarded.len(), 3);

    let (kept, _) = truncate_by_sparsity(tradeoff_front(), 3);
    let mut kept_names = names(&kept);
    kept_names.sort();
    assert_eq!(kept_names, vec!["a", "d", "e"]);
}

#[test]
fn test_truncation_under_capacity_keeps_all() {
    let (kept, discarded) = truncate_by_sparsity(tradeoff_front(), 10);
    assert_eq!(names(&kept), vec!["a", "b", "c", "d", "e"]);
    assert!(discarded.is_empty());
}

#[test]
fn test_build_archive_exact_size() {
    let fronts = non_dominated_sort(mixed_population());

    let (archive, discarded) = build_archive(fronts, 6);
    assert_eq!(archive.len(), 6);
    assert_eq!(discarded.len(), 2);
    assert_eq!(&names(&archive)[..5], &["p1", "p2", "p4", "p6", "p8"]);

    let fronts = non_dominated_sort(mixed_population());
    let (archive, discarded) = build_archive(fronts, 3);
    assert_eq!(archive.len(), 3);
    assert_eq!(discarded.len(), 5);
    let mut archive_names = names(&archive);
    archive_names.sort();
    // Extremes of the first front always survive
    assert!(archive_names.contains(&"p4"));
    assert!(archive_names.contains(&"p6"));
}
