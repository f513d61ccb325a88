//! Multi-objective selection: Pareto fronts and crowding distance.
//!
//! Both objectives are minimised. Individuals are moved, never cloned, so a
//! network lives in exactly one of population, front, archive or discard
//! list at a time.

use std::cmp::Ordering;

/// Number of objectives every individual is ranked on
pub const OBJECTIVES: usize = 2;

/// Something that can be ranked by non-dominated sorting
pub trait Individual {
    /// Objective values, all minimised
    fn objectives(&self) -> [f64; OBJECTIVES];

    fn sparsity(&self) -> f64;

    fn set_sparsity(&mut self, sparsity: f64);
}

/// `a` dominates `b` if it is no worse on every objective and strictly
/// better on at least one.
pub fn dominates<T: Individual>(a: &T, b: &T) -> bool {
    let (a, b) = (a.objectives(), b.objectives());
    let mut strictly_better = false;
    for k in 0..OBJECTIVES {
        if a[k] > b[k] {
            return false;
        }
        if a[k] < b[k] {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Split a population into its non-dominated front and the rest.
///
/// Both halves keep the original relative order.
pub fn pareto_front<T: Individual>(population: Vec<T>) -> (Vec<T>, Vec<T>) {
    let on_front: Vec<bool> = population
        .iter()
        .map(|candidate| !population.iter().any(|other| dominates(other, candidate)))
        .collect();

    let mut front = Vec::new();
    let mut rest = Vec::new();
    for (individual, keep) in population.into_iter().zip(on_front) {
        if keep {
            front.push(individual);
        } else {
            rest.push(individual);
        }
    }
    (front, rest)
}

/// Non-dominated sorting: front `k` is the Pareto front of what remains
/// after fronts `1..k` are taken out.
pub fn non_dominated_sort<T: Individual>(population: Vec<T>) -> Vec<Vec<T>> {
    let mut fronts = Vec::new();
    let mut remaining = population;
    while !remaining.is_empty() {
        let (front, rest) = pareto_front(remaining);
        fronts.push(front);
        remaining = rest;
    }
    fronts
}

fn by_objective<T: Individual>(k: usize) -> impl Fn(&T, &T) -> Ordering {
    move |a, b| {
        a.objectives()[k]
            .partial_cmp(&b.objectives()[k])
            .unwrap_or(Ordering::Equal)
    }
}

/// Compute the crowding distance of every member of a front.
///
/// For each objective the front is sorted, both ends get an infinite
/// distance and every interior member adds the gap between its two
/// neighbours. Fronts of one or two members are all boundary. The front is
/// left sorted by the last objective.
pub fn assign_sparsity<T: Individual>(front: &mut [T]) {
    for individual in front.iter_mut() {
        individual.set_sparsity(0.0);
    }

    let n = front.len();
    if n <= 2 {
        for individual in front.iter_mut() {
            individual.set_sparsity(f64::INFINITY);
        }
        return;
    }

    for k in 0..OBJECTIVES {
        front.sort_by(by_objective(k));
        front[0].set_sparsity(f64::INFINITY);
        front[n - 1].set_sparsity(f64::INFINITY);

        for i in 1..n - 1 {
            if front[i].sparsity().is_infinite() {
                continue;
            }
            let gap = (front[i + 1].objectives()[k] - front[i - 1].objectives()[k]).abs();
            let sparsity = front[i].sparsity() + gap;
            front[i].set_sparsity(sparsity);
        }
    }
}

/// Assign crowding distances and order the front sparsest first.
pub fn sort_by_sparsity<T: Individual>(front: &mut [T]) {
    assign_sparsity(front);
    front.sort_by(|a, b| {
        b.sparsity()
            .partial_cmp(&a.sparsity())
            .unwrap_or(Ordering::Equal)
    });
}

/// Keep the `capacity` sparsest members of a front, returning
/// `(kept, discarded)`.
pub fn truncate_by_sparsity<T: Individual>(mut front: Vec<T>, capacity: usize) -> (Vec<T>, Vec<T>) {
    if front.len() <= capacity {
        return (front, Vec::new());
    }
    sort_by_sparsity(&mut front);
    let discarded = front.split_off(capacity);
    (front, discarded)
}

/// Fill an archive of exactly `target` members from ranked fronts.
///
/// Whole fronts are taken while they fit; the first front that overflows is
/// truncated by crowding distance and everything after it is discarded.
/// Returns `(archive, discarded)`.
pub fn build_archive<T: Individual>(fronts: Vec<Vec<T>>, target: usize) -> (Vec<T>, Vec<T>) {
    let mut archive = Vec::with_capacity(target);
    let mut discarded = Vec::new();

    for front in fronts {
        let room = target - archive.len();
        if room == 0 {
            discarded.extend(front);
        } else if front.len() > room {
            let (kept, dropped) = truncate_by_sparsity(front, room);
            archive.extend(kept);
            discarded.extend(dropped);
        } else {
            archive.extend(front);
        }
    }

    (archive, discarded)
}
