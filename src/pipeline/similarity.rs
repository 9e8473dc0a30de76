use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

use crate::pipeline::text;

/// Sparse rating vector: user id to rating, absent users rate 0
pub type RatingVector = HashMap<u32, f64>;

/// Cosine similarity between two sparse vectors
///
/// Zero-norm vectors are not similar to anything, including themselves.
pub fn cosine_similarity<K: Eq + Hash>(a: &HashMap<K, f64>, b: &HashMap<K, f64>) -> f64 {
    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    // Iterate the smaller vector; absent entries contribute nothing.
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(key, value)| large.get(key).map(|other| value * other))
        .sum();

    dot / (norm_a * norm_b)
}

/// Manhattan distance between two sparse vectors
pub fn manhattan_distance<K: Eq + Hash>(a: &HashMap<K, f64>, b: &HashMap<K, f64>) -> f64 {
    let mut distance = 0.0;
    for (key, value) in a {
        distance += (value - b.get(key).copied().unwrap_or(0.0)).abs();
    }
    for (key, value) in b {
        if !a.contains_key(key) {
            distance += value.abs();
        }
    }
    distance
}

/// Jaccard similarity between two sets; empty sets are similar to nothing
pub fn jaccard_similarity<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let intersection = a.intersection(b).count();
    if intersection == 0 {
        return 0.0;
    }
    intersection as f64 / a.union(b).count() as f64
}

fn norm<K>(vector: &HashMap<K, f64>) -> f64 {
    vector.values().map(|value| value * value).sum::<f64>().sqrt()
}

/// Whether a higher or lower score means a closer neighbor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ranking {
    HigherIsCloser,
    LowerIsCloser,
}

/// Picks the ids of the `n` closest neighbors from scored candidates
///
/// Ties break by ascending id so repeated runs produce identical files.
fn top_n(mut scored: Vec<(i32, f64)>, n: usize, ranking: Ranking) -> Vec<i32> {
    scored.sort_by(|(id_a, score_a), (id_b, score_b)| {
        let by_score = match ranking {
            Ranking::HigherIsCloser => score_b.total_cmp(score_a),
            Ranking::LowerIsCloser => score_a.total_cmp(score_b),
        };
        by_score.then_with(|| id_a.cmp(id_b))
    });
    scored.truncate(n);
    scored.into_iter().map(|(id, _)| id).collect()
}

/// Top-n neighbors per movie by cosine similarity of rating vectors
pub fn rating_cosine_neighbors(
    vectors: &BTreeMap<i32, RatingVector>,
    n: usize,
) -> BTreeMap<i32, Vec<i32>> {
    vectors
        .iter()
        .map(|(&id, vector)| {
            let scored = vectors
                .iter()
                .filter(|(&other_id, _)| other_id != id)
                .map(|(&other_id, other)| (other_id, cosine_similarity(vector, other)))
                .collect();
            (id, top_n(scored, n, Ranking::HigherIsCloser))
        })
        .collect()
}

/// Top-n neighbors per movie by Manhattan distance of rating vectors
///
/// Distance ranks ascending: the closest vectors are the best neighbors.
pub fn rating_manhattan_neighbors(
    vectors: &BTreeMap<i32, RatingVector>,
    n: usize,
) -> BTreeMap<i32, Vec<i32>> {
    vectors
        .iter()
        .map(|(&id, vector)| {
            let scored = vectors
                .iter()
                .filter(|(&other_id, _)| other_id != id)
                .map(|(&other_id, other)| (other_id, manhattan_distance(vector, other)))
                .collect();
            (id, top_n(scored, n, Ranking::LowerIsCloser))
        })
        .collect()
}

/// Top-n neighbors per movie by Jaccard similarity of label sets
///
/// Works for genre sets and tag sets alike. Pairs that share no label are
/// not candidates, so a movie with an empty set gets no neighbors.
pub fn jaccard_neighbors(
    sets: &BTreeMap<i32, BTreeSet<String>>,
    n: usize,
) -> BTreeMap<i32, Vec<i32>> {
    sets.iter()
        .map(|(&id, set)| {
            let scored = sets
                .iter()
                .filter(|(&other_id, _)| other_id != id)
                .filter_map(|(&other_id, other)| {
                    let similarity = jaccard_similarity(set, other);
                    (similarity > 0.0).then_some((other_id, similarity))
                })
                .collect();
            (id, top_n(scored, n, Ranking::HigherIsCloser))
        })
        .collect()
}

/// Top-n neighbors per movie by cosine similarity of description term vectors
///
/// Only movies present in `descriptions` take part; callers exclude movies
/// without one.
pub fn description_cosine_neighbors(
    descriptions: &BTreeMap<i32, String>,
    n: usize,
) -> BTreeMap<i32, Vec<i32>> {
    let bags: BTreeMap<i32, HashMap<String, f64>> = descriptions
        .iter()
        .map(|(&id, description)| (id, text::bag_of_words(description)))
        .collect();

    bags.iter()
        .map(|(&id, bag)| {
            let scored = bags
                .iter()
                .filter(|(&other_id, _)| other_id != id)
                .map(|(&other_id, other)| (other_id, cosine_similarity(bag, other)))
                .collect();
            (id, top_n(scored, n, Ranking::HigherIsCloser))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(entries: &[(u32, f64)]) -> RatingVector {
        entries.iter().copied().collect()
    }

    fn set(labels: &[&str]) -> BTreeSet<String> {
        labels.iter().map(|label| label.to_string()).collect()
    }

    #[test]
    fn test_cosine_identical_vectors_score_one() {
        let a = vector(&[(1, 3.0), (2, 4.0)]);
        let similarity = cosine_similarity(&a, &a);
        assert!((similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_orthogonal_vectors_score_zero() {
        let a = vector(&[(1, 5.0)]);
        let b = vector(&[(2, 5.0)]);
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_known_value() {
        // (1,0) vs (1,1) -> 1/sqrt(2)
        let a = vector(&[(1, 1.0)]);
        let b = vector(&[(1, 1.0), (2, 1.0)]);
        let similarity = cosine_similarity(&a, &b);
        assert!((similarity - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_zero_norm_vector_scores_zero() {
        let empty = RatingVector::new();
        let b = vector(&[(1, 4.0)]);
        assert_eq!(cosine_similarity(&empty, &b), 0.0);
        assert_eq!(cosine_similarity(&empty, &empty), 0.0);
    }

    #[test]
    fn test_manhattan_counts_entries_on_both_sides() {
        let a = vector(&[(1, 3.0), (2, 1.0)]);
        let b = vector(&[(1, 1.0), (3, 2.0)]);
        // |3-1| + |1-0| + |0-2| = 5
        assert_eq!(manhattan_distance(&a, &b), 5.0);
    }

    #[test]
    fn test_manhattan_identical_vectors_distance_zero() {
        let a = vector(&[(1, 2.5), (9, 4.0)]);
        assert_eq!(manhattan_distance(&a, &a), 0.0);
    }

    #[test]
    fn test_jaccard_known_value() {
        let a = set(&["action", "crime", "drama"]);
        let b = set(&["action", "drama", "thriller"]);
        // 2 shared of 4 total
        assert_eq!(jaccard_similarity(&a, &b), 0.5);
    }

    #[test]
    fn test_jaccard_empty_sets_score_zero() {
        let empty = BTreeSet::new();
        let b = set(&["action"]);
        assert_eq!(jaccard_similarity(&empty, &b), 0.0);
        assert_eq!(jaccard_similarity(&empty, &empty), 0.0);
    }

    #[test]
    fn test_top_n_never_includes_self() {
        let mut vectors = BTreeMap::new();
        vectors.insert(1, vector(&[(1, 5.0)]));
        vectors.insert(2, vector(&[(1, 5.0)]));
        vectors.insert(3, vector(&[(1, 5.0)]));
        let neighbors = rating_cosine_neighbors(&vectors, 10);
        assert_eq!(neighbors[&1], vec![2, 3]);
        assert_eq!(neighbors[&2], vec![1, 3]);
    }

    #[test]
    fn test_cosine_neighbors_rank_descending_similarity() {
        let mut vectors = BTreeMap::new();
        vectors.insert(1, vector(&[(1, 1.0), (2, 1.0)]));
        vectors.insert(2, vector(&[(1, 1.0), (2, 1.0)])); // identical to 1
        vectors.insert(3, vector(&[(1, 1.0)])); // half-overlap with 1
        vectors.insert(4, vector(&[(3, 1.0)])); // orthogonal to 1
        let neighbors = rating_cosine_neighbors(&vectors, 2);
        assert_eq!(neighbors[&1], vec![2, 3]);
    }

    #[test]
    fn test_manhattan_neighbors_rank_ascending_distance() {
        let mut vectors = BTreeMap::new();
        vectors.insert(1, vector(&[(1, 5.0)]));
        vectors.insert(2, vector(&[(1, 4.0)])); // distance 1
        vectors.insert(3, vector(&[(1, 1.0)])); // distance 4
        vectors.insert(4, vector(&[(2, 9.0)])); // distance 14
        let neighbors = rating_manhattan_neighbors(&vectors, 2);
        assert_eq!(neighbors[&1], vec![2, 3]);
    }

    #[test]
    fn test_neighbor_ties_break_by_ascending_id() {
        let mut vectors = BTreeMap::new();
        vectors.insert(7, vector(&[(1, 2.0)]));
        vectors.insert(3, vector(&[(1, 2.0)]));
        vectors.insert(5, vector(&[(1, 2.0)]));
        let neighbors = rating_cosine_neighbors(&vectors, 2);
        assert_eq!(neighbors[&7], vec![3, 5]);
    }

    #[test]
    fn test_jaccard_neighbors_skip_disjoint_pairs() {
        let mut sets = BTreeMap::new();
        sets.insert(1, set(&["action", "crime"]));
        sets.insert(2, set(&["action"]));
        sets.insert(3, set(&["romance"]));
        let neighbors = jaccard_neighbors(&sets, 10);
        assert_eq!(neighbors[&1], vec![2]);
        assert_eq!(neighbors[&3], Vec::<i32>::new());
    }

    #[test]
    fn test_jaccard_neighbors_empty_set_has_no_neighbors() {
        let mut sets = BTreeMap::new();
        sets.insert(1, BTreeSet::new());
        sets.insert(2, set(&["drama"]));
        let neighbors = jaccard_neighbors(&sets, 5);
        assert_eq!(neighbors[&1], Vec::<i32>::new());
        assert_eq!(neighbors[&2], Vec::<i32>::new());
    }

    #[test]
    fn test_description_neighbors_identical_text_ranks_first() {
        let mut descriptions = BTreeMap::new();
        descriptions.insert(1, "a thief stealing corporate secrets".to_string());
        descriptions.insert(2, "a thief stealing corporate secrets".to_string());
        descriptions.insert(3, "boxing champion retires".to_string());
        let neighbors = description_cosine_neighbors(&descriptions, 1);
        assert_eq!(neighbors[&1], vec![2]);
        assert_eq!(neighbors[&2], vec![1]);
    }
}
