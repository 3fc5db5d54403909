// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exact nearest-neighbor index over fixed-dimension vectors.
//!
//! Catalogs are tens of events, not millions; a brute-force scan over
//! squared Euclidean distance beats any approximate structure at this
//! scale and is trivially deterministic.

use usher_core::UsherError;

/// Flat vector index. Positions are assigned in insertion order and are
/// the caller's link back to its own records.
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    /// Adds a vector, returning its position.
    pub fn add(&mut self, vector: Vec<f32>) -> Result<usize, UsherError> {
        if vector.len() != self.dimension {
            return Err(UsherError::Search(format!(
                "vector dimension {} does not match index dimension {}",
                vector.len(),
                self.dimension
            )));
        }
        self.vectors.push(vector);
        Ok(self.vectors.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// The stored vector at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        self.vectors.get(position).map(Vec::as_slice)
    }

    /// The `k` nearest stored vectors to `query`, as (position, squared
    /// Euclidean distance) pairs, nearest first.
    pub fn nearest(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(pos, v)| (pos, squared_l2(query, v)))
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_rejects_wrong_dimension() {
        let mut index = VectorIndex::new(3);
        assert!(index.add(vec![1.0, 2.0]).is_err());
        assert_eq!(index.add(vec![1.0, 2.0, 3.0]).unwrap(), 0);
    }

    #[test]
    fn nearest_orders_by_distance() {
        let mut index = VectorIndex::new(2);
        index.add(vec![0.0, 0.0]).unwrap();
        index.add(vec![1.0, 0.0]).unwrap();
        index.add(vec![5.0, 5.0]).unwrap();

        let hits = index.nearest(&[0.9, 0.0], 3);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].0, 1);
        assert_eq!(hits[1].0, 0);
        assert_eq!(hits[2].0, 2);
        assert!(hits[0].1 < hits[1].1 && hits[1].1 < hits[2].1);
    }

    #[test]
    fn nearest_caps_at_k() {
        let mut index = VectorIndex::new(1);
        for i in 0..10 {
            index.add(vec![i as f32]).unwrap();
        }
        assert_eq!(index.nearest(&[0.0], 3).len(), 3);
    }

    #[test]
    fn exact_match_has_zero_distance() {
        let mut index = VectorIndex::new(2);
        index.add(vec![0.5, 0.5]).unwrap();
        let hits = index.nearest(&[0.5, 0.5], 1);
        assert!(hits[0].1.abs() < f32::EPSILON);
    }
}
