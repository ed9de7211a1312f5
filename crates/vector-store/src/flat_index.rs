use crate::error::{Result, VectorStoreError};
use ndarray::{Array2, ArrayView1, Zip};
use std::cmp::Ordering;

/// One search hit: squared Euclidean distance and the record's position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub distance: f32,
    pub position: usize,
}

impl Neighbor {
    /// Ascending distance, ties broken by lower position
    fn rank(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.position.cmp(&other.position))
    }
}

/// Exact nearest-neighbor index over a dense `n x d` matrix.
///
/// Row `i` is the embedding at position `i`. Search is a linear scan,
/// O(n·d) per query, which suits per-document namespaces.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Array2<f32>,
}

impl FlatIndex {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Array2::zeros((0, dimension)),
        }
    }

    /// Build from row vectors; every row must be `dimension` wide
    pub fn build(dimension: usize, embeddings: &[Vec<f32>]) -> Result<Self> {
        let mut flat = Vec::with_capacity(embeddings.len() * dimension);
        for vector in embeddings {
            if vector.len() != dimension {
                return Err(VectorStoreError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            flat.extend_from_slice(vector);
        }
        Self::from_flat(dimension, embeddings.len(), flat)
    }

    /// Build from row-major values, `count * dimension` long
    pub fn from_flat(dimension: usize, count: usize, values: Vec<f32>) -> Result<Self> {
        let vectors = Array2::from_shape_vec((count, dimension), values)
            .map_err(|e| VectorStoreError::persistence(format!("vector matrix shape: {e}")))?;
        Ok(Self { dimension, vectors })
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get number of vectors in index
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    /// Check if index is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn vector(&self, position: usize) -> Option<ArrayView1<'_, f32>> {
        (position < self.len()).then(|| self.vectors.row(position))
    }

    /// Row-major iteration over every stored value
    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.vectors.iter().copied()
    }

    /// `min(k, n)` nearest rows to `query`, ascending by squared distance.
    ///
    /// Equal distances rank by lower position.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let query = ArrayView1::from(query);
        let mut neighbors: Vec<Neighbor> = self
            .vectors
            .outer_iter()
            .enumerate()
            .map(|(position, row)| Neighbor {
                distance: squared_l2(row, query),
                position,
            })
            .collect();

        if k < neighbors.len() {
            neighbors.select_nth_unstable_by(k - 1, Neighbor::rank);
            neighbors.truncate(k);
        }
        neighbors.sort_unstable_by(Neighbor::rank);
        Ok(neighbors)
    }
}

fn squared_l2(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    Zip::from(a).and(b).fold(0.0f32, |acc, &x, &y| {
        let d = x - y;
        d.mul_add(d, acc)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> FlatIndex {
        FlatIndex::build(
            2,
            &[
                vec![0.0, 0.0],
                vec![3.0, 4.0],
                vec![1.0, 0.0],
                vec![0.0, 2.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = grid();
        let hits = index.search(&[0.0, 0.0], 4).unwrap();
        let positions: Vec<usize> = hits.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![0, 2, 3, 1]);
        let distances: Vec<f32> = hits.iter().map(|n| n.distance).collect();
        assert_eq!(distances, vec![0.0, 1.0, 4.0, 25.0]);
    }

    #[test]
    fn test_k_larger_than_index_returns_all() {
        let hits = grid().search(&[3.0, 4.0], 50).unwrap();
        assert_eq!(hits.len(), 4);
        assert_eq!(hits[0].position, 1);
    }

    #[test]
    fn test_exact_ties_rank_by_position() {
        let index = FlatIndex::build(
            2,
            &[
                vec![5.0, 5.0],
                vec![0.0, 1.0],
                vec![1.0, 0.0],
                vec![-1.0, 0.0],
                vec![0.0, -1.0],
            ],
        )
        .unwrap();
        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        let positions: Vec<usize> = hits.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn test_zero_k_and_empty_index() {
        assert!(grid().search(&[0.0, 0.0], 0).unwrap().is_empty());
        let empty = FlatIndex::new(2);
        assert!(empty.is_empty());
        assert!(empty.search(&[0.0, 0.0], 3).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = FlatIndex::build(3, &[vec![1.0, 0.0]]).unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));

        let err = grid().search(&[1.0, 0.0, 0.0], 1).unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_values_are_row_major() {
        let values: Vec<f32> = grid().values().collect();
        assert_eq!(values, vec![0.0, 0.0, 3.0, 4.0, 1.0, 0.0, 0.0, 2.0]);
        let rebuilt = FlatIndex::from_flat(2, 4, values).unwrap();
        assert_eq!(rebuilt, grid());
    }
}
