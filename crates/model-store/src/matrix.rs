//! Sparse interaction storage.
//!
//! - [`IdIndex`]: bidirectional map between external ids and dense indices
//! - [`CsrMatrix`]: compressed sparse rows (row offsets, column indices, values)
//!
//! Column indices within a row are sorted ascending, so the dot product of two
//! rows is a linear merge of their index lists.

use std::collections::HashMap;

/// Bidirectional id <-> dense index map.
///
/// Indices are contiguous `0..len()` and assigned in ascending id order, so
/// the same set of ids always produces the same mapping.
#[derive(Debug, Clone, Default)]
pub struct IdIndex {
    to_index: HashMap<u32, usize>,
    ids: Vec<u32>,
}

impl IdIndex {
    /// Build an index from any collection of ids (duplicates are collapsed)
    pub fn from_ids(ids: impl IntoIterator<Item = u32>) -> Self {
        let mut ids: Vec<u32> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();

        let to_index = ids.iter().enumerate().map(|(idx, &id)| (id, idx)).collect();
        Self { to_index, ids }
    }

    pub fn index_of(&self, id: u32) -> Option<usize> {
        self.to_index.get(&id).copied()
    }

    pub fn id_of(&self, index: usize) -> Option<u32> {
        self.ids.get(index).copied()
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A borrowed view of one matrix row
#[derive(Debug, Clone, Copy)]
pub struct SparseRow<'a> {
    pub indices: &'a [usize],
    pub values: &'a [f32],
    pub norm: f32,
}

impl<'a> SparseRow<'a> {
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Binary search on the sorted column indices
    pub fn contains(&self, col: usize) -> bool {
        self.indices.binary_search(&col).is_ok()
    }

    pub fn iter(self) -> impl Iterator<Item = (usize, f32)> + 'a {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Dot product by merging the two sorted index lists
    pub fn dot(&self, other: &SparseRow<'_>) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Cosine similarity; 0.0 when either row has zero norm
    pub fn cosine(&self, other: &SparseRow<'_>) -> f32 {
        if self.norm == 0.0 || other.norm == 0.0 {
            return 0.0;
        }
        self.dot(other) / (self.norm * other.norm)
    }
}

/// Compressed sparse row matrix with precomputed row L2 norms
#[derive(Debug, Clone, Default)]
pub struct CsrMatrix {
    row_offsets: Vec<usize>,
    col_indices: Vec<usize>,
    values: Vec<f32>,
    row_norms: Vec<f32>,
    n_cols: usize,
}

impl CsrMatrix {
    /// Build from `(row, col, value)` triplets.
    ///
    /// Duplicate coordinates are summed. Every row and column index must be
    /// below `n_rows` / `n_cols`; callers resolve them through an [`IdIndex`].
    pub fn from_triplets(
        n_rows: usize,
        n_cols: usize,
        mut triplets: Vec<(usize, usize, f32)>,
    ) -> Self {
        triplets.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut row_offsets = vec![0usize; n_rows + 1];
        let mut col_indices: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut values: Vec<f32> = Vec::with_capacity(triplets.len());
        let mut rows: Vec<usize> = Vec::with_capacity(triplets.len());

        for (row, col, value) in triplets {
            let same_cell = rows.last() == Some(&row) && col_indices.last() == Some(&col);
            if same_cell {
                if let Some(last) = values.last_mut() {
                    *last += value;
                }
            } else {
                rows.push(row);
                col_indices.push(col);
                values.push(value);
            }
        }

        for &row in &rows {
            row_offsets[row + 1] += 1;
        }
        for row in 0..n_rows {
            row_offsets[row + 1] += row_offsets[row];
        }

        let row_norms = (0..n_rows)
            .map(|row| {
                values[row_offsets[row]..row_offsets[row + 1]]
                    .iter()
                    .map(|v| v * v)
                    .sum::<f32>()
                    .sqrt()
            })
            .collect();

        Self {
            row_offsets,
            col_indices,
            values,
            row_norms,
            n_cols,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.row_offsets.len().saturating_sub(1)
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of stored (non-zero) entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Borrow one row; out-of-range rows come back empty
    pub fn row(&self, row: usize) -> SparseRow<'_> {
        if row >= self.n_rows() {
            return SparseRow {
                indices: &[],
                values: &[],
                norm: 0.0,
            };
        }
        let (start, end) = (self.row_offsets[row], self.row_offsets[row + 1]);
        SparseRow {
            indices: &self.col_indices[start..end],
            values: &self.values[start..end],
            norm: self.row_norms[row],
        }
    }

    /// Stored value at `(row, col)`, if any
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        let row = self.row(row);
        row.indices
            .binary_search(&col)
            .ok()
            .map(|pos| row.values[pos])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_index_is_dense_and_sorted() {
        let index = IdIndex::from_ids(vec![42, 7, 42, 100]);

        assert_eq!(index.len(), 3);
        assert_eq!(index.index_of(7), Some(0));
        assert_eq!(index.index_of(42), Some(1));
        assert_eq!(index.index_of(100), Some(2));
        assert_eq!(index.id_of(1), Some(42));
        assert_eq!(index.index_of(8), None);
        assert_eq!(index.id_of(3), None);
    }

    #[test]
    fn test_csr_sums_duplicates_and_sorts_columns() {
        let matrix = CsrMatrix::from_triplets(
            2,
            3,
            vec![(0, 2, 1.0), (0, 0, 2.0), (0, 2, 0.5), (1, 1, 3.0)],
        );

        assert_eq!(matrix.n_rows(), 2);
        assert_eq!(matrix.nnz(), 3);
        let row = matrix.row(0);
        assert_eq!(row.indices, &[0, 2]);
        assert_eq!(row.values, &[2.0, 1.5]);
        assert_eq!(matrix.get(1, 1), Some(3.0));
        assert_eq!(matrix.get(1, 0), None);
    }

    #[test]
    fn test_empty_rows_have_zero_norm() {
        let matrix = CsrMatrix::from_triplets(3, 2, vec![(2, 0, 1.0)]);

        assert!(matrix.row(0).is_empty());
        assert!(matrix.row(1).is_empty());
        assert_eq!(matrix.row(0).norm, 0.0);
        assert_eq!(matrix.row(2).nnz(), 1);
        assert!(matrix.row(9).is_empty());
    }

    #[test]
    fn test_cosine_similarity() {
        let matrix = CsrMatrix::from_triplets(
            3,
            3,
            vec![
                (0, 0, 1.0),
                (0, 1, 1.0),
                (1, 0, 2.0),
                (1, 1, 2.0),
                (2, 2, 5.0),
            ],
        );

        let identical = matrix.row(0).cosine(&matrix.row(1));
        assert!((identical - 1.0).abs() < 1e-6);

        let orthogonal = matrix.row(0).cosine(&matrix.row(2));
        assert_eq!(orthogonal, 0.0);

        let empty = CsrMatrix::from_triplets(1, 3, vec![]);
        assert_eq!(matrix.row(0).cosine(&empty.row(0)), 0.0);
    }

    #[test]
    fn test_dot_merges_partial_overlap() {
        let matrix = CsrMatrix::from_triplets(
            2,
            4,
            vec![(0, 0, 1.0), (0, 2, 2.0), (0, 3, 1.0), (1, 1, 4.0), (1, 2, 3.0)],
        );
        assert_eq!(matrix.row(0).dot(&matrix.row(1)), 6.0);
        assert!(matrix.row(1).contains(2));
        assert!(!matrix.row(1).contains(3));
    }
}
