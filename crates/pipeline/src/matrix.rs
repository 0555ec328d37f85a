//! Sparse user x item rating matrix.
//!
//! Rows are users and columns are items, both taken from the
//! [`IdentityIndex`]. Stored as CSR so that walking one user's ratings is a
//! contiguous slice.

use crate::identity::IdentityIndex;
use data_loader::RatingLog;
use sprs::{CsMat, CsVecView, TriMat};
use std::collections::HashMap;
use tracing::debug;

/// Ratings of all users, absent cells meaning "not rated".
#[derive(Debug, Clone)]
pub struct RatingMatrix {
    ratings: CsMat<f64>,
}

impl RatingMatrix {
    /// Materialize the matrix from the combined log.
    ///
    /// A cell written more than once keeps the value of the last record in log
    /// order. Records whose user or item is unknown to the index are dropped.
    pub fn build(log: &RatingLog, index: &IdentityIndex) -> Self {
        let mut cells: HashMap<(usize, usize), f64> = HashMap::with_capacity(log.len());
        let mut dropped = 0usize;

        for record in log.combined() {
            match (index.row(&record.user_id), index.col(record.item_id)) {
                (Some(row), Some(col)) => {
                    cells.insert((row, col), record.rating);
                }
                _ => dropped += 1,
            }
        }

        if dropped > 0 {
            debug!("Dropped {} records with ids missing from the index", dropped);
        }

        // TriMat sums duplicates on conversion; cells are already unique here
        let mut triplets = TriMat::with_capacity((index.num_users(), index.num_items()), cells.len());
        for ((row, col), rating) in cells {
            triplets.add_triplet(row, col, rating);
        }
        let ratings: CsMat<f64> = triplets.to_csr();

        debug!(
            "Built {}x{} rating matrix with {} ratings",
            ratings.rows(),
            ratings.cols(),
            ratings.nnz()
        );

        Self { ratings }
    }

    /// (users, items)
    pub fn shape(&self) -> (usize, usize) {
        self.ratings.shape()
    }

    pub fn num_users(&self) -> usize {
        self.ratings.rows()
    }

    /// Number of stored ratings
    pub fn nnz(&self) -> usize {
        self.ratings.nnz()
    }

    /// Rating in a cell, `None` if unrated or out of bounds
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.ratings.get(row, col).copied()
    }

    /// One user's ratings as a sparse vector
    pub fn row_view(&self, row: usize) -> Option<CsVecView<'_, f64>> {
        self.ratings.outer_view(row)
    }

    /// Columns rated by a user, ascending. Empty for unknown rows.
    pub fn rated_columns(&self, row: usize) -> &[usize] {
        if row >= self.ratings.rows() {
            return &[];
        }
        let range = self.ratings.indptr().outer_inds_sz(row);
        &self.ratings.indices()[range]
    }

    /// (column, rating) pairs of a user, ascending by column
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = if row < self.ratings.rows() {
            self.ratings.indptr().outer_inds_sz(row)
        } else {
            0..0
        };
        let indices = &self.ratings.indices()[range.clone()];
        let data = &self.ratings.data()[range];
        indices.iter().copied().zip(data.iter().copied())
    }

    /// Underlying CSR matrix
    pub fn as_csr(&self) -> &CsMat<f64> {
        &self.ratings
    }
}
