/*
* Licensed to Elasticsearch B.V. under one or more contributor
* license agreements. See the NOTICE file distributed with
* this work for additional information regarding copyright
* ownership. Elasticsearch B.V. licenses this file to you under
* the Apache License, Version 2.0 (the "License"); you may
* not use this file except in compliance with the License.
* You may obtain a copy of the License at
*
*  http://www.apache.org/licenses/LICENSE-2.0
*
* Unless required by applicable law or agreed to in writing,
* software distributed under the License is distributed on an
* "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
* KIND, either express or implied.  See the License for the
* specific language governing permissions and limitations
* under the License.
*/

//! Options and results of bulk queries

use ndarray::Array2;
use pointcloud::PointIndex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::errors::*;

/// How a bulk query traverses the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Build a tree over the queries and prune pairs of nodes. k-NN only.
    pub dual_tree: bool,
    /// Visit nodes best first off a heap instead of recursing.
    pub breadth_first: bool,
    /// Sort every row ascending by distance, ties by index.
    pub sort_results: bool,
    /// Query rows handed to each rayon task. `0` runs everything on the calling thread.
    pub parallel_chunk_size: usize,
}

impl Default for QueryOptions {
    fn default() -> QueryOptions {
        QueryOptions {
            dual_tree: false,
            breadth_first: false,
            sort_results: true,
            parallel_chunk_size: 512,
        }
    }
}

impl QueryOptions {
    /// Splits `0..n_rows` into contiguous chunks, runs `f` on each on the rayon pool and
    /// concatenates the results in row order. The first error wins.
    pub(crate) fn run_chunked<T, F>(&self, n_rows: usize, f: F) -> IndexResult<Vec<T>>
    where
        T: Send,
        F: Fn(Range<usize>) -> IndexResult<Vec<T>> + Sync + Send,
    {
        let chunk = self.parallel_chunk_size;
        if chunk == 0 || n_rows <= chunk {
            return f(0..n_rows);
        }
        let starts: Vec<usize> = (0..n_rows).step_by(chunk).collect();
        let chunked: Vec<Vec<T>> = starts
            .par_iter()
            .map(|&start| f(start..(start + chunk).min(n_rows)))
            .collect::<IndexResult<Vec<Vec<T>>>>()?;
        let mut results = try_with_capacity(n_rows, "bulk query")?;
        for part in chunked {
            results.extend(part);
        }
        Ok(results)
    }
}

/// The answer to a bulk query, one row per query point.
///
/// k-NN rows all have length k. Radius rows have whatever length the data gives them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Neighborhood {
    /// True distances
    pub distances: Vec<Vec<f32>>,
    /// Indexes into the indexed point cloud, parallel to `distances`
    pub indices: Vec<Vec<PointIndex>>,
}

impl Neighborhood {
    pub(crate) fn from_pairs(rows: Vec<Vec<(f32, PointIndex)>>) -> Neighborhood {
        let (distances, indices) = rows
            .into_iter()
            .map(|row| row.into_iter().unzip::<f32, PointIndex, Vec<f32>, Vec<PointIndex>>())
            .unzip();
        Neighborhood { distances, indices }
    }

    /// Number of query rows
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    ///
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// The distances and indexes of one row
    pub fn row(&self, i: usize) -> Option<(&[f32], &[PointIndex])> {
        Some((self.distances.get(i)?, self.indices.get(i)?))
    }

    /// Rows in order, as `(distance, index)` pairs
    pub fn iter(&self) -> impl Iterator<Item = Vec<(f32, PointIndex)>> + '_ {
        self.distances
            .iter()
            .zip(&self.indices)
            .map(|(d, i)| d.iter().cloned().zip(i.iter().cloned()).collect())
    }

    /// Dense `n × k` matrices. Fails when the rows have different lengths, so this is
    /// meant for k-NN results.
    pub fn to_arrays(&self) -> IndexResult<(Array2<f32>, Array2<PointIndex>)> {
        let width = self.distances.first().map(|r| r.len()).unwrap_or(0);
        if self.distances.iter().any(|r| r.len() != width) {
            return Err(IndexError::invalid_argument(
                "rows have different lengths and do not fit in a matrix",
            ));
        }
        let shape = (self.len(), width);
        let distances = Array2::from_shape_vec(shape, self.distances.concat())
            .map_err(|e| IndexError::internal(e.to_string()))?;
        let indices = Array2::from_shape_vec(shape, self.indices.concat())
            .map_err(|e| IndexError::internal(e.to_string()))?;
        Ok((distances, indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_keep_row_order() {
        let options = QueryOptions {
            parallel_chunk_size: 7,
            ..Default::default()
        };
        let rows = options
            .run_chunked(100, |rows| Ok(rows.map(|i| i * 2).collect()))
            .unwrap();
        assert_eq!(rows, (0..100).map(|i| i * 2).collect::<Vec<_>>());

        let serial = QueryOptions {
            parallel_chunk_size: 0,
            ..Default::default()
        };
        assert_eq!(serial.run_chunked(3, |rows| Ok(rows.collect())).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn chunk_errors_surface() {
        let options = QueryOptions {
            parallel_chunk_size: 10,
            ..Default::default()
        };
        let result: IndexResult<Vec<usize>> = options.run_chunked(50, |rows| {
            if rows.contains(&33) {
                Err(IndexError::internal("row 33"))
            } else {
                Ok(rows.collect())
            }
        });
        assert!(matches!(result, Err(IndexError::InternalError(_))));
    }

    #[test]
    fn neighborhood_shapes() {
        let hood = Neighborhood::from_pairs(vec![vec![(0.0, 3), (1.5, 1)], vec![(0.5, 2), (2.0, 0)]]);
        assert_eq!(hood.len(), 2);
        assert_eq!(hood.row(1), Some((&[0.5f32, 2.0][..], &[2usize, 0][..])));
        let (distances, indices) = hood.to_arrays().unwrap();
        assert_eq!(distances.shape(), &[2, 2]);
        assert_eq!(indices[[0, 0]], 3);
        assert_eq!(hood.iter().next().unwrap(), vec![(0.0, 3), (1.5, 1)]);

        let ragged = Neighborhood::from_pairs(vec![vec![(0.0, 3)], vec![]]);
        assert!(ragged.to_arrays().is_err());
    }
}
