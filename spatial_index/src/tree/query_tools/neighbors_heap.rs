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

use pointcloud::PointIndex;

use crate::errors::*;

/// Fixed capacity max-heaps, one per query row, stored in two flat arrays.
///
/// Each row starts out full of `+inf` so `largest` is always the current k-th best
/// (reduced) distance, which is exactly the pruning radius the traversals need.
#[derive(Debug, Clone)]
pub struct NeighborsHeap {
    distances: Vec<f32>,
    indices: Vec<PointIndex>,
    k: usize,
}

impl NeighborsHeap {
    /// Heaps for `n_pts` rows of `k` neighbors each.
    pub fn new(n_pts: usize, k: usize) -> IndexResult<NeighborsHeap> {
        let size = n_pts
            .checked_mul(k)
            .ok_or_else(|| IndexError::out_of_memory("neighbor heap allocation"))?;
        Ok(NeighborsHeap {
            distances: try_filled(size, f32::INFINITY, "neighbor heap allocation")?,
            indices: try_filled(size, 0, "neighbor heap allocation")?,
            k,
        })
    }

    /// Number of query rows
    pub fn rows(&self) -> usize {
        if self.k == 0 {
            0
        } else {
            self.distances.len() / self.k
        }
    }

    /// The capacity of each row
    pub fn k(&self) -> usize {
        self.k
    }

    /// The largest distance kept for this row, `+inf` until the row is full.
    #[inline]
    pub fn largest(&self, row: usize) -> f32 {
        self.distances[row * self.k]
    }

    /// Offers a neighbor to a row. Kept only if it beats the current largest.
    pub fn push(&mut self, row: usize, val: f32, i_val: PointIndex) {
        let k = self.k;
        let dist_arr = &mut self.distances[row * k..(row + 1) * k];
        let ind_arr = &mut self.indices[row * k..(row + 1) * k];

        if !(val < dist_arr[0]) {
            return;
        }

        // sift the new value down from the root
        let mut i = 0;
        loop {
            let ic1 = 2 * i + 1;
            let ic2 = ic1 + 1;
            let i_swap = if ic1 >= k {
                break;
            } else if ic2 >= k {
                if dist_arr[ic1] > val {
                    ic1
                } else {
                    break;
                }
            } else if dist_arr[ic1] >= dist_arr[ic2] {
                if val < dist_arr[ic1] {
                    ic1
                } else {
                    break;
                }
            } else if val < dist_arr[ic2] {
                ic2
            } else {
                break;
            };
            dist_arr[i] = dist_arr[i_swap];
            ind_arr[i] = ind_arr[i_swap];
            i = i_swap;
        }
        dist_arr[i] = val;
        ind_arr[i] = i_val;
    }

    /// The raw contents of a row, in heap order.
    pub fn row(&self, row: usize) -> (&[f32], &[PointIndex]) {
        let k = self.k;
        (
            &self.distances[row * k..(row + 1) * k],
            &self.indices[row * k..(row + 1) * k],
        )
    }

    /// Unpacks the heaps. This consumes them. Rows come out ascending when `sort` is set.
    pub fn unpack(self, sort: bool) -> Vec<Vec<(f32, PointIndex)>> {
        let k = self.k;
        (0..self.rows())
            .map(|row| {
                let mut pairs: Vec<(f32, PointIndex)> = self.distances[row * k..(row + 1) * k]
                    .iter()
                    .cloned()
                    .zip(self.indices[row * k..(row + 1) * k].iter().cloned())
                    .collect();
                if sort {
                    pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                }
                pairs
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_k_smallest() {
        let mut heap = NeighborsHeap::new(2, 3).unwrap();
        assert_eq!(heap.largest(0), f32::INFINITY);
        for (i, d) in [5.0, 1.0, 4.0, 3.0, 2.0, 9.0].iter().enumerate() {
            heap.push(0, *d, i);
        }
        assert_eq!(heap.largest(0), 3.0);
        heap.push(1, 7.0, 42);

        let rows = heap.unpack(true);
        assert_eq!(rows[0], vec![(1.0, 1), (2.0, 4), (3.0, 3)]);
        assert_eq!(rows[1][0], (7.0, 42));
        assert_eq!(rows[1][1].0, f32::INFINITY);
    }

    #[test]
    fn rejects_nan_and_ties_with_largest() {
        let mut heap = NeighborsHeap::new(1, 1).unwrap();
        heap.push(0, f32::NAN, 0);
        assert_eq!(heap.largest(0), f32::INFINITY);
        heap.push(0, 2.0, 1);
        heap.push(0, 2.0, 2);
        assert_eq!(heap.row(0).1, &[1usize][..]);
    }

    #[test]
    fn heap_property_holds() {
        let mut heap = NeighborsHeap::new(1, 7).unwrap();
        for i in 0..50 {
            heap.push(0, ((i * 37) % 50) as f32, i);
        }
        let (dists, _) = heap.row(0);
        for i in 1..dists.len() {
            assert!(dists[(i - 1) / 2] >= dists[i]);
        }
        assert_eq!(heap.largest(0), 6.0);
    }
}
