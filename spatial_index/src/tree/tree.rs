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

//! # The flat binary space partitioning tree
//!
//! Nodes live in one array laid out like a binary heap, the children of node `i` are
//! `2i + 1` and `2i + 2`. Every node owns a contiguous slice of a permutation of the
//! point indexes, so a leaf is brute forced by walking its slice. The geometry of a
//! node is kept apart in a [`NodeBounds`] implementor, which is the only thing that
//! distinguishes a KD tree from a ball tree.
//!
//! The tree is read only once built, so queries take `&self` and can run on as many
//! threads as you like.

use log::trace;
use pointcloud::*;
use std::ops::Range;

use super::bounds::*;
use super::node::*;
use super::query_tools::{NeighborsHeap, NodeHeap};
use super::TreeKind;
use crate::errors::*;
use crate::query_interface::{Neighborhood, QueryOptions};

/// A built tree over a point cloud. See the module docs.
#[derive(Debug)]
pub struct SpatialTree<D: PointCloud, M: Metric, B: NodeBounds> {
    pub(crate) point_cloud: D,
    pub(crate) metric: M,
    pub(crate) leaf_size: usize,
    pub(crate) levels: usize,
    pub(crate) idx_array: Vec<PointIndex>,
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) bounds: B,
}

/// A tree of axis aligned boxes. Needs a Minkowski metric.
pub type KdTree<D, M> = SpatialTree<D, M, KdBounds>;
/// A tree of balls around centroids.
pub type BallTree<D, M> = SpatialTree<D, M, BallBounds>;

type NeighborRows = Vec<Vec<(f32, PointIndex)>>;

impl<D: PointCloud, M: Metric, B: NodeBounds> SpatialTree<D, M, B> {
    /// The point cloud this tree references
    pub fn point_cloud(&self) -> &D {
        &self.point_cloud
    }

    /// The metric the bounds were built with
    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// Which bounds this tree uses
    pub fn kind(&self) -> TreeKind {
        B::KIND
    }

    /// Maximum points in a leaf, leaves may hold up to twice this
    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    /// Depth of the node array, a single root is one level
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// All node records, in heap order
    pub fn nodes(&self) -> &[NodeData] {
        &self.nodes
    }

    /// The permutation of the point indexes, each node owns a contiguous slice of it
    pub fn idx_array(&self) -> &[PointIndex] {
        &self.idx_array
    }

    /// The per node geometry
    pub fn bounds(&self) -> &B {
        &self.bounds
    }

    /// Point indexes under a node
    pub fn node_indexes(&self, i_node: usize) -> &[PointIndex] {
        &self.idx_array[self.nodes[i_node].range()]
    }

    /// Number of points in the tree
    pub fn len(&self) -> usize {
        self.idx_array.len()
    }

    /// Never true for a built tree
    pub fn is_empty(&self) -> bool {
        self.idx_array.is_empty()
    }

    /// The dimension of the points
    pub fn dim(&self) -> usize {
        self.point_cloud.dim()
    }

    fn check_query_dim(&self, dim: usize) -> IndexResult<()> {
        if dim != self.dim() {
            return Err(IndexError::invalid_argument(format!(
                "query dimension {} does not match the tree's {}",
                dim,
                self.dim()
            )));
        }
        Ok(())
    }

    fn check_k(&self, k: usize) -> IndexResult<()> {
        if k < 1 || k > self.len() {
            return Err(IndexError::invalid_argument(format!(
                "k must be between 1 and {}, got {}",
                self.len(),
                k
            )));
        }
        Ok(())
    }

    /// The `k` nearest neighbors of every point of `queries`.
    ///
    /// Single tree traversals are split into chunks of query rows and run on the rayon
    /// pool, see [`QueryOptions`]. Dual tree traversals build a tree over the queries with
    /// this tree's metric and leaf size and run on the calling thread.
    pub fn query<Q: PointCloud>(
        &self,
        queries: &Q,
        k: usize,
        options: &QueryOptions,
    ) -> IndexResult<Neighborhood> {
        self.check_query_dim(queries.dim())?;
        self.check_k(k)?;
        let rows = if options.dual_tree && !queries.is_empty() {
            self.knn_dual(queries, k, options)?
        } else {
            options.run_chunked(queries.len(), |rows| self.knn_rows(queries, rows, k, options))?
        };
        Ok(Neighborhood::from_pairs(rows))
    }

    /// The `k` nearest neighbors of a single point, closest first.
    pub fn knn(&self, point: &[f32], k: usize) -> IndexResult<Vec<(f32, PointIndex)>> {
        self.check_query_dim(point.len())?;
        self.check_k(k)?;
        let mut heap = NeighborsHeap::new(1, k)?;
        let lower_bound = self.bounds.min_rdist(&self.metric, 0, point);
        self.knn_depth_first(0, point, 0, &mut heap, lower_bound)?;
        Ok(self.finish_knn(heap, true).pop().unwrap_or_default())
    }

    /// Every point within `radius` of each point of `queries`. Rows have varying lengths.
    pub fn query_radius<Q: PointCloud>(
        &self,
        queries: &Q,
        radius: f32,
        options: &QueryOptions,
    ) -> IndexResult<Neighborhood> {
        self.check_query_dim(queries.dim())?;
        self.check_radius(radius)?;
        let rows = options.run_chunked(queries.len(), |rows| {
            rows.map(|qi| -> IndexResult<Vec<(f32, PointIndex)>> {
                self.radius_row(queries.point(qi)?, radius, options.sort_results)
            })
            .collect::<IndexResult<NeighborRows>>()
        })?;
        Ok(Neighborhood::from_pairs(rows))
    }

    /// Every point within `radius` of a single point, closest first.
    pub fn radius(&self, point: &[f32], radius: f32) -> IndexResult<Vec<(f32, PointIndex)>> {
        self.check_query_dim(point.len())?;
        self.check_radius(radius)?;
        self.radius_row(point, radius, true)
    }

    fn check_radius(&self, radius: f32) -> IndexResult<()> {
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(IndexError::invalid_argument(format!(
                "radius must be positive and finite, got {}",
                radius
            )));
        }
        Ok(())
    }

    fn finish_knn(&self, heap: NeighborsHeap, sort: bool) -> NeighborRows {
        heap.unpack(sort)
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(rdist, i)| (self.metric.rdist_to_dist(rdist), i))
                    .collect()
            })
            .collect()
    }

    /// Brute force of a leaf against one point.
    fn push_leaf(
        &self,
        i_node: usize,
        point: &[f32],
        row: usize,
        heap: &mut NeighborsHeap,
    ) -> IndexResult<()> {
        for &idx in self.node_indexes(i_node) {
            let rdist = self.metric.rdist(point, self.point_cloud.point(idx)?);
            heap.push(row, rdist, idx);
        }
        Ok(())
    }

    fn knn_rows<Q: PointCloud>(
        &self,
        queries: &Q,
        rows: Range<usize>,
        k: usize,
        options: &QueryOptions,
    ) -> IndexResult<NeighborRows> {
        let mut heap = NeighborsHeap::new(rows.len(), k)?;
        for (row, qi) in rows.enumerate() {
            let point = queries.point(qi)?;
            if options.breadth_first {
                self.knn_breadth_first(point, row, &mut heap)?;
            } else {
                let lower_bound = self.bounds.min_rdist(&self.metric, 0, point);
                self.knn_depth_first(0, point, row, &mut heap, lower_bound)?;
            }
        }
        Ok(self.finish_knn(heap, options.sort_results))
    }

    fn knn_depth_first(
        &self,
        i_node: usize,
        point: &[f32],
        row: usize,
        heap: &mut NeighborsHeap,
        lower_bound: f32,
    ) -> IndexResult<()> {
        if lower_bound >= heap.largest(row) {
            return Ok(());
        }
        if self.nodes[i_node].is_leaf {
            return self.push_leaf(i_node, point, row, heap);
        }
        let i1 = left_child(i_node);
        let i2 = right_child(i_node);
        let lb1 = self.bounds.min_rdist(&self.metric, i1, point);
        let lb2 = self.bounds.min_rdist(&self.metric, i2, point);
        if lb1 <= lb2 {
            self.knn_depth_first(i1, point, row, heap, lb1)?;
            self.knn_depth_first(i2, point, row, heap, lb2)
        } else {
            self.knn_depth_first(i2, point, row, heap, lb2)?;
            self.knn_depth_first(i1, point, row, heap, lb1)
        }
    }

    fn knn_breadth_first(
        &self,
        point: &[f32],
        row: usize,
        heap: &mut NeighborsHeap,
    ) -> IndexResult<()> {
        let mut nodeheap = NodeHeap::with_capacity(self.levels * 2);
        nodeheap.push(self.bounds.min_rdist(&self.metric, 0, point), 0, 0);
        while let Some(item) = nodeheap.pop() {
            if item.val >= heap.largest(row) {
                break;
            }
            if self.nodes[item.i1].is_leaf {
                self.push_leaf(item.i1, point, row, heap)?;
            } else {
                for i_child in [left_child(item.i1), right_child(item.i1)] {
                    let lower_bound = self.bounds.min_rdist(&self.metric, i_child, point);
                    nodeheap.push(lower_bound, i_child, 0);
                }
            }
        }
        Ok(())
    }

    fn knn_dual<Q: PointCloud>(
        &self,
        queries: &Q,
        k: usize,
        options: &QueryOptions,
    ) -> IndexResult<NeighborRows> {
        let query_tree: SpatialTree<&Q, M, B> =
            SpatialTree::new(queries, self.metric.clone(), self.leaf_size)?;
        let mut heap = NeighborsHeap::new(queries.len(), k)?;
        let mut bounds = try_filled(query_tree.nodes.len(), f32::INFINITY, "dual tree query")?;
        trace!(
            "dual tree query of {} points against {}",
            queries.len(),
            self.len()
        );
        if options.breadth_first {
            self.knn_dual_breadth_first(&query_tree, &mut bounds, &mut heap)?;
        } else {
            let lower_bound =
                self.bounds
                    .min_rdist_dual(&self.metric, 0, &query_tree.bounds, 0);
            self.knn_dual_depth_first(0, &query_tree, 0, &mut bounds, &mut heap, lower_bound)?;
        }
        Ok(self.finish_knn(heap, options.sort_results))
    }

    /// Brute force of a reference leaf against a query leaf. Returns the query leaf's new bound.
    fn push_leaf_pair<Q: PointCloud>(
        &self,
        i_node1: usize,
        other: &SpatialTree<Q, M, B>,
        i_node2: usize,
        heap: &mut NeighborsHeap,
    ) -> IndexResult<f32> {
        let mut bound: f32 = 0.0;
        for &i2 in other.node_indexes(i_node2) {
            let point = other.point_cloud.point(i2)?;
            if self.bounds.min_rdist(&self.metric, i_node1, point) < heap.largest(i2) {
                self.push_leaf(i_node1, point, i2, heap)?;
            }
            bound = bound.max(heap.largest(i2));
        }
        Ok(bound)
    }

    #[inline]
    fn split_query_node<Q: PointCloud>(
        &self,
        i_node1: usize,
        other: &SpatialTree<Q, M, B>,
        i_node2: usize,
    ) -> bool {
        let node1 = &self.nodes[i_node1];
        let node2 = &other.nodes[i_node2];
        node1.is_leaf || (!node2.is_leaf && node2.radius > node1.radius)
    }

    fn knn_dual_depth_first<Q: PointCloud>(
        &self,
        i_node1: usize,
        other: &SpatialTree<Q, M, B>,
        i_node2: usize,
        bounds: &mut [f32],
        heap: &mut NeighborsHeap,
        lower_bound: f32,
    ) -> IndexResult<()> {
        if lower_bound >= bounds[i_node2] {
            return Ok(());
        }
        if self.nodes[i_node1].is_leaf && other.nodes[i_node2].is_leaf {
            bounds[i_node2] = self.push_leaf_pair(i_node1, other, i_node2, heap)?;
            propagate_bound(bounds, i_node2);
        } else if self.split_query_node(i_node1, other, i_node2) {
            let c1 = left_child(i_node2);
            let c2 = right_child(i_node2);
            let lb1 = self.bounds.min_rdist_dual(&self.metric, i_node1, &other.bounds, c1);
            let lb2 = self.bounds.min_rdist_dual(&self.metric, i_node1, &other.bounds, c2);
            if lb1 <= lb2 {
                self.knn_dual_depth_first(i_node1, other, c1, bounds, heap, lb1)?;
                self.knn_dual_depth_first(i_node1, other, c2, bounds, heap, lb2)?;
            } else {
                self.knn_dual_depth_first(i_node1, other, c2, bounds, heap, lb2)?;
                self.knn_dual_depth_first(i_node1, other, c1, bounds, heap, lb1)?;
            }
        } else {
            let c1 = left_child(i_node1);
            let c2 = right_child(i_node1);
            let lb1 = self.bounds.min_rdist_dual(&self.metric, c1, &other.bounds, i_node2);
            let lb2 = self.bounds.min_rdist_dual(&self.metric, c2, &other.bounds, i_node2);
            if lb1 <= lb2 {
                self.knn_dual_depth_first(c1, other, i_node2, bounds, heap, lb1)?;
                self.knn_dual_depth_first(c2, other, i_node2, bounds, heap, lb2)?;
            } else {
                self.knn_dual_depth_first(c2, other, i_node2, bounds, heap, lb2)?;
                self.knn_dual_depth_first(c1, other, i_node2, bounds, heap, lb1)?;
            }
        }
        Ok(())
    }

    fn knn_dual_breadth_first<Q: PointCloud>(
        &self,
        other: &SpatialTree<Q, M, B>,
        bounds: &mut [f32],
        heap: &mut NeighborsHeap,
    ) -> IndexResult<()> {
        let mut nodeheap = NodeHeap::with_capacity(self.levels * other.levels * 2);
        nodeheap.push(
            self.bounds.min_rdist_dual(&self.metric, 0, &other.bounds, 0),
            0,
            0,
        );
        while let Some(item) = nodeheap.pop() {
            let (i_node1, i_node2) = (item.i1, item.i2);
            if item.val >= bounds[i_node2] {
                continue;
            }
            if self.nodes[i_node1].is_leaf && other.nodes[i_node2].is_leaf {
                bounds[i_node2] = self.push_leaf_pair(i_node1, other, i_node2, heap)?;
                propagate_bound(bounds, i_node2);
            } else if self.split_query_node(i_node1, other, i_node2) {
                for c in [left_child(i_node2), right_child(i_node2)] {
                    let lower_bound =
                        self.bounds.min_rdist_dual(&self.metric, i_node1, &other.bounds, c);
                    nodeheap.push(lower_bound, i_node1, c);
                }
            } else {
                for c in [left_child(i_node1), right_child(i_node1)] {
                    let lower_bound =
                        self.bounds.min_rdist_dual(&self.metric, c, &other.bounds, i_node2);
                    nodeheap.push(lower_bound, c, i_node2);
                }
            }
        }
        Ok(())
    }

    fn radius_row(
        &self,
        point: &[f32],
        radius: f32,
        sort: bool,
    ) -> IndexResult<Vec<(f32, PointIndex)>> {
        let mut found = Vec::new();
        let reduced_radius = self.metric.dist_to_rdist(radius);
        self.radius_depth_first(0, point, radius, reduced_radius, &mut found)?;
        if sort {
            found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        }
        Ok(found)
    }

    fn radius_depth_first(
        &self,
        i_node: usize,
        point: &[f32],
        radius: f32,
        reduced_radius: f32,
        found: &mut Vec<(f32, PointIndex)>,
    ) -> IndexResult<()> {
        let (dist_lb, dist_ub) = self.bounds.min_max_dist(&self.metric, i_node, point);
        if dist_lb > radius {
            return Ok(());
        }
        if dist_ub <= radius {
            for &idx in self.node_indexes(i_node) {
                let dist = self.metric.dist(point, self.point_cloud.point(idx)?);
                found.push((dist, idx));
            }
        } else if self.nodes[i_node].is_leaf {
            for &idx in self.node_indexes(i_node) {
                let rdist = self.metric.rdist(point, self.point_cloud.point(idx)?);
                if rdist <= reduced_radius {
                    found.push((self.metric.rdist_to_dist(rdist), idx));
                }
            }
        } else {
            self.radius_depth_first(left_child(i_node), point, radius, reduced_radius, found)?;
            self.radius_depth_first(right_child(i_node), point, radius, reduced_radius, found)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pointcloud::data_sources::DataRam;

    pub(crate) fn two_triangles() -> DataRam {
        DataRam::from_rows(&[
            [0.0f32, 0.0],
            [0.0, 1.0],
            [1.0, 0.0],
            [10.0, 10.0],
            [10.0, 11.0],
            [11.0, 10.0],
        ])
        .unwrap()
    }

    pub(crate) fn grid(side: usize) -> DataRam {
        let rows: Vec<Vec<f32>> = (0..side * side)
            .map(|i| vec![(i % side) as f32, (i / side) as f32 * 1.1])
            .collect();
        DataRam::from_rows(&rows).unwrap()
    }

    #[test]
    fn nearest_of_origin() {
        let tree = KdTree::new(two_triangles(), L2, 2).unwrap();
        let result = tree.knn(&[0.0, 0.0], 2).unwrap();
        assert_eq!(result[0], (0.0, 0));
        assert_approx_eq!(result[1].0, 1.0);
        assert!(result[1].1 == 1 || result[1].1 == 2);

        let tree = BallTree::new(two_triangles(), L2, 2).unwrap();
        let result = tree.knn(&[0.0, 0.0], 2).unwrap();
        assert_approx_eq!(result[1].0, 1.0);
    }

    #[test]
    fn all_traversals_agree() {
        let cloud = grid(12);
        let tree = BallTree::new(&cloud, L2, 3).unwrap();
        let base = tree.query(&cloud, 5, &QueryOptions::default()).unwrap();
        for (dual_tree, breadth_first) in [(false, true), (true, false), (true, true)] {
            let options = QueryOptions {
                dual_tree,
                breadth_first,
                ..Default::default()
            };
            let other = tree.query(&cloud, 5, &options).unwrap();
            for (d1, d2) in base.distances.iter().zip(&other.distances) {
                for (a, b) in d1.iter().zip(d2) {
                    assert_approx_eq!(a, b);
                }
            }
        }
    }

    #[test]
    fn radius_on_a_grid() {
        let cloud = grid(10);
        let tree = KdTree::new(&cloud, L2, 4).unwrap();
        let found = tree.radius(&[4.0, 4.4], 1.05).unwrap();
        let mut indexes: Vec<PointIndex> = found.iter().map(|(_, i)| *i).collect();
        indexes.sort_unstable();
        // the point itself and its two horizontal neighbors
        assert_eq!(indexes, vec![43, 44, 45]);
        assert!(found.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn bad_queries() {
        let tree = KdTree::new(two_triangles(), L2, 2).unwrap();
        let options = QueryOptions::default();
        assert!(matches!(
            tree.query(&two_triangles(), 0, &options),
            Err(IndexError::InvalidArgument(_))
        ));
        assert!(matches!(
            tree.query(&two_triangles(), 7, &options),
            Err(IndexError::InvalidArgument(_))
        ));
        for radius in [0.0, f32::INFINITY, f32::NAN] {
            assert!(matches!(
                tree.query_radius(&two_triangles(), radius, &options),
                Err(IndexError::InvalidArgument(_))
            ));
        }
        assert!(matches!(
            tree.knn(&[0.0, 0.0, 0.0], 1),
            Err(IndexError::InvalidArgument(_))
        ));
    }

    #[test]
    fn shared_between_threads() {
        let cloud = grid(20);
        let tree = KdTree::new(&cloud, L2, 5).unwrap();
        let options = QueryOptions {
            parallel_chunk_size: 8,
            ..Default::default()
        };
        let expected: Vec<Vec<f32>> = (0..cloud.len())
            .map(|qi| {
                let query = cloud.point(qi).unwrap();
                let mut dists: Vec<f32> = (0..cloud.len())
                    .map(|i| L2.dist(query, cloud.point(i).unwrap()))
                    .collect();
                dists.sort_by(|a, b| a.total_cmp(b));
                dists.truncate(4);
                dists
            })
            .collect();

        std::thread::scope(|s| {
            let mut handles = Vec::new();
            for _ in 0..4 {
                handles.push(s.spawn(|| tree.query(&cloud, 4, &options)));
            }
            for handle in handles {
                let hood = handle.join().unwrap().unwrap();
                assert_eq!(hood.len(), cloud.len());
                for (row, expected) in hood.distances.iter().zip(&expected) {
                    for (a, b) in row.iter().zip(expected) {
                        assert_approx_eq!(a, b, 1e-4);
                    }
                }
            }
        });
    }
}
