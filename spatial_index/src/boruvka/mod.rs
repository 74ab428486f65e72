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

//! # Minimum spanning trees under mutual reachability
//!
//! A dual tree version of Boruvka's algorithm. Every pass walks pairs of tree nodes,
//! pruning pairs that are too far apart to beat any component's current best edge and
//! pairs wholly inside one component, then merges each component along the cheapest
//! edge it found. See [`BoruvkaSolver`] for the state machine.

use pointcloud::loaders::load_yaml;
use pointcloud::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use yaml_rust::Yaml;

use crate::errors::*;
use crate::tree::bounds::NodeBounds;
use crate::tree::{
    read_bool, read_f32, read_tree_kind, read_usize, BallTree, KdTree, SpatialIndex, SpatialTree,
    SpatialTreeBuilder, TreeKind,
};

mod solver;
pub use solver::{BoruvkaSolver, BoruvkaState};
pub(crate) use solver::check_parameters;
mod union_find;
pub use union_find::UnionFind;

/// The edges of a spanning tree as three parallel arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MstEdges {
    /// One end of each edge
    pub source: Vec<PointIndex>,
    /// The other end
    pub sink: Vec<PointIndex>,
    /// Mutual reachability distance between the two ends
    pub weight: Vec<f32>,
}

impl MstEdges {
    /// Room for `capacity` edges, allocated up front.
    pub fn with_capacity(capacity: usize) -> IndexResult<MstEdges> {
        Ok(MstEdges {
            source: try_with_capacity(capacity, "edge list allocation")?,
            sink: try_with_capacity(capacity, "edge list allocation")?,
            weight: try_with_capacity(capacity, "edge list allocation")?,
        })
    }

    ///
    pub fn push(&mut self, source: PointIndex, sink: PointIndex, weight: f32) {
        self.source.push(source);
        self.sink.push(sink);
        self.weight.push(weight);
    }

    /// Number of edges
    pub fn len(&self) -> usize {
        self.weight.len()
    }

    ///
    pub fn is_empty(&self) -> bool {
        self.weight.is_empty()
    }

    /// `(source, sink, weight)` triples
    pub fn iter(&self) -> impl Iterator<Item = (PointIndex, PointIndex, f32)> + '_ {
        self.source
            .iter()
            .zip(&self.sink)
            .zip(&self.weight)
            .map(|((source, sink), weight)| (*source, *sink, *weight))
    }

    /// Sum of the weights, accumulated in `f64`
    pub fn total_weight(&self) -> f64 {
        self.weight.iter().map(|w| *w as f64).sum()
    }

    /// Reorders the edges by ascending weight. Equal weights keep their order.
    pub fn sort_by_weight(&mut self) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|a, b| self.weight[*a].total_cmp(&self.weight[*b]));
        self.source = order.iter().map(|i| self.source[*i]).collect();
        self.sink = order.iter().map(|i| self.sink[*i]).collect();
        self.weight = order.iter().map(|i| self.weight[*i]).collect();
    }
}

/// A construction object for spanning trees.
///
/// `min_samples` picks the neighbor that defines a point's core distance, `alpha` divides
/// raw distances, `approx_min_span_tree` lets passes keep stale node bounds while the
/// component count is still dropping. `leaf_size` and `tree_kind` describe the tree the
/// solver walks; with [`TreeKind::Auto`] the usual heuristic of [`SpatialTreeBuilder`] applies.
#[derive(Debug, Clone)]
pub struct BoruvkaBuilder {
    pub(crate) min_samples: usize,
    pub(crate) alpha: f32,
    pub(crate) approx_min_span_tree: bool,
    pub(crate) leaf_size: usize,
    pub(crate) kind: TreeKind,
}

impl Default for BoruvkaBuilder {
    fn default() -> BoruvkaBuilder {
        BoruvkaBuilder {
            min_samples: 5,
            alpha: 1.0,
            approx_min_span_tree: false,
            leaf_size: 40,
            kind: TreeKind::Auto,
        }
    }
}

impl BoruvkaBuilder {
    /// Creates a new builder with sensible defaults.
    pub fn new() -> BoruvkaBuilder {
        BoruvkaBuilder::default()
    }

    /// Creates a builder from a yaml file. Missing keys keep their defaults.
    /// ```yaml
    /// ---
    /// min_samples: 5
    /// alpha: 1.0
    /// approx_min_span_tree: false
    /// leaf_size: 40
    /// tree_kind: kd
    /// ```
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> IndexResult<BoruvkaBuilder> {
        let params = load_yaml(&path)?;
        BoruvkaBuilder::from_params(&params, &path.as_ref().to_string_lossy())
    }

    pub(crate) fn from_params(params: &Yaml, file_name: &str) -> IndexResult<BoruvkaBuilder> {
        let defaults = BoruvkaBuilder::default();
        Ok(BoruvkaBuilder {
            min_samples: read_usize(params, "min_samples", file_name)?
                .unwrap_or(defaults.min_samples),
            alpha: read_f32(params, "alpha", file_name)?.unwrap_or(defaults.alpha),
            approx_min_span_tree: read_bool(params, "approx_min_span_tree", file_name)?
                .unwrap_or(defaults.approx_min_span_tree),
            leaf_size: read_usize(params, "leaf_size", file_name)?.unwrap_or(defaults.leaf_size),
            kind: read_tree_kind(params, file_name)?.unwrap_or(defaults.kind),
        })
    }

    /// See [`BoruvkaBuilder`] for docs
    pub fn set_min_samples(&mut self, x: usize) -> &mut Self {
        self.min_samples = x;
        self
    }
    /// See [`BoruvkaBuilder`] for docs
    pub fn set_alpha(&mut self, x: f32) -> &mut Self {
        self.alpha = x;
        self
    }
    /// See [`BoruvkaBuilder`] for docs
    pub fn set_approx_min_span_tree(&mut self, x: bool) -> &mut Self {
        self.approx_min_span_tree = x;
        self
    }
    /// See [`BoruvkaBuilder`] for docs
    pub fn set_leaf_size(&mut self, x: usize) -> &mut Self {
        self.leaf_size = x;
        self
    }
    /// See [`BoruvkaBuilder`] for docs
    pub fn set_kind(&mut self, x: TreeKind) -> &mut Self {
        self.kind = x;
        self
    }

    /// Builds a tree over the points and solves on it.
    pub fn build_mst<D: PointCloud, M: Metric>(&self, point_cloud: D, metric: M) -> IndexResult<MstEdges> {
        check_parameters(point_cloud.len(), self.min_samples, self.alpha)?;
        let mut tree_builder = SpatialTreeBuilder::new();
        tree_builder.set_leaf_size(self.leaf_size).set_kind(self.kind);
        let index = tree_builder.build(point_cloud, metric)?;
        self.mst_from_index(&index)
    }

    /// Solves over the data of an existing index. The index's own tree is walked when its
    /// kind matches `tree_kind` (or `tree_kind` is `Auto`), otherwise a tree of the
    /// requested kind is built over the same points.
    pub fn mst_from_index<D: PointCloud, M: Metric>(&self, index: &SpatialIndex<D, M>) -> IndexResult<MstEdges> {
        check_parameters(index.len(), self.min_samples, self.alpha)?;
        match (index, self.kind) {
            (SpatialIndex::Kd(tree), TreeKind::Kd | TreeKind::Auto) => self.solve(tree),
            (SpatialIndex::Ball(tree), TreeKind::Ball | TreeKind::Auto) => self.solve(tree),
            (SpatialIndex::Ball(tree), TreeKind::Kd) => {
                let kd = KdTree::new(tree.point_cloud(), tree.metric().clone(), self.leaf_size)?;
                self.solve(&kd)
            }
            (SpatialIndex::Kd(tree), TreeKind::Ball) => {
                let ball = BallTree::new(tree.point_cloud(), tree.metric().clone(), self.leaf_size)?;
                self.solve(&ball)
            }
        }
    }

    /// Solves on a typed tree.
    pub fn solve<D: PointCloud, M: Metric, B: NodeBounds>(
        &self,
        tree: &SpatialTree<D, M, B>,
    ) -> IndexResult<MstEdges> {
        BoruvkaSolver::new(tree, self.min_samples, self.alpha, self.approx_min_span_tree)?
            .spanning_tree()
    }
}

/// The `n - 1` edges of a minimum spanning tree under mutual reachability.
///
/// Picks the tree kind automatically. Fails with `InvalidConfiguration` on fewer than two
/// points and with `InvalidArgument` when `min_samples` is 0 or at least the number of
/// points, or `alpha` is not positive.
pub fn compute_mst<D: PointCloud, M: Metric>(
    points: D,
    min_samples: usize,
    metric: M,
    alpha: f32,
    approximate: bool,
    leaf_size: usize,
) -> IndexResult<MstEdges> {
    BoruvkaBuilder::new()
        .set_min_samples(min_samples)
        .set_alpha(alpha)
        .set_approx_min_span_tree(approximate)
        .set_leaf_size(leaf_size)
        .build_mst(points, metric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tree::tests::{grid, two_triangles};
    use pointcloud::data_sources::DataRam;
    use yaml_rust::YamlLoader;

    #[test]
    fn edges_bookkeeping() {
        let mut edges = MstEdges::with_capacity(3).unwrap();
        edges.push(0, 1, 2.0);
        edges.push(1, 2, 0.5);
        edges.push(2, 3, 1.0);
        assert_eq!(edges.len(), 3);
        assert_approx_eq!(edges.total_weight(), 3.5f64);
        edges.sort_by_weight();
        assert_eq!(edges.source, vec![1, 2, 0]);
        assert_eq!(edges.sink, vec![2, 3, 1]);
        assert_eq!(edges.iter().next(), Some((1, 2, 0.5)));
    }

    #[test]
    fn kind_mismatch_rebuilds() {
        let cloud = grid(6);
        let index = SpatialTreeBuilder::new()
            .set_kind(TreeKind::Kd)
            .set_leaf_size(4)
            .build(&cloud, L2)
            .unwrap();
        let mut builder = BoruvkaBuilder::new();
        builder.set_min_samples(2).set_leaf_size(3);
        let reused = builder.mst_from_index(&index).unwrap();
        builder.set_kind(TreeKind::Ball);
        let rebuilt = builder.mst_from_index(&index).unwrap();
        assert_eq!(reused.len(), 35);
        assert_eq!(rebuilt.len(), 35);
        assert_approx_eq!(reused.total_weight(), rebuilt.total_weight(), 1e-3);
    }

    #[test]
    fn bad_inputs() {
        let single = DataRam::new(vec![1.0, 1.0], 2).unwrap();
        assert!(matches!(
            compute_mst(single, 1, L2, 1.0, false, 2),
            Err(IndexError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            compute_mst(two_triangles(), 0, L2, 1.0, false, 2),
            Err(IndexError::InvalidArgument(_))
        ));
        assert!(matches!(
            compute_mst(two_triangles(), 1, L2, -1.0, false, 2),
            Err(IndexError::InvalidArgument(_))
        ));
    }

    #[test]
    fn builder_from_yaml() {
        let params = &YamlLoader::load_from_str(
            "min_samples: 3\nalpha: 2\napprox_min_span_tree: true\ntree_kind: kd",
        )
        .unwrap()[0];
        let builder = BoruvkaBuilder::from_params(params, "test").unwrap();
        assert_eq!(builder.min_samples, 3);
        assert_approx_eq!(builder.alpha, 2.0f32);
        assert!(builder.approx_min_span_tree);
        assert_eq!(builder.leaf_size, 40);
        assert_eq!(builder.kind, TreeKind::Kd);

        let params = &YamlLoader::load_from_str("approx_min_span_tree: maybe").unwrap()[0];
        assert!(BoruvkaBuilder::from_params(params, "test").is_err());
    }
}
