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

//! Per-node geometry. A tree kind is nothing more than a choice of bound, everything
//! else (build, queries, the spanning tree solver) is generic over [`NodeBounds`].

use pointcloud::*;
use std::fmt::Debug;

use super::TreeKind;
use crate::errors::IndexResult;

mod ball;
mod kd;
pub use ball::BallBounds;
pub use kd::KdBounds;

/// Lower and upper distance bounds between points and tree nodes.
///
/// All bounds must be valid for every point stored under the node: `min_*` never
/// exceeds, and `max_*` is never below, the true distance to any of them. The `rdist`
/// flavors live in the metric's reduced space.
pub trait NodeBounds: Debug + Send + Sync + Sized {
    /// The tree kind these bounds make
    const KIND: TreeKind;

    /// Storage for `n_nodes` nodes of dimension `dim`. Fails if the metric can't be bounded this way.
    fn allocate<M: Metric>(metric: &M, n_nodes: usize, dim: usize) -> IndexResult<Self>;

    /// Computes the bound of `i_node` from the points it owns and returns its radius.
    fn init_node<D: PointCloud, M: Metric>(
        &mut self,
        i_node: usize,
        point_cloud: &D,
        metric: &M,
        indexes: &[PointIndex],
    ) -> IndexResult<f32>;

    /// Reduced lower bound from a point to a node
    fn min_rdist<M: Metric>(&self, metric: &M, i_node: usize, point: &[f32]) -> f32;
    /// Reduced upper bound from a point to a node
    fn max_rdist<M: Metric>(&self, metric: &M, i_node: usize, point: &[f32]) -> f32;
    /// Lower bound from a point to a node
    fn min_dist<M: Metric>(&self, metric: &M, i_node: usize, point: &[f32]) -> f32;
    /// Upper bound from a point to a node
    fn max_dist<M: Metric>(&self, metric: &M, i_node: usize, point: &[f32]) -> f32;
    /// Both bounds at once
    fn min_max_dist<M: Metric>(&self, metric: &M, i_node: usize, point: &[f32]) -> (f32, f32) {
        (
            self.min_dist(metric, i_node, point),
            self.max_dist(metric, i_node, point),
        )
    }

    /// Reduced lower bound between a node of this tree and a node of `other`
    fn min_rdist_dual<M: Metric>(
        &self,
        metric: &M,
        i_node1: usize,
        other: &Self,
        i_node2: usize,
    ) -> f32;
    /// Reduced upper bound between a node of this tree and a node of `other`
    fn max_rdist_dual<M: Metric>(
        &self,
        metric: &M,
        i_node1: usize,
        other: &Self,
        i_node2: usize,
    ) -> f32;
    /// Lower bound between two nodes
    fn min_dist_dual<M: Metric>(
        &self,
        metric: &M,
        i_node1: usize,
        other: &Self,
        i_node2: usize,
    ) -> f32 {
        metric.rdist_to_dist(self.min_rdist_dual(metric, i_node1, other, i_node2))
    }
    /// Upper bound between two nodes
    fn max_dist_dual<M: Metric>(
        &self,
        metric: &M,
        i_node1: usize,
        other: &Self,
        i_node2: usize,
    ) -> f32 {
        metric.rdist_to_dist(self.max_rdist_dual(metric, i_node1, other, i_node2))
    }
}
