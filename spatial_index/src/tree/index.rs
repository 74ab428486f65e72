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

use pointcloud::*;

use super::node::NodeData;
use super::*;
use crate::query_interface::{Neighborhood, QueryOptions};

/// A tree whose kind was picked at runtime, see [`SpatialTreeBuilder::build`].
#[derive(Debug)]
pub enum SpatialIndex<D: PointCloud, M: Metric> {
    /// Built with box bounds
    Kd(KdTree<D, M>),
    /// Built with ball bounds
    Ball(BallTree<D, M>),
}

macro_rules! dispatch {
    ($self:ident, $tree:ident => $body:expr) => {
        match $self {
            SpatialIndex::Kd($tree) => $body,
            SpatialIndex::Ball($tree) => $body,
        }
    };
}

impl<D: PointCloud, M: Metric> SpatialIndex<D, M> {
    /// Never `Auto`
    pub fn kind(&self) -> TreeKind {
        dispatch!(self, tree => tree.kind())
    }

    ///
    pub fn len(&self) -> usize {
        dispatch!(self, tree => tree.len())
    }

    ///
    pub fn is_empty(&self) -> bool {
        dispatch!(self, tree => tree.is_empty())
    }

    ///
    pub fn dim(&self) -> usize {
        dispatch!(self, tree => tree.dim())
    }

    ///
    pub fn leaf_size(&self) -> usize {
        dispatch!(self, tree => tree.leaf_size())
    }

    ///
    pub fn levels(&self) -> usize {
        dispatch!(self, tree => tree.levels())
    }

    /// The indexed data
    pub fn point_cloud(&self) -> &D {
        dispatch!(self, tree => tree.point_cloud())
    }

    ///
    pub fn metric(&self) -> &M {
        dispatch!(self, tree => tree.metric())
    }

    /// See [`SpatialTree::idx_array`]
    pub fn idx_array(&self) -> &[PointIndex] {
        dispatch!(self, tree => tree.idx_array())
    }

    /// See [`SpatialTree::nodes`]
    pub fn nodes(&self) -> &[NodeData] {
        dispatch!(self, tree => tree.nodes())
    }

    /// See [`SpatialTree::query`]
    pub fn query<Q: PointCloud>(
        &self,
        queries: &Q,
        k: usize,
        options: &QueryOptions,
    ) -> IndexResult<Neighborhood> {
        dispatch!(self, tree => tree.query(queries, k, options))
    }

    /// See [`SpatialTree::query_radius`]
    pub fn query_radius<Q: PointCloud>(
        &self,
        queries: &Q,
        radius: f32,
        options: &QueryOptions,
    ) -> IndexResult<Neighborhood> {
        dispatch!(self, tree => tree.query_radius(queries, radius, options))
    }

    /// See [`SpatialTree::knn`]
    pub fn knn(&self, point: &[f32], k: usize) -> IndexResult<Vec<(f32, PointIndex)>> {
        dispatch!(self, tree => tree.knn(point, k))
    }

    /// See [`SpatialTree::radius`]
    pub fn radius(&self, point: &[f32], radius: f32) -> IndexResult<Vec<(f32, PointIndex)>> {
        dispatch!(self, tree => tree.radius(point, radius))
    }
}

impl<D: PointCloud, M: Metric> From<KdTree<D, M>> for SpatialIndex<D, M> {
    fn from(tree: KdTree<D, M>) -> Self {
        SpatialIndex::Kd(tree)
    }
}

impl<D: PointCloud, M: Metric> From<BallTree<D, M>> for SpatialIndex<D, M> {
    fn from(tree: BallTree<D, M>) -> Self {
        SpatialIndex::Ball(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tree::tests::grid;

    #[test]
    fn both_kinds_answer_the_same() {
        let cloud = grid(8);
        let mut builder = SpatialTreeBuilder::new();
        builder.set_leaf_size(3).set_kind(TreeKind::Kd);
        let kd = builder.build(&cloud, L1).unwrap();
        builder.set_kind(TreeKind::Ball);
        let ball = builder.build(&cloud, L1).unwrap();
        assert_eq!(kd.kind(), TreeKind::Kd);
        assert_eq!(ball.kind(), TreeKind::Ball);
        assert_eq!(kd.len(), 64);
        assert_eq!(ball.dim(), 2);

        let a = kd.knn(&[3.2, 2.0], 6).unwrap();
        let b = ball.knn(&[3.2, 2.0], 6).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_approx_eq!(x.0, y.0);
        }
        assert_eq!(
            kd.radius(&[3.2, 2.0], 1.5).unwrap().len(),
            ball.radius(&[3.2, 2.0], 1.5).unwrap().len()
        );
    }
}
