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

use super::NodeBounds;
use crate::errors::*;
use crate::tree::TreeKind;

/// A centroid and covering radius per node. Works for any metric.
#[derive(Debug, Clone)]
pub struct BallBounds {
    centroids: Vec<f32>,
    radii: Vec<f32>,
    dim: usize,
}

impl BallBounds {
    /// The mean of the points under the node
    pub fn centroid(&self, i_node: usize) -> &[f32] {
        &self.centroids[i_node * self.dim..(i_node + 1) * self.dim]
    }

    /// Largest distance from the centroid to a point under the node
    pub fn radius(&self, i_node: usize) -> f32 {
        self.radii[i_node]
    }

    #[inline]
    fn center_distance<M: Metric>(&self, metric: &M, i_node1: usize, other: &Self, i_node2: usize) -> f32 {
        metric.dist(self.centroid(i_node1), other.centroid(i_node2))
    }
}

impl NodeBounds for BallBounds {
    const KIND: TreeKind = TreeKind::Ball;

    fn allocate<M: Metric>(_metric: &M, n_nodes: usize, dim: usize) -> IndexResult<Self> {
        let size = n_nodes
            .checked_mul(dim)
            .ok_or_else(|| IndexError::out_of_memory("ball tree allocation"))?;
        Ok(BallBounds {
            centroids: try_filled(size, 0.0, "ball tree allocation")?,
            radii: try_filled(n_nodes, 0.0, "ball tree allocation")?,
            dim,
        })
    }

    fn init_node<D: PointCloud, M: Metric>(
        &mut self,
        i_node: usize,
        point_cloud: &D,
        metric: &M,
        indexes: &[PointIndex],
    ) -> IndexResult<f32> {
        let centroid = point_cloud.centroid(indexes)?;
        let radius = point_cloud
            .distances_to_point(metric, &centroid, indexes)?
            .into_iter()
            .fold(0.0, f32::max);
        self.centroids[i_node * self.dim..(i_node + 1) * self.dim].copy_from_slice(&centroid);
        self.radii[i_node] = radius;
        Ok(radius)
    }

    fn min_rdist<M: Metric>(&self, metric: &M, i_node: usize, point: &[f32]) -> f32 {
        metric.dist_to_rdist(self.min_dist(metric, i_node, point))
    }

    fn max_rdist<M: Metric>(&self, metric: &M, i_node: usize, point: &[f32]) -> f32 {
        metric.dist_to_rdist(self.max_dist(metric, i_node, point))
    }

    fn min_dist<M: Metric>(&self, metric: &M, i_node: usize, point: &[f32]) -> f32 {
        let dist_pt = metric.dist(point, self.centroid(i_node));
        (dist_pt - self.radii[i_node]).max(0.0)
    }

    fn max_dist<M: Metric>(&self, metric: &M, i_node: usize, point: &[f32]) -> f32 {
        metric.dist(point, self.centroid(i_node)) + self.radii[i_node]
    }

    fn min_max_dist<M: Metric>(&self, metric: &M, i_node: usize, point: &[f32]) -> (f32, f32) {
        let dist_pt = metric.dist(point, self.centroid(i_node));
        let rad = self.radii[i_node];
        ((dist_pt - rad).max(0.0), dist_pt + rad)
    }

    fn min_rdist_dual<M: Metric>(&self, metric: &M, i_node1: usize, other: &Self, i_node2: usize) -> f32 {
        metric.dist_to_rdist(self.min_dist_dual(metric, i_node1, other, i_node2))
    }

    fn max_rdist_dual<M: Metric>(&self, metric: &M, i_node1: usize, other: &Self, i_node2: usize) -> f32 {
        metric.dist_to_rdist(self.max_dist_dual(metric, i_node1, other, i_node2))
    }

    fn min_dist_dual<M: Metric>(&self, metric: &M, i_node1: usize, other: &Self, i_node2: usize) -> f32 {
        let dist_pt = self.center_distance(metric, i_node1, other, i_node2);
        (dist_pt - self.radii[i_node1] - other.radii[i_node2]).max(0.0)
    }

    fn max_dist_dual<M: Metric>(&self, metric: &M, i_node1: usize, other: &Self, i_node2: usize) -> f32 {
        let dist_pt = self.center_distance(metric, i_node1, other, i_node2);
        dist_pt + self.radii[i_node1] + other.radii[i_node2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointcloud::data_sources::DataRam;

    #[test]
    fn ball_bounds_contain_points() {
        let cloud = DataRam::from_rows(&[[0.0f32, 0.0], [2.0, 0.0], [1.0, 1.0]]).unwrap();
        let mut bounds = BallBounds::allocate(&L2, 1, 2).unwrap();
        let radius = bounds.init_node(0, &cloud, &L2, &[0, 1, 2]).unwrap();
        assert_approx_eq!(bounds.centroid(0)[0], 1.0);
        assert_approx_eq!(bounds.centroid(0)[1], 1.0 / 3.0);
        for i in 0..3 {
            let point = cloud.point(i).unwrap();
            assert!(L2.dist(point, bounds.centroid(0)) <= radius + 1e-6);
            assert_eq!(bounds.min_dist(&L2, 0, point), 0.0);
        }
        let (lo, hi) = bounds.min_max_dist(&L2, 0, &[10.0, 1.0 / 3.0]);
        assert_approx_eq!(lo, 9.0 - radius, 1e-5);
        assert_approx_eq!(hi, 9.0 + radius, 1e-5);
        assert_approx_eq!(bounds.min_rdist(&L2, 0, &[10.0, 1.0 / 3.0]), lo * lo, 1e-3);
    }

    #[test]
    fn dual_bounds_separate_balls() {
        let left = DataRam::from_rows(&[[0.0f32, 0.0], [0.0, 2.0]]).unwrap();
        let right = DataRam::from_rows(&[[10.0f32, 0.0], [10.0, 2.0]]).unwrap();
        let mut b1 = BallBounds::allocate(&L2, 1, 2).unwrap();
        let mut b2 = BallBounds::allocate(&L2, 1, 2).unwrap();
        b1.init_node(0, &left, &L2, &[0, 1]).unwrap();
        b2.init_node(0, &right, &L2, &[0, 1]).unwrap();
        assert_approx_eq!(b1.min_dist_dual(&L2, 0, &b2, 0), 8.0);
        assert_approx_eq!(b1.max_dist_dual(&L2, 0, &b2, 0), 12.0);
        assert_approx_eq!(b1.min_rdist_dual(&L2, 0, &b2, 0), 64.0, 1e-3);
    }
}
