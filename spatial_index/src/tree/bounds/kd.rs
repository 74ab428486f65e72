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

/// Axis aligned bounding boxes. Only valid for Minkowski metrics, since the per
/// dimension gaps are summed the same way the metric sums coordinate differences.
#[derive(Debug, Clone)]
pub struct KdBounds {
    lower: Vec<f32>,
    upper: Vec<f32>,
    dim: usize,
    p: f32,
}

impl KdBounds {
    /// Lower corner of the box
    pub fn lower(&self, i_node: usize) -> &[f32] {
        &self.lower[i_node * self.dim..(i_node + 1) * self.dim]
    }

    /// Upper corner of the box
    pub fn upper(&self, i_node: usize) -> &[f32] {
        &self.upper[i_node * self.dim..(i_node + 1) * self.dim]
    }

    /// Folds one coordinate gap into a reduced distance.
    #[inline]
    fn accumulate(&self, acc: f32, gap: f32) -> f32 {
        if self.p.is_infinite() {
            acc.max(gap)
        } else if self.p == 1.0 {
            acc + gap
        } else if self.p == 2.0 {
            acc + gap * gap
        } else {
            acc + gap.powf(self.p)
        }
    }
}

impl NodeBounds for KdBounds {
    const KIND: TreeKind = TreeKind::Kd;

    fn allocate<M: Metric>(metric: &M, n_nodes: usize, dim: usize) -> IndexResult<Self> {
        let p = metric.minkowski_p().ok_or_else(|| {
            IndexError::invalid_configuration(format!(
                "a kd tree needs a minkowski metric, {} is not one",
                metric.name()
            ))
        })?;
        let size = n_nodes
            .checked_mul(dim)
            .ok_or_else(|| IndexError::out_of_memory("kd tree allocation"))?;
        Ok(KdBounds {
            lower: try_filled(size, 0.0, "kd tree allocation")?,
            upper: try_filled(size, 0.0, "kd tree allocation")?,
            dim,
            p,
        })
    }

    fn init_node<D: PointCloud, M: Metric>(
        &mut self,
        i_node: usize,
        point_cloud: &D,
        metric: &M,
        indexes: &[PointIndex],
    ) -> IndexResult<f32> {
        let (lower, upper) = point_cloud.bounding_box(indexes)?;
        let half_diagonal = lower
            .iter()
            .zip(&upper)
            .fold(0.0, |acc, (lo, hi)| self.accumulate(acc, 0.5 * (hi - lo)));
        self.lower[i_node * self.dim..(i_node + 1) * self.dim].copy_from_slice(&lower);
        self.upper[i_node * self.dim..(i_node + 1) * self.dim].copy_from_slice(&upper);
        Ok(metric.rdist_to_dist(half_diagonal))
    }

    fn min_rdist<M: Metric>(&self, _metric: &M, i_node: usize, point: &[f32]) -> f32 {
        self.lower(i_node)
            .iter()
            .zip(self.upper(i_node))
            .zip(point)
            .fold(0.0, |acc, ((lo, hi), x)| {
                let gap = (lo - x).max(x - hi).max(0.0);
                self.accumulate(acc, gap)
            })
    }

    fn max_rdist<M: Metric>(&self, _metric: &M, i_node: usize, point: &[f32]) -> f32 {
        self.lower(i_node)
            .iter()
            .zip(self.upper(i_node))
            .zip(point)
            .fold(0.0, |acc, ((lo, hi), x)| {
                let far = (x - lo).abs().max((x - hi).abs());
                self.accumulate(acc, far)
            })
    }

    fn min_dist<M: Metric>(&self, metric: &M, i_node: usize, point: &[f32]) -> f32 {
        metric.rdist_to_dist(self.min_rdist(metric, i_node, point))
    }

    fn max_dist<M: Metric>(&self, metric: &M, i_node: usize, point: &[f32]) -> f32 {
        metric.rdist_to_dist(self.max_rdist(metric, i_node, point))
    }

    fn min_rdist_dual<M: Metric>(&self, _metric: &M, i_node1: usize, other: &Self, i_node2: usize) -> f32 {
        let lower1 = self.lower(i_node1);
        let upper1 = self.upper(i_node1);
        let lower2 = other.lower(i_node2);
        let upper2 = other.upper(i_node2);
        (0..self.dim).fold(0.0, |acc, j| {
            let gap = (lower2[j] - upper1[j]).max(lower1[j] - upper2[j]).max(0.0);
            self.accumulate(acc, gap)
        })
    }

    fn max_rdist_dual<M: Metric>(&self, _metric: &M, i_node1: usize, other: &Self, i_node2: usize) -> f32 {
        let lower1 = self.lower(i_node1);
        let upper1 = self.upper(i_node1);
        let lower2 = other.lower(i_node2);
        let upper2 = other.upper(i_node2);
        (0..self.dim).fold(0.0, |acc, j| {
            let far = (upper2[j] - lower1[j]).abs().max((upper1[j] - lower2[j]).abs());
            self.accumulate(acc, far)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointcloud::data_sources::DataRam;

    fn unit_square_bounds<M: Metric>(metric: &M) -> KdBounds {
        let cloud = DataRam::from_rows(&[[0.0f32, 0.0], [1.0, 1.0], [0.5, 0.2]]).unwrap();
        let mut bounds = KdBounds::allocate(metric, 1, 2).unwrap();
        bounds.init_node(0, &cloud, metric, &[0, 1, 2]).unwrap();
        bounds
    }

    #[test]
    fn box_bounds_euclidean() {
        let bounds = unit_square_bounds(&L2);
        assert_eq!(bounds.lower(0), &[0.0f32, 0.0][..]);
        assert_eq!(bounds.upper(0), &[1.0f32, 1.0][..]);
        assert_eq!(bounds.min_dist(&L2, 0, &[0.5, 0.5]), 0.0);
        assert_approx_eq!(bounds.min_dist(&L2, 0, &[4.0, 5.0]), 5.0);
        assert_approx_eq!(bounds.max_dist(&L2, 0, &[4.0, 5.0]), 41.0f32.sqrt());
        assert_approx_eq!(bounds.min_rdist(&L2, 0, &[4.0, 5.0]), 25.0);
    }

    #[test]
    fn box_bounds_other_orders() {
        let bounds = unit_square_bounds(&L1);
        assert_approx_eq!(bounds.min_dist(&L1, 0, &[4.0, 5.0]), 7.0);
        assert_approx_eq!(bounds.max_dist(&L1, 0, &[-1.0, 0.5]), 2.5);
        let bounds = unit_square_bounds(&LInf);
        assert_approx_eq!(bounds.min_dist(&LInf, 0, &[4.0, 5.0]), 4.0);
    }

    #[test]
    fn dual_box_bounds() {
        let bounds = unit_square_bounds(&L2);
        let cloud = DataRam::from_rows(&[[4.0f32, 5.0], [5.0, 6.0]]).unwrap();
        let mut far = KdBounds::allocate(&L2, 1, 2).unwrap();
        far.init_node(0, &cloud, &L2, &[0, 1]).unwrap();
        assert_approx_eq!(bounds.min_dist_dual(&L2, 0, &far, 0), 5.0);
        assert_approx_eq!(bounds.max_dist_dual(&L2, 0, &far, 0), 61.0f32.sqrt());
    }

    #[test]
    fn needs_minkowski() {
        #[derive(Debug, Clone)]
        struct Angular;
        impl Metric for Angular {
            fn rdist(&self, x: &[f32], y: &[f32]) -> f32 {
                x.iter().zip(y).map(|(a, b)| a * b).sum()
            }
            fn rdist_to_dist(&self, rdist: f32) -> f32 {
                rdist
            }
            fn dist_to_rdist(&self, dist: f32) -> f32 {
                dist
            }
            fn name(&self) -> &'static str {
                "angular"
            }
        }
        assert!(matches!(
            KdBounds::allocate(&Angular, 1, 2),
            Err(IndexError::InvalidConfiguration(_))
        ));
    }
}
