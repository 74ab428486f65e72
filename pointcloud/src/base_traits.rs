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

use rayon::prelude::*;
use std::cmp::min;
use std::fmt::Debug;
use std::sync::Arc;

use crate::distances::*;
use crate::pc_errors::*;
use crate::*;

#[inline]
fn chunk(data_dim: usize) -> usize {
    min(15000 / data_dim.max(1), 20).max(1)
}

/// Base trait for a point cloud. Points are dense rows of `f32` of a common dimension.
///
/// The metric is not part of the cloud. Everything that measures distances takes one.
pub trait PointCloud: Debug + Send + Sync {
    /// The number of samples this cloud covers
    fn len(&self) -> usize;
    /// If this is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// The dimension of the underlying data
    fn dim(&self) -> usize;
    /// Gets a point from this dataset
    fn point(&self, pi: PointIndex) -> PointCloudResult<&[f32]>;

    /// Distances from a point to the given indexes. This parallelizes for long index lists.
    fn distances_to_point<M: Metric>(
        &self,
        metric: &M,
        point: &[f32],
        indexes: &[PointIndex],
    ) -> PointCloudResult<Vec<f32>> {
        if point.len() != self.dim() {
            return Err(PointCloudError::dimension_mismatch(self.dim(), point.len()));
        }
        let chunk = chunk(self.dim());
        if indexes.len() > chunk * 3 {
            indexes
                .par_chunks(chunk)
                .map(|chunk_indexes| {
                    chunk_indexes
                        .iter()
                        .map(|i| -> PointCloudResult<f32> { Ok(metric.dist(point, self.point(*i)?)) })
                        .collect::<PointCloudResult<Vec<f32>>>()
                })
                .collect::<PointCloudResult<Vec<Vec<f32>>>>()
                .map(|chunks| chunks.concat())
        } else {
            indexes
                .iter()
                .map(|i| -> PointCloudResult<f32> { Ok(metric.dist(point, self.point(*i)?)) })
                .collect()
        }
    }

    /// Distances from a point in the cloud to the given indexes.
    fn distances_to_point_index<M: Metric>(
        &self,
        metric: &M,
        i: PointIndex,
        indexes: &[PointIndex],
    ) -> PointCloudResult<Vec<f32>> {
        self.distances_to_point(metric, self.point(i)?, indexes)
    }

    /// The raw moment of the given order, summed over the indexes.
    fn moment_subset(&self, moment: i32, indexes: &[PointIndex]) -> PointCloudResult<Vec<f32>> {
        let mut moment_vec: Vec<f32> = vec![0.0; self.dim()];
        for i in indexes {
            let y = self.point(*i)?;
            for (m, yy) in moment_vec.iter_mut().zip(y) {
                *m += yy.powi(moment);
            }
        }
        Ok(moment_vec)
    }

    /// Mean of the given points. Empty index lists give the origin.
    fn centroid(&self, indexes: &[PointIndex]) -> PointCloudResult<Vec<f32>> {
        let mut mean = self.moment_subset(1, indexes)?;
        if !indexes.is_empty() {
            let count = indexes.len() as f32;
            mean.iter_mut().for_each(|m| *m /= count);
        }
        Ok(mean)
    }

    /// Coordinate-wise minimum and maximum of the given points.
    fn bounding_box(&self, indexes: &[PointIndex]) -> PointCloudResult<(Vec<f32>, Vec<f32>)> {
        let mut lower = vec![f32::INFINITY; self.dim()];
        let mut upper = vec![f32::NEG_INFINITY; self.dim()];
        for i in indexes {
            let y = self.point(*i)?;
            for ((lo, hi), yy) in lower.iter_mut().zip(upper.iter_mut()).zip(y) {
                *lo = lo.min(*yy);
                *hi = hi.max(*yy);
            }
        }
        Ok((lower, upper))
    }
}

impl<'a, T: PointCloud> PointCloud for &'a T {
    fn len(&self) -> usize {
        (**self).len()
    }
    fn dim(&self) -> usize {
        (**self).dim()
    }
    fn point(&self, pi: PointIndex) -> PointCloudResult<&[f32]> {
        (**self).point(pi)
    }
}

impl<T: PointCloud> PointCloud for Arc<T> {
    fn len(&self) -> usize {
        (**self).len()
    }
    fn dim(&self) -> usize {
        (**self).dim()
    }
    fn point(&self, pi: PointIndex) -> PointCloudResult<&[f32]> {
        (**self).point(pi)
    }
}
