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

use log::debug;
use pointcloud::loaders::load_yaml;
use pointcloud::pc_errors::ParsingError;
use pointcloud::*;
use std::path::Path;
use yaml_rust::Yaml;

use super::bounds::*;
use super::node::*;
use super::*;

impl<D: PointCloud, M: Metric, B: NodeBounds> SpatialTree<D, M, B> {
    /// Builds the tree. Fails on an empty cloud, a zero leaf size, or a metric the bounds
    /// can't handle.
    pub fn new(point_cloud: D, metric: M, leaf_size: usize) -> IndexResult<Self> {
        if leaf_size < 1 {
            return Err(IndexError::invalid_configuration(
                "leaf_size must be at least 1",
            ));
        }
        let n_points = point_cloud.len();
        if n_points == 0 {
            return Err(IndexError::invalid_configuration(
                "cannot build a tree over an empty point cloud",
            ));
        }

        let levels = tree_levels(n_points, leaf_size);
        let n_nodes = (1usize << levels) - 1;

        let mut idx_array = try_with_capacity(n_points, "tree construction")?;
        idx_array.extend(0..n_points);
        let nodes = try_filled(n_nodes, NodeData::default(), "tree construction")?;
        let bounds = B::allocate(&metric, n_nodes, point_cloud.dim())?;

        let mut tree = SpatialTree {
            point_cloud,
            metric,
            leaf_size,
            levels,
            idx_array,
            nodes,
            bounds,
        };
        tree.recursive_build(0, 0, n_points)?;
        debug!(
            "built a {:?} tree over {} points: {} levels, {} nodes, {} metric",
            B::KIND,
            n_points,
            levels,
            n_nodes,
            tree.metric.name()
        );
        Ok(tree)
    }

    fn recursive_build(&mut self, i_node: usize, idx_start: usize, idx_end: usize) -> IndexResult<()> {
        let n_points = idx_end - idx_start;
        let radius = self.bounds.init_node(
            i_node,
            &self.point_cloud,
            &self.metric,
            &self.idx_array[idx_start..idx_end],
        )?;
        let out_of_slots = left_child(i_node) >= self.nodes.len();
        let is_leaf = out_of_slots || n_points <= self.leaf_size;
        self.nodes[i_node] = NodeData {
            idx_start,
            idx_end,
            is_leaf,
            radius,
        };

        if out_of_slots && n_points > 2 * self.leaf_size {
            return Err(IndexError::internal(format!(
                "node {} ran out of slots with {} points, more than twice the leaf size {}",
                i_node, n_points, self.leaf_size
            )));
        }

        if !is_leaf {
            let idx_mid = idx_start + n_points / 2;
            let split_dim = self.find_split_dim(idx_start, idx_end)?;
            self.partition_indexes(split_dim, idx_start, idx_mid, idx_end)?;
            self.recursive_build(left_child(i_node), idx_start, idx_mid)?;
            self.recursive_build(right_child(i_node), idx_mid, idx_end)?;
        }
        Ok(())
    }

    /// The dimension along which the node's points are most spread out. The first wins ties.
    fn find_split_dim(&self, idx_start: usize, idx_end: usize) -> IndexResult<usize> {
        let (lower, upper) = self
            .point_cloud
            .bounding_box(&self.idx_array[idx_start..idx_end])?;
        let mut split_dim = 0;
        let mut max_spread = f32::NEG_INFINITY;
        for (j, (lo, hi)) in lower.iter().zip(&upper).enumerate() {
            let spread = hi - lo;
            if spread > max_spread {
                max_spread = spread;
                split_dim = j;
            }
        }
        Ok(split_dim)
    }

    /// Reorders the slice so that everything before `idx_mid` is no larger, along
    /// `split_dim`, than everything after it. Only this node's slice is touched.
    fn partition_indexes(
        &mut self,
        split_dim: usize,
        idx_start: usize,
        idx_mid: usize,
        idx_end: usize,
    ) -> IndexResult<()> {
        let mut keyed = self.idx_array[idx_start..idx_end]
            .iter()
            .map(|&i| -> IndexResult<(f32, PointIndex)> {
                Ok((self.point_cloud.point(i)?[split_dim], i))
            })
            .collect::<IndexResult<Vec<(f32, PointIndex)>>>()?;
        keyed.select_nth_unstable_by(idx_mid - idx_start, |a, b| {
            a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
        });
        for (slot, (_, i)) in self.idx_array[idx_start..idx_end].iter_mut().zip(keyed) {
            *slot = i;
        }
        Ok(())
    }
}

/// A construction object for a spatial index.
///
/// `leaf_size` is the most points a leaf should own (leaves can own up to twice as
/// many). `kind` picks the bounds. With [`TreeKind::Auto`] a ball tree is chosen for
/// metrics without a Minkowski order and for clouds with more than
/// `auto_ball_threshold` values (rows times columns), a KD tree otherwise.
#[derive(Debug, Clone)]
pub struct SpatialTreeBuilder {
    pub(crate) leaf_size: usize,
    pub(crate) kind: TreeKind,
    pub(crate) auto_ball_threshold: usize,
}

impl Default for SpatialTreeBuilder {
    fn default() -> SpatialTreeBuilder {
        SpatialTreeBuilder {
            leaf_size: 40,
            kind: TreeKind::Auto,
            auto_ball_threshold: 5000,
        }
    }
}

impl SpatialTreeBuilder {
    /// Creates a new builder with sensible defaults.
    pub fn new() -> SpatialTreeBuilder {
        SpatialTreeBuilder::default()
    }

    /// Creates a builder from a yaml file. Missing keys keep their defaults.
    /// ```yaml
    /// ---
    /// leaf_size: 40
    /// tree_kind: auto
    /// auto_ball_threshold: 5000
    /// ```
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> IndexResult<SpatialTreeBuilder> {
        let params = load_yaml(&path)?;
        SpatialTreeBuilder::from_params(&params, &path.as_ref().to_string_lossy())
    }

    pub(crate) fn from_params(params: &Yaml, file_name: &str) -> IndexResult<SpatialTreeBuilder> {
        let defaults = SpatialTreeBuilder::default();
        Ok(SpatialTreeBuilder {
            leaf_size: read_usize(params, "leaf_size", file_name)?.unwrap_or(defaults.leaf_size),
            kind: read_tree_kind(params, file_name)?.unwrap_or(defaults.kind),
            auto_ball_threshold: read_usize(params, "auto_ball_threshold", file_name)?
                .unwrap_or(defaults.auto_ball_threshold),
        })
    }

    /// See [`SpatialTreeBuilder`] for docs
    pub fn set_leaf_size(&mut self, x: usize) -> &mut Self {
        self.leaf_size = x;
        self
    }
    /// See [`SpatialTreeBuilder`] for docs
    pub fn set_kind(&mut self, x: TreeKind) -> &mut Self {
        self.kind = x;
        self
    }
    /// See [`SpatialTreeBuilder`] for docs
    pub fn set_auto_ball_threshold(&mut self, x: usize) -> &mut Self {
        self.auto_ball_threshold = x;
        self
    }

    /// The concrete kind this builder would build for the cloud and metric.
    pub fn resolve_kind<D: PointCloud, M: Metric>(&self, point_cloud: &D, metric: &M) -> TreeKind {
        match self.kind {
            TreeKind::Auto => {
                if metric.minkowski_p().is_none()
                    || point_cloud.len().saturating_mul(point_cloud.dim()) > self.auto_ball_threshold
                {
                    TreeKind::Ball
                } else {
                    TreeKind::Kd
                }
            }
            kind => kind,
        }
    }

    /// Pass a point cloud and a metric when ready.
    pub fn build<D: PointCloud, M: Metric>(
        &self,
        point_cloud: D,
        metric: M,
    ) -> IndexResult<SpatialIndex<D, M>> {
        match self.resolve_kind(&point_cloud, &metric) {
            TreeKind::Kd => Ok(SpatialIndex::Kd(self.build_kd(point_cloud, metric)?)),
            _ => Ok(SpatialIndex::Ball(self.build_ball(point_cloud, metric)?)),
        }
    }

    /// Builds a KD tree regardless of `kind`
    pub fn build_kd<D: PointCloud, M: Metric>(&self, point_cloud: D, metric: M) -> IndexResult<KdTree<D, M>> {
        KdTree::new(point_cloud, metric, self.leaf_size)
    }

    /// Builds a ball tree regardless of `kind`
    pub fn build_ball<D: PointCloud, M: Metric>(
        &self,
        point_cloud: D,
        metric: M,
    ) -> IndexResult<BallTree<D, M>> {
        BallTree::new(point_cloud, metric, self.leaf_size)
    }
}

fn malformed(file_name: &str, field: &str) -> IndexError {
    IndexError::ParsingError(ParsingError::MalformedYamlError {
        file_name: file_name.to_string(),
        field: field.to_string(),
    })
}

/// Reads a non-negative integer, `None` if the key is absent.
pub(crate) fn read_usize(params: &Yaml, field: &str, file_name: &str) -> IndexResult<Option<usize>> {
    match &params[field] {
        Yaml::BadValue | Yaml::Null => Ok(None),
        Yaml::Integer(i) if *i >= 0 => Ok(Some(*i as usize)),
        _ => Err(malformed(file_name, field)),
    }
}

/// Reads a float, integers are accepted too. `None` if the key is absent.
pub(crate) fn read_f32(params: &Yaml, field: &str, file_name: &str) -> IndexResult<Option<f32>> {
    match &params[field] {
        Yaml::BadValue | Yaml::Null => Ok(None),
        Yaml::Integer(i) => Ok(Some(*i as f32)),
        value => value
            .as_f64()
            .map(|f| Some(f as f32))
            .ok_or_else(|| malformed(file_name, field)),
    }
}

/// Reads a boolean, `None` if the key is absent.
pub(crate) fn read_bool(params: &Yaml, field: &str, file_name: &str) -> IndexResult<Option<bool>> {
    match &params[field] {
        Yaml::BadValue | Yaml::Null => Ok(None),
        Yaml::Boolean(b) => Ok(Some(*b)),
        _ => Err(malformed(file_name, field)),
    }
}

pub(crate) fn read_tree_kind(params: &Yaml, file_name: &str) -> IndexResult<Option<TreeKind>> {
    match &params["tree_kind"] {
        Yaml::BadValue | Yaml::Null => Ok(None),
        Yaml::String(s) => s
            .parse()
            .map(Some)
            .map_err(|_| malformed(file_name, "tree_kind")),
        _ => Err(malformed(file_name, "tree_kind")),
    }
}
