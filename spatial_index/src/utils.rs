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

//! Utility functions for i/o

use log::info;
use pointcloud::data_sources::DataRam;
use pointcloud::loaders::{metric_from_yaml, ram_from_yaml};
use pointcloud::*;
use std::path::Path;

use crate::boruvka::{BoruvkaBuilder, MstEdges};
use crate::errors::IndexResult;
use crate::tree::{SpatialIndex, SpatialTreeBuilder};

/// Given a yaml file on disk, it builds an index.
///
/// ```yaml
/// ---
/// leaf_size: 40
/// tree_kind: auto
/// data_path: DATA_CSV
/// count: NUMBER_OF_DATA_POINTS
/// data_dim: 3
/// metric: euclidean
/// ```
pub fn index_from_yaml<P: AsRef<Path>>(path: P) -> IndexResult<SpatialIndex<DataRam, Minkowski>> {
    let point_cloud = ram_from_yaml(&path)?;
    let metric = metric_from_yaml(&path)?;
    let builder = SpatialTreeBuilder::from_yaml(&path)?;
    info!(
        "Loaded dataset of {} points at dim {}, building a {} index with leaf size {} and the {} metric",
        point_cloud.len(),
        point_cloud.dim(),
        builder.resolve_kind(&point_cloud, &metric),
        builder.leaf_size,
        metric.name()
    );
    builder.build(point_cloud, metric)
}

/// Given a yaml file on disk, it computes the mutual reachability spanning tree of its data.
///
/// ```yaml
/// ---
/// min_samples: 5
/// alpha: 1.0
/// approx_min_span_tree: false
/// leaf_size: 40
/// data_path: DATA_CSV
/// metric: minkowski
/// p: 3
/// ```
pub fn mst_from_yaml<P: AsRef<Path>>(path: P) -> IndexResult<MstEdges> {
    let point_cloud = ram_from_yaml(&path)?;
    let metric = metric_from_yaml(&path)?;
    let builder = BoruvkaBuilder::from_yaml(&path)?;
    info!(
        "Loaded dataset of {} points, computing a spanning tree with min_samples {} and alpha {}",
        point_cloud.len(),
        builder.min_samples,
        builder.alpha
    );
    builder.build_mst(point_cloud, metric)
}
