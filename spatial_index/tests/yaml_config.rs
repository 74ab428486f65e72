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
use spatial_index::utils::*;
use spatial_index::*;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempdir::TempDir;

fn write_points(dir: &Path) {
    let mut csv = File::create(dir.join("points.csv")).unwrap();
    writeln!(csv, "x,y").unwrap();
    for (x, y) in [(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (10.0, 10.0), (10.0, 11.0), (11.0, 10.0)] {
        writeln!(csv, "{},{}", x, y).unwrap();
    }
}

fn write_config(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("config.yml");
    let mut config = File::create(&path).unwrap();
    writeln!(config, "---\ndata_path: points.csv\nhas_headers: true\ndata_dim: 2\ncount: 6").unwrap();
    write!(config, "{}", body).unwrap();
    path
}

#[test]
fn index_from_a_config() {
    let dir = TempDir::new("index_config").unwrap();
    write_points(dir.path());
    let path = write_config(dir.path(), "leaf_size: 2\ntree_kind: ball\nmetric: manhattan\n");
    let index = index_from_yaml(&path).unwrap();
    assert_eq!(index.kind(), TreeKind::Ball);
    assert_eq!(index.leaf_size(), 2);
    assert_eq!(index.metric().p(), 1.0);
    let nearest = index.knn(&[10.0, 10.0], 3).unwrap();
    assert_eq!(nearest[0], (0.0, 3));
    assert_eq!(nearest[2].0, 1.0);
}

#[test]
fn spanning_tree_from_a_config() {
    let dir = TempDir::new("mst_config").unwrap();
    write_points(dir.path());
    let path = write_config(
        dir.path(),
        "min_samples: 1\nalpha: 1.0\nleaf_size: 2\ntree_kind: kd\nmetric: minkowski\np: 2\n",
    );
    let edges = mst_from_yaml(&path).unwrap();
    assert_eq!(edges.len(), 5);
    assert!((edges.total_weight() - (4.0 + 181.0f64.sqrt())).abs() < 1e-3);
}

#[test]
fn bad_configs_are_reported() {
    let dir = TempDir::new("bad_config").unwrap();
    write_points(dir.path());
    let path = write_config(dir.path(), "tree_kind: octree\n");
    assert!(matches!(
        index_from_yaml(&path),
        Err(IndexError::ParsingError(_))
    ));
    let path = write_config(dir.path(), "min_samples: 9\n");
    assert!(matches!(
        mst_from_yaml(&path),
        Err(IndexError::InvalidArgument(_))
    ));
    assert!(matches!(
        index_from_yaml(dir.path().join("missing.yml")),
        Err(IndexError::IoError(_))
    ));
}
