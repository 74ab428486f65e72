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

#![allow(dead_code)]

use pointcloud::data_sources::DataRam;
use pointcloud::*;
use spatial_index::TreeKind;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub fn random_cloud(count: usize, dim: usize, seed: u64) -> DataRam {
    let mut rng = SmallRng::seed_from_u64(seed);
    let data: Vec<f32> = (0..count * dim).map(|_| rng.gen_range(-10.0f32..10.0)).collect();
    DataRam::new(data, dim).unwrap()
}

/// Two gaussian-ish blobs far apart, so the spanning tree has one obvious bridge.
pub fn blobs(count: usize, seed: u64) -> DataRam {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(count * 2);
    for i in 0..count {
        let offset = if i % 2 == 0 { 0.0 } else { 50.0 };
        data.push(offset + rng.gen_range(-1.0f32..1.0));
        data.push(offset + rng.gen_range(-1.0f32..1.0));
    }
    DataRam::new(data, 2).unwrap()
}

pub fn two_triangles() -> DataRam {
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

/// All `(distance, index)` pairs from `point`, closest first.
pub fn brute_force<D: PointCloud, M: Metric>(cloud: &D, metric: &M, point: &[f32]) -> Vec<(f32, PointIndex)> {
    let mut all: Vec<(f32, PointIndex)> = (0..cloud.len())
        .map(|i| (metric.dist(point, cloud.point(i).unwrap()), i))
        .collect();
    all.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    all
}

/// Ball trees count a point as its own first neighbor, KD trees skip it.
pub fn core_distances<D: PointCloud, M: Metric>(
    cloud: &D,
    metric: &M,
    kind: TreeKind,
    min_samples: usize,
) -> Vec<f32> {
    let kth = match kind {
        TreeKind::Kd => min_samples,
        _ => min_samples - 1,
    };
    (0..cloud.len())
        .map(|i| brute_force(cloud, metric, cloud.point(i).unwrap())[kth].0)
        .collect()
}

/// Prim's algorithm over the explicit mutual reachability matrix.
pub fn prim_weight<D: PointCloud, M: Metric>(
    cloud: &D,
    metric: &M,
    kind: TreeKind,
    min_samples: usize,
    alpha: f32,
) -> f64 {
    let n = cloud.len();
    let core = core_distances(cloud, metric, kind, min_samples);
    let mr = |p: usize, q: usize| -> f32 {
        let d = metric.dist(cloud.point(p).unwrap(), cloud.point(q).unwrap()) / alpha;
        d.max(core[p]).max(core[q])
    };
    let mut in_tree = vec![false; n];
    let mut best = vec![f32::INFINITY; n];
    best[0] = 0.0;
    let mut total = 0.0f64;
    for _ in 0..n {
        let next = (0..n)
            .filter(|i| !in_tree[*i])
            .min_by(|a, b| best[*a].total_cmp(&best[*b]))
            .unwrap();
        in_tree[next] = true;
        total += best[next] as f64;
        for other in 0..n {
            if !in_tree[other] {
                best[other] = best[other].min(mr(next, other));
            }
        }
    }
    total
}

pub fn assert_close(a: f64, b: f64) {
    assert!(
        (a - b).abs() <= 1e-3 * a.abs().max(b.abs()).max(1.0),
        "{} and {} differ",
        a,
        b
    );
}
