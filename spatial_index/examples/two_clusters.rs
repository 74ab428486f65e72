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

//! Builds an index over two noisy clusters, runs a few queries and prints the longest
//! edges of the mutual reachability spanning tree. The longest one is the bridge.

use log::LevelFilter;
use pointcloud::data_sources::DataRam;
use pointcloud::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use spatial_index::*;

fn main() -> IndexResult<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(LevelFilter::Debug)
        .init();

    let mut rng = SmallRng::seed_from_u64(1234);
    let mut rows = Vec::new();
    for (cx, cy) in [(0.0f32, 0.0f32), (8.0, 3.0)] {
        for _ in 0..500 {
            rows.push([cx + rng.gen_range(-1.0..1.0), cy + rng.gen_range(-1.0..1.0)]);
        }
    }
    let points = DataRam::from_rows(&rows)?;

    let index = SpatialTreeBuilder::new()
        .set_leaf_size(20)
        .build(&points, L2)?;
    println!(
        "built a {} tree with {} levels over {} points",
        index.kind(),
        index.levels(),
        index.len()
    );

    let nearest = index.knn(&[4.0, 1.5], 3)?;
    println!("3 nearest to the midpoint: {:?}", nearest);
    let close = index.radius(&[0.0, 0.0], 0.25)?;
    println!("{} points within 0.25 of the first center", close.len());

    let options = QueryOptions {
        dual_tree: true,
        ..Default::default()
    };
    let hood = index.query(&points, 5, &options)?;
    let mean_fifth: f32 = hood.distances.iter().map(|row| row[4]).sum::<f32>() / hood.len() as f32;
    println!("mean distance to the 5th neighbor: {}", mean_fifth);

    let mut edges = BoruvkaBuilder::new()
        .set_min_samples(5)
        .mst_from_index(&index)?;
    edges.sort_by_weight();
    println!("spanning tree total weight {}", edges.total_weight());
    for i in (0..edges.len()).rev().take(3) {
        println!("{} -- {}: {}", edges.source[i], edges.sink[i], edges.weight[i]);
    }
    Ok(())
}
