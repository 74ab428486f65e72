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

#![warn(missing_docs)]
#![doc(test(attr(allow(unused_variables), deny(warnings))))]

//! # Spatial Index
//! Exact k-nearest neighbor and radius queries over dense vectors with KD trees and ball
//! trees, and a dual tree Boruvka solver for minimum spanning trees under mutual
//! reachability distance.
//!
//! ## Parameter Guide
//! `leaf_size` is the one knob of the trees. Leaves are brute forced, so a small leaf
//! size prunes more but walks more nodes. Leaves hold between `leaf_size` and
//! `2 * leaf_size` points. KD trees bound nodes with boxes and need a Minkowski metric,
//! ball trees bound them with a centroid and a radius and tend to do better in high
//! dimensions. [`TreeKind::Auto`] picks between them.
//!
//! For spanning trees `min_samples` sets the core distance of each point (the distance
//! to its `min_samples`-th neighbor) and `alpha` divides raw distances before they are
//! compared to core distances.
//!
//! ```rust
//! use pointcloud::*;
//! use pointcloud::data_sources::DataRam;
//! use spatial_index::*;
//!
//! let points = DataRam::from_rows(&[
//!     [0.0f32, 0.0], [0.0, 1.0], [1.0, 0.0],
//!     [10.0, 10.0], [10.0, 11.0], [11.0, 10.0],
//! ]).unwrap();
//! let index = SpatialTreeBuilder::new().set_leaf_size(2).build(&points, L2).unwrap();
//! let nearest = index.knn(&[0.0, 0.0], 2).unwrap();
//! assert_eq!(nearest[1].0, 1.0);
//!
//! let edges = compute_mst(&points, 1, L2, 1.0, false, 2).unwrap();
//! assert_eq!(edges.len(), 5);
//! ```

#[cfg(test)]
#[macro_use]
extern crate assert_approx_eq;

pub mod errors;
pub use errors::{IndexError, IndexResult};

pub mod tree;
pub use tree::{
    BallTree, KdTree, NodeData, SpatialIndex, SpatialTree, SpatialTreeBuilder, TreeKind,
};

pub mod query_interface;
pub use query_interface::{Neighborhood, QueryOptions};

pub mod boruvka;
pub use boruvka::{compute_mst, BoruvkaBuilder, BoruvkaSolver, BoruvkaState, MstEdges};

pub mod utils;
