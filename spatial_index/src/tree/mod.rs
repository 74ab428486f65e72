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

//! # KD and ball trees
//!
//! Both are [`SpatialTree`]s, they differ only in the [`bounds::NodeBounds`] they carry.
//! Use a [`SpatialTreeBuilder`] to pick the kind at runtime, it hands back a
//! [`SpatialIndex`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::*;

pub mod bounds;
pub(crate) mod node;
pub use node::NodeData;
pub mod query_tools;

mod builders;
pub use builders::SpatialTreeBuilder;
pub(crate) use builders::{read_bool, read_f32, read_tree_kind, read_usize};
mod index;
pub use index::SpatialIndex;
#[allow(clippy::module_inception)]
pub(crate) mod tree;
pub use tree::{BallTree, KdTree, SpatialTree};

/// Which bounds a tree is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeKind {
    /// Axis aligned bounding boxes
    Kd,
    /// Centroid and covering radius
    Ball,
    /// Let the builder decide
    Auto,
}

impl Default for TreeKind {
    fn default() -> TreeKind {
        TreeKind::Auto
    }
}

impl fmt::Display for TreeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TreeKind::Kd => write!(f, "kd"),
            TreeKind::Ball => write!(f, "ball"),
            TreeKind::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for TreeKind {
    type Err = IndexError;
    fn from_str(s: &str) -> IndexResult<TreeKind> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kd" | "kd_tree" | "kdtree" => Ok(TreeKind::Kd),
            "ball" | "ball_tree" | "balltree" => Ok(TreeKind::Ball),
            "auto" => Ok(TreeKind::Auto),
            other => Err(IndexError::invalid_configuration(format!(
                "unknown tree kind {}",
                other
            ))),
        }
    }
}
