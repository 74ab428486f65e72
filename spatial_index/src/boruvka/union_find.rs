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

use pointcloud::PointIndex;

use crate::errors::*;

/// Disjoint sets over `0..n` with path compression and union by rank.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<PointIndex>,
    rank: Vec<u8>,
    components: usize,
}

impl UnionFind {
    /// `n` singletons
    pub fn new(n: usize) -> IndexResult<UnionFind> {
        let mut parent = try_with_capacity(n, "union find allocation")?;
        parent.extend(0..n);
        Ok(UnionFind {
            parent,
            rank: try_filled(n, 0, "union find allocation")?,
            components: n,
        })
    }

    /// The representative of `x`'s set. Flattens the path it walks.
    pub fn find(&mut self, x: PointIndex) -> PointIndex {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = x;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// Merges the sets of `x` and `y`. False if they already were one set.
    pub fn union(&mut self, x: PointIndex, y: PointIndex) -> bool {
        let x_root = self.find(x);
        let y_root = self.find(y);
        if x_root == y_root {
            return false;
        }
        match self.rank[x_root].cmp(&self.rank[y_root]) {
            std::cmp::Ordering::Less => self.parent[x_root] = y_root,
            std::cmp::Ordering::Greater => self.parent[y_root] = x_root,
            std::cmp::Ordering::Equal => {
                self.parent[y_root] = x_root;
                self.rank[x_root] = self.rank[x_root].saturating_add(1);
            }
        }
        self.components -= 1;
        true
    }

    /// Number of disjoint sets
    pub fn components(&self) -> usize {
        self.components
    }

    ///
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    ///
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }
}
