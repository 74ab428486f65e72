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

//! The node record of the flat tree, and the heap-style addressing between nodes.

use std::ops::Range;

/// One node of the tree. It owns the contiguous slice `idx_start..idx_end` of the
/// tree's permutation array.
///
/// Slots of the node array that the build never reached stay at the default, an
/// empty leaf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeData {
    /// First position in the permutation array
    pub idx_start: usize,
    /// One past the last position in the permutation array
    pub idx_end: usize,
    /// Leaves are brute forced
    pub is_leaf: bool,
    /// Ball trees store the covering radius, KD trees half the box diagonal
    pub radius: f32,
}

impl Default for NodeData {
    fn default() -> NodeData {
        NodeData {
            idx_start: 0,
            idx_end: 0,
            is_leaf: true,
            radius: 0.0,
        }
    }
}

impl NodeData {
    /// Number of points under this node
    #[inline]
    pub fn len(&self) -> usize {
        self.idx_end - self.idx_start
    }

    ///
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx_end == self.idx_start
    }

    /// Positions in the permutation array
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.idx_start..self.idx_end
    }
}

#[inline]
pub(crate) fn left_child(i_node: usize) -> usize {
    2 * i_node + 1
}

#[inline]
pub(crate) fn right_child(i_node: usize) -> usize {
    2 * i_node + 2
}

#[inline]
pub(crate) fn parent(i_node: usize) -> usize {
    (i_node - 1) / 2
}

/// Pushes a tightened bound of `i_node` up the tree. A parent's bound is the larger
/// of its children's, and we stop as soon as a parent would not shrink.
pub(crate) fn propagate_bound(bounds: &mut [f32], mut i_node: usize) {
    while i_node > 0 {
        let i_parent = parent(i_node);
        let bound_max = bounds[left_child(i_parent)].max(bounds[right_child(i_parent)]);
        if bound_max < bounds[i_parent] {
            bounds[i_parent] = bound_max;
            i_node = i_parent;
        } else {
            break;
        }
    }
}

/// Number of levels of a tree over `count` points: `floor(log2(max(1, (count - 1) / leaf_size))) + 1`.
pub(crate) fn tree_levels(count: usize, leaf_size: usize) -> usize {
    let ratio = (count.saturating_sub(1) as f64 / leaf_size as f64).max(1.0);
    ratio.log2().floor() as usize + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addressing() {
        assert_eq!(left_child(0), 1);
        assert_eq!(right_child(0), 2);
        assert_eq!(parent(1), 0);
        assert_eq!(parent(2), 0);
        assert_eq!(parent(right_child(5)), 5);
    }

    #[test]
    fn bounds_flow_upward() {
        let mut bounds = vec![f32::INFINITY; 7];
        bounds[3] = 1.0;
        propagate_bound(&mut bounds, 3);
        assert_eq!(bounds[1], f32::INFINITY);
        bounds[4] = 2.0;
        propagate_bound(&mut bounds, 4);
        assert_eq!(bounds[1], 2.0);
        assert_eq!(bounds[0], f32::INFINITY);
        bounds[5] = 0.5;
        bounds[6] = 0.5;
        propagate_bound(&mut bounds, 6);
        assert_eq!(bounds[2], 0.5);
        assert_eq!(bounds[0], 2.0);
    }

    #[test]
    fn level_counts() {
        assert_eq!(tree_levels(1, 40), 1);
        assert_eq!(tree_levels(40, 40), 1);
        assert_eq!(tree_levels(81, 40), 2);
        assert_eq!(tree_levels(6, 2), 2);
        assert_eq!(tree_levels(1000, 1), 10);
    }
}
