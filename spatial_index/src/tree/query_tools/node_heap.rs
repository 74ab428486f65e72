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

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A pending node, or pair of nodes, with the lower bound that orders it.
#[derive(Debug, Clone, Copy)]
pub struct NodeHeapData {
    /// Lower bound on the distance
    pub val: f32,
    /// Node of the reference tree
    pub i1: usize,
    /// Node of the query tree, unused for single tree queries
    pub i2: usize,
}

impl PartialEq for NodeHeapData {
    fn eq(&self, other: &NodeHeapData) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NodeHeapData {}

impl PartialOrd for NodeHeapData {
    fn partial_cmp(&self, other: &NodeHeapData) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed so the std max-heap pops the smallest bound first.
impl Ord for NodeHeapData {
    fn cmp(&self, other: &NodeHeapData) -> Ordering {
        other
            .val
            .total_cmp(&self.val)
            .then_with(|| other.i1.cmp(&self.i1))
            .then_with(|| other.i2.cmp(&self.i2))
    }
}

/// Min-heap of nodes for best first traversals.
#[derive(Debug, Default)]
pub struct NodeHeap {
    heap: BinaryHeap<NodeHeapData>,
}

impl NodeHeap {
    /// An empty heap with some room
    pub fn with_capacity(capacity: usize) -> NodeHeap {
        NodeHeap {
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    ///
    pub fn push(&mut self, val: f32, i1: usize, i2: usize) {
        self.heap.push(NodeHeapData { val, i1, i2 });
    }

    /// Removes the entry with the smallest bound
    pub fn pop(&mut self) -> Option<NodeHeapData> {
        self.heap.pop()
    }

    /// The smallest bound, without removing it
    pub fn peek(&self) -> Option<&NodeHeapData> {
        self.heap.peek()
    }

    ///
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    ///
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_smallest_first() {
        let mut heap = NodeHeap::with_capacity(4);
        heap.push(3.0, 3, 0);
        heap.push(0.5, 1, 0);
        heap.push(f32::INFINITY, 9, 0);
        heap.push(1.5, 2, 7);
        assert_eq!(heap.peek().unwrap().i1, 1);
        let order: Vec<usize> = std::iter::from_fn(|| heap.pop()).map(|d| d.i1).collect();
        assert_eq!(order, vec![1, 2, 3, 9]);
        assert!(heap.is_empty());
    }
}
