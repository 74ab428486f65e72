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

use log::{debug, info, trace};
use pointcloud::*;

use super::union_find::UnionFind;
use super::MstEdges;
use crate::errors::*;
use crate::query_interface::QueryOptions;
use crate::tree::bounds::NodeBounds;
use crate::tree::node::{left_child, propagate_bound, right_child};
use crate::tree::{SpatialTree, TreeKind};

/// Where a [`BoruvkaSolver`] is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoruvkaState {
    /// Core distances are known, nothing else
    Initialized,
    /// Every point is its own component and the candidate edges read off the k-NN lists are recorded
    ComponentsComputed,
    /// A dual tree pass found a candidate edge for every component it could
    Traversing,
    /// Candidate edges were added and components merged
    ComponentsMerged,
    /// The spanning tree is complete
    Done,
}

pub(crate) fn check_parameters(n_points: usize, min_samples: usize, alpha: f32) -> IndexResult<()> {
    if n_points < 2 {
        return Err(IndexError::invalid_configuration(format!(
            "a spanning tree needs at least 2 points, got {}",
            n_points
        )));
    }
    if min_samples < 1 || min_samples >= n_points {
        return Err(IndexError::invalid_argument(format!(
            "min_samples must be between 1 and {}, got {}",
            n_points - 1,
            min_samples
        )));
    }
    if !(alpha > 0.0) || !alpha.is_finite() {
        return Err(IndexError::invalid_argument(format!(
            "alpha must be positive, got {}",
            alpha
        )));
    }
    Ok(())
}

/// Dual tree Boruvka over a single tree.
///
/// Each component keeps the cheapest edge leaving it that the traversal has seen so far.
/// Edge weights are mutual reachability distances, `max(d(p, q) / alpha, core(p), core(q))`,
/// where `core(p)` is the distance from `p` to its `min_samples`-th nearest neighbor.
/// On a ball tree `p` is its own first neighbor, so `min_samples = 1` gives a core
/// distance of 0 and plain distances. A KD tree skips `p` itself.
/// Internally everything is compared in the metric's reduced space after scaling by
/// `alpha`, which preserves the order.
#[derive(Debug)]
pub struct BoruvkaSolver<'a, D: PointCloud, M: Metric, B: NodeBounds> {
    tree: &'a SpatialTree<D, M, B>,
    alpha: f32,
    approx_min_span_tree: bool,
    state: BoruvkaState,
    passes: usize,
    core_distances: Vec<f32>,
    core_rdist: Vec<f32>,
    knn_indices: Option<Vec<Vec<PointIndex>>>,
    union_find: UnionFind,
    component_of_point: Vec<PointIndex>,
    component_of_node: Vec<Option<PointIndex>>,
    candidate: Vec<Option<(PointIndex, PointIndex)>>,
    candidate_distance: Vec<f32>,
    bounds: Vec<f32>,
    bounds_reset: bool,
    edges: MstEdges,
}

impl<'a, D: PointCloud, M: Metric, B: NodeBounds> BoruvkaSolver<'a, D, M, B> {
    /// Validates the parameters and computes the core distances with a k-NN query on the tree.
    pub fn new(
        tree: &'a SpatialTree<D, M, B>,
        min_samples: usize,
        alpha: f32,
        approx_min_span_tree: bool,
    ) -> IndexResult<Self> {
        let n_points = tree.len();
        check_parameters(n_points, min_samples, alpha)?;

        // KD trees do not count the point itself among its `min_samples` neighbors
        let k = match B::KIND {
            TreeKind::Kd => min_samples + 1,
            _ => min_samples,
        };
        let neighborhood = tree.query(&tree.point_cloud, k, &QueryOptions::default())?;
        let core_distances: Vec<f32> = neighborhood
            .distances
            .iter()
            .map(|row| row.last().cloned().unwrap_or(0.0))
            .collect();
        let core_rdist = core_distances
            .iter()
            .map(|core| tree.metric.dist_to_rdist(alpha * core))
            .collect();

        let n_nodes = tree.nodes.len();
        let mut component_of_point = try_with_capacity(n_points, "spanning tree allocation")?;
        component_of_point.extend(0..n_points);
        Ok(BoruvkaSolver {
            tree,
            alpha,
            approx_min_span_tree,
            state: BoruvkaState::Initialized,
            passes: 0,
            core_distances,
            core_rdist,
            knn_indices: Some(neighborhood.indices),
            union_find: UnionFind::new(n_points)?,
            component_of_point,
            component_of_node: try_filled(n_nodes, None, "spanning tree allocation")?,
            candidate: try_filled(n_points, None, "spanning tree allocation")?,
            candidate_distance: try_filled(n_points, f32::INFINITY, "spanning tree allocation")?,
            bounds: try_filled(n_nodes, f32::INFINITY, "spanning tree allocation")?,
            bounds_reset: true,
            edges: MstEdges::with_capacity(n_points - 1)?,
        })
    }

    /// The current state
    pub fn state(&self) -> BoruvkaState {
        self.state
    }

    /// Distance from each point to its `min_samples`-th nearest neighbor, the point itself
    /// included on ball trees
    pub fn core_distances(&self) -> &[f32] {
        &self.core_distances
    }

    /// The edges added so far
    pub fn edges(&self) -> &MstEdges {
        &self.edges
    }

    /// Number of components left
    pub fn n_components(&self) -> usize {
        self.union_find.components()
    }

    /// Moves to the next state and returns it. Calling this on a finished solver is a no-op.
    pub fn step(&mut self) -> IndexResult<BoruvkaState> {
        match self.state {
            BoruvkaState::Initialized => self.compute_bounds()?,
            BoruvkaState::ComponentsComputed | BoruvkaState::Traversing => {
                self.update_components()?
            }
            BoruvkaState::ComponentsMerged => {
                self.dual_tree_traversal(0, 0)?;
                self.state = BoruvkaState::Traversing;
            }
            BoruvkaState::Done => {}
        }
        Ok(self.state)
    }

    /// Runs to completion and hands back the `n - 1` edges, in the order they were found.
    pub fn spanning_tree(mut self) -> IndexResult<MstEdges> {
        while self.step()? != BoruvkaState::Done {}
        info!(
            "spanning tree of {} points done in {} passes, total weight {}",
            self.tree.len(),
            self.passes,
            self.edges.total_weight()
        );
        Ok(self.edges)
    }

    /// Candidate edges straight from the k-NN lists. An edge from `p` to one of its
    /// neighbors that weighs exactly `core(p)` is the cheapest edge leaving `p`.
    fn compute_bounds(&mut self) -> IndexResult<()> {
        let tree = self.tree;
        let knn_indices = self.knn_indices.take().unwrap_or_default();
        for (p, row) in knn_indices.iter().enumerate() {
            let point_p = tree.point_cloud.point(p)?;
            for &q in row.iter().filter(|&&q| q != p) {
                let rdist = tree.metric.rdist(point_p, tree.point_cloud.point(q)?);
                let mr_dist = rdist.max(self.core_rdist[p]).max(self.core_rdist[q]);
                if mr_dist <= self.core_rdist[p] {
                    self.candidate[p] = Some((p, q));
                    self.candidate_distance[p] = mr_dist;
                    break;
                }
            }
        }
        self.refresh_components();
        self.bounds.iter_mut().for_each(|b| *b = f32::INFINITY);
        self.bounds_reset = true;
        self.state = BoruvkaState::ComponentsComputed;
        Ok(())
    }

    /// Adds every candidate edge that still joins two components, then recomputes which
    /// component owns each point and node.
    fn update_components(&mut self) -> IndexResult<()> {
        let n_points = self.tree.len();
        let last_components = self.union_find.components();
        let mut added = 0;
        for component in 0..n_points {
            let (source, sink) = match self.candidate[component].take() {
                Some(edge) => edge,
                None => continue,
            };
            if !self.union_find.union(source, sink) {
                continue;
            }
            let weight = self.tree.metric.rdist_to_dist(self.candidate_distance[component]) / self.alpha;
            self.edges.push(source, sink, weight);
            added += 1;
        }
        self.candidate_distance.iter_mut().for_each(|d| *d = f32::INFINITY);
        self.refresh_components();

        if self.state == BoruvkaState::Traversing {
            self.passes += 1;
        }
        debug!(
            "boruvka pass {}: {} edges added, {} components, {} edges",
            self.passes,
            added,
            self.union_find.components(),
            self.edges.len()
        );

        if self.edges.len() + 1 >= n_points {
            self.state = BoruvkaState::Done;
            return Ok(());
        }
        if added == 0 && self.state == BoruvkaState::Traversing && self.bounds_reset {
            return Err(IndexError::internal(format!(
                "a dual tree pass with fresh bounds joined nothing, {} components remain",
                self.union_find.components()
            )));
        }

        let reset = !self.approx_min_span_tree || self.union_find.components() == last_components;
        if reset {
            self.bounds.iter_mut().for_each(|b| *b = f32::INFINITY);
        }
        self.bounds_reset = reset;
        self.state = BoruvkaState::ComponentsMerged;
        Ok(())
    }

    fn refresh_components(&mut self) {
        let tree = self.tree;
        for p in 0..self.component_of_point.len() {
            self.component_of_point[p] = self.union_find.find(p);
        }
        for i_node in (0..tree.nodes.len()).rev() {
            self.component_of_node[i_node] = if tree.nodes[i_node].is_leaf {
                let mut indexes = tree.node_indexes(i_node).iter();
                match indexes.next() {
                    Some(&first) => {
                        let component = self.component_of_point[first];
                        if indexes.all(|&i| self.component_of_point[i] == component) {
                            Some(component)
                        } else {
                            None
                        }
                    }
                    None => None,
                }
            } else {
                let left = self.component_of_node[left_child(i_node)];
                if left.is_some() && left == self.component_of_node[right_child(i_node)] {
                    left
                } else {
                    None
                }
            };
        }
    }

    fn dual_tree_traversal(&mut self, i_node1: usize, i_node2: usize) -> IndexResult<()> {
        let tree = self.tree;
        let node_dist = tree
            .bounds
            .min_rdist_dual(&tree.metric, i_node1, &tree.bounds, i_node2);
        if node_dist >= self.bounds[i_node1] {
            return Ok(());
        }
        if let Some(component) = self.component_of_node[i_node1] {
            if self.component_of_node[i_node2] == Some(component) {
                return Ok(());
            }
        }

        let node1 = tree.nodes[i_node1];
        let node2 = tree.nodes[i_node2];
        if node1.is_leaf && node2.is_leaf {
            return self.compare_leaves(i_node1, i_node2);
        }

        if node2.is_leaf || (!node1.is_leaf && node1.radius >= node2.radius) {
            let (left, right) = (left_child(i_node1), right_child(i_node1));
            let left_dist = tree.bounds.min_rdist_dual(&tree.metric, left, &tree.bounds, i_node2);
            let right_dist = tree.bounds.min_rdist_dual(&tree.metric, right, &tree.bounds, i_node2);
            if left_dist <= right_dist {
                self.dual_tree_traversal(left, i_node2)?;
                self.dual_tree_traversal(right, i_node2)
            } else {
                self.dual_tree_traversal(right, i_node2)?;
                self.dual_tree_traversal(left, i_node2)
            }
        } else {
            let (left, right) = (left_child(i_node2), right_child(i_node2));
            let left_dist = tree.bounds.min_rdist_dual(&tree.metric, i_node1, &tree.bounds, left);
            let right_dist = tree.bounds.min_rdist_dual(&tree.metric, i_node1, &tree.bounds, right);
            if left_dist <= right_dist {
                self.dual_tree_traversal(i_node1, left)?;
                self.dual_tree_traversal(i_node1, right)
            } else {
                self.dual_tree_traversal(i_node1, right)?;
                self.dual_tree_traversal(i_node1, left)
            }
        }
    }

    /// Brute force of two leaves. Points whose core distance already beats nothing are
    /// skipped on both sides and don't count towards the new bound of `i_node1`.
    fn compare_leaves(&mut self, i_node1: usize, i_node2: usize) -> IndexResult<()> {
        let tree = self.tree;
        let mut new_bound: f32 = 0.0;
        for &p in tree.node_indexes(i_node1) {
            let component_p = self.component_of_point[p];
            if self.core_rdist[p] > self.candidate_distance[component_p] {
                continue;
            }
            let point_p = tree.point_cloud.point(p)?;
            for &q in tree.node_indexes(i_node2) {
                if self.component_of_point[q] == component_p
                    || self.core_rdist[q] > self.candidate_distance[component_p]
                {
                    continue;
                }
                let rdist = tree.metric.rdist(point_p, tree.point_cloud.point(q)?);
                let mr_dist = rdist.max(self.core_rdist[p]).max(self.core_rdist[q]);
                if mr_dist < self.candidate_distance[component_p] {
                    self.candidate_distance[component_p] = mr_dist;
                    self.candidate[component_p] = Some((p, q));
                }
            }
            new_bound = new_bound.max(self.candidate_distance[component_p]);
        }
        if new_bound < self.bounds[i_node1] {
            trace!("bound of node {} tightened to {}", i_node1, new_bound);
            self.bounds[i_node1] = new_bound;
            propagate_bound(&mut self.bounds, i_node1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tree::tests::two_triangles;
    use crate::tree::{BallTree, KdTree};

    #[test]
    fn walks_through_the_states() {
        let tree = KdTree::new(two_triangles(), L2, 2).unwrap();
        let mut solver = BoruvkaSolver::new(&tree, 1, 1.0, false).unwrap();
        assert_eq!(solver.state(), BoruvkaState::Initialized);
        assert_eq!(solver.step().unwrap(), BoruvkaState::ComponentsComputed);
        let after_seeding = solver.step().unwrap();
        assert!(after_seeding == BoruvkaState::ComponentsMerged || after_seeding == BoruvkaState::Done);
        // each point's nearest neighbor is 1 away, so the seeds alone merge the triangles
        assert_eq!(solver.n_components(), 2);
        assert_eq!(solver.step().unwrap(), BoruvkaState::Traversing);
        assert_eq!(solver.step().unwrap(), BoruvkaState::Done);
        assert_eq!(solver.step().unwrap(), BoruvkaState::Done);

        let edges = solver.spanning_tree().unwrap();
        assert_eq!(edges.len(), 5);
        let bridges: Vec<f32> = edges
            .iter()
            .filter(|(source, sink, _)| (*source < 3) != (*sink < 3))
            .map(|(_, _, weight)| weight)
            .collect();
        assert_eq!(bridges.len(), 1);
        assert_approx_eq!(bridges[0], 181.0f32.sqrt(), 1e-4);
    }

    #[test]
    fn core_distances_are_kth_neighbors() {
        let tree = KdTree::new(two_triangles(), L2, 2).unwrap();
        let solver = BoruvkaSolver::new(&tree, 1, 1.0, false).unwrap();
        for core in solver.core_distances() {
            assert_approx_eq!(*core, 1.0f32);
        }
        // the right angle corners have both legs at 1, the others reach the far leg at sqrt 2
        let solver = BoruvkaSolver::new(&tree, 2, 1.0, false).unwrap();
        let expected = [1.0f32, 2.0f32.sqrt(), 2.0f32.sqrt()];
        for (i, core) in solver.core_distances().iter().enumerate() {
            assert_approx_eq!(*core, expected[i % 3], 1e-5);
        }
        let solver = BoruvkaSolver::new(&tree, 3, 1.0, false).unwrap();
        assert_approx_eq!(solver.core_distances()[0], 200.0f32.sqrt(), 1e-4);
    }

    #[test]
    fn ball_tree_core_distances_count_the_point() {
        let tree = BallTree::new(two_triangles(), L2, 2).unwrap();
        let solver = BoruvkaSolver::new(&tree, 1, 1.0, false).unwrap();
        for core in solver.core_distances() {
            assert_eq!(*core, 0.0);
        }
        let solver = BoruvkaSolver::new(&tree, 2, 1.0, false).unwrap();
        for core in solver.core_distances() {
            assert_approx_eq!(*core, 1.0f32);
        }
        let solver = BoruvkaSolver::new(&tree, 3, 1.0, false).unwrap();
        let expected = [1.0f32, 2.0f32.sqrt(), 2.0f32.sqrt()];
        for (i, core) in solver.core_distances().iter().enumerate() {
            assert_approx_eq!(*core, expected[i % 3], 1e-5);
        }
        let solver = BoruvkaSolver::new(&tree, 4, 1.0, false).unwrap();
        assert_approx_eq!(solver.core_distances()[0], 200.0f32.sqrt(), 1e-4);

        // zero core distances leave plain distances, same bridge
        let edges = BoruvkaSolver::new(&tree, 1, 1.0, false)
            .unwrap()
            .spanning_tree()
            .unwrap();
        assert_eq!(edges.len(), 5);
        assert_approx_eq!(edges.total_weight(), 4.0 + 181.0f64.sqrt(), 1e-3);
    }

    #[test]
    fn parameters_are_checked() {
        let tree = KdTree::new(two_triangles(), L2, 2).unwrap();
        assert!(matches!(
            BoruvkaSolver::new(&tree, 0, 1.0, false),
            Err(IndexError::InvalidArgument(_))
        ));
        assert!(matches!(
            BoruvkaSolver::new(&tree, 6, 1.0, false),
            Err(IndexError::InvalidArgument(_))
        ));
        assert!(matches!(
            BoruvkaSolver::new(&tree, 2, 0.0, false),
            Err(IndexError::InvalidArgument(_))
        ));
        assert!(matches!(
            check_parameters(1, 1, 1.0),
            Err(IndexError::InvalidConfiguration(_))
        ));
    }
}
