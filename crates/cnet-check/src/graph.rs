//! Image adjacency induced by shared control points.

use std::collections::{BTreeMap, BTreeSet};

use cnet_core::{ControlMeasure, ControlNet, IgnorePolicy, ImageId};

use crate::ProgressSink;

/// Undirected image graph: two images are adjacent when an eligible point
/// has eligible measures on both.
///
/// Only images that take part in a multi-measure point are vertices; an
/// image seen exclusively in single-measure points never enters the graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrespondenceGraph {
    vertices: BTreeSet<ImageId>,
    adjacency: BTreeMap<ImageId, BTreeSet<ImageId>>,
}

impl CorrespondenceGraph {
    /// Build the graph from every eligible point with two or more eligible
    /// measures. Each ordered measure pair `(i, j)`, `i != j`, adds `image(j)`
    /// to the neighbor set of `image(i)`, so adjacency is symmetric.
    pub fn build(net: &ControlNet, policy: IgnorePolicy, progress: &mut dyn ProgressSink) -> Self {
        let mut graph = Self::default();
        progress.start("Building correspondence graph", net.num_points());
        for point in &net.points {
            progress.advance(1);
            if !policy.point_eligible(point) {
                continue;
            }
            let measures: Vec<&ControlMeasure> = point.eligible_measures(policy).collect();
            if measures.len() < 2 {
                continue;
            }
            for (i, from) in measures.iter().enumerate() {
                graph.vertices.insert(from.image.clone());
                let neighbors = graph.adjacency.entry(from.image.clone()).or_default();
                for (j, to) in measures.iter().enumerate() {
                    if i != j {
                        neighbors.insert(to.image.clone());
                    }
                }
            }
        }
        progress.finish();
        graph
    }

    pub fn vertices(&self) -> impl Iterator<Item = &ImageId> + '_ {
        self.vertices.iter()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn contains(&self, id: &ImageId) -> bool {
        self.vertices.contains(id)
    }

    /// Neighbors of `id` in ascending id order. Empty for unknown ids.
    pub fn neighbors<'a>(&'a self, id: &ImageId) -> impl Iterator<Item = &'a ImageId> + 'a {
        self.adjacency.get(id).into_iter().flatten()
    }

    pub fn is_adjacent(&self, a: &ImageId, b: &ImageId) -> bool {
        self.adjacency.get(a).is_some_and(|n| n.contains(b))
    }

    /// Number of undirected edges between distinct images.
    pub fn num_edges(&self) -> usize {
        let directed: usize = self
            .adjacency
            .iter()
            .map(|(id, n)| n.len() - usize::from(n.contains(id)))
            .sum();
        directed / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullProgress;
    use cnet_core::test_utils::{linked_network, point, tie_point};

    fn id(s: &str) -> ImageId {
        ImageId::from(s)
    }

    #[test]
    fn adjacency_is_symmetric() {
        let net = ControlNet::new(vec![
            tie_point("p1", &["A", "B", "C"]),
            tie_point("p2", &["C", "D"]),
        ]);
        let graph = CorrespondenceGraph::build(&net, IgnorePolicy::Honor, &mut NullProgress);
        for a in graph.vertices() {
            for b in graph.neighbors(a) {
                assert!(graph.is_adjacent(b, a), "{a} -> {b} not mirrored");
            }
        }
        assert_eq!(graph.num_vertices(), 4);
        assert_eq!(graph.num_edges(), 4);
    }

    #[test]
    fn single_measure_images_are_not_vertices() {
        let mut net = linked_network(&[("A", "B")]);
        net.points.push(tie_point("lonely", &["Z"]));
        let graph = CorrespondenceGraph::build(&net, IgnorePolicy::Honor, &mut NullProgress);
        assert!(!graph.contains(&id("Z")));
        assert_eq!(graph.num_vertices(), 2);
    }

    #[test]
    fn ignored_measures_do_not_create_edges() {
        let mut p = tie_point("p1", &["A", "B", "C"]);
        p.measures[2].ignored = true;
        let net = ControlNet::new(vec![p]);

        let honored = CorrespondenceGraph::build(&net, IgnorePolicy::Honor, &mut NullProgress);
        assert!(!honored.contains(&id("C")));
        assert!(honored.is_adjacent(&id("A"), &id("B")));

        let disregarded =
            CorrespondenceGraph::build(&net, IgnorePolicy::Disregard, &mut NullProgress);
        assert!(disregarded.is_adjacent(&id("A"), &id("C")));
    }

    #[test]
    fn ignored_point_contributes_nothing_when_honored() {
        let net = ControlNet::new(vec![tie_point("p", &["A", "B"]).ignored()]);
        let graph = CorrespondenceGraph::build(&net, IgnorePolicy::Honor, &mut NullProgress);
        assert_eq!(graph.num_vertices(), 0);
    }

    #[test]
    fn point_with_one_surviving_measure_adds_no_edges() {
        let mut p = tie_point("p", &["A", "B"]);
        p.measures[0].ignored = true;
        let net = ControlNet::new(vec![p]);
        let graph = CorrespondenceGraph::build(&net, IgnorePolicy::Honor, &mut NullProgress);
        assert_eq!(graph.num_vertices(), 0);
        assert_eq!(graph.num_edges(), 0);
    }

    #[test]
    fn repeated_image_in_one_point_is_a_self_loop() {
        let net = ControlNet::new(vec![point("p", &[("A", 1.0, 1.0), ("A", 5.0, 5.0)])]);
        let graph = CorrespondenceGraph::build(&net, IgnorePolicy::Honor, &mut NullProgress);
        assert!(graph.contains(&id("A")));
        assert!(graph.is_adjacent(&id("A"), &id("A")));
        assert_eq!(graph.num_edges(), 0);
    }
}
