//! Connected components ("islands") of the correspondence graph.

use std::collections::BTreeSet;

use cnet_core::ImageId;
use serde::Serialize;

use crate::{CorrespondenceGraph, ProgressSink};

/// A maximal set of images connected through shared control points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Island {
    images: BTreeSet<ImageId>,
}

impl Island {
    pub fn new(images: BTreeSet<ImageId>) -> Self {
        Self { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn contains(&self, id: &ImageId) -> bool {
        self.images.contains(id)
    }

    /// Member images in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &ImageId> + '_ {
        self.images.iter()
    }
}

/// Partition the graph's vertices into islands with an explicit-stack DFS.
///
/// Every vertex lands in exactly one island. Each stack frame keeps its own
/// neighbor cursor, so the walk picks the first still-unvisited neighbor
/// without rescanning and the whole pass is O(V + E). Which neighbor comes
/// first is a tie-break only; the partition does not depend on it.
///
/// Islands are returned ordered by their smallest image id.
pub fn find_islands(graph: &CorrespondenceGraph, progress: &mut dyn ProgressSink) -> Vec<Island> {
    let mut unvisited: BTreeSet<&ImageId> = graph.vertices().collect();
    let mut islands = Vec::new();
    progress.start("Finding islands", unvisited.len());

    while let Some(seed) = unvisited.pop_first() {
        progress.advance(1);
        let mut members = BTreeSet::new();
        members.insert(seed.clone());
        let mut stack = vec![graph.neighbors(seed)];

        loop {
            let next = match stack.last_mut() {
                Some(frontier) => frontier.find(|n| unvisited.contains(n)),
                None => break,
            };
            match next {
                Some(image) => {
                    unvisited.remove(image);
                    progress.advance(1);
                    members.insert(image.clone());
                    stack.push(graph.neighbors(image));
                }
                None => {
                    stack.pop();
                }
            }
        }

        islands.push(Island::new(members));
    }
    progress.finish();

    islands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullProgress;
    use cnet_core::test_utils::linked_network;
    use cnet_core::IgnorePolicy;

    fn islands_of(links: &[(&str, &str)]) -> Vec<Vec<String>> {
        let net = linked_network(links);
        let graph = CorrespondenceGraph::build(&net, IgnorePolicy::Honor, &mut NullProgress);
        find_islands(&graph, &mut NullProgress)
            .iter()
            .map(|i| i.iter().map(|id| id.to_string()).collect())
            .collect()
    }

    #[test]
    fn chain_forms_one_island() {
        assert_eq!(islands_of(&[("A", "B"), ("B", "C")]), vec![vec!["A", "B", "C"]]);
    }

    #[test]
    fn disjoint_pairs_form_two_islands() {
        assert_eq!(
            islands_of(&[("A", "B"), ("C", "D")]),
            vec![vec!["A", "B"], vec!["C", "D"]]
        );
    }

    #[test]
    fn empty_graph_has_no_islands() {
        assert!(find_islands(&CorrespondenceGraph::default(), &mut NullProgress).is_empty());
    }

    #[test]
    fn backtracking_reaches_every_branch() {
        // Star around B plus a tail off D; the walk has to back up past D's
        // branch to reach E and F.
        let links = [("B", "A"), ("B", "D"), ("D", "G"), ("B", "E"), ("E", "F")];
        assert_eq!(islands_of(&links), vec![vec!["A", "B", "D", "E", "F", "G"]]);
    }
}
