use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::warn;

use crate::core::ProjectInfo;

/// Directed graph of runtime reference edges between known components.
///
/// Nodes are component names. Only non-special references whose target is a
/// known component become edges, and repeated declarations collapse into one.
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
    /// Direct edges per node in declaration order
    direct: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl ReferenceGraph {
    pub fn build(projects: &[ProjectInfo]) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::with_capacity(projects.len());
        let mut owners = Vec::with_capacity(projects.len());

        for project in projects {
            if nodes.contains_key(&project.name) {
                warn!(
                    "Duplicate project name '{}' at {}; keeping the first occurrence",
                    project.name,
                    project.descriptor_path.display()
                );
                continue;
            }
            let node = graph.add_node(project.name.clone());
            nodes.insert(project.name.clone(), node);
            owners.push((node, project));
        }

        let mut direct = HashMap::with_capacity(owners.len());
        for (node, project) in owners {
            let mut targets: Vec<NodeIndex> = Vec::new();
            for reference in project.references.iter().filter(|r| !r.is_special()) {
                let Some(&target) = nodes.get(&reference.target_name()) else {
                    continue;
                };
                if !targets.contains(&target) {
                    targets.push(target);
                    graph.update_edge(node, target, ());
                }
            }
            direct.insert(node, targets);
        }

        Self {
            graph,
            nodes,
            direct,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Resolved direct reference names of a component, in declaration order.
    pub fn direct_references(&self, name: &str) -> Vec<&str> {
        self.nodes
            .get(name)
            .and_then(|node| self.direct.get(node))
            .map(|targets| targets.iter().map(|t| self.graph[*t].as_str()).collect())
            .unwrap_or_default()
    }

    /// Every component reachable from `name` through one or more edges.
    ///
    /// `name` itself is only included when it lies on a cycle.
    pub fn reachable_from(&self, name: &str) -> HashSet<&str> {
        let mut reached = HashSet::new();
        let Some(&start) = self.nodes.get(name) else {
            return reached;
        };

        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = self.graph.neighbors(start).collect();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            reached.insert(self.graph[current].as_str());
            queue.extend(
                self.graph
                    .neighbors(current)
                    .filter(|next| !visited.contains(next)),
            );
        }

        reached
    }
}
