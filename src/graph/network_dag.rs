use crate::activity::{Activity, RelationKind};
use crate::calculations::ScheduleError;
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Edge payload: the relation and lag of one predecessor link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkEdge {
    pub relation: RelationKind,
    pub lag_days: i64,
}

/// The activity network as a petgraph digraph. Node weights are dense arena
/// indices into the activity slice; edges run predecessor -> successor and
/// never own activity data.
#[derive(Debug)]
pub struct NetworkDag {
    pub graph: DiGraph<usize, LinkEdge>,
    pub id_to_index: HashMap<i32, NodeIndex>,
    /// Arena indices in topological order.
    topo_order: Vec<usize>,
}

impl NetworkDag {
    /// Build the digraph and topologically order it. Links referencing
    /// unknown activity ids and cycles are both fatal; a cycle error names
    /// one activity on the cycle.
    pub fn build(activities: &[Activity]) -> Result<Self, ScheduleError> {
        let mut graph: DiGraph<usize, LinkEdge> = DiGraph::new();
        let mut id_to_index: HashMap<i32, NodeIndex> = HashMap::new();

        for (arena_idx, activity) in activities.iter().enumerate() {
            let node_ix = graph.add_node(arena_idx);
            id_to_index.insert(activity.id, node_ix);
        }

        for activity in activities {
            let succ_ix = id_to_index[&activity.id];
            for link in &activity.predecessors {
                let Some(&pred_ix) = id_to_index.get(&link.predecessor_id) else {
                    return Err(ScheduleError::DanglingPredecessor {
                        activity_id: activity.id,
                        predecessor_id: link.predecessor_id,
                    });
                };
                graph.add_edge(
                    pred_ix,
                    succ_ix,
                    LinkEdge {
                        relation: link.relation,
                        lag_days: link.lag_days,
                    },
                );
            }
        }

        let topo_order = toposort(&graph, None)
            .map_err(|cycle| ScheduleError::CircularDependency {
                activity_id: activities[graph[cycle.node_id()]].id,
            })?
            .into_iter()
            .map(|node_ix| graph[node_ix])
            .collect();

        Ok(Self {
            graph,
            id_to_index,
            topo_order,
        })
    }

    pub fn topo_order(&self) -> &[usize] {
        &self.topo_order
    }

    pub fn node_of(&self, activity_id: i32) -> Option<NodeIndex> {
        self.id_to_index.get(&activity_id).copied()
    }

    /// Successor arena indices with their link edges, for one activity.
    pub fn successors_of(&self, node_ix: NodeIndex) -> Vec<(usize, LinkEdge)> {
        self.graph
            .edges_directed(node_ix, Direction::Outgoing)
            .map(|edge| (self.graph[edge.target()], *edge.weight()))
            .collect()
    }

    pub fn successor_count(&self, node_ix: NodeIndex) -> usize {
        self.graph
            .neighbors_directed(node_ix, Direction::Outgoing)
            .count()
    }

    /// Arena indices of activities with no successors.
    pub fn terminal_indices(&self) -> Vec<usize> {
        self.graph
            .node_indices()
            .filter(|&ix| self.successor_count(ix) == 0)
            .map(|ix| self.graph[ix])
            .collect()
    }
}
