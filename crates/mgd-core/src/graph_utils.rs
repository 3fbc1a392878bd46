use crate::topology::Topology;
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::{HashSet, VecDeque};

/// Undirected bus graph: one node per bus, one edge per line.
pub fn bus_graph(topology: &Topology) -> UnGraph<usize, usize> {
    let mut graph = UnGraph::with_capacity(topology.bus_count(), topology.lines().len());
    let nodes: Vec<NodeIndex> = (0..topology.bus_count()).map(|bus| graph.add_node(bus)).collect();
    for (index, line) in topology.lines().iter().enumerate() {
        graph.add_edge(nodes[line.from.value()], nodes[line.to.value()], index);
    }
    graph
}

/// One connected part of the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IslandSummary {
    pub island_id: usize,
    pub buses: Vec<usize>,
}

/// Island id per bus plus the islands themselves.
#[derive(Debug, Clone)]
pub struct IslandAnalysis {
    pub islands: Vec<IslandSummary>,
    pub bus_island: Vec<usize>,
}

/// Labels connected components by breadth-first search from each unvisited bus.
pub fn find_islands(topology: &Topology) -> IslandAnalysis {
    let graph = bus_graph(topology);
    let mut visited = HashSet::new();
    let mut islands = Vec::new();
    let mut bus_island = vec![0; topology.bus_count()];

    for start in graph.node_indices() {
        if visited.contains(&start) {
            continue;
        }
        let island_id = islands.len();
        let mut queue = VecDeque::from([start]);
        let mut members = Vec::new();
        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            let bus = graph[node];
            members.push(bus);
            bus_island[bus] = island_id;
            for neighbor in graph.neighbors(node) {
                if !visited.contains(&neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        members.sort_unstable();
        islands.push(IslandSummary {
            island_id,
            buses: members,
        });
    }

    IslandAnalysis {
        islands,
        bus_island,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Line;
    use crate::BusId;

    #[test]
    fn connected_network_is_one_island() {
        let lines = vec![
            Line::lossless(BusId::new(0), BusId::new(1), 0.1),
            Line::lossless(BusId::new(1), BusId::new(2), 0.1),
        ];
        let topo = Topology::build(3, &lines).unwrap();
        let analysis = find_islands(&topo);
        assert_eq!(analysis.islands.len(), 1);
        assert_eq!(analysis.islands[0].buses, vec![0, 1, 2]);
    }

    #[test]
    fn isolated_bus_forms_its_own_island() {
        let lines = vec![Line::lossless(BusId::new(0), BusId::new(2), 0.1)];
        let topo = Topology::build(3, &lines).unwrap();
        let analysis = find_islands(&topo);
        assert_eq!(analysis.islands.len(), 2);
        assert_eq!(analysis.bus_island, vec![0, 1, 0]);
        assert_eq!(analysis.islands[1].buses, vec![1]);
    }
}
