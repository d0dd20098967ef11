//
//  Copyright (C) 2022-2024  Chase Ruskin
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

/// Basic graph data structure
/// - source: http://smallcultfollowing.com/babysteps/blog/2015/04/06/modeling-graphs-in-rust-using-vector-indices/
use std::collections::HashSet;

pub type NodeIndex = usize;

type EdgeIndex = usize;

#[derive(Debug, PartialEq)]
struct NodeData<V> {
    node: V,
    first_outgoing_edge: Option<EdgeIndex>,
    first_incoming_edge: Option<EdgeIndex>,
}

#[derive(Debug, PartialEq)]
struct EdgeData {
    source: NodeIndex,
    target: NodeIndex,
    next_outgoing_edge: Option<EdgeIndex>,
    next_incoming_edge: Option<EdgeIndex>,
}

/// A directed graph where an edge `a -> b` means `a` must come before `b`.
#[derive(Debug, PartialEq)]
pub struct Graph<V> {
    vertices: Vec<NodeData<V>>,
    edges: Vec<EdgeData>,
}

impl<V> Graph<V> {
    /// Creates an empty `Graph` struct.
    pub fn new() -> Self {
        Self {
            edges: Vec::new(),
            vertices: Vec::new(),
        }
    }

    /// Adds a new node to the graph.
    ///
    /// Returns the `NodeIndex` to remember the node.
    pub fn add_node(&mut self, node: V) -> NodeIndex {
        let index = self.vertices.len();
        self.vertices.push(NodeData {
            node: node,
            first_outgoing_edge: None,
            first_incoming_edge: None,
        });
        index
    }

    /// Checks if a given `source` node is connected to the given `target` node.
    pub fn has_edge(&self, source: NodeIndex, target: NodeIndex) -> bool {
        self.successors(source).any(|f| f == target)
    }

    /// Returns the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.vertices.len()
    }

    /// Accesses the node data label behind the `node` index.
    pub fn get_node(&self, node: NodeIndex) -> Option<&V> {
        Some(&self.vertices.get(node)?.node)
    }

    /// Adds a new edge to the graph from `source` to `target`.
    pub fn add_edge(&mut self, source: NodeIndex, target: NodeIndex) -> EdgeStatus {
        if source >= self.node_count() {
            return EdgeStatus::MissingSource;
        }
        if target >= self.node_count() {
            return EdgeStatus::MissingTarget;
        }
        // do not allow duplicate edges
        if self.has_edge(source, target) == true {
            return EdgeStatus::AlreadyExists;
        }
        // do not allow self-loops
        if source == target {
            return EdgeStatus::SelfLoop;
        }
        let edge_index = self.edges.len();
        let next_outgoing_edge = self.vertices[source].first_outgoing_edge;
        let next_incoming_edge = self.vertices[target].first_incoming_edge;
        self.edges.push(EdgeData {
            source: source,
            target: target,
            next_outgoing_edge: next_outgoing_edge,
            next_incoming_edge: next_incoming_edge,
        });
        self.vertices[source].first_outgoing_edge = Some(edge_index);
        self.vertices[target].first_incoming_edge = Some(edge_index);
        EdgeStatus::Success
    }

    /// Creates an iterator over the incoming nodes to the `target` source.
    pub fn predecessors(&self, target: NodeIndex) -> Predecessors<V> {
        let first_incoming_edge = self.vertices[target].first_incoming_edge;
        Predecessors {
            graph: self,
            current_edge_index: first_incoming_edge,
        }
    }

    /// Creates an iterator over the outgoing nodes from the `source` node.
    pub fn successors(&self, source: NodeIndex) -> Successors<V> {
        let first_outgoing_edge = self.vertices[source].first_outgoing_edge;
        Successors {
            graph: self,
            current_edge_index: first_outgoing_edge,
        }
    }

    /// Orders every node so that it comes after all of its predecessors.
    ///
    /// Ties are broken by lowest index. When the remaining nodes form a cycle,
    /// the lowest-indexed remaining node is taken next, so every node always
    /// appears exactly once.
    pub fn topological_sort(&self) -> Vec<NodeIndex> {
        let mut order = Vec::<NodeIndex>::with_capacity(self.node_count());
        // store the set of remaining nodes with incoming edges
        let mut store: Vec<Option<HashSet<NodeIndex>>> = (0..self.node_count())
            .map(|i| Some(self.predecessors(i).collect()))
            .collect();

        while order.len() < self.node_count() {
            let ready = store
                .iter()
                .position(|t| t.as_ref().map(|d| d.is_empty()).unwrap_or(false));
            // break a cycle at the earliest node still waiting
            let current = match ready {
                Some(i) => i,
                None => match store.iter().position(|t| t.is_some()) {
                    Some(i) => i,
                    None => break,
                },
            };
            store[current] = None;
            for deps in store.iter_mut().flatten() {
                deps.remove(&current);
            }
            order.push(current);
        }
        order
    }
}

#[derive(Debug, PartialEq)]
pub enum EdgeStatus {
    MissingSource,
    MissingTarget,
    SelfLoop,
    AlreadyExists,
    Success,
}

impl EdgeStatus {
    pub fn is_ok(&self) -> bool {
        match self {
            Self::Success => true,
            _ => false,
        }
    }
}

pub struct Predecessors<'graph, V> {
    graph: &'graph Graph<V>,
    current_edge_index: Option<EdgeIndex>,
}

impl<'graph, V> Iterator for Predecessors<'graph, V> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let edge = &self.graph.edges[self.current_edge_index?];
        self.current_edge_index = edge.next_incoming_edge;
        Some(edge.source)
    }
}

pub struct Successors<'graph, V> {
    graph: &'graph Graph<V>,
    current_edge_index: Option<EdgeIndex>,
}

impl<'graph, V> Iterator for Successors<'graph, V> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let edge = &self.graph.edges[self.current_edge_index?];
        self.current_edge_index = edge.next_outgoing_edge;
        Some(edge.target)
    }
}
