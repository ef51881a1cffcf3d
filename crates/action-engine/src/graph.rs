//! Nodes, wires and the composite body that owns them
//!
//! A composite's nodes live in an ordered arena keyed by [`NodeId`]. Wires
//! store `(node id, slot)` endpoints, so inserting or removing nodes never
//! invalidates them. The positional view used by the interpreter, the codec
//! and editors is derived on demand:
//!
//! ```text
//! index 0          the virtual Input node
//! 1..=n            user nodes, in arena order
//! n + 1            the virtual Output node
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{self, Folder};
use crate::config::{defaults, LayoutConfig};
use crate::error::EditError;
use crate::function::{Function, INPUT_FUNCTION_ID, OUTPUT_FUNCTION_ID};
use crate::value::Value;

/// Opaque layout coordinate
pub type Position = (f64, f64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Reserved id of the virtual Input node
    pub const INPUT: NodeId = NodeId(Uuid::from_u128(0x6f3c_1d2a_7b4e_4c1f_9a0d_5e2b_8c7f_1000));
    /// Reserved id of the virtual Output node
    pub const OUTPUT: NodeId = NodeId(Uuid::from_u128(0x6f3c_1d2a_7b4e_4c1f_9a0d_5e2b_8c7f_2000));

    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn is_boundary(self) -> bool {
        self == Self::INPUT || self == Self::OUTPUT
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INPUT {
            f.write_str("input")
        } else if *self == Self::OUTPUT {
            f.write_str("output")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireId(pub Uuid);

impl WireId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WireId {
    fn default() -> Self {
        Self::new()
    }
}

/// An instance of a function placed in a composite
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub position: Position,
    /// Id of the function this node calls, looked up in the owner's roster
    pub function: String,
    /// Manually supplied input values keyed by input slot
    pub values: BTreeMap<usize, Value>,
}

impl Node {
    /// Create a node whose control flow slot is preset to `signal`
    pub fn new(function: impl Into<String>, position: Position) -> Self {
        Self {
            id: NodeId::new(),
            position,
            function: function.into(),
            values: default_values(),
        }
    }

    pub fn with_value(mut self, slot: usize, value: impl Into<Value>) -> Self {
        self.values.insert(slot, value.into());
        self
    }
}

/// Manual values a fresh node (and a fresh Output node) starts with
pub fn default_values() -> BTreeMap<usize, Value> {
    BTreeMap::from([(0, Value::SIGNAL)])
}

/// One end of a wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub node: NodeId,
    pub slot: usize,
}

impl Endpoint {
    pub fn new(node: NodeId, slot: usize) -> Self {
        Self { node, slot }
    }
}

/// Connection from an output slot to an input slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Wire {
    pub id: WireId,
    pub start: Endpoint,
    pub end: Endpoint,
}

/// A wire expressed as `(node index, slot)` pairs in the positional view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionalWire {
    pub start: (usize, usize),
    pub end: (usize, usize),
}

impl PositionalWire {
    pub fn new(start: (usize, usize), end: (usize, usize)) -> Self {
        Self { start, end }
    }
}

/// Body of a composite function
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    wires: Vec<Wire>,
    functions: Vec<Folder<Function>>,
    pub input_node_position: Position,
    pub output_node_position: Position,
    /// Manual values of the virtual Output node
    pub output_node_values: BTreeMap<usize, Value>,
}

impl Graph {
    /// Create an empty body that can call the functions of `functions`
    pub fn new(functions: Vec<Folder<Function>>) -> Self {
        Self::with_layout(functions, &LayoutConfig::default())
    }

    pub fn with_layout(functions: Vec<Folder<Function>>, layout: &LayoutConfig) -> Self {
        Self {
            nodes: Vec::new(),
            wires: Vec::new(),
            functions,
            input_node_position: layout.input_node_position,
            output_node_position: layout.output_node_position,
            output_node_values: default_values(),
        }
    }

    // ---- roster ----

    /// Grouped roster of callable sub-functions
    pub fn grouped_functions(&self) -> &[Folder<Function>] {
        &self.functions
    }

    pub fn set_functions(&mut self, functions: Vec<Folder<Function>>) {
        self.functions = functions;
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        catalog::flatten(&self.functions)
    }

    pub fn function(&self, id: &str) -> Option<&Function> {
        catalog::find(&self.functions, id)
    }

    // ---- nodes ----

    /// User nodes, without the virtual boundary nodes
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    /// Number of nodes in the positional view, boundaries included
    pub fn node_count(&self) -> usize {
        self.nodes.len() + 2
    }

    pub fn output_index(&self) -> usize {
        self.nodes.len() + 1
    }

    /// `[Input] + user nodes + [Output]`
    pub fn all_nodes(&self) -> Vec<Node> {
        let mut all = Vec::with_capacity(self.node_count());
        all.push(self.input_node());
        all.extend(self.nodes.iter().cloned());
        all.push(self.output_node());
        all
    }

    pub fn input_node(&self) -> Node {
        Node {
            id: NodeId::INPUT,
            position: self.input_node_position,
            function: INPUT_FUNCTION_ID.to_string(),
            values: BTreeMap::new(),
        }
    }

    pub fn output_node(&self) -> Node {
        Node {
            id: NodeId::OUTPUT,
            position: self.output_node_position,
            function: OUTPUT_FUNCTION_ID.to_string(),
            values: self.output_node_values.clone(),
        }
    }

    /// Positional index of a node
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        if id == NodeId::INPUT {
            Some(0)
        } else if id == NodeId::OUTPUT {
            Some(self.output_index())
        } else {
            self.nodes.iter().position(|node| node.id == id).map(|i| i + 1)
        }
    }

    /// Node id at a positional index
    pub fn node_id_at(&self, index: usize) -> Option<NodeId> {
        if index == 0 {
            Some(NodeId::INPUT)
        } else if index == self.output_index() {
            Some(NodeId::OUTPUT)
        } else {
            self.nodes.get(index - 1).map(|node| node.id)
        }
    }

    /// Append a user node, returning its id
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.push(node);
        id
    }

    /// Insert a user node at `position` among the user nodes (0-based)
    ///
    /// Positional indices of later nodes, and of the Output node, shift by
    /// one; wires follow automatically.
    pub fn insert_node(&mut self, position: usize, node: Node) -> NodeId {
        let id = node.id;
        let position = position.min(self.nodes.len());
        self.nodes.insert(position, node);
        id
    }

    /// Remove a user node together with every wire touching it
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, EditError> {
        if id.is_boundary() {
            return Err(EditError::BoundaryNode(id));
        }
        let index = self
            .nodes
            .iter()
            .position(|node| node.id == id)
            .ok_or(EditError::UnknownNode(id))?;
        let before = self.wires.len();
        self.wires.retain(|wire| wire.start.node != id && wire.end.node != id);
        log::debug!(
            "Removed node {} and {} attached wire(s)",
            id,
            before - self.wires.len()
        );
        Ok(self.nodes.remove(index))
    }

    /// Move any node, boundary nodes included
    pub fn move_node(&mut self, id: NodeId, position: Position) -> Result<(), EditError> {
        if id == NodeId::INPUT {
            self.input_node_position = position;
        } else if id == NodeId::OUTPUT {
            self.output_node_position = position;
        } else {
            self.node_mut(id).ok_or(EditError::UnknownNode(id))?.position = position;
        }
        Ok(())
    }

    /// Keep every node inside the square `[0, max]` editing area
    pub fn clamp_positions(&mut self, max: f64) {
        let clamp = |(x, y): Position| (x.clamp(0.0, max), y.clamp(0.0, max));
        for node in &mut self.nodes {
            node.position = clamp(node.position);
        }
        self.input_node_position = clamp(self.input_node_position);
        self.output_node_position = clamp(self.output_node_position);
    }

    // ---- manual values ----

    pub fn value(&self, node: NodeId, slot: usize) -> Option<&Value> {
        if node == NodeId::OUTPUT {
            self.output_node_values.get(&slot)
        } else {
            self.node(node)?.values.get(&slot)
        }
    }

    /// Set a manual input value; wires feeding that slot are removed
    pub fn set_value(&mut self, node: NodeId, slot: usize, value: Value) -> Result<(), EditError> {
        self.values_mut(node)?.insert(slot, value);
        self.wires.retain(|wire| wire.end != Endpoint::new(node, slot));
        Ok(())
    }

    pub fn clear_value(&mut self, node: NodeId, slot: usize) -> Result<Option<Value>, EditError> {
        Ok(self.values_mut(node)?.remove(&slot))
    }

    fn values_mut(&mut self, node: NodeId) -> Result<&mut BTreeMap<usize, Value>, EditError> {
        if node == NodeId::INPUT {
            return Err(EditError::BoundaryNode(node));
        }
        if node == NodeId::OUTPUT {
            return Ok(&mut self.output_node_values);
        }
        Ok(&mut self.node_mut(node).ok_or(EditError::UnknownNode(node))?.values)
    }

    // ---- wires ----

    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    /// Add a wire without any type check
    pub fn add_wire(&mut self, start: Endpoint, end: Endpoint) -> Result<WireId, EditError> {
        for endpoint in [start, end] {
            if self.index_of(endpoint.node).is_none() {
                return Err(EditError::UnknownNode(endpoint.node));
            }
        }
        let id = WireId::new();
        self.wires.push(Wire { id, start, end });
        Ok(id)
    }

    pub fn remove_wire(&mut self, id: WireId) -> Option<Wire> {
        let index = self.wires.iter().position(|wire| wire.id == id)?;
        Some(self.wires.remove(index))
    }

    /// Remove every wire ending at `end`, returning how many were removed
    pub fn disconnect(&mut self, end: Endpoint) -> usize {
        let before = self.wires.len();
        self.wires.retain(|wire| wire.end != end);
        before - self.wires.len()
    }

    /// Translate a positional `(node index, slot)` into an endpoint
    pub fn endpoint_at(&self, (index, slot): (usize, usize)) -> Result<Endpoint, EditError> {
        let node = self
            .node_id_at(index)
            .ok_or(EditError::NodeIndexOutOfRange(index))?;
        Ok(Endpoint::new(node, slot))
    }

    /// Wires in the positional index space, in insertion order
    pub fn positional_wires(&self) -> Vec<PositionalWire> {
        self.wires
            .iter()
            .filter_map(|wire| self.positional(wire))
            .collect()
    }

    pub fn positional(&self, wire: &Wire) -> Option<PositionalWire> {
        Some(PositionalWire {
            start: (self.index_of(wire.start.node)?, wire.start.slot),
            end: (self.index_of(wire.end.node)?, wire.end.slot),
        })
    }

    pub fn add_positional_wire(&mut self, wire: PositionalWire) -> Result<WireId, EditError> {
        let start = self.endpoint_at(wire.start)?;
        let end = self.endpoint_at(wire.end)?;
        self.add_wire(start, end)
    }

    /// Positional wires that end at the node with the given index
    pub fn wires_to(&self, index: usize) -> Vec<PositionalWire> {
        self.positional_wires()
            .into_iter()
            .filter(|wire| wire.end.0 == index)
            .collect()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Default position for nodes created without one
pub fn default_node_position() -> Position {
    defaults::NODE_POSITION
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(count: usize) -> (Graph, Vec<NodeId>) {
        let mut graph = Graph::default();
        let ids = (0..count)
            .map(|_| graph.add_node(Node::new("f", default_node_position())))
            .collect();
        (graph, ids)
    }

    #[test]
    fn test_new_node_defaults_to_signal() {
        let node = Node::new("f", (0.0, 0.0));
        assert_eq!(node.values.get(&0), Some(&Value::SIGNAL));
        assert_eq!(node.values.len(), 1);
    }

    #[test]
    fn test_positional_view() {
        let (graph, ids) = graph_with(2);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.index_of(NodeId::INPUT), Some(0));
        assert_eq!(graph.index_of(ids[1]), Some(2));
        assert_eq!(graph.index_of(NodeId::OUTPUT), Some(3));
        assert_eq!(graph.node_id_at(1), Some(ids[0]));
        assert_eq!(graph.node_id_at(4), None);

        let all = graph.all_nodes();
        assert_eq!(all.first().unwrap().id, NodeId::INPUT);
        assert_eq!(all.last().unwrap().id, NodeId::OUTPUT);
        assert_eq!(all.last().unwrap().values, default_values());
    }

    #[test]
    fn test_remove_node_renumbers_and_drops_wires() {
        let (mut graph, ids) = graph_with(3);
        graph.add_positional_wire(PositionalWire::new((0, 1), (1, 1))).unwrap();
        graph.add_positional_wire(PositionalWire::new((1, 1), (2, 1))).unwrap();
        graph.add_positional_wire(PositionalWire::new((3, 1), (4, 1))).unwrap();

        graph.remove_node(ids[1]).unwrap();

        // The wire into the removed node is gone, the last one shifted down.
        assert_eq!(
            graph.positional_wires(),
            vec![
                PositionalWire::new((0, 1), (1, 1)),
                PositionalWire::new((2, 1), (3, 1)),
            ]
        );
    }

    #[test]
    fn test_insert_node_shifts_later_endpoints() {
        let (mut graph, _) = graph_with(1);
        graph.add_positional_wire(PositionalWire::new((1, 1), (2, 1))).unwrap();

        graph.insert_node(0, Node::new("g", (0.0, 0.0)));
        assert_eq!(graph.positional_wires(), vec![PositionalWire::new((2, 1), (3, 1))]);

        // Appending moves the Output node, so wires into it follow.
        graph.add_node(Node::new("h", (0.0, 0.0)));
        assert_eq!(graph.positional_wires(), vec![PositionalWire::new((2, 1), (4, 1))]);
    }

    #[test]
    fn test_boundary_nodes_cannot_be_removed() {
        let (mut graph, _) = graph_with(0);
        assert_eq!(
            graph.remove_node(NodeId::OUTPUT),
            Err(EditError::BoundaryNode(NodeId::OUTPUT))
        );
        let unknown = NodeId::new();
        assert_eq!(graph.remove_node(unknown), Err(EditError::UnknownNode(unknown)));
    }

    #[test]
    fn test_set_value_removes_feeding_wires() {
        let (mut graph, ids) = graph_with(1);
        graph.add_positional_wire(PositionalWire::new((0, 1), (1, 1))).unwrap();
        graph.add_positional_wire(PositionalWire::new((0, 2), (1, 2))).unwrap();

        graph.set_value(ids[0], 1, Value::Number(4.0)).unwrap();

        assert_eq!(graph.wires_to(1), vec![PositionalWire::new((0, 2), (1, 2))]);
        assert_eq!(graph.value(ids[0], 1), Some(&Value::Number(4.0)));
        assert!(graph.set_value(NodeId::INPUT, 0, Value::SIGNAL).is_err());
    }

    #[test]
    fn test_output_node_values() {
        let (mut graph, _) = graph_with(0);
        graph.set_value(NodeId::OUTPUT, 1, Value::Text("x".into())).unwrap();
        assert_eq!(graph.output_node().values.len(), 2);
        assert_eq!(graph.clear_value(NodeId::OUTPUT, 1).unwrap(), Some(Value::Text("x".into())));
    }

    #[test]
    fn test_add_positional_wire_out_of_range() {
        let (mut graph, _) = graph_with(1);
        assert_eq!(
            graph.add_positional_wire(PositionalWire::new((0, 1), (5, 1))),
            Err(EditError::NodeIndexOutOfRange(5))
        );
    }

    #[test]
    fn test_disconnect_and_remove_wire() {
        let (mut graph, ids) = graph_with(1);
        let id = graph.add_positional_wire(PositionalWire::new((0, 1), (1, 1))).unwrap();
        graph.add_positional_wire(PositionalWire::new((0, 2), (1, 2))).unwrap();

        assert!(graph.remove_wire(id).is_some());
        assert!(graph.remove_wire(id).is_none());
        assert_eq!(graph.disconnect(Endpoint::new(ids[0], 2)), 1);
        assert!(graph.wires().is_empty());
    }

    #[test]
    fn test_move_and_clamp() {
        let (mut graph, ids) = graph_with(1);
        graph.move_node(ids[0], (-20.0, 2500.0)).unwrap();
        graph.move_node(NodeId::INPUT, (10.0, 10.0)).unwrap();
        graph.clamp_positions(2000.0);
        assert_eq!(graph.node(ids[0]).unwrap().position, (0.0, 2000.0));
        assert_eq!(graph.input_node_position, (10.0, 10.0));
    }
}
