//! Fluent builder for composite functions
//!
//! Nodes are addressed the same way wires are persisted: index 0 is the
//! Input node, user nodes follow in the order they were added, and the
//! Output node comes last.

use std::collections::BTreeMap;

use crate::catalog::Folder;
use crate::config::LayoutConfig;
use crate::error::EditError;
use crate::function::Function;
use crate::graph::{default_node_position, Graph, Node, NodeId, Position, PositionalWire};
use crate::parameter::Parameter;
use crate::value::{TypeTag, Value};

/// Fluent builder for constructing composite functions
///
/// # Example
///
/// ```ignore
/// let add_two = FunctionBuilder::new("add-two", "Add Two")
///     .input("X", TypeTag::NUMBER)
///     .output("X + 2", TypeTag::NUMBER)
///     .folder(Folder::new("Math", vec![add]))
///     .node("add")
///     .with_value(2, 2.0)
///     .wire((0, 1), (1, 1))
///     .wire((1, 1), (2, 1))
///     .build()?;
/// ```
pub struct FunctionBuilder {
    id: String,
    name: String,
    description: String,
    input: Vec<Parameter>,
    output: Vec<Parameter>,
    functions: Vec<Folder<Function>>,
    nodes: Vec<Node>,
    wires: Vec<PositionalWire>,
    output_values: BTreeMap<usize, Value>,
    layout: LayoutConfig,
}

impl FunctionBuilder {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            input: Vec::new(),
            output: Vec::new(),
            functions: Vec::new(),
            nodes: Vec::new(),
            wires: Vec::new(),
            output_values: BTreeMap::new(),
            layout: LayoutConfig::default(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Append a data input parameter
    pub fn input(mut self, name: impl Into<String>, value_type: TypeTag) -> Self {
        self.input.push(Parameter::new(name, value_type));
        self
    }

    /// Append a data output parameter
    pub fn output(mut self, name: impl Into<String>, value_type: TypeTag) -> Self {
        self.output.push(Parameter::new(name, value_type));
        self
    }

    /// Make a folder of functions callable from the body
    pub fn folder(mut self, folder: Folder<Function>) -> Self {
        self.functions.push(folder);
        self
    }

    pub fn folders(mut self, folders: impl IntoIterator<Item = Folder<Function>>) -> Self {
        self.functions.extend(folders);
        self
    }

    /// Add a node calling `function`
    pub fn node(self, function: impl Into<String>) -> Self {
        self.node_at(function, default_node_position())
    }

    pub fn node_at(mut self, function: impl Into<String>, position: Position) -> Self {
        self.nodes.push(Node::new(function, position));
        self
    }

    /// Set a manual value on the most recently added node
    pub fn with_value(mut self, slot: usize, value: impl Into<Value>) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.values.insert(slot, value.into());
        }
        self
    }

    /// Set a manual value on the Output node
    pub fn output_value(mut self, slot: usize, value: impl Into<Value>) -> Self {
        self.output_values.insert(slot, value.into());
        self
    }

    /// Connect `(node index, output slot)` to `(node index, input slot)`
    ///
    /// Unlike [`Function::connect`] the slot types are not checked, but a
    /// manual value on the fed slot is still dropped.
    pub fn wire(mut self, start: (usize, usize), end: (usize, usize)) -> Self {
        self.wires.push(PositionalWire::new(start, end));
        self
    }

    /// Build the function, resolving wires against the final node list
    pub fn build(self) -> Result<Function, EditError> {
        let mut graph = Graph::with_layout(self.functions, &self.layout);
        for node in self.nodes {
            graph.add_node(node);
        }
        for (slot, value) in self.output_values {
            graph.set_value(NodeId::OUTPUT, slot, value)?;
        }
        for wire in self.wires {
            let end = graph.endpoint_at(wire.end)?;
            graph.add_positional_wire(wire)?;
            // A wired slot never keeps a manual value
            if end.node != NodeId::INPUT {
                graph.clear_value(end.node, end.slot)?;
            }
        }

        let mut function = Function::composite(self.id, self.name, self.input, self.output, graph)
            .with_description(self.description);
        function.width = self.layout.node_width;
        Ok(function)
    }
}
