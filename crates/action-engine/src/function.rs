//! Function definitions
//!
//! A [`Function`] is either a native mapping supplied by the host or a
//! composite [`Graph`] of nodes calling other functions. Both kinds expose
//! the same signature: an implicit control flow parameter in slot 0 of the
//! input and output lists, followed by the data parameters.
//!
//! Two pseudo-functions describe a composite's boundary. The Input
//! pseudo-function has no inputs and outputs the composite's data inputs;
//! the Output pseudo-function takes the composite's data outputs and has no
//! outputs.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::config::defaults;
use crate::engine;
use crate::error::{EditError, ExecutionError};
use crate::events::{EventSink, NullEventSink};
use crate::graph::{Graph, WireId};
use crate::parameter::Parameter;
use crate::registry::ValueType;
use crate::value::Value;

/// Reserved id of the Input pseudo-function
pub const INPUT_FUNCTION_ID: &str = "standard-actions.input";
/// Reserved id of the Output pseudo-function
pub const OUTPUT_FUNCTION_ID: &str = "standard-actions.output";

/// Signature of a host-supplied mapping
///
/// Receives the data inputs (control flow already stripped) in slot order and
/// returns the data outputs.
pub type NativeMapping = dyn Fn(&[Value]) -> Vec<Value> + Send + Sync;

/// Shared handle to a native mapping
#[derive(Clone)]
pub struct NativeFn(Arc<NativeMapping>);

impl NativeFn {
    pub fn new(mapping: impl Fn(&[Value]) -> Vec<Value> + Send + Sync + 'static) -> Self {
        Self(Arc::new(mapping))
    }

    pub fn call(&self, inputs: &[Value]) -> Vec<Value> {
        (self.0)(inputs)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NativeFn(..)")
    }
}

#[derive(Debug, Clone)]
pub enum Implementation {
    Native(NativeFn),
    Composite(Graph),
}

/// A named computational unit
#[derive(Debug, Clone)]
pub struct Function {
    pub id: String,
    pub name: String,
    pub description: String,
    pub(crate) data_input: Vec<Parameter>,
    pub(crate) data_output: Vec<Parameter>,
    pub implementation: Implementation,
    /// Merge contract: ready as soon as any single input arrives
    pub require_only_one_input: bool,
    pub width: f64,
}

impl Function {
    /// Create a function backed by a host mapping
    pub fn native(
        id: impl Into<String>,
        name: impl Into<String>,
        input: Vec<Parameter>,
        output: Vec<Parameter>,
        mapping: impl Fn(&[Value]) -> Vec<Value> + Send + Sync + 'static,
    ) -> Self {
        Self::new(
            id,
            name,
            input,
            output,
            Implementation::Native(NativeFn::new(mapping)),
        )
    }

    /// Create a function whose body is a graph
    pub fn composite(
        id: impl Into<String>,
        name: impl Into<String>,
        input: Vec<Parameter>,
        output: Vec<Parameter>,
        graph: Graph,
    ) -> Self {
        Self::new(id, name, input, output, Implementation::Composite(graph))
    }

    fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        input: Vec<Parameter>,
        output: Vec<Parameter>,
        implementation: Implementation,
    ) -> Self {
        let mut function = Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            data_input: Vec::new(),
            data_output: Vec::new(),
            implementation,
            require_only_one_input: false,
            width: defaults::NODE_WIDTH,
        };
        function.set_input(input);
        function.set_output(output);
        function
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Generate the merge function for a value type
    ///
    /// Two inputs and one output of the same type; fires as soon as either
    /// input arrives and forwards it, or the type's default if none did.
    pub fn merge(value_type: &dyn ValueType) -> Self {
        let tag = value_type.tag();
        let default = value_type.default_value();
        let mut function = Self::native(
            format!("merge-{}", tag),
            format!("Merge ({})", value_type.name()),
            vec![
                Parameter::new("Value 1", tag.clone()),
                Parameter::new("Value 2", tag.clone()),
            ],
            vec![Parameter::new("Value", tag)],
            move |inputs: &[Value]| vec![inputs.first().cloned().unwrap_or_else(|| default.clone())],
        );
        function.require_only_one_input = true;
        function
    }

    // ---- signature ----

    pub fn is_input_boundary(&self) -> bool {
        self.id == INPUT_FUNCTION_ID
    }

    pub fn is_output_boundary(&self) -> bool {
        self.id == OUTPUT_FUNCTION_ID
    }

    /// Input parameters with the control flow slot prepended
    pub fn input(&self) -> Vec<Parameter> {
        if self.is_input_boundary() {
            return Vec::new();
        }
        std::iter::once(Parameter::control_flow())
            .chain(self.data_input.iter().cloned())
            .collect()
    }

    /// Output parameters with the control flow slot prepended
    pub fn output(&self) -> Vec<Parameter> {
        if self.is_output_boundary() {
            return Vec::new();
        }
        std::iter::once(Parameter::control_flow())
            .chain(self.data_output.iter().cloned())
            .collect()
    }

    pub fn data_input(&self) -> &[Parameter] {
        &self.data_input
    }

    pub fn data_output(&self) -> &[Parameter] {
        &self.data_output
    }

    /// Replace the data inputs; control flow entries are dropped
    pub fn set_input(&mut self, input: Vec<Parameter>) {
        self.data_input = input.into_iter().filter(|p| !p.is_control_flow()).collect();
    }

    /// Replace the data outputs; control flow entries are dropped
    pub fn set_output(&mut self, output: Vec<Parameter>) {
        self.data_output = output.into_iter().filter(|p| !p.is_control_flow()).collect();
    }

    /// Longest of the two parameter lists
    pub fn max_count(&self) -> usize {
        self.input().len().max(self.output().len())
    }

    // ---- composite body ----

    pub fn graph(&self) -> Option<&Graph> {
        match &self.implementation {
            Implementation::Composite(graph) => Some(graph),
            Implementation::Native(_) => None,
        }
    }

    pub fn graph_mut(&mut self) -> Option<&mut Graph> {
        match &mut self.implementation {
            Implementation::Composite(graph) => Some(graph),
            Implementation::Native(_) => None,
        }
    }

    pub fn is_composite(&self) -> bool {
        self.graph().is_some()
    }

    /// The pseudo-function standing for this composite's Input node
    pub fn input_boundary(&self) -> Function {
        self.boundary(
            INPUT_FUNCTION_ID,
            "Input",
            Vec::new(),
            self.data_input.clone(),
            NativeFn::new(|inputs: &[Value]| inputs.to_vec()),
        )
    }

    /// The pseudo-function standing for this composite's Output node
    pub fn output_boundary(&self) -> Function {
        self.boundary(
            OUTPUT_FUNCTION_ID,
            "Output",
            self.data_output.clone(),
            Vec::new(),
            NativeFn::new(|_: &[Value]| Vec::new()),
        )
    }

    // Parameter lists are taken as-is so boundary slots line up with ours.
    fn boundary(
        &self,
        id: &str,
        name: &str,
        data_input: Vec<Parameter>,
        data_output: Vec<Parameter>,
        mapping: NativeFn,
    ) -> Function {
        Function {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            data_input,
            data_output,
            implementation: Implementation::Native(mapping),
            require_only_one_input: false,
            width: self.width,
        }
    }

    /// Callable sub-functions of a composite, flattened
    pub fn functions(&self) -> Vec<&Function> {
        self.graph()
            .map(|graph| graph.functions().collect())
            .unwrap_or_default()
    }

    /// Roster plus the two boundary pseudo-functions
    pub fn all_functions(&self) -> Vec<Cow<'_, Function>> {
        let mut all: Vec<Cow<'_, Function>> = self.functions().into_iter().map(Cow::Borrowed).collect();
        all.push(Cow::Owned(self.input_boundary()));
        all.push(Cow::Owned(self.output_boundary()));
        all
    }

    /// Resolve a function id the way a node of this composite would
    pub fn function(&self, id: &str) -> Option<Cow<'_, Function>> {
        match id {
            INPUT_FUNCTION_ID => Some(Cow::Owned(self.input_boundary())),
            OUTPUT_FUNCTION_ID => Some(Cow::Owned(self.output_boundary())),
            _ => self.graph()?.function(id).map(Cow::Borrowed),
        }
    }

    /// Function called by the node at a positional index
    pub fn function_at(&self, index: usize) -> Option<Cow<'_, Function>> {
        let graph = self.graph()?;
        if index == 0 {
            Some(Cow::Owned(self.input_boundary()))
        } else if index == graph.output_index() {
            Some(Cow::Owned(self.output_boundary()))
        } else {
            let node = graph.nodes().get(index.checked_sub(1)?)?;
            graph.function(&node.function).map(Cow::Borrowed)
        }
    }

    /// Parameter at a positional `(node index, slot)` endpoint
    ///
    /// `input` selects the node's input list, otherwise its output list.
    pub fn parameter(&self, (index, slot): (usize, usize), input: bool) -> Option<Parameter> {
        let function = self.function_at(index)?;
        let parameters = if input {
            function.input()
        } else {
            function.output()
        };
        parameters.into_iter().nth(slot)
    }

    /// Connect an output slot to an input slot, as an editor would
    ///
    /// Fails on a type mismatch. Otherwise any wire already feeding `end` is
    /// replaced and a manual value at `end` is cleared.
    pub fn connect(&mut self, start: (usize, usize), end: (usize, usize)) -> Result<WireId, EditError> {
        let graph = self
            .graph()
            .ok_or_else(|| EditError::NotComposite(self.id.clone()))?;
        let start_endpoint = graph.endpoint_at(start)?;
        let end_endpoint = graph.endpoint_at(end)?;

        let output = self
            .parameter(start, false)
            .ok_or(EditError::SlotOutOfRange { node: start.0, slot: start.1 })?;
        let input = self
            .parameter(end, true)
            .ok_or(EditError::SlotOutOfRange { node: end.0, slot: end.1 })?;
        if output.value_type != input.value_type {
            return Err(EditError::TypeMismatch {
                output: output.value_type,
                input: input.value_type,
            });
        }

        let id = self.id.clone();
        let graph = self
            .graph_mut()
            .ok_or_else(|| EditError::NotComposite(id.clone()))?;
        graph.disconnect(end_endpoint);
        graph.clear_value(end_endpoint.node, end_endpoint.slot)?;
        let wire = graph.add_wire(start_endpoint, end_endpoint)?;
        log::trace!("Connected {:?} -> {:?} in '{}'", start, end, id);
        Ok(wire)
    }

    /// Remove the wires feeding an input slot, as clicking it in an editor does
    pub fn disconnect(&mut self, end: (usize, usize)) -> Result<usize, EditError> {
        let id = self.id.clone();
        let graph = self.graph_mut().ok_or(EditError::NotComposite(id))?;
        let endpoint = graph.endpoint_at(end)?;
        Ok(graph.disconnect(endpoint))
    }

    // ---- execution ----

    /// Run with data inputs, returning data outputs
    pub fn run(&self, inputs: &[Value]) -> Result<Vec<Value>, ExecutionError> {
        self.run_with_events(inputs, &NullEventSink)
    }

    /// Run with data inputs, reporting progress to `sink`
    pub fn run_with_events(
        &self,
        inputs: &[Value],
        sink: &dyn EventSink,
    ) -> Result<Vec<Value>, ExecutionError> {
        let mut call = Vec::with_capacity(inputs.len() + 1);
        call.push(Value::SIGNAL);
        call.extend_from_slice(inputs);
        let mut outputs = self.evaluate(&call, sink)?;
        if !outputs.is_empty() {
            outputs.remove(0);
        }
        Ok(outputs)
    }

    /// Evaluate with the full input list, control flow slot included
    ///
    /// The leading control value is dropped, and the result always starts
    /// with `signal` so that native and composite functions share output
    /// slot indices.
    pub fn evaluate(&self, inputs: &[Value], sink: &dyn EventSink) -> Result<Vec<Value>, ExecutionError> {
        self.evaluate_at(inputs, sink, 0)
    }

    pub(crate) fn evaluate_at(
        &self,
        inputs: &[Value],
        sink: &dyn EventSink,
        depth: usize,
    ) -> Result<Vec<Value>, ExecutionError> {
        let data = inputs.get(1..).unwrap_or_default();
        let produced = match &self.implementation {
            Implementation::Native(mapping) => mapping.call(data),
            Implementation::Composite(graph) => engine::execute(self, graph, data, sink, depth)?,
        };
        let mut outputs = Vec::with_capacity(produced.len() + 1);
        outputs.push(Value::SIGNAL);
        outputs.extend(produced);
        Ok(outputs)
    }
}

/// Parameter lists a host supplies when the persisted record omits them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    pub input: Vec<Parameter>,
    pub output: Vec<Parameter>,
}

impl Signature {
    pub fn new(input: Vec<Parameter>, output: Vec<Parameter>) -> Self {
        Self { input, output }
    }

    pub fn of(function: &Function) -> Self {
        Self::new(function.data_input.clone(), function.data_output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Folder;
    use crate::graph::{Node, NodeId, PositionalWire};
    use crate::registry::TextType;
    use crate::value::TypeTag;

    fn add() -> Function {
        Function::native(
            "add",
            "Add",
            vec![
                Parameter::new("A", TypeTag::NUMBER),
                Parameter::new("B", TypeTag::NUMBER),
            ],
            vec![Parameter::new("Sum", TypeTag::NUMBER)],
            |inputs: &[Value]| {
                let sum = inputs.iter().filter_map(Value::as_number).sum::<f64>();
                vec![Value::Number(sum)]
            },
        )
    }

    fn composite_with(node_function: &str) -> Function {
        let mut graph = Graph::new(vec![Folder::new("Math", vec![add()])]);
        graph.add_node(Node::new(node_function, (0.0, 0.0)));
        Function::composite(
            "wrapper",
            "Wrapper",
            vec![
                Parameter::new("X", TypeTag::NUMBER),
                Parameter::new("Y", TypeTag::NUMBER),
            ],
            vec![Parameter::new("Result", TypeTag::NUMBER)],
            graph,
        )
    }

    #[test]
    fn test_signature_prepends_control_flow() {
        let function = add();
        assert_eq!(function.input().len(), 3);
        assert!(function.input()[0].is_control_flow());
        assert_eq!(function.output().len(), 2);
        assert_eq!(function.max_count(), 3);
    }

    #[test]
    fn test_set_input_is_idempotent() {
        let mut function = add();
        let full = function.input();
        function.set_input(full.clone());
        assert_eq!(function.input(), full);
        assert_eq!(function.data_input().len(), 2);
    }

    #[test]
    fn test_boundary_signatures() {
        let function = composite_with("add");
        let input = function.input_boundary();
        assert!(input.input().is_empty());
        assert_eq!(input.output().len(), 3);

        let output = function.output_boundary();
        assert_eq!(output.input().len(), 2);
        assert!(output.output().is_empty());
    }

    #[test]
    fn test_native_evaluate_prefixes_signal() {
        let outputs = add()
            .evaluate(&[Value::SIGNAL, Value::Number(1.0), Value::Number(2.0)], &NullEventSink)
            .unwrap();
        assert_eq!(outputs, vec![Value::SIGNAL, Value::Number(3.0)]);
        assert_eq!(add().run(&[Value::Number(1.0), Value::Number(2.0)]).unwrap(), vec![Value::Number(3.0)]);
    }

    #[test]
    fn test_merge_generator() {
        let merge = Function::merge(&TextType);
        assert_eq!(merge.id, "merge-text");
        assert_eq!(merge.name, "Merge (Text)");
        assert!(merge.require_only_one_input);
        assert_eq!(merge.input().len(), 3);
        assert_eq!(merge.run(&[Value::from("x")]).unwrap(), vec![Value::from("x")]);
        assert_eq!(merge.run(&[]).unwrap(), vec![Value::from("")]);
    }

    #[test]
    fn test_parameter_lookup() {
        let function = composite_with("add");
        // Input node output slot 1 is X, the add node's input slot 2 is B.
        assert_eq!(function.parameter((0, 1), false).unwrap().name, "X");
        assert_eq!(function.parameter((1, 2), true).unwrap().name, "B");
        assert_eq!(function.parameter((2, 1), true).unwrap().name, "Result");
        assert!(function.parameter((2, 1), false).is_none());
        assert!(function.parameter((1, 3), true).is_none());
    }

    #[test]
    fn test_connect_replaces_wire_and_clears_value() {
        let mut function = composite_with("add");
        let node = function.graph().unwrap().node_id_at(1).unwrap();
        function
            .graph_mut()
            .unwrap()
            .node_mut(node)
            .unwrap()
            .values
            .insert(1, Value::Number(9.0));

        function.connect((0, 1), (1, 1)).unwrap();
        assert!(function.graph().unwrap().value(node, 1).is_none());

        function.connect((0, 2), (1, 1)).unwrap();
        assert_eq!(
            function.graph().unwrap().positional_wires(),
            vec![PositionalWire::new((0, 2), (1, 1))]
        );
    }

    #[test]
    fn test_connect_type_mismatch() {
        let mut function = composite_with("add");
        let err = function.connect((0, 0), (1, 1)).unwrap_err();
        assert_eq!(
            err,
            EditError::TypeMismatch {
                output: TypeTag::CONTROL_FLOW,
                input: TypeTag::NUMBER
            }
        );
        assert!(function.graph().unwrap().wires().is_empty());
    }

    #[test]
    fn test_connect_on_native_fails() {
        let mut function = add();
        assert_eq!(
            function.connect((0, 1), (1, 1)),
            Err(EditError::NotComposite("add".into()))
        );
    }

    #[test]
    fn test_function_lookup() {
        let function = composite_with("add");
        assert_eq!(function.functions().len(), 1);
        assert_eq!(function.all_functions().len(), 3);
        assert!(function.function(INPUT_FUNCTION_ID).unwrap().is_input_boundary());
        assert!(function.function("add").is_some());
        assert!(function.function_at(2).unwrap().is_output_boundary());
        assert!(function.graph().unwrap().node(NodeId::INPUT).is_none());
    }
}
