//! Fixpoint interpreter for composite functions
//!
//! A run repeatedly sweeps the pending nodes in positional order. A node
//! executes once every input slot has a value (any single data input for
//! merge functions) and its control flow input is `signal`. Outputs are
//! added to the data pool immediately, so later nodes in the same pass can
//! already consume them. A run succeeds once the accumulated outputs match
//! the declared number of data outputs (a function without outputs finishes
//! after its first pass), and fails with [`ExecutionError::EmptyIteration`]
//! as soon as a pass executes nothing.
//!
//! Composite nodes recurse into [`Function::evaluate_at`], which re-enters
//! this module with a fresh data pool.

use crate::error::ExecutionError;
use crate::events::{emit, EventSink, ExecutionEvent};
use crate::function::Function;
use crate::graph::{Graph, Node, PositionalWire};
use crate::value::Value;

/// Where a pooled value sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataPosition {
    /// Produced by a node's output slot
    Output { node: usize, slot: usize },
    /// Supplied manually to a node's input slot
    Input { node: usize, slot: usize },
}

/// One value in a run's data pool
#[derive(Debug, Clone, PartialEq)]
pub struct ActionData {
    pub position: DataPosition,
    pub value: Value,
}

impl ActionData {
    pub fn output(node: usize, slot: usize, value: Value) -> Self {
        Self {
            position: DataPosition::Output { node, slot },
            value,
        }
    }

    pub fn input(node: usize, slot: usize, value: Value) -> Self {
        Self {
            position: DataPosition::Input { node, slot },
            value,
        }
    }
}

/// State of one run over one composite body
struct Run<'a> {
    function: &'a Function,
    nodes: Vec<Node>,
    wires: Vec<PositionalWire>,
    inputs: &'a [Value],
    sink: &'a dyn EventSink,
    depth: usize,
    data: Vec<ActionData>,
    result: Option<Vec<Value>>,
}

/// Run a composite body with data inputs (control flow excluded)
pub(crate) fn execute(
    function: &Function,
    graph: &Graph,
    inputs: &[Value],
    sink: &dyn EventSink,
    depth: usize,
) -> Result<Vec<Value>, ExecutionError> {
    let mut run = Run::new(function, graph, inputs, sink, depth);
    emit(
        sink,
        ExecutionEvent::RunStarted {
            function_id: function.id.clone(),
            depth,
        },
    );

    match run.drive() {
        Ok((values, passes)) => {
            emit(
                sink,
                ExecutionEvent::RunCompleted {
                    function_id: function.id.clone(),
                    passes,
                    depth,
                },
            );
            Ok(values)
        }
        Err(err) => {
            emit(
                sink,
                ExecutionEvent::RunFailed {
                    function_id: function.id.clone(),
                    error: err.to_string(),
                    depth,
                },
            );
            Err(err)
        }
    }
}

impl<'a> Run<'a> {
    fn new(
        function: &'a Function,
        graph: &Graph,
        inputs: &'a [Value],
        sink: &'a dyn EventSink,
        depth: usize,
    ) -> Self {
        let nodes = graph.all_nodes();
        let data = nodes
            .iter()
            .enumerate()
            .flat_map(|(index, node)| {
                node.values
                    .iter()
                    .map(move |(slot, value)| ActionData::input(index, *slot, value.clone()))
            })
            .collect();

        Self {
            function,
            nodes,
            wires: graph.positional_wires(),
            inputs,
            sink,
            depth,
            data,
            result: None,
        }
    }

    fn output_index(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Sweep until the Output node delivers or a pass stalls
    fn drive(&mut self) -> Result<(Vec<Value>, usize), ExecutionError> {
        let expected = self.function.data_output().len();
        let mut pending: Vec<usize> = (0..self.nodes.len()).collect();
        let mut pass = 0;

        loop {
            pass += 1;
            let mut progressed = false;
            let mut remaining = Vec::with_capacity(pending.len());

            for index in pending {
                if self.step(index)? {
                    progressed = true;
                } else {
                    remaining.push(index);
                }
            }
            pending = remaining;

            log::trace!(
                "'{}' pass {}: progressed={}, {} node(s) pending",
                self.function.id,
                pass,
                progressed,
                pending.len()
            );
            emit(
                self.sink,
                ExecutionEvent::PassCompleted {
                    function_id: self.function.id.clone(),
                    pass,
                    progressed,
                    depth: self.depth,
                },
            );

            // Without declared outputs an empty accumulator already matches
            let values = self.result.take().or_else(|| (expected == 0).then(Vec::new));
            if let Some(values) = values {
                if values.len() == expected {
                    return Ok((values, pass));
                }
                log::debug!(
                    "'{}' output node produced {} value(s), expected {}",
                    self.function.id,
                    values.len(),
                    expected
                );
            }
            if !progressed {
                log::debug!(
                    "'{}' stalled in pass {} with pending nodes {:?}",
                    self.function.id,
                    pass,
                    pending
                );
                return Err(ExecutionError::EmptyIteration { node: None });
            }
        }
    }

    /// Try to execute one node; `Ok(true)` if it ran
    fn step(&mut self, index: usize) -> Result<bool, ExecutionError> {
        let collected = self.collect(index);
        let function = self.function;

        let callee = match function.function_at(index) {
            Some(callee) => callee,
            None => {
                log::warn!(
                    "Node {} of '{}' calls unknown function '{}'",
                    index,
                    function.id,
                    self.nodes[index].function
                );
                return Ok(false);
            }
        };

        let ready = if callee.require_only_one_input {
            collected.len() > 1
        } else {
            (0..callee.input().len()).all(|slot| collected.iter().any(|(s, _)| *s == slot))
        };
        let gated = index == 0 || matches!(collected.first(), Some((_, value)) if value.is_signal());
        if !ready || !gated {
            return Ok(false);
        }

        emit(
            self.sink,
            ExecutionEvent::StepStarted {
                function_id: callee.id.clone(),
                node_index: index,
                node_id: self.nodes[index].id,
                depth: self.depth,
            },
        );

        let outputs = if index == 0 {
            let mut outputs = Vec::with_capacity(self.inputs.len() + 1);
            outputs.push(Value::SIGNAL);
            outputs.extend_from_slice(self.inputs);
            outputs
        } else if index == self.output_index() {
            self.result = Some(collected.into_iter().skip(1).map(|(_, value)| value).collect());
            Vec::new()
        } else {
            let values: Vec<Value> = collected.into_iter().map(|(_, value)| value).collect();
            callee
                .evaluate_at(&values, self.sink, self.depth + 1)
                .map_err(|_| ExecutionError::EmptyIteration { node: Some(index) })?
        };

        self.data.extend(
            outputs
                .into_iter()
                .enumerate()
                .map(|(slot, value)| ActionData::output(index, slot, value)),
        );
        Ok(true)
    }

    /// Values available to a node's inputs, sorted by slot
    ///
    /// Each wire contributes the first pooled value produced at its start;
    /// manual values for the node are added as-is.
    fn collect(&self, index: usize) -> Vec<(usize, Value)> {
        let mut collected: Vec<(usize, Value)> = self
            .wires
            .iter()
            .filter(|wire| wire.end.0 == index)
            .filter_map(|wire| {
                let source = DataPosition::Output {
                    node: wire.start.0,
                    slot: wire.start.1,
                };
                self.data
                    .iter()
                    .find(|data| data.position == source)
                    .map(|data| (wire.end.1, data.value.clone()))
            })
            .collect();

        collected.extend(self.data.iter().filter_map(|data| match data.position {
            DataPosition::Input { node, slot } if node == index => Some((slot, data.value.clone())),
            _ => None,
        }));
        collected.sort_by_key(|(slot, _)| *slot);
        collected
    }
}
