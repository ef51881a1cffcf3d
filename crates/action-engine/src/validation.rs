//! Graph validation for composite functions
//!
//! Reports the problems an editor prevents while wiring: mismatched types,
//! dangling or out-of-range endpoints, unknown functions, inputs fed more
//! than once. The interpreter does not require a clean report; it simply
//! never executes nodes whose inputs cannot be satisfied.

use std::collections::HashMap;

use crate::function::Function;
use crate::graph::{Graph, NodeId, PositionalWire, Wire, WireId};
use crate::registry::TypeRegistry;
use crate::value::TypeTag;

/// Validation error with location context
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A node calls a function missing from the roster
    UnknownFunction { node_id: NodeId, function_id: String },
    /// A wire references a node that no longer exists
    DanglingWire { wire_id: WireId, node_id: NodeId },
    /// A wire or manual value addresses a slot the node does not have
    SlotOutOfRange { node_id: NodeId, slot: usize, input: bool },
    /// A wire connects different value types
    IncompatibleTypes {
        wire_id: WireId,
        output_type: TypeTag,
        input_type: TypeTag,
    },
    /// A manual value does not match its input's type
    ValueTypeMismatch {
        node_id: NodeId,
        slot: usize,
        expected: TypeTag,
        found: TypeTag,
    },
    /// More than one wire ends at the same input
    DuplicateFeed { node_id: NodeId, slot: usize },
    /// An input has both a wire and a manual value
    ShadowedValue { node_id: NodeId, slot: usize },
    /// A parameter's type is missing from the registry
    UnregisteredType { parameter: String, value_type: TypeTag },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownFunction {
                node_id,
                function_id,
            } => write!(f, "Node '{}' calls unknown function '{}'", node_id, function_id),
            Self::DanglingWire { wire_id, node_id } => write!(
                f,
                "Wire '{}' references missing node '{}'",
                wire_id.0, node_id
            ),
            Self::SlotOutOfRange {
                node_id,
                slot,
                input,
            } => write!(
                f,
                "Node '{}' has no {} slot {}",
                node_id,
                if *input { "input" } else { "output" },
                slot
            ),
            Self::IncompatibleTypes {
                wire_id,
                output_type,
                input_type,
            } => write!(
                f,
                "Wire '{}' connects incompatible types: {} -> {}",
                wire_id.0, output_type, input_type
            ),
            Self::ValueTypeMismatch {
                node_id,
                slot,
                expected,
                found,
            } => write!(
                f,
                "Value for input {} of node '{}' is {}, expected {}",
                slot, node_id, found, expected
            ),
            Self::DuplicateFeed { node_id, slot } => {
                write!(f, "Input {} of node '{}' is fed by several wires", slot, node_id)
            }
            Self::ShadowedValue { node_id, slot } => write!(
                f,
                "Input {} of node '{}' has both a wire and a manual value",
                slot, node_id
            ),
            Self::UnregisteredType {
                parameter,
                value_type,
            } => write!(
                f,
                "Parameter '{}' uses unregistered type '{}'",
                parameter, value_type
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a composite function
///
/// Native functions have no body and always validate. Pass a registry to
/// also check that every parameter type is registered.
pub fn validate_function(
    function: &Function,
    registry: Option<&TypeRegistry>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let Some(graph) = function.graph() else {
        return errors;
    };

    if let Some(registry) = registry {
        let mut parameters: Vec<_> = function.data_input().iter().collect();
        parameters.extend(function.data_output());
        for callee in function.functions() {
            parameters.extend(callee.data_input());
            parameters.extend(callee.data_output());
        }
        for parameter in parameters {
            if !registry.contains(&parameter.value_type) {
                errors.push(ValidationError::UnregisteredType {
                    parameter: parameter.name.clone(),
                    value_type: parameter.value_type.clone(),
                });
            }
        }
    }

    for node in graph.all_nodes() {
        let Some(index) = graph.index_of(node.id) else {
            continue;
        };
        let Some(callee) = function.function_at(index) else {
            errors.push(ValidationError::UnknownFunction {
                node_id: node.id,
                function_id: node.function.clone(),
            });
            continue;
        };
        let input = callee.input();
        for (slot, value) in &node.values {
            match input.get(*slot) {
                None => errors.push(ValidationError::SlotOutOfRange {
                    node_id: node.id,
                    slot: *slot,
                    input: true,
                }),
                Some(parameter) if parameter.value_type != value.type_tag() => {
                    errors.push(ValidationError::ValueTypeMismatch {
                        node_id: node.id,
                        slot: *slot,
                        expected: parameter.value_type.clone(),
                        found: value.type_tag(),
                    })
                }
                Some(_) => {}
            }
        }
    }

    let mut feeds: HashMap<(NodeId, usize), usize> = HashMap::new();
    for wire in graph.wires() {
        let Some(positional) = check_endpoints(graph, wire, &mut errors) else {
            continue;
        };

        *feeds.entry((wire.end.node, wire.end.slot)).or_insert(0) += 1;
        if graph.value(wire.end.node, wire.end.slot).is_some() {
            errors.push(ValidationError::ShadowedValue {
                node_id: wire.end.node,
                slot: wire.end.slot,
            });
        }

        // Unknown functions were already reported per node.
        if function.function_at(positional.start.0).is_none()
            || function.function_at(positional.end.0).is_none()
        {
            continue;
        }
        let output = function.parameter(positional.start, false);
        let input = function.parameter(positional.end, true);
        match (output, input) {
            (Some(output), Some(input)) => {
                if output.value_type != input.value_type {
                    errors.push(ValidationError::IncompatibleTypes {
                        wire_id: wire.id,
                        output_type: output.value_type,
                        input_type: input.value_type,
                    });
                }
            }
            (None, _) => errors.push(ValidationError::SlotOutOfRange {
                node_id: wire.start.node,
                slot: wire.start.slot,
                input: false,
            }),
            (_, None) => errors.push(ValidationError::SlotOutOfRange {
                node_id: wire.end.node,
                slot: wire.end.slot,
                input: true,
            }),
        }
    }

    let mut duplicates: Vec<_> = feeds.into_iter().filter(|(_, count)| *count > 1).collect();
    duplicates.sort_by_key(|((node_id, slot), _)| (graph.index_of(*node_id), *slot));
    for ((node_id, slot), _) in duplicates {
        errors.push(ValidationError::DuplicateFeed { node_id, slot });
    }

    errors
}

fn check_endpoints(
    graph: &Graph,
    wire: &Wire,
    errors: &mut Vec<ValidationError>,
) -> Option<PositionalWire> {
    for node_id in [wire.start.node, wire.end.node] {
        if graph.index_of(node_id).is_none() {
            errors.push(ValidationError::DanglingWire {
                wire_id: wire.id,
                node_id,
            });
            return None;
        }
    }
    graph.positional(wire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Folder;
    use crate::graph::Node;
    use crate::parameter::Parameter;
    use crate::value::Value;

    fn roster() -> Vec<Folder<Function>> {
        let negate = Function::native(
            "negate",
            "Negate",
            vec![Parameter::new("X", TypeTag::NUMBER)],
            vec![Parameter::new("-X", TypeTag::NUMBER)],
            |inputs: &[Value]| {
                vec![Value::Number(-inputs.first().and_then(Value::as_number).unwrap_or(0.0))]
            },
        );
        vec![Folder::new("Math", vec![negate])]
    }

    fn function_with(graph: Graph) -> Function {
        Function::composite(
            "custom",
            "Custom",
            vec![Parameter::new("Label", TypeTag::TEXT)],
            vec![Parameter::new("Result", TypeTag::NUMBER)],
            graph,
        )
    }

    #[test]
    fn test_valid_function() {
        let mut graph = Graph::new(roster());
        graph.add_node(Node::new("negate", (0.0, 0.0)).with_value(1, 2.0));
        graph
            .add_positional_wire(PositionalWire::new((1, 1), (2, 1)))
            .unwrap();
        let function = function_with(graph);
        assert!(validate_function(&function, Some(&TypeRegistry::with_builtins())).is_empty());
    }

    #[test]
    fn test_incompatible_types() {
        let mut graph = Graph::new(roster());
        graph.add_node(Node::new("negate", (0.0, 0.0)));
        graph
            .add_positional_wire(PositionalWire::new((0, 1), (1, 1)))
            .unwrap();
        let errors = validate_function(&function_with(graph), None);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ValidationError::IncompatibleTypes { output_type, input_type, .. }
                if *output_type == TypeTag::TEXT && *input_type == TypeTag::NUMBER
        ));
    }

    #[test]
    fn test_unknown_function_and_bad_value() {
        let mut graph = Graph::new(roster());
        graph.add_node(Node::new("missing", (0.0, 0.0)));
        graph.add_node(Node::new("negate", (0.0, 0.0)).with_value(1, "text").with_value(4, 1.0));
        let errors = validate_function(&function_with(graph), None);

        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::UnknownFunction { function_id, .. } if function_id == "missing")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::ValueTypeMismatch { slot: 1, .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::SlotOutOfRange { slot: 4, input: true, .. })));
    }

    #[test]
    fn test_duplicate_feed_and_shadowed_value() {
        let mut graph = Graph::new(roster());
        graph.add_node(Node::new("negate", (0.0, 0.0)).with_value(1, 3.0));
        graph.add_node(Node::new("negate", (0.0, 0.0)).with_value(1, 4.0));
        graph
            .add_positional_wire(PositionalWire::new((1, 1), (3, 1)))
            .unwrap();
        graph
            .add_positional_wire(PositionalWire::new((2, 1), (3, 1)))
            .unwrap();
        let errors = validate_function(&function_with(graph), None);

        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ValidationError::DuplicateFeed { slot: 1, .. }));
        assert!(errors[0].to_string().contains("several wires"));
    }

    #[test]
    fn test_unregistered_parameter_type() {
        let graph = Graph::new(roster());
        let errors = validate_function(&function_with(graph), Some(&TypeRegistry::new()));
        // Label, Result and the roster's X and -X
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_native_function_is_valid() {
        let native = roster()[0].content[0].clone();
        assert!(validate_function(&native, None).is_empty());
    }

    #[test]
    fn test_duplicate_feeds_follow_node_order() {
        let mut graph = Graph::new(roster());
        for value in [1.0, 2.0, 3.0] {
            graph.add_node(Node::new("negate", (0.0, 0.0)).with_value(1, value));
        }
        let target = graph.add_node(Node::new("negate", (0.0, 0.0)));
        for (start, end) in [((1, 1), (5, 1)), ((2, 1), (5, 1)), ((2, 1), (4, 1)), ((3, 1), (4, 1))] {
            graph
                .add_positional_wire(PositionalWire::new(start, end))
                .unwrap();
        }
        let errors = validate_function(&function_with(graph), None);

        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateFeed {
                    node_id: target,
                    slot: 1
                },
                ValidationError::DuplicateFeed {
                    node_id: NodeId::OUTPUT,
                    slot: 1
                },
            ]
        );
    }
}
