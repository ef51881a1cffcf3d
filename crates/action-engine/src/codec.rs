//! Persisted encoding of composite functions
//!
//! A composite's editable state is flattened into a columnar record of
//! parallel arrays (one entry per user node) plus a list of positional
//! wires. Values are stored as `{tag, value}` pairs resolved against the
//! host's [`TypeRegistry`].
//!
//! Two schema variants exist. [`SchemaVariant::WithSignature`] stores the
//! function's own parameter lists; [`SchemaVariant::HostSignature`] omits
//! them and the host supplies a [`Signature`] when decoding.
//!
//! Decoding never fails on content: short arrays are padded, unknown tags
//! fall back to control flow and out-of-range wires are dropped. Every such
//! fallback is reported as a [`DecodeWarning`].

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Folder;
use crate::config::defaults;
use crate::error::{CodecError, Result};
use crate::function::{Function, Signature};
use crate::graph::{Graph, Node, NodeId, Position, PositionalWire};
use crate::parameter::Parameter;
use crate::registry::TypeRegistry;
use crate::value::{TypeTag, Value};

/// Which parameter lists a record carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVariant {
    /// The record stores input and output parameters
    WithSignature,
    /// Parameters come from the host when decoding
    HostSignature,
}

/// A value as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedValue {
    pub tag: TypeTag,
    pub value: serde_json::Value,
}

/// Columnar record of a composite function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncodedFunction {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(alias = "nodeIDs")]
    pub node_ids: Vec<Uuid>,
    pub node_positions: Vec<Position>,
    pub node_functions: Vec<String>,
    pub node_value_keys: Vec<Vec<usize>>,
    pub node_value_values: Vec<Vec<EncodedValue>>,
    pub output_node_value_keys: Vec<usize>,
    pub output_node_value_values: Vec<EncodedValue>,
    /// `[start node, start slot, end node, end slot]` per wire
    pub wires: Vec<Vec<usize>>,
    pub width: f64,
    pub input_node_position: Position,
    pub output_node_position: Position,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_ids: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_types: Option<Vec<TypeTag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_ids: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_types: Option<Vec<TypeTag>>,
}

impl Default for EncodedFunction {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            node_ids: Vec::new(),
            node_positions: Vec::new(),
            node_functions: Vec::new(),
            node_value_keys: Vec::new(),
            node_value_values: Vec::new(),
            output_node_value_keys: Vec::new(),
            output_node_value_values: Vec::new(),
            wires: Vec::new(),
            width: defaults::NODE_WIDTH,
            input_node_position: defaults::INPUT_NODE_POSITION,
            output_node_position: defaults::OUTPUT_NODE_POSITION,
            input_ids: None,
            input_names: None,
            input_types: None,
            output_ids: None,
            output_names: None,
            output_types: None,
        }
    }
}

impl EncodedFunction {
    pub fn variant(&self) -> SchemaVariant {
        let any = self.input_ids.is_some()
            || self.input_names.is_some()
            || self.input_types.is_some()
            || self.output_ids.is_some()
            || self.output_names.is_some()
            || self.output_types.is_some();
        if any {
            SchemaVariant::WithSignature
        } else {
            SchemaVariant::HostSignature
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A fallback taken while decoding
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeWarning {
    /// A manual value's tag is not registered
    UnknownValueType { tag: TypeTag },
    /// A manual value's payload does not fit its registered type
    MalformedValue { tag: TypeTag },
    /// A parameter's type is not registered
    UnknownParameterType { parameter: String, tag: TypeTag },
    /// A wire points outside the node list
    WireOutOfRange { wire: Vec<usize> },
    /// A node id repeats an earlier node or a boundary node; a fresh id was used
    DuplicateNodeId { node_index: usize, id: Uuid },
    /// A node calls a function missing from the roster
    UnknownFunction { node_index: usize, function_id: String },
    /// A host-signature record was decoded without a host signature
    MissingSignature,
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownValueType { tag } => {
                write!(f, "Unknown value type '{}', using control flow", tag)
            }
            Self::MalformedValue { tag } => {
                write!(f, "Malformed '{}' value, using control flow", tag)
            }
            Self::UnknownParameterType { parameter, tag } => write!(
                f,
                "Parameter '{}' has unknown type '{}', using control flow",
                parameter, tag
            ),
            Self::DuplicateNodeId { node_index, id } => write!(
                f,
                "Node {} reuses id {}, assigned a new one",
                node_index, id
            ),
            Self::WireOutOfRange { wire } => write!(f, "Dropped out-of-range wire {:?}", wire),
            Self::UnknownFunction {
                node_index,
                function_id,
            } => write!(
                f,
                "Node {} calls unknown function '{}'",
                node_index, function_id
            ),
            Self::MissingSignature => write!(f, "No parameter lists available"),
        }
    }
}

/// Result of decoding a record
#[derive(Debug, Clone)]
pub struct Decoded {
    pub function: Function,
    pub warnings: Vec<DecodeWarning>,
}

/// Encoder/decoder bound to a registry and a roster
///
/// # Example
///
/// ```ignore
/// let codec = FunctionCodec::new(&registry, &catalog);
/// let record = codec.encode(&function, SchemaVariant::WithSignature)?;
/// let decoded = codec.decode(&record);
/// ```
pub struct FunctionCodec<'a> {
    registry: &'a TypeRegistry,
    functions: &'a [Folder<Function>],
    signature: Option<&'a Signature>,
}

impl<'a> FunctionCodec<'a> {
    pub fn new(registry: &'a TypeRegistry, functions: &'a [Folder<Function>]) -> Self {
        Self {
            registry,
            functions,
            signature: None,
        }
    }

    /// Parameter lists used for records without their own
    pub fn with_signature(mut self, signature: &'a Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn encode(
        &self,
        function: &Function,
        variant: SchemaVariant,
    ) -> std::result::Result<EncodedFunction, CodecError> {
        let graph = function
            .graph()
            .ok_or_else(|| CodecError::NotComposite(function.id.clone()))?;

        let mut record = EncodedFunction {
            id: function.id.clone(),
            name: function.name.clone(),
            description: function.description.clone(),
            width: function.width,
            input_node_position: graph.input_node_position,
            output_node_position: graph.output_node_position,
            ..EncodedFunction::default()
        };

        for node in graph.nodes() {
            record.node_ids.push(node.id.0);
            record.node_positions.push(node.position);
            record.node_functions.push(node.function.clone());
            let (keys, values) = self.encode_values(&node.values)?;
            record.node_value_keys.push(keys);
            record.node_value_values.push(values);
        }
        let (keys, values) = self.encode_values(&graph.output_node_values)?;
        record.output_node_value_keys = keys;
        record.output_node_value_values = values;

        record.wires = graph
            .positional_wires()
            .into_iter()
            .map(|wire| vec![wire.start.0, wire.start.1, wire.end.0, wire.end.1])
            .collect();

        if variant == SchemaVariant::WithSignature {
            let input = function.data_input();
            let output = function.data_output();
            record.input_ids = Some(input.iter().map(|p| p.id).collect());
            record.input_names = Some(input.iter().map(|p| p.name.clone()).collect());
            record.input_types = Some(input.iter().map(|p| p.value_type.clone()).collect());
            record.output_ids = Some(output.iter().map(|p| p.id).collect());
            record.output_names = Some(output.iter().map(|p| p.name.clone()).collect());
            record.output_types = Some(output.iter().map(|p| p.value_type.clone()).collect());
        }

        log::debug!(
            "Encoded '{}': {} node(s), {} wire(s)",
            record.id,
            record.node_ids.len(),
            record.wires.len()
        );
        Ok(record)
    }

    fn encode_values(
        &self,
        values: &BTreeMap<usize, Value>,
    ) -> std::result::Result<(Vec<usize>, Vec<EncodedValue>), CodecError> {
        let mut keys = Vec::with_capacity(values.len());
        let mut encoded = Vec::with_capacity(values.len());
        for (slot, value) in values {
            let tag = value.type_tag();
            let payload = self
                .registry
                .get(&tag)
                .and_then(|value_type| value_type.encode(value))
                .ok_or_else(|| CodecError::UnknownValueType(tag.clone()))?;
            keys.push(*slot);
            encoded.push(EncodedValue {
                tag,
                value: payload,
            });
        }
        Ok((keys, encoded))
    }

    pub fn decode(&self, record: &EncodedFunction) -> Decoded {
        let mut warnings = Vec::new();

        let (input, output) = match record.variant() {
            SchemaVariant::WithSignature => (
                self.decode_parameters(
                    record.input_ids.as_deref(),
                    record.input_names.as_deref(),
                    record.input_types.as_deref(),
                    &mut warnings,
                ),
                self.decode_parameters(
                    record.output_ids.as_deref(),
                    record.output_names.as_deref(),
                    record.output_types.as_deref(),
                    &mut warnings,
                ),
            ),
            SchemaVariant::HostSignature => match self.signature {
                Some(signature) => (signature.input.clone(), signature.output.clone()),
                None => {
                    warnings.push(DecodeWarning::MissingSignature);
                    (Vec::new(), Vec::new())
                }
            },
        };

        let mut graph = Graph::new(self.functions.to_vec());
        graph.input_node_position = record.input_node_position;
        graph.output_node_position = record.output_node_position;

        let count = record
            .node_ids
            .len()
            .max(record.node_positions.len())
            .max(record.node_functions.len());
        let mut seen = HashSet::new();
        for index in 0..count {
            let function_id = record.node_functions.get(index).cloned().unwrap_or_default();
            if graph.function(&function_id).is_none() {
                warnings.push(DecodeWarning::UnknownFunction {
                    node_index: index + 1,
                    function_id: function_id.clone(),
                });
            }
            let id = match record.node_ids.get(index).map(|id| NodeId(*id)) {
                Some(id) if id.is_boundary() || !seen.insert(id) => {
                    let fresh = NodeId::new();
                    seen.insert(fresh);
                    warnings.push(DecodeWarning::DuplicateNodeId {
                        node_index: index + 1,
                        id: id.0,
                    });
                    fresh
                }
                Some(id) => id,
                None => NodeId::new(),
            };
            let node = Node {
                id,
                position: record.node_positions.get(index).copied().unwrap_or((0.0, 0.0)),
                function: function_id,
                values: self.decode_values(
                    record.node_value_keys.get(index).map(Vec::as_slice).unwrap_or_default(),
                    record.node_value_values.get(index).map(Vec::as_slice).unwrap_or_default(),
                    &mut warnings,
                ),
            };
            graph.add_node(node);
        }
        graph.output_node_values = self.decode_values(
            &record.output_node_value_keys,
            &record.output_node_value_values,
            &mut warnings,
        );

        for raw in &record.wires {
            let at = |i: usize| raw.get(i).copied().unwrap_or(0);
            let wire = PositionalWire::new((at(0), at(1)), (at(2), at(3)));
            if graph.add_positional_wire(wire).is_err() {
                warnings.push(DecodeWarning::WireOutOfRange { wire: raw.clone() });
            }
        }

        let mut function = Function::composite(
            record.id.clone(),
            record.name.clone(),
            Vec::new(),
            Vec::new(),
            graph,
        );
        // Assigned directly: parameters that fell back to control flow keep
        // their slot so wire indices stay valid.
        function.data_input = input;
        function.data_output = output;
        function.description = record.description.clone();
        function.width = record.width;

        for warning in &warnings {
            log::warn!("Decoding '{}': {}", record.id, warning);
        }
        Decoded { function, warnings }
    }

    fn decode_parameters(
        &self,
        ids: Option<&[Uuid]>,
        names: Option<&[String]>,
        types: Option<&[TypeTag]>,
        warnings: &mut Vec<DecodeWarning>,
    ) -> Vec<Parameter> {
        let ids = ids.unwrap_or_default();
        let names = names.unwrap_or_default();
        let types = types.unwrap_or_default();
        let count = ids.len().max(names.len()).max(types.len());

        (0..count)
            .map(|index| {
                let name = names.get(index).cloned().unwrap_or_default();
                let tag = types.get(index).cloned().unwrap_or(TypeTag::CONTROL_FLOW);
                let tag = if self.registry.contains(&tag) {
                    tag
                } else {
                    warnings.push(DecodeWarning::UnknownParameterType {
                        parameter: name.clone(),
                        tag,
                    });
                    TypeTag::CONTROL_FLOW
                };
                let id = ids.get(index).copied().unwrap_or_else(Uuid::new_v4);
                Parameter::with_id(id, name, tag)
            })
            .collect()
    }

    /// Pair keys with values by position
    fn decode_values(
        &self,
        keys: &[usize],
        values: &[EncodedValue],
        warnings: &mut Vec<DecodeWarning>,
    ) -> BTreeMap<usize, Value> {
        keys.iter()
            .zip(values)
            .map(|(slot, encoded)| (*slot, self.decode_value(encoded, warnings)))
            .collect()
    }

    fn decode_value(&self, encoded: &EncodedValue, warnings: &mut Vec<DecodeWarning>) -> Value {
        let (value_type, fell_back) = self.registry.resolve(&encoded.tag);
        if fell_back {
            warnings.push(DecodeWarning::UnknownValueType {
                tag: encoded.tag.clone(),
            });
            return value_type.default_value();
        }
        match value_type.decode(&encoded.value) {
            Some(value) => value,
            None => {
                warnings.push(DecodeWarning::MalformedValue {
                    tag: encoded.tag.clone(),
                });
                self.registry.control_flow().default_value()
            }
        }
    }

    /// Encode straight to JSON
    pub fn encode_json(&self, function: &Function, variant: SchemaVariant) -> Result<String> {
        self.encode(function, variant)?.to_json()
    }

    /// Decode straight from JSON
    pub fn decode_json(&self, json: &str) -> Result<Decoded> {
        Ok(self.decode(&EncodedFunction::from_json(json)?))
    }
}
