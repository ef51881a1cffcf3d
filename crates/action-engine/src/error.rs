//! Error types for the action engine

use thiserror::Error;

use crate::graph::NodeId;
use crate::value::TypeTag;

/// Result type alias using ActionError
pub type Result<T> = std::result::Result<T, ActionError>;

/// Errors that can occur anywhere in the action engine
#[derive(Debug, Error)]
pub enum ActionError {
    /// A run stopped making progress
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// A graph edit was rejected
    #[error(transparent)]
    Edit(#[from] EditError),

    /// A function could not be encoded
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The interpreter's only failure mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// A pass completed without executing any node.
    ///
    /// `node` is `None` when the stall happened in the graph being run, and
    /// the index of the composite node whose nested run stalled otherwise.
    #[error("{}", empty_iteration_message(.node))]
    EmptyIteration { node: Option<usize> },
}

fn empty_iteration_message(node: &Option<usize>) -> String {
    match node {
        Some(index) => format!("Empty iteration inside composite node at index {}", index),
        None => "Empty iteration: no node could execute".to_string(),
    }
}

/// Rejected graph edits
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Node index {0} is out of range")]
    NodeIndexOutOfRange(usize),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Slot {slot} is out of range for node at index {node}")]
    SlotOutOfRange { node: usize, slot: usize },

    /// Wire endpoints carry different value types
    #[error("Type mismatch: cannot connect {output} to {input}")]
    TypeMismatch { output: TypeTag, input: TypeTag },

    /// The virtual input/output nodes cannot be edited this way
    #[error("Boundary node {0} cannot be edited")]
    BoundaryNode(NodeId),

    #[error("Function '{0}' is not a composite")]
    NotComposite(String),
}

/// Failures while encoding a function into its persisted record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("Function '{0}' is not a composite")]
    NotComposite(String),

    /// A value's tag is missing from the type registry
    #[error("Value type '{0}' is not registered")]
    UnknownValueType(TypeTag),
}

impl ActionError {
    /// Create a compression error from any displayable cause
    pub fn compression(err: impl std::fmt::Display) -> Self {
        Self::Compression(err.to_string())
    }
}
