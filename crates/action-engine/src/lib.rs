//! Action Engine - visual function graphs and their interpreter
//!
//! Users compose small functions as graphs of typed nodes joined by wires.
//! This crate provides:
//!
//! - The editable model: [`Function`], [`Graph`], [`Node`], [`Wire`], [`Parameter`]
//! - A fixpoint interpreter with control flow gating and merge nodes
//! - Recursive composite functions, run exactly like native ones
//! - A columnar persisted encoding resolved against a host [`TypeRegistry`]
//! - Compressed snapshot undo/redo and graph validation
//!
//! # Architecture
//!
//! Everything the engine needs is passed in explicitly:
//!
//! - `TypeRegistry`: capability table of value types, always holding control flow
//! - `Folder<Function>` rosters: the functions a composite may call
//! - `EventSink`: observer for run, pass and step events
//!
//! # Example
//!
//! ```ignore
//! use action_engine::{FunctionBuilder, TypeTag, Value};
//!
//! let add = FunctionBuilder::new("custom-add", "Custom Add")
//!     .input("A", TypeTag::NUMBER)
//!     .input("B", TypeTag::NUMBER)
//!     .output("Sum", TypeTag::NUMBER)
//!     .folders(action_nodes::default_catalog(&registry))
//!     .node(action_nodes::number::ADD_ID)
//!     .wire((0, 1), (1, 1))
//!     .wire((0, 2), (1, 2))
//!     .wire((1, 1), (2, 1))
//!     .build()?;
//!
//! assert_eq!(add.run(&[Value::Number(3.0), Value::Number(4.0)])?, vec![Value::Number(7.0)]);
//! ```

pub mod builder;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod function;
pub mod graph;
pub mod parameter;
pub mod registry;
pub mod undo;
pub mod validation;
pub mod value;

// Re-export key types
pub use builder::FunctionBuilder;
pub use catalog::Folder;
pub use codec::{DecodeWarning, Decoded, EncodedFunction, EncodedValue, FunctionCodec, SchemaVariant};
pub use config::{HistoryConfig, LayoutConfig};
pub use engine::{ActionData, DataPosition};
pub use error::{ActionError, CodecError, EditError, ExecutionError, Result};
pub use events::{EventError, EventSink, ExecutionEvent, NullEventSink, StepCallback, VecEventSink};
pub use function::{
    Function, Implementation, NativeFn, Signature, INPUT_FUNCTION_ID, OUTPUT_FUNCTION_ID,
};
pub use graph::{Endpoint, Graph, Node, NodeId, Position, PositionalWire, Wire, WireId};
pub use parameter::Parameter;
pub use registry::{JsonType, TypeRegistry, ValueType};
pub use undo::UndoStack;
pub use validation::{validate_function, ValidationError};
pub use value::{ControlFlow, TypeTag, Value};
