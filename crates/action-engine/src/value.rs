//! Runtime values flowing along wires
//!
//! Four value kinds are built in (control flow, number, text, boolean).
//! Hosts add their own kinds as [`Value::Custom`] payloads tagged with a
//! [`TypeTag`] that is registered in the [`TypeRegistry`](crate::TypeRegistry).

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable serialization tag of a value type, unique within a registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTag(Cow<'static, str>);

impl TypeTag {
    pub const CONTROL_FLOW: TypeTag = TypeTag::from_static("control-flow");
    pub const NUMBER: TypeTag = TypeTag::from_static("number");
    pub const TEXT: TypeTag = TypeTag::from_static("text");
    pub const BOOLEAN: TypeTag = TypeTag::from_static("boolean");

    pub const fn from_static(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }

    pub fn new(tag: impl Into<String>) -> Self {
        Self(Cow::Owned(tag.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_control_flow(&self) -> bool {
        self.as_str() == Self::CONTROL_FLOW.as_str()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for TypeTag {
    fn from(tag: &'static str) -> Self {
        Self::from_static(tag)
    }
}

/// The implicit gating value carried in slot 0 of every function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlFlow {
    #[default]
    Signal,
    NoSignal,
}

impl ControlFlow {
    pub fn is_signal(self) -> bool {
        self == Self::Signal
    }
}

impl From<bool> for ControlFlow {
    fn from(signal: bool) -> Self {
        if signal {
            Self::Signal
        } else {
            Self::NoSignal
        }
    }
}

/// A typed runtime datum
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    ControlFlow(ControlFlow),
    Number(f64),
    Text(String),
    Boolean(bool),
    /// Host-defined value type
    Custom {
        tag: TypeTag,
        data: serde_json::Value,
    },
}

impl Value {
    pub const SIGNAL: Value = Value::ControlFlow(ControlFlow::Signal);
    pub const NO_SIGNAL: Value = Value::ControlFlow(ControlFlow::NoSignal);

    /// Tag of the value type this value belongs to
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::ControlFlow(_) => TypeTag::CONTROL_FLOW,
            Self::Number(_) => TypeTag::NUMBER,
            Self::Text(_) => TypeTag::TEXT,
            Self::Boolean(_) => TypeTag::BOOLEAN,
            Self::Custom { tag, .. } => tag.clone(),
        }
    }

    pub fn as_control_flow(&self) -> Option<ControlFlow> {
        match self {
            Self::ControlFlow(flow) => Some(*flow),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(boolean) => Some(*boolean),
            _ => None,
        }
    }

    /// True only for `ControlFlow::Signal`
    pub fn is_signal(&self) -> bool {
        matches!(self, Self::ControlFlow(ControlFlow::Signal))
    }
}

impl From<ControlFlow> for Value {
    fn from(flow: ControlFlow) -> Self {
        Self::ControlFlow(flow)
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Self::Number(number)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<bool> for Value {
    fn from(boolean: bool) -> Self {
        Self::Boolean(boolean)
    }
}
