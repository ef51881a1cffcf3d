//! Typed function parameters

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::TypeTag;

/// A named, typed slot of a function's input or output list
///
/// Identity is by `id`; wires address parameters by their position in the
/// list, not by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub id: Uuid,
    pub name: String,
    pub value_type: TypeTag,
}

impl Parameter {
    /// Id shared by every implicit control flow slot
    pub const CONTROL_FLOW_ID: Uuid = Uuid::from_u128(0x6f3c_1d2a_7b4e_4c1f_9a0d_5e2b_8c7f_0001);

    pub fn new(name: impl Into<String>, value_type: TypeTag) -> Self {
        Self::with_id(Uuid::new_v4(), name, value_type)
    }

    pub fn with_id(id: Uuid, name: impl Into<String>, value_type: TypeTag) -> Self {
        Self {
            id,
            name: name.into(),
            value_type,
        }
    }

    /// The implicit slot-0 parameter
    pub fn control_flow() -> Self {
        Self::with_id(Self::CONTROL_FLOW_ID, "Control Flow", TypeTag::CONTROL_FLOW)
    }

    pub fn is_control_flow(&self) -> bool {
        self.value_type.is_control_flow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let a = Parameter::new("A", TypeTag::NUMBER);
        let b = Parameter::new("A", TypeTag::NUMBER);
        assert_ne!(a.id, b.id);
        assert_ne!(a, b);
    }

    #[test]
    fn test_control_flow_parameter_is_stable() {
        assert_eq!(Parameter::control_flow(), Parameter::control_flow());
        assert!(Parameter::control_flow().is_control_flow());
    }

    #[test]
    fn test_serde_camel_case() {
        let parameter = Parameter::new("Value", TypeTag::TEXT);
        let json = serde_json::to_value(&parameter).unwrap();
        assert_eq!(json["valueType"], "text");
    }
}
