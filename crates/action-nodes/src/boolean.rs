//! Boolean functions
//!
//! Logical operators and the conversion from a boolean to control flow.

use action_engine::{ControlFlow, Folder, Function, Parameter, TypeTag, Value};

pub const AND_ID: &str = "standard-actions.and";
pub const OR_ID: &str = "standard-actions.or";
pub const NOT_ID: &str = "standard-actions.not";
pub const TO_CONTROL_FLOW_ID: &str = "standard-actions.boolean-to-control-flow";

fn flag(inputs: &[Value], index: usize, default: bool) -> bool {
    inputs.get(index).and_then(Value::as_boolean).unwrap_or(default)
}

fn two_booleans() -> Vec<Parameter> {
    vec![
        Parameter::new("Boolean 1", TypeTag::BOOLEAN),
        Parameter::new("Boolean 2", TypeTag::BOOLEAN),
    ]
}

fn one_boolean() -> Vec<Parameter> {
    vec![Parameter::new("Boolean", TypeTag::BOOLEAN)]
}

pub fn and() -> Function {
    Function::native(AND_ID, "And", two_booleans(), one_boolean(), |inputs: &[Value]| {
        vec![Value::Boolean(flag(inputs, 0, false) && flag(inputs, 1, false))]
    })
    .with_description("The output is only true if both of the inputs are true.")
}

pub fn or() -> Function {
    Function::native(OR_ID, "Or", two_booleans(), one_boolean(), |inputs: &[Value]| {
        vec![Value::Boolean(flag(inputs, 0, false) || flag(inputs, 1, false))]
    })
    .with_description("The output is true if at least one of the inputs is true.")
}

pub fn not() -> Function {
    Function::native(NOT_ID, "Not", one_boolean(), one_boolean(), |inputs: &[Value]| {
        vec![Value::Boolean(!flag(inputs, 0, true))]
    })
    .with_description("Reverse the logical state of the input.")
}

/// Turn a boolean into a control flow value
///
/// Control flow parameters are never part of the data parameter list, so
/// the produced value occupies output slot 1 without a declared parameter.
/// Wire it positionally into the control flow slot of the node to gate.
pub fn to_control_flow() -> Function {
    Function::native(
        TO_CONTROL_FLOW_ID,
        "Boolean to Control Flow",
        one_boolean(),
        Vec::new(),
        |inputs: &[Value]| vec![Value::ControlFlow(ControlFlow::from(flag(inputs, 0, false)))],
    )
    .with_description("Convert a boolean into the control flow.")
}

pub fn folders() -> Vec<Folder<Function>> {
    vec![
        Folder::new("Logical Operators", vec![and(), or(), not()]),
        Folder::new("Convert Boolean", vec![to_control_flow()]),
    ]
}
