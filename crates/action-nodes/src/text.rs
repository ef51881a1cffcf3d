//! Text functions

use action_engine::{Folder, Function, Parameter, TypeTag, Value};

pub const ADD_ID: &str = "standard-actions.add-text";
pub const EQUAL_ID: &str = "standard-actions.equal-text";
pub const TO_NUMBER_ID: &str = "standard-actions.text-to-number";

fn text(inputs: &[Value], index: usize) -> &str {
    inputs.get(index).and_then(Value::as_text).unwrap_or_default()
}

fn two_texts() -> Vec<Parameter> {
    vec![
        Parameter::new("Text 1", TypeTag::TEXT),
        Parameter::new("Text 2", TypeTag::TEXT),
    ]
}

/// Concatenate two texts
pub fn add() -> Function {
    Function::native(
        ADD_ID,
        "Add Text",
        two_texts(),
        vec![Parameter::new("Text", TypeTag::TEXT)],
        |inputs: &[Value]| vec![Value::Text(format!("{}{}", text(inputs, 0), text(inputs, 1)))],
    )
    .with_description("Combine two texts.")
}

pub fn equal() -> Function {
    Function::native(
        EQUAL_ID,
        "Equal",
        two_texts(),
        vec![Parameter::new("Comparison", TypeTag::BOOLEAN)],
        |inputs: &[Value]| vec![Value::Boolean(text(inputs, 0) == text(inputs, 1))],
    )
    .with_description("Check if two texts are equal.")
}

/// Text that does not parse as a number converts to 0
pub fn to_number() -> Function {
    Function::native(
        TO_NUMBER_ID,
        "Text to Number",
        vec![Parameter::new("Text", TypeTag::TEXT)],
        vec![Parameter::new("Number", TypeTag::NUMBER)],
        |inputs: &[Value]| vec![Value::Number(text(inputs, 0).parse().unwrap_or(0.0))],
    )
    .with_description("Convert a text into a number.")
}

pub fn folders() -> Vec<Folder<Function>> {
    vec![
        Folder::new("Text Operators", vec![add()]),
        Folder::new("Text Relations", vec![equal()]),
        Folder::new("Convert Text", vec![to_number()]),
    ]
}
