//! Number functions
//!
//! Arithmetic, comparisons and conversion to text. Missing or mistyped
//! operands fall back to the operation's neutral value (0 for addition,
//! subtraction and comparisons, 1 for multiplication and division).

use action_engine::{Folder, Function, Parameter, TypeTag, Value};

pub const ADD_ID: &str = "standard-actions.add-numbers";
pub const SUBTRACT_ID: &str = "standard-actions.subtract-numbers";
pub const MULTIPLY_ID: &str = "standard-actions.multiply-numbers";
pub const DIVIDE_ID: &str = "standard-actions.divide-numbers";
pub const EQUAL_ID: &str = "standard-actions.equal-numbers";
pub const GREATER_THAN_ID: &str = "standard-actions.greater-than";
pub const TO_TEXT_ID: &str = "standard-actions.number-to-text";

fn operand(inputs: &[Value], index: usize, default: f64) -> f64 {
    inputs.get(index).and_then(Value::as_number).unwrap_or(default)
}

fn two_numbers() -> Vec<Parameter> {
    vec![
        Parameter::new("Number 1", TypeTag::NUMBER),
        Parameter::new("Number 2", TypeTag::NUMBER),
    ]
}

fn binary(
    id: &str,
    name: &str,
    description: &str,
    output: Parameter,
    op: fn(&[Value]) -> Value,
) -> Function {
    Function::native(id, name, two_numbers(), vec![output], move |inputs: &[Value]| {
        vec![op(inputs)]
    })
    .with_description(description)
}

pub fn add() -> Function {
    binary(
        ADD_ID,
        "Add",
        "Add two numbers.",
        Parameter::new("Sum", TypeTag::NUMBER),
        |inputs| Value::Number(operand(inputs, 0, 0.0) + operand(inputs, 1, 0.0)),
    )
}

pub fn subtract() -> Function {
    binary(
        SUBTRACT_ID,
        "Subtract",
        "Subtract two numbers.",
        Parameter::new("Difference", TypeTag::NUMBER),
        |inputs| Value::Number(operand(inputs, 0, 0.0) - operand(inputs, 1, 0.0)),
    )
}

pub fn multiply() -> Function {
    binary(
        MULTIPLY_ID,
        "Multiply",
        "Multiply two numbers.",
        Parameter::new("Product", TypeTag::NUMBER),
        |inputs| Value::Number(operand(inputs, 0, 1.0) * operand(inputs, 1, 1.0)),
    )
}

/// Division by zero divides by one instead
pub fn divide() -> Function {
    binary(
        DIVIDE_ID,
        "Divide",
        "Divide two numbers.",
        Parameter::new("Quotient", TypeTag::NUMBER),
        |inputs| {
            let divisor = match operand(inputs, 1, 1.0) {
                d if d == 0.0 => 1.0,
                d => d,
            };
            Value::Number(operand(inputs, 0, 1.0) / divisor)
        },
    )
}

pub fn equal() -> Function {
    binary(
        EQUAL_ID,
        "Equal",
        "Check if two numbers are equal.",
        Parameter::new("Equal", TypeTag::BOOLEAN),
        |inputs| Value::Boolean(operand(inputs, 0, 0.0) == operand(inputs, 1, 0.0)),
    )
}

pub fn greater_than() -> Function {
    binary(
        GREATER_THAN_ID,
        "Greater Than",
        "Check if the first number is greater than the second number.",
        Parameter::new("Comparison", TypeTag::BOOLEAN),
        |inputs| Value::Boolean(operand(inputs, 0, 0.0) > operand(inputs, 1, 0.0)),
    )
}

/// Whole numbers are written without a fractional part
pub fn to_text() -> Function {
    Function::native(
        TO_TEXT_ID,
        "Number to Text",
        vec![Parameter::new("Number", TypeTag::NUMBER)],
        vec![Parameter::new("Text", TypeTag::TEXT)],
        |inputs: &[Value]| vec![Value::Text(format_number(operand(inputs, 0, 0.0)))],
    )
    .with_description("Convert a number into a text.")
}

pub(crate) fn format_number(number: f64) -> String {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        (number as i64).to_string()
    } else {
        number.to_string()
    }
}

pub fn folders() -> Vec<Folder<Function>> {
    vec![
        Folder::new(
            "Number Operators",
            vec![add(), subtract(), multiply(), divide()],
        ),
        Folder::new("Number Relations", vec![equal(), greater_than()]),
        Folder::new("Convert Number", vec![to_text()]),
    ]
}
