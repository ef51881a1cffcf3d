//! Control flow conversion

use action_engine::{Folder, Function, Parameter, TypeTag, Value};

pub const TO_BOOLEAN_ID: &str = "standard-actions.control-flow-to-boolean";

/// Turn the incoming control flow into a boolean
///
/// The only input is the implicit control flow slot. A node runs only on
/// `signal`, so an executed node always reports `true`.
pub fn to_boolean() -> Function {
    Function::native(
        TO_BOOLEAN_ID,
        "Control Flow to Boolean",
        Vec::new(),
        vec![Parameter::new("Boolean", TypeTag::BOOLEAN)],
        |inputs: &[Value]| {
            let signal = inputs
                .first()
                .and_then(Value::as_control_flow)
                .unwrap_or_default()
                .is_signal();
            vec![Value::Boolean(signal)]
        },
    )
    .with_description("Convert the control flow into a boolean.")
}

pub fn folders() -> Vec<Folder<Function>> {
    vec![Folder::new("Convert Control Flow", vec![to_boolean()])]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_boolean() {
        let function = to_boolean();
        assert_eq!(function.input().len(), 1);
        assert_eq!(function.run(&[]).unwrap(), vec![Value::Boolean(true)]);
    }
}
