//! Action Nodes - built-in functions for the action engine
//!
//! Every function is native and grouped into folders the way an editor
//! palette shows them. [`default_catalog`] returns the complete roster,
//! including one merge function per registered value type.

pub mod boolean;
pub mod control;
pub mod merge;
pub mod number;
pub mod text;

use action_engine::{Folder, Function, TypeRegistry};

/// All built-in folders, ready to hand to a composite function
pub fn default_catalog(registry: &TypeRegistry) -> Vec<Folder<Function>> {
    let mut folders = number::folders();
    folders.extend(text::folders());
    folders.extend(boolean::folders());
    folders.extend(control::folders());
    folders.extend(merge::folders(registry));
    log::debug!(
        "Built default catalog with {} folders for {} value types",
        folders.len(),
        registry.len()
    );
    folders
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_engine::{catalog, ExecutionError, FunctionBuilder, TypeTag, Value};

    #[test]
    fn test_catalog_folders() {
        let registry = TypeRegistry::with_builtins();
        let folders = default_catalog(&registry);
        let titles: Vec<&str> = folders.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Number Operators",
                "Number Relations",
                "Convert Number",
                "Text Operators",
                "Text Relations",
                "Convert Text",
                "Logical Operators",
                "Convert Boolean",
                "Convert Control Flow",
                "Merge Flow",
            ]
        );
        assert_eq!(catalog::flatten(&folders).count(), 7 + 3 + 4 + 1 + 4);
    }

    #[test]
    fn test_custom_add() {
        let registry = TypeRegistry::with_builtins();
        let function = FunctionBuilder::new("custom-add", "Custom Add")
            .input("A", TypeTag::NUMBER)
            .input("B", TypeTag::NUMBER)
            .output("Sum", TypeTag::NUMBER)
            .folders(default_catalog(&registry))
            .node(number::ADD_ID)
            .wire((0, 1), (1, 1))
            .wire((0, 2), (1, 2))
            .wire((1, 1), (2, 1))
            .build()
            .unwrap();

        assert_eq!(
            function.run(&[Value::Number(1.0), Value::Number(2.0)]).unwrap(),
            vec![Value::Number(3.0)]
        );
    }

    #[test]
    fn test_boolean_gates_a_branch() {
        let registry = TypeRegistry::with_builtins();
        // greater-than -> boolean-to-control-flow -> gated text node -> output
        let function = FunctionBuilder::new("describe", "Describe")
            .input("A", TypeTag::NUMBER)
            .input("B", TypeTag::NUMBER)
            .output("Text", TypeTag::TEXT)
            .folders(default_catalog(&registry))
            .node(number::GREATER_THAN_ID)
            .node(boolean::TO_CONTROL_FLOW_ID)
            .node(text::ADD_ID)
            .with_value(1, "greater")
            .with_value(2, "")
            .wire((0, 1), (1, 1))
            .wire((0, 2), (1, 2))
            .wire((1, 1), (2, 1))
            .wire((2, 1), (3, 0))
            .wire((3, 1), (4, 1))
            .build()
            .unwrap();

        assert_eq!(
            function.run(&[Value::Number(2.0), Value::Number(1.0)]).unwrap(),
            vec![Value::from("greater")]
        );
        assert_eq!(
            function.run(&[Value::Number(1.0), Value::Number(2.0)]),
            Err(ExecutionError::EmptyIteration { node: None })
        );
    }

    #[test]
    fn test_merge_joins_alternative_branches() {
        let registry = TypeRegistry::with_builtins();
        // Only one of the two gated text nodes runs; the merge forwards it
        let function = FunctionBuilder::new("pick", "Pick")
            .input("Flag", TypeTag::BOOLEAN)
            .output("Text", TypeTag::TEXT)
            .folders(default_catalog(&registry))
            .node(boolean::TO_CONTROL_FLOW_ID)
            .node(boolean::NOT_ID)
            .node(boolean::TO_CONTROL_FLOW_ID)
            .node(text::ADD_ID)
            .with_value(1, "yes")
            .with_value(2, "")
            .node(text::ADD_ID)
            .with_value(1, "no")
            .with_value(2, "")
            .node(merge::merge_id(&TypeTag::TEXT))
            .wire((0, 1), (1, 1))
            .wire((0, 1), (2, 1))
            .wire((2, 1), (3, 1))
            .wire((1, 1), (4, 0))
            .wire((3, 1), (5, 0))
            .wire((4, 1), (6, 1))
            .wire((5, 1), (6, 2))
            .wire((6, 1), (7, 1))
            .build()
            .unwrap();

        assert_eq!(
            function.run(&[Value::Boolean(true)]).unwrap(),
            vec![Value::from("yes")]
        );
        assert_eq!(
            function.run(&[Value::Boolean(false)]).unwrap(),
            vec![Value::from("no")]
        );
    }
}
