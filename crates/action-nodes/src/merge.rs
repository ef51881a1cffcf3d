//! Merge functions
//!
//! One merge function per registered value type. A merge node fires as soon
//! as either of its inputs arrives, joining two alternative branches.

use action_engine::{Folder, Function, TypeRegistry, TypeTag};

/// Id of the merge function generated for a value type
pub fn merge_id(tag: &TypeTag) -> String {
    format!("merge-{}", tag)
}

/// Merge functions for every type in the registry, text first
pub fn functions(registry: &TypeRegistry) -> Vec<Function> {
    const ORDER: [TypeTag; 4] = [
        TypeTag::TEXT,
        TypeTag::NUMBER,
        TypeTag::BOOLEAN,
        TypeTag::CONTROL_FLOW,
    ];
    let mut types: Vec<_> = registry.types().collect();
    // Host types keep their registration order after the built-ins
    types.sort_by_key(|value_type| {
        let tag = value_type.tag();
        ORDER.iter().position(|known| *known == tag).unwrap_or(ORDER.len())
    });
    types
        .into_iter()
        .map(|value_type| Function::merge(&**value_type))
        .collect()
}

pub fn folders(registry: &TypeRegistry) -> Vec<Folder<Function>> {
    vec![Folder::new("Merge Flow", functions(registry))]
}
