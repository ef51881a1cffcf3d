//! Named folders grouping callable functions

use uuid::Uuid;

use crate::function::Function;

/// A titled group of items, used to organize a function roster
#[derive(Debug, Clone)]
pub struct Folder<T> {
    pub id: Uuid,
    pub title: String,
    pub content: Vec<T>,
}

impl<T> Folder<T> {
    pub fn new(title: impl Into<String>, content: Vec<T>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content,
        }
    }
}

/// Iterate every function of a grouped roster in folder order
pub fn flatten(folders: &[Folder<Function>]) -> impl Iterator<Item = &Function> {
    folders.iter().flat_map(|folder| folder.content.iter())
}

/// Find a function by id in a grouped roster
pub fn find<'a>(folders: &'a [Folder<Function>], id: &str) -> Option<&'a Function> {
    flatten(folders).find(|function| function.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn constant(id: &str) -> Function {
        Function::native(id, id, Vec::new(), Vec::new(), |_: &[Value]| Vec::new())
    }

    #[test]
    fn test_flatten_keeps_folder_order() {
        let folders = vec![
            Folder::new("First", vec![constant("a"), constant("b")]),
            Folder::new("Second", vec![constant("c")]),
        ];
        let ids: Vec<&str> = flatten(&folders).map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_find() {
        let folders = vec![Folder::new("Only", vec![constant("a")])];
        assert!(find(&folders, "a").is_some());
        assert!(find(&folders, "missing").is_none());
    }
}
