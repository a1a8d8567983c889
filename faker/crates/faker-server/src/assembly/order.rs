//! Root fields resolve concurrently and are collected as they finish, so a
//! proxied field can end up behind faster faked ones. The response data is put
//! back into the order of the operation's selection set.

use std::collections::HashSet;

use async_graphql::{Name, Value};
use async_graphql_parser::{
    types::{DocumentOperations, ExecutableDocument, Selection, SelectionSet},
    Positioned,
};
use indexmap::IndexSet;

/// The response keys of the root selection set of the executed operation, in
/// document order. `None` if the query does not parse or names no operation.
pub(super) fn root_response_keys(query: &str, operation_name: Option<&str>) -> Option<IndexSet<String>> {
    let document = async_graphql_parser::parse_query(query).ok()?;

    let operation = match (&document.operations, operation_name) {
        (DocumentOperations::Single(operation), _) => operation,
        (DocumentOperations::Multiple(operations), Some(name)) => operations.get(name)?,
        (DocumentOperations::Multiple(operations), None) if operations.len() == 1 => operations.values().next()?,
        (DocumentOperations::Multiple(_), None) => return None,
    };

    let mut keys = IndexSet::new();
    let mut visited = HashSet::new();

    collect_keys(&document, &operation.node.selection_set, &mut visited, &mut keys);

    Some(keys)
}

fn collect_keys<'a>(
    document: &'a ExecutableDocument,
    selection_set: &'a Positioned<SelectionSet>,
    visited: &mut HashSet<&'a str>,
    keys: &mut IndexSet<String>,
) {
    for selection in &selection_set.node.items {
        match &selection.node {
            Selection::Field(field) => {
                keys.insert(field.node.response_key().node.to_string());
            }
            Selection::InlineFragment(fragment) => {
                collect_keys(document, &fragment.node.selection_set, visited, keys);
            }
            Selection::FragmentSpread(spread) => {
                let name = spread.node.fragment_name.node.as_str();

                if !visited.insert(name) {
                    continue;
                }

                if let Some(fragment) = document.fragments.get(&spread.node.fragment_name.node) {
                    collect_keys(document, &fragment.node.selection_set, visited, keys);
                }
            }
        }
    }
}

/// Sorts the entries of `data` by their position in `keys`. Unknown keys keep
/// their relative order at the end.
pub(super) fn reorder(data: &mut Value, keys: &IndexSet<String>) {
    let Value::Object(fields) = data else {
        return;
    };

    let position = |key: &Name| keys.get_index_of(key.as_str()).unwrap_or(usize::MAX);

    fields.sort_by(|left, _, right, _| position(left).cmp(&position(right)));
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn keys(query: &str, operation_name: Option<&str>) -> Vec<String> {
        root_response_keys(query, operation_name)
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn keys_follow_the_document() {
        let query = r#"
            query Orders { a: user(id: "1") { id } ...Root ... on Query { banner } hello }
            query Other { other }
            fragment Root on Query { count ...Root }
        "#;

        assert_eq!(vec!["a", "count", "banner", "hello"], keys(query, Some("Orders")));
        assert_eq!(vec!["other"], keys(query, Some("Other")));
        assert!(root_response_keys(query, None).is_none());
        assert!(root_response_keys("{ broken", None).is_none());
    }

    #[test]
    fn data_is_sorted_by_selection() {
        let mut data = Value::from_json(json!({ "banner": "hi", "extra": 1, "user": { "id": "1" } })).unwrap();

        reorder(&mut data, &root_response_keys("{ user { id } banner }", None).unwrap());

        let order: Vec<_> = match &data {
            Value::Object(fields) => fields.keys().map(|key| key.as_str().to_owned()).collect(),
            _ => Vec::new(),
        };

        assert_eq!(vec!["user", "banner", "extra"], order);
    }
}
