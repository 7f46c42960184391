//! HTTP route resolution for the query API
//!
//! The API exposes two routes: the collection (`GET /items`) and a single
//! store (`GET /items/{store}`). The gateway passes the store as a path
//! parameter; the raw path decides between "collection" and "unknown" when no
//! parameter is present.

/// What one HTTP request is asking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTarget {
    /// Every record in the table.
    AllItems,
    /// Records for one store.
    Store(String),
    /// Anything else; answered with a 404 body.
    NotFound,
}

/// Resolve a request to a query target.
///
/// A non-empty `store` path parameter wins; otherwise a path ending in
/// `/items` (with or without a stage prefix) addresses the collection, and a
/// path routed through `/items/` yields its last segment as the store.
pub fn resolve_target(path_store: Option<&str>, raw_path: &str) -> QueryTarget {
    if let Some(store) = path_store.filter(|s| !s.is_empty()) {
        return QueryTarget::Store(store.to_string());
    }
    if raw_path.ends_with("/items") {
        return QueryTarget::AllItems;
    }
    if raw_path.contains("/items/") {
        let store = raw_path.rsplit('/').next().unwrap_or("");
        if !store.is_empty() {
            return QueryTarget::Store(store.to_string());
        }
    }
    QueryTarget::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_parameter_wins() {
        assert_eq!(
            resolve_target(Some("Berlin"), "/prod/items/Berlin"),
            QueryTarget::Store("Berlin".to_string())
        );
    }

    #[test]
    fn collection_with_and_without_stage_prefix() {
        assert_eq!(resolve_target(None, "/prod/items"), QueryTarget::AllItems);
        assert_eq!(resolve_target(None, "/items"), QueryTarget::AllItems);
    }

    #[test]
    fn empty_store_parameter_falls_back_to_path() {
        assert_eq!(resolve_target(Some(""), "/prod/items"), QueryTarget::AllItems);
    }

    #[test]
    fn raw_path_supplies_the_store_when_no_parameter_arrives() {
        assert_eq!(
            resolve_target(None, "/prod/items/Berlin"),
            QueryTarget::Store("Berlin".to_string())
        );
        assert_eq!(
            resolve_target(None, "/items/Madrid"),
            QueryTarget::Store("Madrid".to_string())
        );
    }

    #[test]
    fn unknown_paths_are_not_found() {
        assert_eq!(resolve_target(None, "/prod/stores"), QueryTarget::NotFound);
        assert_eq!(resolve_target(None, "/prod/items/"), QueryTarget::NotFound);
        assert_eq!(resolve_target(None, ""), QueryTarget::NotFound);
    }
}
