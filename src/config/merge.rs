//! Layer merging for settings maps.
//!
//! Merging happens at the top level only: a key present in the overlay
//! replaces the base entry wholesale. Lists and nested maps are never
//! combined, so a later config file that sets `taxonomies` discards every
//! entry an earlier file or default put there.

use super::value::ValueMap;

/// Merge `overlay` on top of `base`, with `overlay` winning on every key it has.
///
/// # Example
/// ```
/// use drouet::config::{Value, ValueMap, replace_merge};
///
/// let mut base = ValueMap::new();
/// base.insert("title".into(), Value::from("a"));
/// base.insert("tags".into(), Value::from(vec!["x".to_string(), "y".to_string()]));
/// let mut overlay = ValueMap::new();
/// overlay.insert("tags".into(), Value::from(vec!["z".to_string()]));
///
/// let merged = replace_merge(base, overlay);
/// assert_eq!(merged["title"], Value::from("a"));
/// assert_eq!(merged["tags"], Value::from(vec!["z".to_string()]));
/// ```
pub fn replace_merge(mut base: ValueMap, overlay: ValueMap) -> ValueMap {
    for (key, value) in overlay {
        base.insert(key, value);
    }
    base
}

/// Merge layers in order, later layers taking precedence.
pub fn replace_merge_all(layers: impl IntoIterator<Item = ValueMap>) -> ValueMap {
    layers.into_iter().fold(ValueMap::new(), replace_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::value::Value;

    fn map(entries: &[(&str, Value)]) -> ValueMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_scalar_override() {
        let base = map(&[("paginate", Value::Int(10)), ("title", Value::from("a"))]);
        let overlay = map(&[("paginate", Value::Int(20))]);
        let result = replace_merge(base, overlay);
        assert_eq!(result["paginate"], Value::Int(20));
        assert_eq!(result["title"], Value::from("a"));
    }

    #[test]
    fn test_maps_replaced_not_merged() {
        let base = map(&[(
            "taxonomies",
            Value::Map(map(&[("tag", "tags".into()), ("category", "categories".into())])),
        )]);
        let overlay = map(&[(
            "taxonomies",
            Value::Map(map(&[("series", "series".into())])),
        )]);
        let result = replace_merge(base, overlay);
        let taxonomies = result["taxonomies"].as_map().unwrap();
        assert_eq!(taxonomies.len(), 1);
        assert!(taxonomies.contains_key("series"));
    }

    #[test]
    fn test_lists_replaced_not_concatenated() {
        let base = map(&[("ignorefiles", Value::from(vec!["a".to_string(), "b".to_string()]))]);
        let overlay = map(&[("ignorefiles", Value::from(vec!["c".to_string()]))]);
        let result = replace_merge(base, overlay);
        assert_eq!(result["ignorefiles"], Value::from(vec!["c".to_string()]));
    }

    #[test]
    fn test_merge_all_last_wins() {
        let layers = vec![
            map(&[("a", Value::Int(1))]),
            map(&[("b", Value::Int(2))]),
            map(&[("a", Value::Int(3)), ("c", Value::Int(4))]),
        ];
        let result = replace_merge_all(layers);
        assert_eq!(
            result,
            map(&[("a", Value::Int(3)), ("b", Value::Int(2)), ("c", Value::Int(4))])
        );
    }

    #[test]
    fn test_overlay_replaces_scalar_with_map() {
        let base = map(&[("value", Value::Int(42))]);
        let overlay = map(&[("value", Value::Map(map(&[("nested", true.into())])))]);
        let result = replace_merge(base, overlay);
        assert!(result["value"].as_map().is_some());
    }
}
