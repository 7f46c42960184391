//! Conversions between inventory items and table attribute maps

use aws_sdk_dynamodb::types::AttributeValue;
use inventory_common::item::{ATTR_COUNT, ATTR_ITEM, ATTR_STORE};
use inventory_common::InventoryItem;
use std::collections::HashMap;

/// Attribute map for writing one item.
pub fn item_to_attrs(item: &InventoryItem) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (ATTR_STORE.to_string(), AttributeValue::S(item.store.clone())),
        (ATTR_ITEM.to_string(), AttributeValue::S(item.item.clone())),
        (ATTR_COUNT.to_string(), AttributeValue::N(item.count.to_string())),
    ])
}

/// Read one item back from a scan or query result row.
///
/// Returns `None` when the row is missing a field or carries a non-numeric
/// count; callers skip such rows rather than failing the response.
pub fn attrs_to_item(attrs: &HashMap<String, AttributeValue>) -> Option<InventoryItem> {
    let store = attrs.get(ATTR_STORE)?.as_s().ok()?;
    let item = attrs.get(ATTR_ITEM)?.as_s().ok()?;
    let count = attrs.get(ATTR_COUNT)?.as_n().ok()?.parse::<i64>().ok()?;
    Some(InventoryItem::new(store, item, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_attribute_map() {
        let item = InventoryItem::new("Berlin", "Laptop", 42);
        let attrs = item_to_attrs(&item);
        assert_eq!(attrs_to_item(&attrs), Some(item));
    }

    #[test]
    fn rejects_rows_with_missing_or_malformed_fields() {
        let item = InventoryItem::new("Berlin", "Laptop", 42);
        let mut attrs = item_to_attrs(&item);
        attrs.insert(ATTR_COUNT.to_string(), AttributeValue::N("many".to_string()));
        assert_eq!(attrs_to_item(&attrs), None);

        let mut attrs = item_to_attrs(&item);
        attrs.remove(ATTR_STORE);
        assert_eq!(attrs_to_item(&attrs), None);
    }
}
