//! Low-stock alert decision and message formatting
//!
//! The notifier feeds every change-stream record through [`should_alert`];
//! the rule is deliberately dumb: alert on inserts and updates that leave the
//! count under the threshold, stay silent on everything else.

use crate::defaults::LOW_STOCK_THRESHOLD;
use crate::item::InventoryItem;

/// Kind of change-stream record, as reported by the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEventKind {
    Insert,
    Modify,
    Remove,
}

impl StreamEventKind {
    /// Parse the event name carried on a stream record. Unknown names map to
    /// `None` and are ignored by the notifier.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "INSERT" => Some(Self::Insert),
            "MODIFY" => Some(Self::Modify),
            "REMOVE" => Some(Self::Remove),
            _ => None,
        }
    }
}

/// Whether one stream record warrants a notification.
///
/// Only inserts and modifications can alert; removals never do, and neither
/// does any count at or above [`LOW_STOCK_THRESHOLD`].
pub fn should_alert(kind: StreamEventKind, count: i64) -> bool {
    matches!(kind, StreamEventKind::Insert | StreamEventKind::Modify)
        && count < LOW_STOCK_THRESHOLD
}

/// Subject line for a low-stock notification.
pub fn alert_subject(store: &str) -> String {
    format!("Low stock alert - {store}")
}

/// Message body for a low-stock notification.
pub fn alert_message(item: &InventoryItem) -> String {
    format!(
        "Low stock detected!\n\n\
         Store: {}\n\
         Item: {}\n\
         Remaining: {} units\n\n\
         Restock soon to avoid running out.",
        item.store, item.item, item.count
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modify_below_threshold_alerts() {
        // 80 -> 30 crosses the threshold, 30 -> 10 stays under it; both alert.
        assert!(should_alert(StreamEventKind::Modify, 30));
        assert!(should_alert(StreamEventKind::Modify, 10));
    }

    #[test]
    fn insert_below_threshold_alerts() {
        assert!(should_alert(StreamEventKind::Insert, 5));
    }

    #[test]
    fn remove_never_alerts() {
        assert!(!should_alert(StreamEventKind::Remove, 1));
    }

    #[test]
    fn threshold_boundary() {
        assert!(should_alert(StreamEventKind::Modify, LOW_STOCK_THRESHOLD - 1));
        assert!(!should_alert(StreamEventKind::Modify, LOW_STOCK_THRESHOLD));
        assert!(!should_alert(StreamEventKind::Insert, LOW_STOCK_THRESHOLD + 1));
    }

    #[test]
    fn parses_stream_event_names() {
        assert_eq!(StreamEventKind::parse("INSERT"), Some(StreamEventKind::Insert));
        assert_eq!(StreamEventKind::parse("MODIFY"), Some(StreamEventKind::Modify));
        assert_eq!(StreamEventKind::parse("REMOVE"), Some(StreamEventKind::Remove));
        assert_eq!(StreamEventKind::parse("insert"), None);
        assert_eq!(StreamEventKind::parse(""), None);
    }

    #[test]
    fn message_carries_store_item_and_count() {
        let item = InventoryItem::new("Berlin", "Laptop", 12);
        let body = alert_message(&item);
        assert!(body.contains("Berlin"));
        assert!(body.contains("Laptop"));
        assert!(body.contains("12"));
        assert_eq!(alert_subject("Berlin"), "Low stock alert - Berlin");
    }
}
