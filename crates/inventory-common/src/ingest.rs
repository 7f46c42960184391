//! CSV parsing with per-row error tolerance
//!
//! Uploaded files use the header `Store,Item,Count`. A malformed row (missing
//! field, empty name, non-integer count) is skipped without failing the rest
//! of the file, so one bad line never blocks an import.

use crate::item::{InventoryItem, ATTR_COUNT, ATTR_ITEM, ATTR_STORE};

/// Outcome of parsing one CSV file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CsvImport {
    /// Rows that parsed cleanly, in file order.
    pub items: Vec<InventoryItem>,
    /// Number of rows rejected.
    pub skipped: usize,
}

/// Parse an uploaded CSV file into inventory items.
///
/// Never fails outright: unreadable rows are counted in
/// [`CsvImport::skipped`]. A file without the expected header yields no items
/// and counts every data row as skipped.
pub fn parse_inventory_csv(data: &[u8]) -> CsvImport {
    let mut reader = csv::ReaderBuilder::new().from_reader(data);

    let columns = match reader.headers() {
        Ok(headers) => locate_columns(headers),
        Err(_) => None,
    };

    let mut import = CsvImport::default();
    for record in reader.records() {
        let Ok(record) = record else {
            import.skipped += 1;
            continue;
        };
        let Some((store_idx, item_idx, count_idx)) = columns else {
            import.skipped += 1;
            continue;
        };
        match parse_row(&record, store_idx, item_idx, count_idx) {
            Some(item) => import.items.push(item),
            None => import.skipped += 1,
        }
    }
    import
}

fn locate_columns(headers: &csv::StringRecord) -> Option<(usize, usize, usize)> {
    let find = |name: &str| headers.iter().position(|h| h.trim() == name);
    Some((find(ATTR_STORE)?, find(ATTR_ITEM)?, find(ATTR_COUNT)?))
}

fn parse_row(
    record: &csv::StringRecord,
    store_idx: usize,
    item_idx: usize,
    count_idx: usize,
) -> Option<InventoryItem> {
    let store = record.get(store_idx)?.trim();
    let item = record.get(item_idx)?.trim();
    if store.is_empty() || item.is_empty() {
        return None;
    }
    let count = record.get(count_idx)?.trim().parse::<i64>().ok()?;
    Some(InventoryItem::new(store, item, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_file() {
        let data = b"Store,Item,Count\nBerlin,Laptop,25\nMadrid,Mouse,120\n";
        let import = parse_inventory_csv(data);
        assert_eq!(
            import.items,
            vec![
                InventoryItem::new("Berlin", "Laptop", 25),
                InventoryItem::new("Madrid", "Mouse", 120),
            ]
        );
        assert_eq!(import.skipped, 0);
    }

    #[test]
    fn skips_only_the_malformed_row() {
        let data = b"Store,Item,Count\nBerlin,Laptop,25\nMadrid,Mouse,many\nBerlin,Screen,7\nMadrid,Desk,40\n";
        let import = parse_inventory_csv(data);
        assert_eq!(import.items.len(), 3);
        assert_eq!(import.skipped, 1);
    }

    #[test]
    fn skips_rows_with_missing_or_empty_fields() {
        let data = b"Store,Item,Count\n,Laptop,25\nBerlin,,10\nBerlin,Screen\nMadrid,Desk,40\n";
        let import = parse_inventory_csv(data);
        assert_eq!(import.items, vec![InventoryItem::new("Madrid", "Desk", 40)]);
        // Short row is a csv-level error, the rest fail field checks.
        assert_eq!(import.skipped, 3);
    }

    #[test]
    fn tolerates_whitespace_around_values() {
        let data = b"Store,Item,Count\n Berlin , Laptop , 25 \n";
        let import = parse_inventory_csv(data);
        assert_eq!(import.items, vec![InventoryItem::new("Berlin", "Laptop", 25)]);
    }

    #[test]
    fn file_without_expected_header_yields_nothing() {
        let data = b"Shop,Product,Qty\nBerlin,Laptop,25\n";
        let import = parse_inventory_csv(data);
        assert!(import.items.is_empty());
        assert_eq!(import.skipped, 1);
    }

    #[test]
    fn empty_input_is_empty_import() {
        let import = parse_inventory_csv(b"");
        assert!(import.items.is_empty());
        assert_eq!(import.skipped, 0);
    }

    #[test]
    fn negative_counts_are_kept() {
        let data = b"Store,Item,Count\nBerlin,Laptop,-3\n";
        let import = parse_inventory_csv(data);
        assert_eq!(import.items[0].count, -3);
    }
}
