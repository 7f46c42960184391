//! Deterministic resource names derived from the deployment suffix.
//!
//! Re-runs must converge on the same physical resources, so every name is a
//! pure function of the suffix. The suffix itself comes from the deployment
//! record when one exists; a fresh environment always starts from
//! [`DEFAULT_SUFFIX`], never from a random token.

/// Suffix used when no deployment record exists yet.
pub const DEFAULT_SUFFIX: &str = "inventory-main";

/// Fixed table name; the functions address it via their environment.
pub const TABLE_NAME: &str = "Inventory";

/// The three function names, fixed so triggers and the record stay stable.
pub const FN_LOAD: &str = "load_inventory";
pub const FN_API: &str = "get_inventory_api";
pub const FN_NOTIFY: &str = "notify_low_stock";

/// Topic name, deliberately suffix-independent: alert subscribers should
/// survive environment renames.
pub const TOPIC_NAME: &str = "low-stock-inventory-main";

/// Fragment shared by every topic this tool may have created; teardown
/// sweeps by this fragment rather than the exact name.
pub const TOPIC_FRAGMENT: &str = "low-stock";

/// Privileged role adopted when the environment provides one.
pub const PREFERRED_ROLE: &str = "LabRole";

/// Every name the deployment uses, derived from one suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    pub suffix: String,
    pub bucket_uploads: String,
    pub bucket_web: String,
    pub table: String,
    pub role: String,
    pub api: String,
    pub topic: String,
}

impl ResourceNames {
    /// Derive all names for a suffix. Pure; no side effects.
    pub fn derive(suffix: &str) -> Self {
        Self {
            suffix: suffix.to_string(),
            bucket_uploads: format!("inventory-uploads-{suffix}"),
            bucket_web: format!("inventory-web-{suffix}"),
            table: TABLE_NAME.to_string(),
            role: format!("lambda-inventory-role-{suffix}"),
            api: format!("inventory-api-{suffix}"),
            topic: TOPIC_NAME.to_string(),
        }
    }

    /// The three function names in creation order.
    pub fn functions() -> [&'static str; 3] {
        [FN_LOAD, FN_API, FN_NOTIFY]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let a = ResourceNames::derive("inventory-main");
        let b = ResourceNames::derive("inventory-main");
        assert_eq!(a, b);
    }

    #[test]
    fn derives_the_expected_names() {
        let names = ResourceNames::derive("inventory-main");
        assert_eq!(names.bucket_uploads, "inventory-uploads-inventory-main");
        assert_eq!(names.bucket_web, "inventory-web-inventory-main");
        assert_eq!(names.table, "Inventory");
        assert_eq!(names.role, "lambda-inventory-role-inventory-main");
        assert_eq!(names.api, "inventory-api-inventory-main");
        assert_eq!(names.topic, "low-stock-inventory-main");
        assert_eq!(
            ResourceNames::functions(),
            ["load_inventory", "get_inventory_api", "notify_low_stock"]
        );
    }

    #[test]
    fn suffix_changes_only_the_qualified_names() {
        let names = ResourceNames::derive("lab-7");
        assert_eq!(names.bucket_uploads, "inventory-uploads-lab-7");
        assert_eq!(names.role, "lambda-inventory-role-lab-7");
        assert_eq!(names.api, "inventory-api-lab-7");
        // Fixed identities stay put.
        assert_eq!(names.table, TABLE_NAME);
        assert_eq!(names.topic, TOPIC_NAME);
    }

    #[test]
    fn topic_name_matches_the_teardown_fragment() {
        assert!(TOPIC_NAME.contains(TOPIC_FRAGMENT));
    }
}
