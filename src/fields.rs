use std::fmt::Display;

pub use crate::constants::fields::ITEM_FIELD_DELIMITER;
use crate::types::FieldName;

/// Canonical suffix of a per-item report field.
///
/// Workflow forms emit one field per tracked item, named
/// `<item><delimiter><suffix>` (for example `paracetamol_available`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemField {
    suffix: &'static str,
}

impl ItemField {
    /// Create a field key with a canonical static suffix.
    pub const fn new(suffix: &'static str) -> Self {
        Self { suffix }
    }

    /// Return the raw suffix.
    pub const fn as_str(&self) -> &'static str {
        self.suffix
    }

    /// Field name for `item` (e.g., "paracetamol_in").
    pub fn for_item(&self, item: impl Display) -> FieldName {
        format!("{}{}{}", item, ITEM_FIELD_DELIMITER, self.suffix)
    }

    /// Field name for `item` qualified by the originating form
    /// (e.g., "paracetamol_used_in_pnc_visit").
    pub fn for_item_in(&self, item: impl Display, form: impl Display) -> FieldName {
        format!(
            "{}{}{}{}{}",
            item, ITEM_FIELD_DELIMITER, self.suffix, ITEM_FIELD_DELIMITER, form
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::fields::{AVAILABLE, USED_IN};

    #[test]
    fn item_field_prefixes_the_item() {
        assert_eq!(AVAILABLE.for_item("paracetamol"), "paracetamol_available");
    }

    #[test]
    fn used_in_field_carries_the_originating_form() {
        assert_eq!(
            USED_IN.for_item_in("amoxicillin", "pnc_visit"),
            "amoxicillin_used_in_pnc_visit"
        );
    }

    #[test]
    fn item_field_new_and_as_str_work() {
        const CUSTOM: ItemField = ItemField::new("custom");
        assert_eq!(CUSTOM.as_str(), "custom");
        assert_eq!(CUSTOM.for_item(42), "42_custom");
    }
}
