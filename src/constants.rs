use crate::fields::ItemField;

/// Per-item field suffixes carried by stock monitoring reports.
pub mod fields {
    use super::ItemField;

    /// Separator between the item name and the field suffix (for example `paracetamol_in`).
    pub const ITEM_FIELD_DELIMITER: &str = "_";
    /// Quantity physically counted during a stock count.
    pub const AVAILABLE: ItemField = ItemField::new("available");
    /// Quantity brought in by a supply, discrepancy, or return confirmation.
    pub const IN: ItemField = ItemField::new("in");
    /// Quantity sent out by a return or settled by a discrepancy resolution.
    pub const OUT: ItemField = ItemField::new("out");
    /// Quantity handed over by an outbound supply form.
    pub const SUPPLY: ItemField = ItemField::new("supply");
    /// Quantity acknowledged on a supply confirmation.
    pub const CONFIRMED: ItemField = ItemField::new("confirmed");
    /// Quantity received, as recorded on stock logs.
    pub const RECEIVED: ItemField = ItemField::new("received");
    /// Quantity returned, as recorded on stock logs.
    pub const RETURNED: ItemField = ItemField::new("returned");
    /// Difference between returned and acknowledged quantities.
    pub const RETURN_DIFFERENCE: ItemField = ItemField::new("return_difference");
    /// Prefix of the usage field; the originating form name is appended.
    pub const USED_IN: ItemField = ItemField::new("used_in");
}

/// Field names used to resolve when a report happened.
pub mod dates {
    /// Supervisor-corrected date, nested under the `s_reported` group.
    pub const SUPERVISOR_REPORTED_DATE: &str = "s_reported.s_reported_date";
    /// Supervision visit date.
    pub const SUPERVISION_DATE: &str = "supervision_date";
    /// Date carried by item-used additional documents.
    pub const STOCK_MONITORING_REPORTED_DATE: &str = "stock_monitoring_reported_date";
}

/// Report envelope keys and flags.
pub mod report {
    /// Top-level key holding form field values on submitted reports.
    pub const FIELDS_KEY: &str = "fields";
    /// Namespaces searched, in order, below `fields` when a flat name is not found.
    pub const FIELD_NAMESPACES: [&str; 3] = ["out", "inputs", "s_reported"];
    /// Flag carried by supply additional documents when a confirmation is expected.
    pub const NEED_CONFIRMATION: &str = "need_confirmation";
    /// Values of `need_confirmation` meaning the supply counts immediately.
    pub const NO_CONFIRMATION_VALUES: [&str; 3] = ["no", "false", "0"];
}

/// Default form identifiers of the additional documents emitted by the workflow forms.
pub mod additional_docs {
    /// Item-used document created from consumption-recording forms.
    pub const ITEM_USED: &str = "stock-consumption-doc";
    /// Supply-issued document created alongside an outbound supply.
    pub const SUPPLY: &str = "stock-supply-doc";
    /// Document settling a supply discrepancy.
    pub const DISCREPANCY_RESOLUTION: &str = "discrepancy-resolution-doc";
    /// Document recording a difference between returned and received quantities.
    pub const RETURN_DIFFERENCE: &str = "return-difference-doc";
}

/// Consumption window settings.
pub mod consumption {
    /// Number of whole periods covered by the trailing window.
    pub const WINDOW_PERIODS: u32 = 3;
}
