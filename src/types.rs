/// Stable document identifier of a submitted report.
/// Example: `7f3c1e2a-report-0001`
pub type ReportId = String;
/// Configurable identifier naming the form (workflow template) a report belongs to.
/// Examples: `stock_count`, `stock_supply`, `stock-supply-doc`
pub type FormName = String;
/// Unique name of a tracked commodity.
/// Examples: `paracetamol`, `amoxicillin_250`
pub type ItemName = String;
/// Flat field name looked up on a report.
/// Examples: `paracetamol_available`, `paracetamol_used_in_pnc_visit`
pub type FieldName = String;
/// Signed quantity of an item, in the item's base unit.
pub type Quantity = f64;
