use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::constants::additional_docs;
use crate::errors::StockError;
use crate::types::{FormName, ItemName, Quantity};
use crate::utils::{coerce_quantity, scalar_text};

/// A workflow whose reports are identified by a configured form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Workflow {
    /// Full physical stock count (the replay checkpoint).
    StockCount,
    /// Item-used additional document.
    ItemUsed,
    /// Supply-issued additional document.
    SupplyIssued,
    /// Stock logs recording received and returned quantities.
    StockLogs,
    /// Outbound supply form.
    StockSupply,
    /// Supply form attached to a stock order.
    OrderSupply,
    /// Supply confirmation form.
    SupplyConfirmation,
    /// Supply discrepancy form.
    SupplyDiscrepancy,
    /// Discrepancy-resolution additional document.
    DiscrepancyResolution,
    /// Stock return form.
    StockReturn,
    /// Stock returned (return confirmation) form.
    StockReturned,
    /// Return-difference additional document.
    ReturnDifference,
}

impl Workflow {
    /// Stable label used in logs and collision reports.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Workflow::StockCount => "stock_count",
            Workflow::ItemUsed => "item_used",
            Workflow::SupplyIssued => "supply_issued",
            Workflow::StockLogs => "stock_logs",
            Workflow::StockSupply => "stock_supply",
            Workflow::OrderSupply => "stock_order.stock_supply",
            Workflow::SupplyConfirmation => "stock_supply.confirm_supply",
            Workflow::SupplyDiscrepancy => "stock_supply.discrepancy",
            Workflow::DiscrepancyResolution => "discrepancy_resolution",
            Workflow::StockReturn => "stock_return",
            Workflow::StockReturned => "stock_return.confirmation",
            Workflow::ReturnDifference => "return_difference",
        }
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to the form used by a workflow.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormRef {
    /// Form identifier; empty when unset.
    #[serde(default)]
    pub form_name: FormName,
}

impl FormRef {
    /// Reference to `form_name`.
    pub fn new(form_name: impl Into<FormName>) -> Self {
        Self {
            form_name: form_name.into(),
        }
    }
}

/// Supply confirmation settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfirmSupply {
    /// Whether issued supplies wait for a confirmation report.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub active: bool,
    /// Confirmation form identifier.
    #[serde(default)]
    pub form_name: FormName,
}

/// Outbound supply workflow with optional confirmation and discrepancy handling.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StockSupply {
    /// Supply form identifier.
    #[serde(default)]
    pub form_name: FormName,
    /// Optional confirmation step on the receiving side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_supply: Option<ConfirmSupply>,
    /// Optional discrepancy report form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discrepancy: Option<FormRef>,
}

/// Stock return workflow.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StockReturn {
    /// Return form identifier.
    #[serde(default)]
    pub form_name: FormName,
    /// Optional form confirming the returned quantities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<FormRef>,
}

/// Stock order workflow with its own supply form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StockOrder {
    /// Order form identifier.
    #[serde(default)]
    pub form_name: FormName,
    /// Optional supply form attached to the order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_supply: Option<FormRef>,
}

/// Per-deployment record of active workflows and their form identifiers.
///
/// A workflow that is absent, or configured with an empty form name, never
/// matches a report.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Full stock count form.
    #[serde(default)]
    pub stock_count: FormRef,
    /// Supply workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_supply: Option<StockSupply>,
    /// Return workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_return: Option<StockReturn>,
    /// Order workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_order: Option<StockOrder>,
    /// Stock logs form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_logs: Option<FormRef>,
}

impl FeatureConfig {
    /// Form identifier of full stock counts.
    pub fn stock_count_form(&self) -> &str {
        &self.stock_count.form_name
    }

    /// Form identifier of outbound supplies.
    pub fn supply_form(&self) -> &str {
        self.stock_supply
            .as_ref()
            .map(|supply| supply.form_name.as_str())
            .unwrap_or_default()
    }

    /// Form identifier of supply confirmations, when the confirmation workflow is active.
    pub fn confirmation_form(&self) -> &str {
        self.stock_supply
            .as_ref()
            .and_then(|supply| supply.confirm_supply.as_ref())
            .filter(|confirm| confirm.active)
            .map(|confirm| confirm.form_name.as_str())
            .unwrap_or_default()
    }

    /// True when issued supplies wait for a confirmation report.
    pub fn confirmation_active(&self) -> bool {
        !self.confirmation_form().is_empty()
    }

    /// Form identifier of supply discrepancies.
    pub fn discrepancy_form(&self) -> &str {
        self.stock_supply
            .as_ref()
            .and_then(|supply| supply.discrepancy.as_ref())
            .map(|discrepancy| discrepancy.form_name.as_str())
            .unwrap_or_default()
    }

    /// Form identifier of stock returns.
    pub fn return_form(&self) -> &str {
        self.stock_return
            .as_ref()
            .map(|stock_return| stock_return.form_name.as_str())
            .unwrap_or_default()
    }

    /// Form identifier confirming that returned stock arrived.
    pub fn return_confirmation_form(&self) -> &str {
        self.stock_return
            .as_ref()
            .and_then(|stock_return| stock_return.confirmation.as_ref())
            .map(|confirmation| confirmation.form_name.as_str())
            .unwrap_or_default()
    }

    /// Form identifier of supplies issued against a stock order.
    pub fn order_supply_form(&self) -> &str {
        self.stock_order
            .as_ref()
            .and_then(|order| order.stock_supply.as_ref())
            .map(|supply| supply.form_name.as_str())
            .unwrap_or_default()
    }

    /// Form identifier of stock logs.
    pub fn logs_form(&self) -> &str {
        self.stock_logs
            .as_ref()
            .map(|logs| logs.form_name.as_str())
            .unwrap_or_default()
    }

    /// Every configured workflow with its form identifier, in rule order.
    ///
    /// Additional documents are listed only when the workflow that emits them
    /// is configured. Empty form identifiers are skipped.
    pub fn workflow_forms<'a>(
        &'a self,
        docs: &'a AdditionalDocForms,
    ) -> Vec<(Workflow, &'a str)> {
        let supplies_configured =
            !self.supply_form().is_empty() || !self.order_supply_form().is_empty();
        let discrepancy_configured = !self.discrepancy_form().is_empty();
        let return_configured = !self.return_form().is_empty();

        let candidates = [
            (Workflow::StockCount, self.stock_count_form()),
            (Workflow::ItemUsed, docs.item_used.as_str()),
            (
                Workflow::SupplyIssued,
                if supplies_configured { docs.supply.as_str() } else { "" },
            ),
            (Workflow::StockLogs, self.logs_form()),
            (Workflow::StockSupply, self.supply_form()),
            (Workflow::OrderSupply, self.order_supply_form()),
            (Workflow::SupplyConfirmation, self.confirmation_form()),
            (Workflow::SupplyDiscrepancy, self.discrepancy_form()),
            (
                Workflow::DiscrepancyResolution,
                if discrepancy_configured {
                    docs.discrepancy_resolution.as_str()
                } else {
                    ""
                },
            ),
            (Workflow::StockReturn, self.return_form()),
            (Workflow::StockReturned, self.return_confirmation_form()),
            (
                Workflow::ReturnDifference,
                if return_configured {
                    docs.return_difference.as_str()
                } else {
                    ""
                },
            ),
        ];
        candidates
            .into_iter()
            .filter(|(_, form)| !form.is_empty())
            .collect()
    }

    /// Form identifiers shared by more than one workflow, sorted by form.
    pub fn collisions(&self, docs: &AdditionalDocForms) -> Vec<FormCollision> {
        let mut by_form: BTreeMap<&str, Vec<Workflow>> = BTreeMap::new();
        for (workflow, form) in self.workflow_forms(docs) {
            by_form.entry(form).or_default().push(workflow);
        }
        by_form
            .into_iter()
            .filter(|(_, workflows)| workflows.len() > 1)
            .map(|(form, workflows)| FormCollision {
                form: form.to_string(),
                workflows,
            })
            .collect()
    }
}

/// A form identifier configured for several workflows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormCollision {
    /// Shared form identifier.
    pub form: FormName,
    /// Workflows using it, in rule order.
    pub workflows: Vec<Workflow>,
}

impl FormCollision {
    /// Comma-separated workflow labels.
    pub fn workflow_list(&self) -> String {
        self.workflows
            .iter()
            .map(Workflow::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<FormCollision> for StockError {
    fn from(collision: FormCollision) -> Self {
        StockError::FormCollision {
            workflows: collision.workflow_list(),
            form: collision.form,
        }
    }
}

/// Form identifiers of the additional documents written by workflow forms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditionalDocForms {
    /// Item-used document form.
    pub item_used: FormName,
    /// Supply-issued document form.
    pub supply: FormName,
    /// Discrepancy-resolution document form.
    pub discrepancy_resolution: FormName,
    /// Return-difference document form.
    pub return_difference: FormName,
}

impl Default for AdditionalDocForms {
    fn default() -> Self {
        Self {
            item_used: additional_docs::ITEM_USED.to_string(),
            supply: additional_docs::SUPPLY.to_string(),
            discrepancy_resolution: additional_docs::DISCREPANCY_RESOLUTION.to_string(),
            return_difference: additional_docs::RETURN_DIFFERENCE.to_string(),
        }
    }
}

/// Packaging of an item sold in sets (boxes, blisters).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemSet {
    /// Localized set label keyed by language code.
    #[serde(default)]
    pub label: IndexMap<String, String>,
    /// Number of units per set.
    #[serde(default, deserialize_with = "deserialize_quantity")]
    pub count: Quantity,
}

/// A tracked commodity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Item name, the prefix of every item field.
    #[serde(default)]
    pub name: ItemName,
    /// Unit label.
    #[serde(default)]
    pub unit: String,
    /// Packaging set, when items are counted in sets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<ItemSet>,
    /// Level below which stock is low.
    #[serde(default, deserialize_with = "deserialize_quantity")]
    pub warning_total: Quantity,
    /// Level below which stock is critical.
    #[serde(default, deserialize_with = "deserialize_quantity")]
    pub danger_total: Quantity,
}

impl Item {
    /// Item with a name and unit and no thresholds.
    pub fn new(name: impl Into<ItemName>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            ..Self::default()
        }
    }
}

/// Deployment configuration as written by the scaffolding tool.
///
/// Only the parts the ledger needs are modelled; languages, categories,
/// levels, and translations are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StockConfig {
    /// Configured workflows.
    #[serde(default)]
    pub features: FeatureConfig,
    /// Tracked items, in configuration order.
    #[serde(default, deserialize_with = "deserialize_items")]
    pub items: Vec<Item>,
    /// Form identifiers of the additional documents.
    #[serde(default)]
    pub additional_doc_forms: AdditionalDocForms,
}

impl StockConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Form-identifier collisions of this deployment.
    pub fn collisions(&self) -> Vec<FormCollision> {
        self.features.collisions(&self.additional_doc_forms)
    }

    /// Reject configurations that reuse a form identifier across workflows
    /// or that list an item without a name.
    pub fn validate(&self) -> Result<(), StockError> {
        if let Some(collision) = self.collisions().into_iter().next() {
            return Err(collision.into());
        }
        if self.items.iter().any(|item| item.name.is_empty()) {
            return Err(StockError::Configuration(
                "every item needs a non-empty name".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ItemsRepr {
    List(Vec<Item>),
    Keyed(IndexMap<ItemName, Item>),
}

fn deserialize_items<'de, D>(deserializer: D) -> Result<Vec<Item>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match ItemsRepr::deserialize(deserializer)? {
        ItemsRepr::List(items) => items,
        ItemsRepr::Keyed(items) => items
            .into_iter()
            .map(|(key, mut item)| {
                if item.name.is_empty() {
                    item.name = key;
                }
                item
            })
            .collect(),
    };
    Ok(items)
}

fn deserialize_quantity<'de, D>(deserializer: D) -> Result<Quantity, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_quantity(Some(&value)))
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let flag = scalar_text(Some(&value))
        .map(|text| matches!(text.to_ascii_lowercase().as_str(), "true" | "yes" | "y" | "1"))
        .unwrap_or(false);
    Ok(flag)
}
