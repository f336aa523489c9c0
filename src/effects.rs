//! Report kinds and the per-deployment table mapping form identifiers to them.
//!
//! Form identifiers are chosen per deployment, so the table is rebuilt from
//! [`FeatureConfig`] for every computation. Each [`ReportKind`] owns its delta
//! rule; whether a supply-issued document counts on its own or waits for a
//! confirmation is fixed when the table is built, so the two paths can never
//! both apply.

use indexmap::IndexMap;
use tracing::warn;

use crate::config::{AdditionalDocForms, FeatureConfig, Workflow};
use crate::constants::fields::{
    AVAILABLE, CONFIRMED, IN, OUT, RECEIVED, RETURN_DIFFERENCE, RETURNED, SUPPLY, USED_IN,
};
use crate::constants::report::{NEED_CONFIRMATION, NO_CONFIRMATION_VALUES};
use crate::data::Report;
use crate::types::{FormName, Quantity};
use crate::utils::scalar_text;

/// How a supply-issued document is counted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupplyGate {
    /// No confirmation workflow: the issued quantity counts immediately.
    Immediate,
    /// Confirmation workflow active: counts only when the document says no
    /// confirmation is needed; otherwise the confirmation report carries it.
    UnlessConfirmationNeeded,
}

/// Effect a report has on a facility's stock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportKind {
    /// `-<item>_used_in_<created_from_name>`
    ItemUsed,
    /// `+<item>_in`, subject to the gate.
    SupplyIssued(SupplyGate),
    /// `+<item>_received - <item>_returned`
    StockLogs,
    /// `-<item>_supply` (outbound or order supply).
    OutboundSupply,
    /// `+<item>_confirmed`
    SupplyConfirmation,
    /// `+<item>_in`
    SupplyDiscrepancy,
    /// `+<item>_out`
    DiscrepancyResolution,
    /// `-<item>_out`
    StockReturn,
    /// `+<item>_in`
    StockReturned,
    /// `+<item>_return_difference`
    ReturnDifference,
}

impl ReportKind {
    /// Kind replayed for `workflow`, if its reports move stock after a count.
    pub fn for_workflow(workflow: Workflow, features: &FeatureConfig) -> Option<Self> {
        let kind = match workflow {
            Workflow::StockCount => return None,
            Workflow::ItemUsed => ReportKind::ItemUsed,
            Workflow::SupplyIssued => ReportKind::SupplyIssued(if features.confirmation_active() {
                SupplyGate::UnlessConfirmationNeeded
            } else {
                SupplyGate::Immediate
            }),
            Workflow::StockLogs => ReportKind::StockLogs,
            Workflow::StockSupply | Workflow::OrderSupply => ReportKind::OutboundSupply,
            Workflow::SupplyConfirmation => ReportKind::SupplyConfirmation,
            Workflow::SupplyDiscrepancy => ReportKind::SupplyDiscrepancy,
            Workflow::DiscrepancyResolution => ReportKind::DiscrepancyResolution,
            Workflow::StockReturn => ReportKind::StockReturn,
            Workflow::StockReturned => ReportKind::StockReturned,
            Workflow::ReturnDifference => ReportKind::ReturnDifference,
        };
        Some(kind)
    }

    /// Signed change `report` applies to `item`.
    pub fn delta(&self, report: &Report, item: &str) -> Quantity {
        match self {
            ReportKind::ItemUsed => -used_quantity(report, item),
            ReportKind::SupplyIssued(SupplyGate::Immediate) => report.quantity(&IN.for_item(item)),
            ReportKind::SupplyIssued(SupplyGate::UnlessConfirmationNeeded) => {
                if confirmation_waived(report) {
                    report.quantity(&IN.for_item(item))
                } else {
                    0.0
                }
            }
            ReportKind::StockLogs => {
                report.quantity(&RECEIVED.for_item(item)) - report.quantity(&RETURNED.for_item(item))
            }
            ReportKind::OutboundSupply => -report.quantity(&SUPPLY.for_item(item)),
            ReportKind::SupplyConfirmation => report.quantity(&CONFIRMED.for_item(item)),
            ReportKind::SupplyDiscrepancy | ReportKind::StockReturned => {
                report.quantity(&IN.for_item(item))
            }
            ReportKind::DiscrepancyResolution => report.quantity(&OUT.for_item(item)),
            ReportKind::StockReturn => -report.quantity(&OUT.for_item(item)),
            ReportKind::ReturnDifference => report.quantity(&RETURN_DIFFERENCE.for_item(item)),
        }
    }
}

/// Quantity counted on a stock count report; the replay seed.
pub fn available_quantity(report: &Report, item: &str) -> Quantity {
    report.quantity(&AVAILABLE.for_item(item))
}

/// Quantity recorded as used on an item-used document.
///
/// The field is qualified by the form the document was created from; a
/// document without `created_from_name` contributes nothing.
pub fn used_quantity(report: &Report, item: &str) -> Quantity {
    match report.created_from_name.as_deref() {
        Some(form) if !form.is_empty() => report.quantity(&USED_IN.for_item_in(item, form)),
        _ => 0.0,
    }
}

fn confirmation_waived(report: &Report) -> bool {
    scalar_text(report.field(NEED_CONFIRMATION))
        .map(|flag| {
            NO_CONFIRMATION_VALUES
                .iter()
                .any(|value| flag.eq_ignore_ascii_case(value))
        })
        .unwrap_or(false)
}

/// Contributing form identifiers of one deployment and their report kinds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectTable {
    kinds: IndexMap<FormName, ReportKind>,
}

impl EffectTable {
    /// Build the table for a deployment.
    ///
    /// Rules are registered in [`FeatureConfig::workflow_forms`] order. When two
    /// workflows share a form identifier the later rule replaces the earlier
    /// one and a warning is logged; rejecting such configurations is left to
    /// [`FeatureConfig::collisions`].
    pub fn build(features: &FeatureConfig, docs: &AdditionalDocForms) -> Self {
        let mut kinds: IndexMap<FormName, ReportKind> = IndexMap::new();
        for (workflow, form) in features.workflow_forms(docs) {
            let Some(kind) = ReportKind::for_workflow(workflow, features) else {
                continue;
            };
            if let Some(previous) = kinds.insert(form.to_string(), kind) {
                if previous != kind {
                    warn!(
                        form,
                        ?previous,
                        replacement = ?kind,
                        "form identifier is configured for several workflows; the later rule wins"
                    );
                }
            }
        }
        Self { kinds }
    }

    /// Report kind registered for `form`.
    pub fn kind_of(&self, form: &str) -> Option<ReportKind> {
        self.kinds.get(form).copied()
    }

    /// True when reports with `form` are replayed after a checkpoint.
    pub fn is_contributing(&self, form: &str) -> bool {
        self.kinds.contains_key(form)
    }

    /// Contributing form identifiers in registration order.
    pub fn contributing_forms(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    /// Signed change `report` applies to `item`; zero for non-contributing forms.
    pub fn delta(&self, report: &Report, item: &str) -> Quantity {
        self.kind_of(&report.form)
            .map(|kind| kind.delta(report, item))
            .unwrap_or(0.0)
    }

    /// Number of contributing forms.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// True when no form contributes.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
