//! Current stock per item, replayed forward from the last stock count.
//!
//! ```text
//! reports --> locate checkpoint --> relevant events --> seed + deltas --> Ledger
//!                                        ^
//!                                   EffectTable
//! ```
//!
//! The replay is a pure fold over the supplied reports. Seeding happens once
//! from the checkpoint and every later event only adds a delta, so the result
//! does not depend on the order of same-day reports.

use std::ptr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::debug;

use crate::config::{AdditionalDocForms, FeatureConfig, Item, StockConfig};
use crate::dates::reported_date;
use crate::data::Report;
use crate::effects::{EffectTable, available_quantity};
use crate::types::{FormName, ItemName, Quantity};

/// Item name to current quantity, in item configuration order.
///
/// Empty when no stock count exists: quantities are unknown, not zero.
pub type Ledger = IndexMap<ItemName, Quantity>;

/// The most recent full stock count.
#[derive(Clone, Copy, Debug)]
pub struct Checkpoint<'a> {
    /// The stock-count report that seeds the ledger.
    pub report: &'a Report,
    /// Position of the report in the input list.
    pub position: usize,
    /// Resolved reported date of the checkpoint.
    pub reported_at: DateTime<Utc>,
}

/// Replays reports of one deployment.
#[derive(Clone, Debug)]
pub struct LedgerEngine {
    stock_count_form: FormName,
    item_used_form: FormName,
    effects: EffectTable,
}

impl LedgerEngine {
    /// Engine for one deployment; the effect table is built here once.
    pub fn new(features: &FeatureConfig, docs: &AdditionalDocForms) -> Self {
        let effects = EffectTable::build(features, docs);
        debug!(
            contributing = ?effects.contributing_forms().collect::<Vec<_>>(),
            "built effect table"
        );
        Self {
            stock_count_form: features.stock_count_form().to_string(),
            item_used_form: docs.item_used.clone(),
            effects,
        }
    }

    /// Engine for a parsed [`StockConfig`].
    pub fn from_config(config: &StockConfig) -> Self {
        Self::new(&config.features, &config.additional_doc_forms)
    }

    /// Effect table used for replay.
    pub fn effects(&self) -> &EffectTable {
        &self.effects
    }

    /// Effective timestamp of `report`.
    pub fn reported_date(&self, report: &Report) -> DateTime<Utc> {
        reported_date(report, &self.item_used_form)
    }

    /// Most recent stock count, by resolved date.
    ///
    /// Ties go to the report that appears later in `reports`.
    pub fn locate_checkpoint<'a>(&self, reports: &'a [Report]) -> Option<Checkpoint<'a>> {
        if self.stock_count_form.is_empty() {
            return None;
        }
        reports
            .iter()
            .enumerate()
            .filter(|(_, report)| report.form == self.stock_count_form)
            .map(|(position, report)| Checkpoint {
                report,
                position,
                reported_at: self.reported_date(report),
            })
            .max_by(|left, right| {
                left.reported_at
                    .cmp(&right.reported_at)
                    .then_with(|| left.position.cmp(&right.position))
            })
    }

    /// The checkpoint plus every contributing report dated strictly after it,
    /// in input order.
    pub fn relevant_reports<'a>(
        &self,
        reports: &'a [Report],
        checkpoint: &Checkpoint<'a>,
    ) -> Vec<&'a Report> {
        reports
            .iter()
            .enumerate()
            .filter(|(position, report)| {
                *position == checkpoint.position
                    || (self.effects.is_contributing(&report.form)
                        && self.reported_date(report) > checkpoint.reported_at)
            })
            .map(|(_, report)| report)
            .collect()
    }

    /// Current quantity of every item in `items`.
    pub fn replay(&self, items: &[Item], reports: &[Report]) -> Ledger {
        let Some(checkpoint) = self.locate_checkpoint(reports) else {
            debug!(
                form = %self.stock_count_form,
                reports = reports.len(),
                "no stock count found; quantities are unknown"
            );
            return Ledger::new();
        };
        let events: Vec<&Report> = self
            .relevant_reports(reports, &checkpoint)
            .into_iter()
            .filter(|report| !ptr::eq(*report, checkpoint.report))
            .collect();
        debug!(
            checkpoint = %checkpoint.report.id,
            reported_at = %checkpoint.reported_at,
            events = events.len(),
            "replaying stock events"
        );

        items
            .iter()
            .map(|item| {
                let seed = available_quantity(checkpoint.report, &item.name);
                let total = events
                    .iter()
                    .fold(seed, |total, report| total + self.effects.delta(report, &item.name));
                (item.name.clone(), total)
            })
            .collect()
    }
}

/// Current quantity per item for a deployment configuration.
pub fn current_quantities(config: &StockConfig, reports: &[Report]) -> Ledger {
    LedgerEngine::from_config(config).replay(&config.items, reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormRef;
    use chrono::TimeZone;

    fn engine() -> LedgerEngine {
        let features = FeatureConfig {
            stock_count: FormRef::new("stock_count"),
            ..FeatureConfig::default()
        };
        LedgerEngine::new(&features, &AdditionalDocForms::default())
    }

    fn day(d: u32) -> i64 {
        Utc.with_ymd_and_hms(2025, 3, d, 9, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn count(id: &str, d: u32, available: i64) -> Report {
        Report::new(id, "stock_count")
            .with_reported_date(day(d))
            .with_field("out.paracetamol_available", available)
    }

    fn usage(id: &str, d: u32, used: i64) -> Report {
        Report::new(id, "stock-consumption-doc")
            .with_reported_date(day(d))
            .with_created_from("pnc_visit")
            .with_value("paracetamol_used_in_pnc_visit", used)
    }

    #[test]
    fn checkpoint_is_the_latest_stock_count() {
        let reports = vec![count("a", 3, 10), count("b", 7, 20), count("c", 5, 30)];
        let checkpoint = engine().locate_checkpoint(&reports).unwrap();
        assert_eq!(checkpoint.report.id, "b");
        assert_eq!(checkpoint.position, 1);
    }

    #[test]
    fn checkpoint_ties_go_to_the_later_report() {
        let reports = vec![count("a", 7, 10), count("b", 7, 20), usage("u", 7, 1)];
        let checkpoint = engine().locate_checkpoint(&reports).unwrap();
        assert_eq!(checkpoint.report.id, "b");
    }

    #[test]
    fn no_checkpoint_without_a_stock_count_form() {
        let features = FeatureConfig::default();
        let engine = LedgerEngine::new(&features, &AdditionalDocForms::default());
        let reports = vec![Report::new("a", "")];
        assert!(engine.locate_checkpoint(&reports).is_none());
    }

    #[test]
    fn relevant_reports_exclude_earlier_and_same_instant_events() {
        let mut same_instant = usage("same", 5, 1);
        same_instant.reported_date = count("x", 5, 0).reported_date;
        let reports = vec![
            usage("before", 4, 1),
            count("checkpoint", 5, 10),
            same_instant,
            usage("after", 6, 1),
            Report::new("other", "household_visit").with_reported_date(day(8)),
        ];
        let engine = engine();
        let checkpoint = engine.locate_checkpoint(&reports).unwrap();
        let ids: Vec<&str> = engine
            .relevant_reports(&reports, &checkpoint)
            .into_iter()
            .map(|report| report.id.as_str())
            .collect();
        assert_eq!(ids, vec!["checkpoint", "after"]);
    }

    #[test]
    fn replay_seeds_and_applies_deltas() {
        let reports = vec![usage("u1", 6, 12), count("c", 5, 100), usage("u0", 4, 50)];
        let items = vec![Item::new("paracetamol", "tablet"), Item::new("ors", "sachet")];
        let ledger = engine().replay(&items, &reports);
        assert_eq!(ledger.get("paracetamol"), Some(&88.0));
        assert_eq!(ledger.get("ors"), Some(&0.0));
        assert_eq!(
            ledger.keys().collect::<Vec<_>>(),
            vec!["paracetamol", "ors"]
        );
    }
}
