use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AdditionalDocForms, FeatureConfig, Item, StockConfig, Workflow};
use crate::constants::consumption::WINDOW_PERIODS;
use crate::constants::fields::{OUT, RETURN_DIFFERENCE, SUPPLY};
use crate::data::Report;
use crate::dates::{reported_date, start_of_day};
use crate::effects::used_quantity;
use crate::errors::StockError;
use crate::types::{FormName, ItemName, Quantity};

/// Item name to quantity moved over the trailing window.
pub type Consumption = IndexMap<ItemName, Quantity>;

/// Length of one consumption period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Weekly periods.
    #[default]
    Week,
    /// Calendar-month periods.
    Month,
}

impl Period {
    /// Lowercase name, as accepted by `FromStr`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = StockError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "week" | "weeks" | "weekly" => Ok(Period::Week),
            "month" | "months" | "monthly" => Ok(Period::Month),
            other => Err(StockError::InvalidArgument(format!(
                "unknown period '{other}' (expected week or month)"
            ))),
        }
    }
}

/// Half-open time window `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsumptionWindow {
    /// Inclusive lower bound.
    pub start: DateTime<Utc>,
    /// Exclusive upper bound.
    pub end: DateTime<Utc>,
}

impl ConsumptionWindow {
    /// The periods immediately preceding the end of today, on day boundaries.
    pub fn trailing(period: Period, now: DateTime<Utc>) -> Self {
        let today = start_of_day(now);
        let start = match period {
            Period::Week => today - Duration::weeks(i64::from(WINDOW_PERIODS)),
            Period::Month => today
                .checked_sub_months(Months::new(WINDOW_PERIODS))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        };
        Self {
            start,
            end: today + Duration::days(1),
        }
    }

    /// Whether `instant` falls inside the half-open window.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Reports counted as stock movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MovementKind {
    /// `+<item>_used_in_<created_from_name>`
    ItemUsed,
    /// `+<item>_supply` (outbound or order supply).
    Supply,
    /// `-<item>_out`
    DiscrepancyResolution,
    /// `-<item>_return_difference`
    ReturnDifference,
}

impl MovementKind {
    fn for_workflow(workflow: Workflow) -> Option<Self> {
        match workflow {
            Workflow::ItemUsed => Some(MovementKind::ItemUsed),
            Workflow::StockSupply | Workflow::OrderSupply => Some(MovementKind::Supply),
            Workflow::DiscrepancyResolution => Some(MovementKind::DiscrepancyResolution),
            Workflow::ReturnDifference => Some(MovementKind::ReturnDifference),
            _ => None,
        }
    }

    /// Signed movement of `item` recorded by `report`.
    pub fn movement(&self, report: &Report, item: &str) -> Quantity {
        match self {
            MovementKind::ItemUsed => used_quantity(report, item),
            MovementKind::Supply => report.quantity(&SUPPLY.for_item(item)),
            MovementKind::DiscrepancyResolution => -report.quantity(&OUT.for_item(item)),
            MovementKind::ReturnDifference => -report.quantity(&RETURN_DIFFERENCE.for_item(item)),
        }
    }
}

/// Movement rules of one deployment, keyed by form identifier.
pub fn movement_table(
    features: &FeatureConfig,
    docs: &AdditionalDocForms,
) -> IndexMap<FormName, MovementKind> {
    features
        .workflow_forms(docs)
        .into_iter()
        .filter_map(|(workflow, form)| {
            MovementKind::for_workflow(workflow).map(|kind| (form.to_string(), kind))
        })
        .collect()
}

/// Per-item movement over the trailing window ending today.
///
/// Independent of stock counts: answers how much moved, not how much is left.
/// `now` is supplied by the caller so repeated calls are reproducible.
pub fn consumption(
    features: &FeatureConfig,
    docs: &AdditionalDocForms,
    items: &[Item],
    reports: &[Report],
    period: Period,
    now: DateTime<Utc>,
) -> Consumption {
    let table = movement_table(features, docs);
    let window = ConsumptionWindow::trailing(period, now);
    let in_window: Vec<(&Report, MovementKind)> = reports
        .iter()
        .filter_map(|report| table.get(&report.form).map(|kind| (report, *kind)))
        .filter(|(report, _)| window.contains(reported_date(report, &docs.item_used)))
        .collect();
    debug!(
        %period,
        start = %window.start,
        end = %window.end,
        reports = in_window.len(),
        "aggregating consumption"
    );

    items
        .iter()
        .map(|item| {
            let total = in_window
                .iter()
                .fold(0.0, |total, (report, kind)| total + kind.movement(report, &item.name));
            (item.name.clone(), total)
        })
        .collect()
}

/// [`consumption`] for a deployment configuration.
pub fn consumption_for_config(
    config: &StockConfig,
    reports: &[Report],
    period: Period,
    now: DateTime<Utc>,
) -> Consumption {
    consumption(
        &config.features,
        &config.additional_doc_forms,
        &config.items,
        reports,
        period,
        now,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn period_parses_and_displays() {
        assert_eq!("week".parse::<Period>().unwrap(), Period::Week);
        assert_eq!(" Month ".parse::<Period>().unwrap(), Period::Month);
        assert!("fortnight".parse::<Period>().is_err());
        assert_eq!(Period::default(), Period::Week);
        assert_eq!(Period::Month.to_string(), "month");
    }

    #[test]
    fn weekly_window_spans_three_weeks_to_end_of_today() {
        let window = ConsumptionWindow::trailing(Period::Week, at(2025, 5, 10, 15));
        assert_eq!(window.start, at(2025, 4, 19, 0));
        assert_eq!(window.end, at(2025, 5, 11, 0));
        assert!(window.contains(at(2025, 4, 19, 0)));
        assert!(window.contains(at(2025, 5, 10, 23)));
        assert!(!window.contains(at(2025, 5, 11, 0)));
        assert!(!window.contains(at(2025, 4, 18, 23)));
    }

    #[test]
    fn monthly_window_uses_calendar_months() {
        let window = ConsumptionWindow::trailing(Period::Month, at(2025, 5, 31, 8));
        assert_eq!(window.start, at(2025, 2, 28, 0));
        assert_eq!(window.end, at(2025, 6, 1, 0));
    }

    #[test]
    fn movement_signs() {
        let report = Report::new("r", "any")
            .with_created_from("pnc_visit")
            .with_value("ors_used_in_pnc_visit", 3)
            .with_value("ors_supply", 10)
            .with_value("ors_out", 2)
            .with_value("ors_return_difference", 1);
        assert_eq!(MovementKind::ItemUsed.movement(&report, "ors"), 3.0);
        assert_eq!(MovementKind::Supply.movement(&report, "ors"), 10.0);
        assert_eq!(
            MovementKind::DiscrepancyResolution.movement(&report, "ors"),
            -2.0
        );
        assert_eq!(MovementKind::ReturnDifference.movement(&report, "ors"), -1.0);
    }

    #[test]
    fn movement_table_ignores_non_movement_workflows() {
        let features: FeatureConfig = serde_json::from_value(serde_json::json!({
            "stock_count": {"form_name": "stock_count"},
            "stock_supply": {"form_name": "stock_supply"},
            "stock_logs": {"form_name": "stock_logs"}
        }))
        .unwrap();
        let table = movement_table(&features, &AdditionalDocForms::default());
        assert_eq!(table.get("stock_supply"), Some(&MovementKind::Supply));
        assert_eq!(
            table.get("stock-consumption-doc"),
            Some(&MovementKind::ItemUsed)
        );
        assert!(!table.contains_key("stock_count"));
        assert!(!table.contains_key("stock_logs"));
        assert!(!table.contains_key("stock-supply-doc"));
    }
}
