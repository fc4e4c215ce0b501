use crate::domain::model::{Batch, Classification, DecodedResult, EvDetail, RunTotals};
use indexmap::IndexMap;

pub const NOT_APPLICABLE: &str = "Not Applicable";
pub const NON_FUEL_VEHICLE: &str = "Non-Fuel Vehicle: might be a trailer or a bad VIN";

/// Composite key -> occurrences, in first-seen order.
pub type SummaryCounter = IndexMap<String, u64>;

// 空字串與 "Not Applicable" 一律視為沒有值
fn normalized(value: Option<&str>) -> &str {
    match value.map(str::trim) {
        Some(v) if v != NOT_APPLICABLE => v,
        _ => "",
    }
}

fn or_placeholder(value: Option<&str>, placeholder: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => placeholder.to_string(),
    }
}

pub fn classify(result: &DecodedResult) -> Classification {
    let primary = normalized(result.fuel_type_primary.as_deref());
    let secondary = normalized(result.fuel_type_secondary.as_deref());
    let electrification = normalized(result.electrification_level.as_deref());

    let primary = if primary.is_empty() {
        NON_FUEL_VEHICLE
    } else {
        primary
    };

    Classification {
        key: format!("{}|{}|{}", primary, secondary, electrification),
        is_ev: !electrification.is_empty(),
    }
}

pub fn ev_detail(result: &DecodedResult) -> EvDetail {
    EvDetail {
        make: or_placeholder(result.make.as_deref(), "(No Make)"),
        model: or_placeholder(result.model.as_deref(), "(No Model)"),
        model_year: or_placeholder(result.model_year.as_deref(), "(No Model Year)"),
        vin: or_placeholder(result.vin.as_deref(), "(No VIN)"),
        fuel_type_primary: normalized(result.fuel_type_primary.as_deref()).to_string(),
        fuel_type_secondary: normalized(result.fuel_type_secondary.as_deref()).to_string(),
        electrification_level: normalized(result.electrification_level.as_deref()).to_string(),
    }
}

/// Final state of a run: per-key counts plus scalar totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub counts: SummaryCounter,
    pub totals: RunTotals,
}

/// Running counts for one pipeline run. Owned by the driver; no global state.
#[derive(Debug, Default)]
pub struct Aggregator {
    counts: SummaryCounter,
    totals: RunTotals,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count input rows, independent of what the service returns for them.
    pub fn record_consumed(&mut self, lines: usize) {
        self.totals.lines_processed += lines as u64;
    }

    pub fn record_submitted(&mut self) {
        self.totals.batches_submitted += 1;
    }

    pub fn record_unmatched(&mut self, results: usize) {
        self.totals.results_unmatched += results as u64;
    }

    pub fn record_dropped(&mut self, batch: &Batch) {
        self.totals.batches_dropped += 1;
        self.totals.vins_dropped += batch.len() as u64;
    }

    /// Counts one decoded vehicle; returns its detail row when it is electrified.
    pub fn absorb(&mut self, result: &DecodedResult) -> Option<EvDetail> {
        let classification = classify(result);
        self.totals.results_decoded += 1;

        match self.counts.get_mut(&classification.key) {
            Some(count) => *count += 1,
            None => {
                tracing::info!("🆕 New classification: {}", classification.key);
                self.counts.insert(classification.key, 1);
            }
        }

        if classification.is_ev {
            self.totals.evs_found += 1;
            Some(ev_detail(result))
        } else {
            None
        }
    }

    pub fn totals(&self) -> &RunTotals {
        &self.totals
    }

    pub fn counts(&self) -> &SummaryCounter {
        &self.counts
    }

    pub fn into_report(self) -> RunReport {
        RunReport {
            counts: self.counts,
            totals: self.totals,
        }
    }
}
