use serde::{Deserialize, Serialize};

/// One input row. Only the VIN column is carried forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VinRecord {
    pub vin: String,
}

impl VinRecord {
    pub fn new(vin: impl Into<String>) -> Self {
        Self { vin: vin.into() }
    }
}

/// An ordered group of records submitted in a single decode request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub index: usize,
    pub records: Vec<VinRecord>,
}

impl Batch {
    pub fn vins(&self) -> Vec<String> {
        self.records.iter().map(|r| r.vin.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A single vehicle as reported by the vPIC `DecodeVINValuesBatch` endpoint.
///
/// vPIC sends `""` for values it could not determine; callers treat that the
/// same as an absent field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DecodedResult {
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub model_year: Option<String>,
    #[serde(default, rename = "VIN")]
    pub vin: Option<String>,
    #[serde(default)]
    pub fuel_type_primary: Option<String>,
    #[serde(default)]
    pub fuel_type_secondary: Option<String>,
    #[serde(default)]
    pub electrification_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DecodeResponse {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
    pub results: Vec<DecodedResult>,
}

/// A row of the EV detail file. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvDetail {
    pub make: String,
    pub model: String,
    pub model_year: String,
    #[serde(rename = "VIN")]
    pub vin: String,
    pub fuel_type_primary: String,
    pub fuel_type_secondary: String,
    pub electrification_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub key: String,
    pub is_ev: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    /// Input VINs consumed, whether or not their batch decoded.
    pub lines_processed: u64,
    pub evs_found: u64,
    pub results_decoded: u64,
    /// Results naming a VIN that was not in the submitted batch.
    pub results_unmatched: u64,
    pub batches_submitted: u64,
    pub batches_dropped: u64,
    pub vins_dropped: u64,
}

impl RunTotals {
    pub fn non_evs(&self) -> u64 {
        self.lines_processed.saturating_sub(self.evs_found)
    }
}
