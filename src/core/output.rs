use crate::core::classifier::RunReport;
use crate::domain::model::EvDetail;
use crate::utils::error::Result;
use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const DETAIL_HEADERS: [&str; 7] = [
    "Make",
    "Model",
    "ModelYear",
    "VIN",
    "FuelTypePrimary",
    "FuelTypeSecondary",
    "ElectrificationLevel",
];

/// Appends EV rows to the detail CSV as batches complete.
pub struct DetailWriter<W: Write> {
    writer: csv::Writer<W>,
    rows_written: u64,
}

impl DetailWriter<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(file)
    }
}

impl<W: Write> DetailWriter<W> {
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(DETAIL_HEADERS)?;
        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    pub fn write(&mut self, detail: &EvDetail) -> Result<()> {
        self.writer.serialize(detail)?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::utils::error::EtlError::IoError(e.into_error()))
    }
}

impl RunReport {
    /// Plain-text summary: one `key : count` line per classification, then totals.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        for (key, count) in &self.counts {
            let _ = writeln!(out, "{} : {}", key, count);
        }

        let totals = &self.totals;
        let _ = writeln!(out, "Summary:");
        let _ = writeln!(out, "EVs found: {}", totals.evs_found);
        let _ = writeln!(out, "Non-EVs: {}", totals.non_evs());
        let _ = writeln!(out, "Total: {}", totals.lines_processed);
        if totals.batches_dropped > 0 {
            let _ = writeln!(
                out,
                "Dropped batches: {} ({} VINs)",
                totals.batches_dropped, totals.vins_dropped
            );
        }
        out
    }

    pub fn write_summary<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let summary = self.render_summary();
        std::fs::write(path, summary.as_bytes())?;
        Ok(summary)
    }
}
