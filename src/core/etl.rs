use crate::core::classifier::RunReport;
use crate::core::output::DetailWriter;
use crate::core::pipeline::VinPipeline;
use crate::core::reader::VinReader;
use crate::domain::ports::VinDecoder;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub input: PathBuf,
    pub summary: PathBuf,
    pub details: PathBuf,
}

/// Wires files to the pipeline: VIN list in, detail CSV and summary text out.
pub struct EtlEngine<D: VinDecoder> {
    pipeline: VinPipeline<D>,
    paths: RunPaths,
    monitor: SystemMonitor,
}

impl<D: VinDecoder> EtlEngine<D> {
    pub fn new(pipeline: VinPipeline<D>, paths: RunPaths) -> Self {
        Self::new_with_monitoring(pipeline, paths, false)
    }

    pub fn new_with_monitoring(pipeline: VinPipeline<D>, paths: RunPaths, monitor: bool) -> Self {
        Self {
            pipeline,
            paths,
            monitor: SystemMonitor::new(monitor),
        }
    }

    pub async fn run(&self) -> Result<RunReport> {
        tracing::info!(
            "Reading VINs from {} in batches of {}",
            self.paths.input.display(),
            self.pipeline.chunk_size()
        );
        let reader = VinReader::open(&self.paths.input)?;
        let mut details = DetailWriter::create(&self.paths.details)?;
        self.monitor.log_stats("Input opened");

        let report = self.pipeline.run(reader.records(), &mut details).await?;
        details.flush()?;
        self.monitor.log_stats("Batches processed");

        let summary = report.write_summary(&self.paths.summary)?;
        print!("{}", summary);
        println!("Detailed results available in {}", self.paths.details.display());

        tracing::info!(
            "📁 Summary written to {}, {} EV rows written to {}",
            self.paths.summary.display(),
            details.rows_written(),
            self.paths.details.display()
        );
        self.monitor.log_final_stats();

        Ok(report)
    }
}
