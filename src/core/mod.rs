pub mod batcher;
pub mod classifier;
pub mod client;
pub mod etl;
pub mod output;
pub mod pipeline;
pub mod reader;
pub mod retry;

pub use crate::domain::model::{Batch, DecodedResult, EvDetail, RunTotals, VinRecord};
pub use crate::domain::ports::{ConfigProvider, VinDecoder};
pub use crate::utils::error::Result;
