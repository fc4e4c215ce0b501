use crate::domain::model::DecodedResult;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn chunk_size(&self) -> usize;
    fn base_delay(&self) -> Duration;
    fn timeout_factor(&self) -> u32;
    fn max_retries(&self) -> u32;
    fn batch_pause(&self) -> Duration;
}

/// One decode attempt against the remote service. Retrying is layered on top.
#[async_trait]
pub trait VinDecoder: Send + Sync {
    async fn decode(&self, vins: &[String], timeout: Duration) -> Result<Vec<DecodedResult>>;
}
