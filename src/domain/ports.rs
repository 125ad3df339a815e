use crate::utils::error::Result;
use async_trait::async_trait;

/// Where a dataset's JSON body comes from.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value>;
}

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}
