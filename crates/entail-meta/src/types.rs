use anyhow::Result;
use async_trait::async_trait;

/// Narrow key-value interface over the shared metadata store. Values are
/// opaque bytes and writes are last-write-wins.
#[async_trait]
pub trait MetaStore: Send + Sync {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
}
