//! Media index registration
//!
//! Saved pictures are announced to the platform media index so they show up
//! in gallery apps. The index is reached through a connection that must be
//! closed exactly once.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// Platform media index (e.g. the Android media scanner)
#[async_trait]
pub trait MediaIndex: Send + Sync {
    /// Open a connection to the index
    async fn connect(&self) -> Result<Box<dyn MediaIndexConnection>>;
}

/// Open connection to a media index
#[async_trait]
pub trait MediaIndexConnection: Send {
    /// Scan a file into the index and wait for completion
    async fn scan_file(&mut self, path: &Path, mime_type: Option<&str>) -> Result<()>;

    /// Close the connection
    fn disconnect(&mut self);
}

/// Media index for hosts without one
#[derive(Clone, Copy, Debug, Default)]
pub struct NullMediaIndex;

struct NullConnection;

#[async_trait]
impl MediaIndex for NullMediaIndex {
    async fn connect(&self) -> Result<Box<dyn MediaIndexConnection>> {
        Ok(Box::new(NullConnection))
    }
}

#[async_trait]
impl MediaIndexConnection for NullConnection {
    async fn scan_file(&mut self, path: &Path, _mime_type: Option<&str>) -> Result<()> {
        tracing::trace!(path = %path.display(), "media index unavailable, skipping scan");
        Ok(())
    }

    fn disconnect(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_media_index_scans_nothing() {
        let index = NullMediaIndex;
        let mut connection = index.connect().await.unwrap();
        assert!(connection
            .scan_file(Path::new("/tmp/picture.png"), Some("image/png"))
            .await
            .is_ok());
        connection.disconnect();
    }
}
