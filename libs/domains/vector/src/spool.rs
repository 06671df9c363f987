//! Snapshot uploads are written to a temporary file while they arrive, so a
//! restore never holds the whole snapshot in memory.

use std::io;
use std::path::Path;
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// A snapshot upload being received.
pub struct SnapshotSpool {
    file_name: String,
    file: File,
    path: TempPath,
    len: u64,
}

impl SnapshotSpool {
    pub async fn new(file_name: impl Into<String>) -> io::Result<Self> {
        let temp = tokio::task::spawn_blocking(|| {
            tempfile::Builder::new()
                .prefix("quietvector-snapshot-")
                .tempfile()
        })
        .await
        .map_err(io::Error::other)??;
        let (file, path) = temp.into_parts();

        Ok(Self {
            file_name: file_name.into(),
            file: File::from_std(file),
            path,
            len: 0,
        })
    }

    pub async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.file.write_all(chunk).await?;
        self.len += chunk.len() as u64;
        Ok(())
    }

    pub async fn finish(mut self) -> io::Result<SpooledSnapshot> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        Ok(SpooledSnapshot {
            file_name: self.file_name,
            path: self.path,
            len: self.len,
        })
    }
}

/// A fully received snapshot. The file is removed on drop.
#[derive(Debug)]
pub struct SpooledSnapshot {
    file_name: String,
    path: TempPath,
    len: u64,
}

impl SpooledSnapshot {
    /// Spool `data` in one go.
    pub async fn from_bytes(file_name: impl Into<String>, data: &[u8]) -> io::Result<Self> {
        let mut spool = SnapshotSpool::new(file_name).await?;
        spool.write(data).await?;
        spool.finish().await
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_chunks_are_appended_in_order() {
        let mut spool = SnapshotSpool::new("s1.snapshot").await.unwrap();
        spool.write(b"first-").await.unwrap();
        spool.write(b"second").await.unwrap();
        let snapshot = spool.finish().await.unwrap();

        assert_eq!(snapshot.file_name(), "s1.snapshot");
        assert_eq!(snapshot.len(), 12);
        assert_eq!(tokio::fs::read(snapshot.path()).await.unwrap(), b"first-second");
    }

    #[tokio::test]
    async fn test_file_is_removed_on_drop() {
        let snapshot = SpooledSnapshot::from_bytes("s1.snapshot", b"data").await.unwrap();
        let path = snapshot.path().to_path_buf();
        assert!(path.exists());

        drop(snapshot);
        assert!(!path.exists());
    }
}
