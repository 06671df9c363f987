use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const MIN_KEY_LEN: usize = 16;

/// Write `key` (trimmed) to `path` readable by the owner only.
///
/// The key goes to a temporary file in the same directory (created `0600`
/// on unix), which is then renamed over `path`. Parent directories are
/// created as needed.
pub async fn write_key_file(path: &Path, key: &str) -> io::Result<()> {
    let key = key.trim().to_string();
    if key.chars().count() < MIN_KEY_LEN {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "Key too short"));
    }

    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent.to_path_buf(),
        None => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&dir).await?;

    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> io::Result<()> {
        let mut temp = tempfile::Builder::new()
            .prefix(".qdrant-key-")
            .tempfile_in(&dir)?;
        temp.write_all(key.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&path)?;
        Ok(())
    })
    .await
    .map_err(io::Error::other)?
}
