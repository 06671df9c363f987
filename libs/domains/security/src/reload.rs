use async_trait::async_trait;

/// The vector store client's view of key rotation.
///
/// After a new key file is written the client is told a reload is pending;
/// once the store restarts with the new key the client re-reads the file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyReloader: Send + Sync {
    fn mark_pending(&self);

    async fn reload_from_file(&self) -> std::io::Result<()>;
}
