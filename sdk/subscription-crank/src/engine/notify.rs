use crate::types::DueEvent;
use async_trait::async_trait;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex};

/// Sink for "payment due" events, consumed by an external notifier.
///
/// The crank never waits on the notifier's downstream delivery; a failed
/// hand-off is logged and the pass carries on.
#[async_trait]
pub trait DueNotifier: Send + Sync {
    async fn notify(&self, event: &DueEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

#[async_trait]
impl<T: DueNotifier + ?Sized> DueNotifier for Box<T> {
    async fn notify(&self, event: &DueEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        (**self).notify(event).await
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl DueNotifier for NoopNotifier {
    async fn notify(&self, _event: &DueEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

/// Forwards events to an in-process consumer.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<DueEvent>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DueEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl DueNotifier for ChannelNotifier {
    async fn notify(&self, event: &DueEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.sender
            .send(event.clone())
            .map_err(|_| "notification receiver dropped")?;
        Ok(())
    }
}

/// Appends one JSON object per line to a spool file.
pub struct SpoolNotifier {
    path: PathBuf,
    file: Mutex<File>,
}

impl SpoolNotifier {
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DueNotifier for SpoolNotifier {
    async fn notify(&self, event: &DueEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
