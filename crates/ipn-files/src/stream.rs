//! Channel-based adapters over the importer and exporter.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use ipn_types::Multihash;

use crate::entry::{AddEntry, IpfsFile};
use crate::error::{FilesError, FilesResult};
use crate::exporter::Exporter;
use crate::importer::Importer;

/// Buffered entries per stream.
pub const STREAM_BUFFER: usize = 16;

/// Start an add stream. Entries sent on the returned sender are imported
/// together once the sender is dropped; the handle resolves to the result
/// of [`Importer::add_entries`].
///
/// Must be called from within a tokio runtime.
pub fn add_stream(
    importer: Importer,
) -> (
    mpsc::Sender<AddEntry>,
    JoinHandle<FilesResult<Vec<IpfsFile>>>,
) {
    let (tx, mut rx) = mpsc::channel::<AddEntry>(STREAM_BUFFER);
    let handle = tokio::spawn(async move {
        let mut entries = Vec::new();
        while let Some(entry) = rx.recv().await {
            entries.push(entry);
        }
        debug!(entries = entries.len(), "add stream closed");
        tokio::task::spawn_blocking(move || importer.add_entries(entries))
            .await
            .map_err(|e| FilesError::Task(e.to_string()))?
    });
    (tx, handle)
}

/// Export `hash` entry by entry. An error ends the stream as its last item.
/// Dropping the receiver stops the export.
///
/// Must be called from within a tokio runtime.
pub fn get_pull(exporter: Exporter, hash: Multihash) -> mpsc::Receiver<FilesResult<IpfsFile>> {
    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
    tokio::task::spawn_blocking(move || {
        let result = exporter.for_each(&hash, |file| tx.blocking_send(Ok(file)).is_ok());
        if let Err(e) = result {
            let _ = tx.blocking_send(Err(e));
        }
    });
    rx
}
