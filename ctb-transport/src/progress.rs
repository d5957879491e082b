use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Live byte counters for one transfer, shared between the transport doing
/// the work and whoever is watching.
#[derive(Debug, Clone, Default)]
pub struct TransferProgress {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    upload_sent: AtomicU64,
    upload_total: AtomicU64,
    download_received: AtomicU64,
    download_total: AtomicU64,
}

impl TransferProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_upload_total(&self, total: u64) {
        self.inner.upload_total.store(total, Ordering::Relaxed);
    }

    pub fn add_uploaded(&self, bytes: u64) {
        self.inner.upload_sent.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn set_uploaded(&self, sent: u64, total: u64) {
        self.inner.upload_total.store(total, Ordering::Relaxed);
        self.inner.upload_sent.store(sent, Ordering::Relaxed);
    }

    pub fn set_download_total(&self, total: u64) {
        self.inner.download_total.store(total, Ordering::Relaxed);
    }

    pub fn add_downloaded(&self, bytes: u64) {
        self.inner.download_received.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Marks both directions finished.
    pub fn complete(&self) {
        for (done, total) in [
            (&self.inner.upload_sent, &self.inner.upload_total),
            (&self.inner.download_received, &self.inner.download_total),
        ] {
            let value = total.load(Ordering::Relaxed).max(done.load(Ordering::Relaxed)).max(1);
            total.store(value, Ordering::Relaxed);
            done.store(value, Ordering::Relaxed);
        }
    }

    /// Fraction of the request body handed to the connection, in `0..=1`.
    pub fn upload(&self) -> f32 {
        ratio(
            self.inner.upload_sent.load(Ordering::Relaxed),
            self.inner.upload_total.load(Ordering::Relaxed),
        )
    }

    /// Fraction of the response body received, in `0..=1`. Stays 0 until the
    /// length is known.
    pub fn download(&self) -> f32 {
        ratio(
            self.inner.download_received.load(Ordering::Relaxed),
            self.inner.download_total.load(Ordering::Relaxed),
        )
    }
}

fn ratio(done: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    (done as f64 / total as f64).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratios_are_clamped() {
        let progress = TransferProgress::new();
        assert_eq!(progress.upload(), 0.0);

        progress.set_upload_total(200);
        progress.add_uploaded(50);
        assert_eq!(progress.upload(), 0.25);

        progress.add_uploaded(500);
        assert_eq!(progress.upload(), 1.0);
    }

    #[test]
    fn clones_share_counters() {
        let progress = TransferProgress::new();
        let watcher = progress.clone();

        progress.set_download_total(10);
        progress.add_downloaded(5);
        assert_eq!(watcher.download(), 0.5);

        progress.complete();
        assert_eq!(watcher.upload(), 1.0);
        assert_eq!(watcher.download(), 1.0);
    }
}
