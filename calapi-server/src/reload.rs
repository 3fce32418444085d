//! Config hot-reload.
//!
//! Polls the config file's modification time. Sources and rules are re-read
//! by the cache on every refresh anyway; a change here only restarts the
//! refresh timer so a new interval takes effect right away.

use std::time::{Duration, SystemTime};

use calapi_core::RefreshScheduler;
use calapi_core::config::{FileConfigProvider, ServerConfig};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct ConfigWatcher {
    provider: FileConfigProvider,
    /// Settings the server was started with.
    bound: ServerConfig,
    scheduler: RefreshScheduler,
    last_modified: Option<SystemTime>,
}

impl ConfigWatcher {
    pub fn new(provider: FileConfigProvider, bound: ServerConfig, scheduler: RefreshScheduler) -> Self {
        let last_modified = modified(&provider);
        ConfigWatcher {
            provider,
            bound,
            scheduler,
            last_modified,
        }
    }

    /// Poll until `cancel` fires, then stop the scheduler.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.poll().await;
                }
            }
        }

        self.scheduler.stop().await;
    }

    /// Reload if the file changed since the last poll. Returns whether it did.
    pub async fn poll(&mut self) -> bool {
        let current = modified(&self.provider);
        if current == self.last_modified {
            return false;
        }
        self.last_modified = current;

        info!(path = %self.provider.path().display(), "Config file change detected");

        let server = match self.provider.server() {
            Ok(server) => server,
            Err(e) => {
                error!(error = %e, "Unable to reload config, keeping the current settings");
                return false;
            }
        };

        if server.http_addr() != self.bound.http_addr() {
            error!(
                current = %self.bound.http_addr(),
                requested = %server.http_addr(),
                "Cannot change host or port at runtime, restart the server to apply"
            );
        }

        self.scheduler.restart(server.refresh_interval()).await;
        true
    }

    #[cfg(test)]
    fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }
}

fn modified(provider: &FileConfigProvider) -> Option<SystemTime> {
    match std::fs::metadata(provider.path()).and_then(|meta| meta.modified()) {
        Ok(time) => Some(time),
        Err(e) => {
            debug!(error = %e, "Unable to stat config file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use calapi_core::AggregationCache;
    use calapi_core::config::{ConfigProvider, StaticConfig};

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn rewrite(file: &tempfile::NamedTempFile, contents: &str, age: Duration) {
        std::fs::write(file.path(), contents).unwrap();
        // Some filesystems have coarse mtimes; move it explicitly.
        let handle = std::fs::OpenOptions::new()
            .write(true)
            .open(file.path())
            .unwrap();
        handle.set_modified(SystemTime::now() + age).unwrap();
    }

    async fn watcher(file: &tempfile::NamedTempFile) -> ConfigWatcher {
        let provider = FileConfigProvider::new(file.path());
        let bound = provider.server().unwrap();
        let config: Arc<dyn ConfigProvider> = Arc::new(StaticConfig::new(Vec::new(), Vec::new()));
        let mut scheduler = RefreshScheduler::new(Arc::new(AggregationCache::new(config)));
        scheduler.start(bound.refresh_interval()).await;
        ConfigWatcher::new(provider, bound, scheduler)
    }

    #[tokio::test]
    async fn unchanged_file_is_ignored() {
        let file = write_config("server:\n  refresh: 5m\n");
        let mut watcher = watcher(&file).await;

        assert!(!watcher.poll().await);
        assert_eq!(watcher.scheduler().interval(), Some(Duration::from_secs(300)));
    }

    #[tokio::test]
    async fn changed_interval_restarts_the_scheduler() {
        let file = write_config("server:\n  refresh: 5m\n");
        let mut watcher = watcher(&file).await;

        rewrite(&file, "server:\n  refresh: 1h\n", Duration::from_secs(10));
        assert!(watcher.poll().await);
        assert_eq!(watcher.scheduler().interval(), Some(Duration::from_secs(3600)));

        // a second poll without changes does nothing
        assert!(!watcher.poll().await);
    }

    #[tokio::test]
    async fn port_change_is_not_applied() {
        let file = write_config("server:\n  http_port: 8099\n  refresh: 5m\n");
        let mut watcher = watcher(&file).await;

        rewrite(
            &file,
            "server:\n  http_port: 9000\n  refresh: 10m\n",
            Duration::from_secs(10),
        );
        assert!(watcher.poll().await);
        assert_eq!(watcher.bound.http_port, 8099);
        assert_eq!(watcher.scheduler().interval(), Some(Duration::from_secs(600)));
    }
}
