use std::{
    path::{Path, PathBuf},
    sync::{Arc, LazyLock},
};

use herald_common::{Signal, audit, internal};
use herald_delivery::{DeliveryWorker, DryRunTransport};
use herald_rules::{RuleSource, RuleStore};
use tokio::{
    signal::unix::{SignalKind, signal},
    sync::broadcast,
};

use crate::{
    config::{ConfigError, Herald},
    ingest::Ingestor,
};

pub static SHUTDOWN_BROADCAST: LazyLock<broadcast::Sender<Signal>> = LazyLock::new(|| {
    let (sender, _receiver) = broadcast::channel(64);
    sender
});

/// Owns the running relay: the rule store, the ingestion side and the
/// delivery worker, all built from one configuration file.
#[derive(Debug)]
pub struct Controller {
    config_path: PathBuf,
    rules: Arc<RuleStore>,
    ingestor: Arc<Ingestor>,
    worker: DeliveryWorker<DryRunTransport>,
}

#[tracing::instrument(level = "trace")]
async fn shutdown() -> anyhow::Result<()> {
    let mut terminate = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            internal!("CTRL+C entered -- Enter it again to force shutdown");
        }
        _ = terminate.recv() => {
            internal!("Terminate Signal received, shutting down");
        }
    };

    SHUTDOWN_BROADCAST
        .send(Signal::Shutdown)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Interrupted, e.to_string()))?;

    Ok(())
}

impl Controller {
    /// Load the configuration at `config_path` and build everything it
    /// describes.
    ///
    /// # Errors
    ///
    /// If the configuration is unreadable or invalid, or the spool cannot be
    /// initialised.
    pub fn init(config_path: &Path) -> anyhow::Result<Self> {
        let config = Herald::load(config_path)?;
        let routing = config.routing()?;

        audit::init(config.audit.clone());

        let queue = config.spool.into_queue()?;
        let rules = Arc::new(RuleStore::new(routing.rules));

        internal!(
            level = INFO,
            "Loaded {} rules, monitoring {} chats",
            rules.snapshot().len(),
            routing.monitored.len()
        );

        let ingestor = Arc::new(Ingestor::new(
            rules.clone(),
            routing.monitored,
            config.forward_mode,
            queue.clone(),
        ));

        Ok(Self {
            config_path: config_path.to_path_buf(),
            rules,
            ingestor,
            worker: DeliveryWorker::new(config.delivery, queue, DryRunTransport),
        })
    }

    pub fn ingestor(&self) -> Arc<Ingestor> {
        self.ingestor.clone()
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    pub const fn worker(&self) -> &DeliveryWorker<DryRunTransport> {
        &self.worker
    }

    /// Re-read the configuration file and swap in its rules and monitored
    /// chats.
    ///
    /// Spool, delivery and forward mode settings only take effect on
    /// restart.
    ///
    /// # Errors
    ///
    /// If the file is unreadable or invalid. The current rules stay in
    /// place.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let routing = Herald::load(&self.config_path)?.routing()?;

        self.ingestor.set_monitored(routing.monitored);
        self.rules.replace(routing.rules);

        Ok(())
    }

    async fn reload_on_hangup(&self) -> anyhow::Result<()> {
        let mut hangup = signal(SignalKind::hangup())?;

        while hangup.recv().await.is_some() {
            internal!(level = INFO, "SIGHUP received, reloading configuration");
            if let Err(err) = self.reload() {
                internal!(level = ERROR, "Reload failed, keeping current rules: {err}");
            }
        }

        Ok(())
    }

    /// Run the delivery worker until shutdown.
    ///
    /// When `read_stdin` is set, newline-delimited JSON messages on standard
    /// input are ingested as they arrive.
    ///
    /// # Errors
    ///
    /// This function will return an error if signal handlers cannot be
    /// installed, or the worker fails.
    #[tracing::instrument(level = "trace", skip_all, err)]
    pub async fn run(self, read_stdin: bool) -> anyhow::Result<()> {
        internal!("Controller running");

        let feed = read_stdin.then(|| {
            let ingestor = self.ingestor();
            tokio::spawn(async move {
                let stdin = tokio::io::BufReader::new(tokio::io::stdin());
                match ingestor.feed(stdin).await {
                    Ok(count) => internal!(level = INFO, "Input closed after {count} records"),
                    Err(err) => internal!(level = ERROR, "Failed to read input: {err}"),
                }
            })
        });

        let control = async {
            let ret = tokio::select! {
                r = self.reload_on_hangup() => {
                    r
                }
                r = shutdown() => {
                    r
                }
            };

            // The worker must stop even if the signal handlers failed
            let _ = SHUTDOWN_BROADCAST.send(Signal::Shutdown);
            ret
        };

        let (served, controlled) =
            tokio::join!(self.worker.serve(SHUTDOWN_BROADCAST.subscribe()), control);

        if let Some(feed) = feed {
            feed.abort();
        }

        internal!("Shutting down...");

        served?;
        controlled
    }
}
