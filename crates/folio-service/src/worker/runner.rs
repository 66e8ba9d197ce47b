//! Rebuild worker — polls the outbox and executes queued subtree
//! rebuilds with bounded retries.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{error, info, warn};

use folio_core::config::RebuildConfig;
use folio_core::result::AppResult;
use folio_database::repositories::outbox::OutboxRepository;
use folio_entity::node::NodeRef;
use folio_permission::JointPermissionBuilder;

/// Polls the rebuild outbox and runs queued subtree rebuilds.
#[derive(Debug, Clone)]
pub struct RebuildWorker {
    outbox: OutboxRepository,
    builder: JointPermissionBuilder,
    config: RebuildConfig,
}

impl RebuildWorker {
    /// Create a new rebuild worker.
    pub fn new(
        outbox: OutboxRepository,
        builder: JointPermissionBuilder,
        config: RebuildConfig,
    ) -> Self {
        Self {
            outbox,
            builder,
            config,
        }
    }

    /// Run until the cancel signal flips to true. Pending jobs drain
    /// back to back; an empty outbox sleeps for the poll interval.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        info!(
            poll_interval = self.config.poll_interval_seconds,
            "Rebuild worker started"
        );
        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds);

        loop {
            if *cancel.borrow() {
                info!("Rebuild worker shutting down");
                break;
            }

            match self.drain_once().await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(err) => error!(error = %err, "Outbox poll failed"),
            }

            tokio::select! {
                _ = cancel.changed() => {}
                _ = time::sleep(poll_interval) => {}
            }
        }
    }

    /// Claim and execute at most one queued rebuild. Returns whether a
    /// job was claimed, so callers can drain until empty.
    pub async fn drain_once(&self) -> AppResult<bool> {
        let Some(job) = self.outbox.claim_next().await? else {
            return Ok(false);
        };

        let node = NodeRef::new(job.node_id, job.node_kind);
        match self.builder.rebuild_for_subtree(node).await {
            Ok(()) => {
                self.outbox.complete(job.id).await?;
                info!(job = job.id, node = %node, "Queued rebuild completed");
            }
            Err(err) => {
                warn!(
                    job = job.id,
                    node = %node,
                    attempt = job.attempts,
                    max_attempts = job.max_attempts,
                    error = %err,
                    "Queued rebuild failed"
                );
                self.outbox.fail(job.id, &err.to_string()).await?;
                if job.attempts >= job.max_attempts {
                    // Attempts exhausted: surfaced for operators, the
                    // index for this subtree needs manual attention.
                    error!(job = job.id, node = %node, "Rebuild job exhausted its attempts");
                }
            }
        }
        Ok(true)
    }
}
