//! Outbound pump.
//!
//! Drains the change-event queue: each pending event is built into an
//! envelope by the coordinator, sent over the uplink transport and retired.
//! An event whose send fails stays pending and is read again on the next
//! batch, so the peer sees every change at least once.

use crate::config::SyncConfig;
use crate::coordinator::SyncCoordinator;
use crate::error::SyncResult;
use crate::transport::UplinkTransport;
use edgesync_core::EventQueue;
use edgesync_protocol::OutboundEnvelope;
use std::sync::Arc;
use tokio::sync::watch;

/// What one drain pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Events read from the queue.
    pub read: usize,
    /// Envelopes sent and retired.
    pub sent: usize,
    /// Events retired without sending because the entity was gone.
    pub skipped: usize,
    /// Events left pending after a failed send.
    pub failed: usize,
}

impl DrainReport {
    /// Returns true if the pass made progress through the queue.
    pub fn made_progress(&self) -> bool {
        self.sent + self.skipped > 0
    }
}

/// Moves locally recorded changes to the peer.
pub struct OutboundPump {
    coordinator: Arc<SyncCoordinator>,
    events: Arc<EventQueue>,
    transport: Arc<dyn UplinkTransport>,
    config: SyncConfig,
}

impl OutboundPump {
    /// Creates a pump.
    pub fn new(
        coordinator: Arc<SyncCoordinator>,
        events: Arc<EventQueue>,
        transport: Arc<dyn UplinkTransport>,
        config: SyncConfig,
    ) -> Self {
        Self {
            coordinator,
            events,
            transport,
            config,
        }
    }

    /// Processes up to `max_read_records` pending events.
    ///
    /// Stops at the first event that cannot be sent so later changes to the
    /// same entity are not delivered ahead of it.
    ///
    /// # Errors
    ///
    /// Returns fatal errors (unregistered kind, non-retryable transport
    /// failure). The failing event stays pending.
    pub async fn drain_once(&self) -> SyncResult<DrainReport> {
        let batch = self.events.pending(self.config.max_read_records);
        let mut report = DrainReport {
            read: batch.len(),
            ..DrainReport::default()
        };

        for event in batch {
            let envelope = match self.coordinator.build_outbound(&event).await {
                Ok(Some(envelope)) => envelope,
                Ok(None) => {
                    self.events.retire(event.sequence);
                    report.skipped += 1;
                    continue;
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) if err.is_retryable() => {
                    tracing::warn!(
                        sequence = event.sequence,
                        error = %err,
                        "build failed, event left pending"
                    );
                    report.failed += 1;
                    break;
                }
                Err(err) => {
                    tracing::error!(
                        sequence = event.sequence,
                        kind = %event.kind,
                        error = %err,
                        "cannot build outbound message, dropping event"
                    );
                    self.events.retire(event.sequence);
                    report.failed += 1;
                    continue;
                }
            };

            match self.send_with_retry(envelope).await {
                Ok(()) => {
                    self.events.retire(event.sequence);
                    report.sent += 1;
                }
                Err(err) if err.is_retryable() => {
                    tracing::warn!(
                        node = %self.config.node_name,
                        sequence = event.sequence,
                        error = %err,
                        "send failed, event left pending"
                    );
                    report.failed += 1;
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        if report.read > 0 {
            tracing::debug!(
                node = %self.config.node_name,
                read = report.read,
                sent = report.sent,
                skipped = report.skipped,
                failed = report.failed,
                "outbound batch"
            );
        }
        Ok(report)
    }

    async fn send_with_retry(&self, envelope: OutboundEnvelope) -> SyncResult<()> {
        let retry = &self.config.retry;
        let mut attempt = 0;
        loop {
            let delay = retry.delay_for_attempt(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match self.transport.send(envelope.clone()).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_retryable() && attempt + 1 < retry.max_attempts => {
                    tracing::debug!(attempt, error = %err, "retrying send");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Drains the queue until `shutdown` turns true or its sender is
    /// dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> SyncResult<()> {
        tracing::info!(node = %self.config.node_name, "outbound pump started");
        loop {
            if *shutdown.borrow() {
                break;
            }

            let report = self.drain_once().await?;
            let pause = if report.made_progress() {
                self.config.sleep_between_batches
            } else {
                self.config.no_records_sleep
            };
            if report.made_progress() && pause.is_zero() {
                tokio::task::yield_now().await;
                continue;
            }

            let idle = report.read == 0;
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(pause) => {}
                _ = self.events.wait_for_events(), if idle => {}
            }
        }
        tracing::info!(node = %self.config.node_name, "outbound pump stopped");
        Ok(())
    }
}

impl std::fmt::Debug for OutboundPump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundPump")
            .field("node", &self.config.node_name)
            .field("pending", &self.events.len())
            .finish_non_exhaustive()
    }
}
