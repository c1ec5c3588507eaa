//! Cron-driven publish trigger.
//!
//! Fires on a wall-clock schedule and runs one publish tick per firing.
//! Overlapping firings are safe: the atomic claim in the store decides
//! who wins, the scheduler itself holds no lock.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cron::Schedule;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::error::PipelineError;
use super::orchestrator::{PipelineOrchestrator, TickOutcome};

/// Parses a cron expression, accepting both the classic 5-field form
/// (minute-resolution) and the 6/7-field form with seconds.
pub fn parse_schedule(expression: &str) -> Result<Schedule, PipelineError> {
    let normalized = normalize_expression(expression);
    Schedule::from_str(&normalized)
        .map_err(|e| PipelineError::InvalidSchedule(format!("{}: {}", expression, e)))
}

fn normalize_expression(expression: &str) -> String {
    let fields = expression.split_whitespace().count();
    if fields == 5 {
        // Classic crontab form; pin the seconds field to zero.
        format!("0 {}", expression.trim())
    } else {
        expression.trim().to_string()
    }
}

/// Background task firing publish ticks on a cron schedule.
pub struct PublishScheduler {
    schedule: Schedule,
    expression: String,
    orchestrator: Arc<PipelineOrchestrator>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl PublishScheduler {
    /// Create a new scheduler. `expression` is a cron expression in
    /// 5-field or seconds-resolution form.
    pub fn new(
        expression: &str,
        orchestrator: Arc<PipelineOrchestrator>,
    ) -> Result<Self, PipelineError> {
        let schedule = parse_schedule(expression)?;
        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            schedule,
            expression: expression.to_string(),
            orchestrator,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        })
    }

    /// The configured cron expression.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Next scheduled firing, if any.
    pub fn next_firing(&self) -> Option<chrono::DateTime<Utc>> {
        self.schedule.upcoming(Utc).next()
    }

    /// Start the scheduler loop (spawns a background task).
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Publish scheduler already running");
            return;
        }

        info!(schedule = %self.expression, "Starting publish scheduler");

        let schedule = self.schedule.clone();
        let orchestrator = Arc::clone(&self.orchestrator);
        let running = Arc::clone(&self.running);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            loop {
                let Some(next) = schedule.upcoming(Utc).next() else {
                    warn!("Schedule has no upcoming firings, scheduler exiting");
                    break;
                };
                let wait = (next - Utc::now())
                    .to_std()
                    .unwrap_or(Duration::from_secs(0));
                debug!(next = %next, "Next publish tick scheduled");

                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Publish scheduler received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(wait) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        match orchestrator.publish_tick().await {
                            Ok(TickOutcome::Published(item)) => {
                                info!(item_id = %item.id, "Scheduled publish succeeded");
                            }
                            Ok(TickOutcome::NothingEligible) => {
                                debug!("Scheduled publish: nothing eligible");
                            }
                            Ok(TickOutcome::PublishInFlight) => {
                                info!("Scheduled publish skipped: publish already in flight");
                            }
                            Ok(TickOutcome::Failed { item_id, reason }) => {
                                warn!(item_id = %item_id, "Scheduled publish failed: {}", reason);
                            }
                            Err(e) => {
                                warn!("Publish tick error: {}", e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Stop the scheduler gracefully.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Publish scheduler not running");
            return;
        }
        info!("Stopping publish scheduler");
        let _ = self.shutdown_tx.send(());
    }
}
