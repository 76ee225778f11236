// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer source: cron schedules firing `trigger-node` into the loop.
//!
//! The controller only sees the [`TimerSource`] trait; the provided
//! implementation keeps one task per node↔schedule association and
//! computes fire times from the cron expression.

use baton_core::{NodeId, NodeScheduleId};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::runtime::Input;

#[derive(Debug, Error)]
pub enum TimerError {
    #[error("invalid cron expression {expr:?}: {reason}")]
    BadExpression { expr: String, reason: String },
}

/// The trigger side of scheduling, as the controller sees it.
pub trait TimerSource: Send + Sync + 'static {
    /// Register (or replace) the trigger for one association.
    fn schedule_cron_job(
        &self,
        id: NodeScheduleId,
        node_id: NodeId,
        cron_expr: &str,
    ) -> Result<(), TimerError>;

    /// Drop every trigger registered for a node.
    fn remove_node_triggers(&self, node_id: NodeId);
}

struct CronJob {
    node_id: NodeId,
    handle: JoinHandle<()>,
}

/// Cron-backed timer source; emits `Input::Trigger` into the controller
/// channel when a schedule fires.
pub struct CronTimerSource {
    tx: mpsc::Sender<Input>,
    jobs: Mutex<HashMap<NodeScheduleId, CronJob>>,
}

impl CronTimerSource {
    pub fn new(tx: mpsc::Sender<Input>) -> Self {
        Self { tx, jobs: Mutex::new(HashMap::new()) }
    }
}

impl TimerSource for CronTimerSource {
    fn schedule_cron_job(
        &self,
        id: NodeScheduleId,
        node_id: NodeId,
        cron_expr: &str,
    ) -> Result<(), TimerError> {
        let schedule = cron::Schedule::from_str(cron_expr).map_err(|e| {
            TimerError::BadExpression { expr: cron_expr.to_string(), reason: e.to_string() }
        })?;

        let tx = self.tx.clone();
        let expr = cron_expr.to_string();
        let handle = tokio::spawn(async move {
            loop {
                let Some(next) = schedule.upcoming(Utc).next() else {
                    tracing::info!(node = %node_id, expr = %expr, "schedule exhausted");
                    break;
                };
                let wait = (next - Utc::now()).to_std().unwrap_or_default();
                tokio::time::sleep(wait).await;
                tracing::debug!(node = %node_id, "cron fired");
                if tx.send(Input::Trigger { node_id }).await.is_err() {
                    break;
                }
            }
        });

        let mut jobs = self.jobs.lock();
        if let Some(old) = jobs.insert(id, CronJob { node_id, handle }) {
            old.handle.abort();
        }
        Ok(())
    }

    fn remove_node_triggers(&self, node_id: NodeId) {
        let mut jobs = self.jobs.lock();
        jobs.retain(|_, job| {
            if job.node_id == node_id {
                job.handle.abort();
                false
            } else {
                true
            }
        });
    }
}

impl Drop for CronTimerSource {
    fn drop(&mut self) {
        for job in self.jobs.lock().values() {
            job.handle.abort();
        }
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
