// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The conductor controller.
//!
//! One [`Runtime`] owns all mutable execution state: the per-execution
//! infos, the agent tracker, and the schedule cache. Handlers run on a
//! single logical event loop (see [`crate::conductor`]); the mutexes
//! below only guard against the brief reads tests perform and are never
//! held across await points.

mod handlers;
mod monitor;

use crate::cache::ScheduleCache;
use crate::error::RuntimeError;
use crate::notify::Notifier;
use crate::timer::TimerSource;
use crate::tracker::AgentTracker;
use crate::transport::Transport;
use baton_core::{
    AgentId, Clock, ExecVertexId, ExecWorkflowId, ExecutionId, ExecutionModel, NodeId,
    StatusEvent,
};
use baton_store::Store;
use baton_wire::{FromAgent, ToAgent, Topic};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Everything that can enter the controller loop.
#[derive(Debug)]
pub enum Input {
    /// A decoded message from the agent inbox.
    Agent(FromAgent),
    /// A cron schedule fired for a node.
    Trigger { node_id: NodeId },
    /// A request from the CRUD collaborator or an operator surface.
    Control(ControlRequest),
    /// Broadcast a heartbeat to agents.
    HeartbeatTick,
    /// Scan for agents whose heartbeat went stale.
    WatchdogTick,
}

/// Requests from collaborators outside the agent protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRequest {
    /// A node row changed; refresh the cache.
    NodeSave { node_id: NodeId },
    /// A schedule row changed; refresh the cache and re-register timers.
    ScheduleSave { schedule_id: baton_core::ScheduleId },
    /// A node's schedule associations changed; reload them.
    ScheduleAssoc { node_id: NodeId },
    /// Start an execution for a node now.
    TriggerNode { node_id: NodeId },
    AbortExecution { execution_id: ExecutionId },
    ResumeExecution { execution_id: ExecutionId, exec_vertex_id: ExecVertexId },
}

/// Runtime adapter dependencies.
pub struct RuntimeDeps<T, N> {
    pub store: Arc<dyn Store>,
    pub transport: Arc<T>,
    pub notifier: N,
    pub timer: Arc<dyn TimerSource>,
}

/// Controller tunables.
#[derive(Debug, Clone)]
pub struct Settings {
    pub heartbeat_dead_after: Duration,
    pub max_concurrent_per_agent: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self { heartbeat_dead_after: Duration::from_secs(60), max_concurrent_per_agent: None }
    }
}

/// Book-keeping for one live execution.
pub(crate) struct ExecInfo {
    pub(crate) model: Arc<ExecutionModel>,
    pub(crate) root_wf_name: String,
    #[allow(dead_code)] // reported in status queries
    pub(crate) start_ts: u64,
    /// Acked in-flight job vertices per exec-workflow.
    pub(crate) running_jobs: HashMap<ExecWorkflowId, u32>,
    /// Scheduled vertices per exec-workflow that have not reached a
    /// terminal state: jobs from dispatch (acked or not, forced or
    /// not), workflow vertices until their child exec-workflow closes.
    /// An exec-workflow cannot complete while this is non-empty, so a
    /// sibling finishing first never closes it out from under
    /// still-scheduled work.
    pub(crate) in_flight: HashMap<ExecWorkflowId, HashSet<ExecVertexId>>,
    /// Exec-workflows in which some vertex failed with no successor to
    /// take over.
    pub(crate) failed_wfs: HashSet<ExecWorkflowId>,
}

/// Runtime that coordinates the system.
pub struct Runtime<T, N, C: Clock> {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) transport: Arc<T>,
    pub(crate) notifier: N,
    pub(crate) clock: C,
    pub(crate) timer: Arc<dyn TimerSource>,
    pub(crate) tracker: Mutex<AgentTracker>,
    pub(crate) cache: Mutex<ScheduleCache>,
    pub(crate) exec_infos: Mutex<HashMap<ExecutionId, ExecInfo>>,
    pub(crate) event_tx: mpsc::Sender<StatusEvent>,
    pub(crate) settings: Settings,
}

impl<T, N, C> Runtime<T, N, C>
where
    T: Transport,
    N: Notifier,
    C: Clock,
{
    pub fn new(
        deps: RuntimeDeps<T, N>,
        clock: C,
        settings: Settings,
        tracker: AgentTracker,
        event_tx: mpsc::Sender<StatusEvent>,
    ) -> Self {
        Self {
            store: deps.store,
            transport: deps.transport,
            notifier: deps.notifier,
            clock,
            timer: deps.timer,
            tracker: Mutex::new(tracker),
            cache: Mutex::new(ScheduleCache::new()),
            exec_infos: Mutex::new(HashMap::new()),
            event_tx,
            settings,
        }
    }

    /// Load nodes, schedules, and associations into the cache and
    /// register every association with the timer source.
    pub async fn warm_up(&self) -> Result<(), RuntimeError> {
        let nodes = self.store.nodes().await?;
        let schedules = self.store.schedules().await?;
        let assocs = self.store.node_schedules().await?;
        tracing::info!(
            nodes = nodes.len(),
            schedules = schedules.len(),
            assocs = assocs.len(),
            "warming schedule cache"
        );
        {
            let mut cache = self.cache.lock();
            cache.put_nodes(nodes);
            cache.put_schedules(schedules.clone());
            cache.put_assocs(assocs.clone());
        }
        let by_id: HashMap<_, _> = schedules.into_iter().map(|s| (s.schedule_id, s)).collect();
        for assoc in assocs {
            let Some(schedule) = by_id.get(&assoc.schedule_id) else {
                tracing::warn!(assoc = %assoc.node_schedule_id, "association without schedule");
                continue;
            };
            self.timer.schedule_cron_job(
                assoc.node_schedule_id,
                assoc.node_id,
                &schedule.cron_expression,
            )?;
        }
        Ok(())
    }

    /// Handle one loop input.
    pub async fn handle(&self, input: Input) -> Result<(), RuntimeError> {
        match input {
            Input::Agent(msg) => self.handle_agent_message(msg).await,
            Input::Trigger { node_id } => self.trigger_node(node_id).await,
            Input::Control(req) => self.handle_control(req).await,
            Input::HeartbeatTick => self.handle_heartbeat_tick().await,
            Input::WatchdogTick => self.handle_watchdog_tick().await,
        }
    }

    // -- shared helpers --

    /// Model of a live execution.
    pub(crate) fn model(&self, id: ExecutionId) -> Result<Arc<ExecutionModel>, RuntimeError> {
        self.exec_infos
            .lock()
            .get(&id)
            .map(|info| Arc::clone(&info.model))
            .ok_or(RuntimeError::ExecutionNotFound(id))
    }

    /// Whether an execution is currently held in memory.
    pub fn is_live(&self, id: ExecutionId) -> bool {
        self.exec_infos.lock().contains_key(&id)
    }

    /// Emit a UI event. Blocks when the status channel is full: stalled
    /// consumers slow the loop down instead of losing events.
    pub(crate) async fn emit(&self, event: StatusEvent) -> Result<(), RuntimeError> {
        tracing::debug!(event = %event.log_summary(), "emit");
        self.event_tx.send(event).await.map_err(|_| RuntimeError::EventChannelClosed)
    }

    /// Publish one message to an agent topic, retrying transient
    /// failures with bounded backoff.
    pub(crate) async fn send_to_agent(
        &self,
        agent: &AgentId,
        msg: &ToAgent,
    ) -> Result<(), RuntimeError> {
        self.publish(Topic::Agent(agent.clone()), msg).await
    }

    pub(crate) async fn broadcast(&self, msg: &ToAgent) -> Result<(), RuntimeError> {
        self.publish(Topic::Broadcast, msg).await
    }

    async fn publish(&self, topic: Topic, msg: &ToAgent) -> Result<(), RuntimeError> {
        let payload = baton_wire::encode(msg)?;
        let mut attempt: u32 = 0;
        loop {
            match self.transport.publish(topic.clone(), payload.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    attempt += 1;
                    if attempt >= PUBLISH_ATTEMPTS {
                        return Err(e.into());
                    }
                    tracing::warn!(
                        error = %e,
                        topic = %topic,
                        kind = msg.kind(),
                        attempt,
                        "publish failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(50 * attempt as u64)).await;
                }
            }
        }
    }
}

const PUBLISH_ATTEMPTS: u32 = 3;

#[cfg(test)]
#[path = "runtime_tests/mod.rs"]
mod tests;
