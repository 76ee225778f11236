// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test doubles and the conductor test harness.
//!
//! Shared by this crate's runtime tests and the workspace-level specs:
//! an in-process recording transport, recording notifier and timer
//! source, and [`TestConductor`], which drives the controller directly
//! (no loop task) with a scripted agent.

use crate::error::RuntimeError;
use crate::notify::{Notifier, NotifyError};
use crate::runtime::{Input, Runtime, RuntimeDeps, Settings};
use crate::timer::{TimerError, TimerSource};
use crate::tracker::{AgentTracker, Selection};
use crate::transport::{Transport, TransportError};
use async_trait::async_trait;
use baton_core::{
    AgentId, ExecVertexId, ExecWorkflowId, ExecutionId, FakeClock, NodeId, NodeScheduleId,
    RunStatus, StatusEvent,
};
use baton_store::{MemoryStore, Store};
use baton_wire::{FromAgent, ToAgent, Topic};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Transport that records every published payload for assertions.
#[derive(Default)]
pub struct ChannelTransport {
    sent: Mutex<Vec<(Topic, Vec<u8>)>>,
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything published so far.
    pub fn take_sent(&self) -> Vec<(Topic, Vec<u8>)> {
        std::mem::take(&mut self.sent.lock())
    }

    /// Drain and decode the agent-bound messages published so far.
    pub fn take_agent_messages(&self) -> Vec<(Topic, ToAgent)> {
        self.take_sent()
            .into_iter()
            .filter_map(|(topic, payload)| {
                baton_wire::decode::<ToAgent>(&payload).ok().map(|msg| (topic, msg))
            })
            .collect()
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn publish(&self, topic: Topic, payload: Vec<u8>) -> Result<(), TransportError> {
        self.sent.lock().push((topic, payload));
        Ok(())
    }
}

/// Notifier that records calls instead of sending mail.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub failed: Arc<Mutex<Vec<(ExecutionId, String)>>>,
    pub dead: Arc<Mutex<Vec<BTreeMap<AgentId, BTreeSet<ExecVertexId>>>>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn execution_failed(
        &self,
        execution_id: ExecutionId,
        name: &str,
        _error: &str,
    ) -> Result<(), NotifyError> {
        self.failed.lock().push((execution_id, name.to_string()));
        Ok(())
    }

    async fn agents_dead(
        &self,
        dead: &BTreeMap<AgentId, BTreeSet<ExecVertexId>>,
    ) -> Result<(), NotifyError> {
        self.dead.lock().push(dead.clone());
        Ok(())
    }
}

/// Timer source that records registrations instead of spawning tasks.
#[derive(Clone, Default)]
pub struct RecordingTimer {
    pub scheduled: Arc<Mutex<Vec<(NodeScheduleId, NodeId, String)>>>,
    pub removed: Arc<Mutex<Vec<NodeId>>>,
}

impl TimerSource for RecordingTimer {
    fn schedule_cron_job(
        &self,
        id: NodeScheduleId,
        node_id: NodeId,
        cron_expr: &str,
    ) -> Result<(), TimerError> {
        self.scheduled.lock().push((id, node_id, cron_expr.to_string()));
        Ok(())
    }

    fn remove_node_triggers(&self, node_id: NodeId) {
        self.removed.lock().push(node_id);
    }
}

/// In-memory conductor with deterministic agent selection.
pub struct TestConductor {
    pub runtime: Arc<Runtime<ChannelTransport, RecordingNotifier, FakeClock>>,
    pub store: Arc<MemoryStore>,
    pub transport: Arc<ChannelTransport>,
    pub clock: FakeClock,
    pub notifier: RecordingNotifier,
    pub timer: RecordingTimer,
    pub events: mpsc::Receiver<StatusEvent>,
    /// Dispatches observed but not yet handed to a scripted agent.
    pending: Mutex<std::collections::VecDeque<(Topic, ToAgent)>>,
}

impl TestConductor {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(ChannelTransport::new());
        let clock = FakeClock::new();
        let notifier = RecordingNotifier::default();
        let timer = RecordingTimer::default();
        let (event_tx, events) = mpsc::channel(256);
        let runtime = Arc::new(Runtime::new(
            RuntimeDeps {
                store: Arc::clone(&store) as Arc<dyn Store>,
                transport: Arc::clone(&transport),
                notifier: notifier.clone(),
                timer: Arc::new(timer.clone()),
            },
            clock.clone(),
            settings,
            AgentTracker::with_selection(Selection::Deterministic),
            event_tx,
        ));
        Self {
            runtime,
            store,
            transport,
            clock,
            notifier,
            timer,
            events,
            pending: Mutex::new(std::collections::VecDeque::new()),
        }
    }

    pub async fn handle(&self, input: Input) -> Result<(), RuntimeError> {
        self.runtime.handle(input).await
    }

    /// Register an agent and swallow the `agent-registered` reply.
    pub async fn register_agent(&self, name: &str) -> Result<AgentId, RuntimeError> {
        let agent = AgentId::new(name);
        self.runtime
            .handle_agent_message(FromAgent::AgentRegistering { agent_id: agent.clone() })
            .await?;
        self.transport.take_sent();
        Ok(agent)
    }

    pub async fn trigger(&self, node_id: NodeId) -> Result<(), RuntimeError> {
        self.runtime.trigger_node(node_id).await
    }

    /// Pop every status event emitted so far.
    pub fn drain_events(&mut self) -> Vec<StatusEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    /// Event kinds emitted so far, in order.
    pub fn drain_event_kinds(&mut self) -> Vec<String> {
        self.drain_events()
            .iter()
            .map(|e| {
                e.log_summary().split_whitespace().next().unwrap_or_default().to_string()
            })
            .collect()
    }

    /// Move everything newly published into the pending queue.
    fn refill_pending(&self) {
        self.pending.lock().extend(self.transport.take_agent_messages());
    }

    /// Pop the oldest dispatched `run-job`, keeping later dispatches
    /// queued for subsequent calls.
    pub fn next_run_job(&self) -> Option<RunJobAt> {
        self.refill_pending();
        let mut pending = self.pending.lock();
        let idx = pending
            .iter()
            .position(|(t, m)| matches!((t, m), (Topic::Agent(_), ToAgent::RunJob { .. })))?;
        match pending.remove(idx) {
            Some((
                Topic::Agent(agent),
                ToAgent::RunJob { execution_id, exec_vertex_id, exec_wf_id, .. },
            )) => Some(RunJobAt { agent, execution_id, exec_vertex_id, exec_wf_id }),
            _ => None,
        }
    }

    /// Drain every queued `run-job`, leaving other traffic pending.
    fn take_pending_run_jobs(&self) -> Vec<RunJobAt> {
        self.refill_pending();
        let mut pending = self.pending.lock();
        let mut keep = std::collections::VecDeque::new();
        let mut out = Vec::new();
        while let Some(entry) = pending.pop_front() {
            match entry {
                (
                    Topic::Agent(agent),
                    ToAgent::RunJob { execution_id, exec_vertex_id, exec_wf_id, .. },
                ) => out.push(RunJobAt { agent, execution_id, exec_vertex_id, exec_wf_id }),
                other => keep.push_back(other),
            }
        }
        *pending = keep;
        out
    }

    /// Agent accepted the dispatch.
    pub async fn ack_job(&self, at: &RunJobAt) -> Result<(), RuntimeError> {
        self.runtime
            .handle_agent_message(FromAgent::RunJobAck {
                execution_id: at.execution_id,
                exec_vertex_id: at.exec_vertex_id,
                exec_wf_id: at.exec_wf_id,
                agent_id: at.agent.clone(),
            })
            .await
    }

    /// Agent reported the job done.
    pub async fn finish_job(&self, at: &RunJobAt, success: bool) -> Result<(), RuntimeError> {
        self.runtime
            .handle_agent_message(FromAgent::JobFinished {
                execution_id: at.execution_id,
                exec_vertex_id: at.exec_vertex_id,
                exec_wf_id: at.exec_wf_id,
                agent_id: at.agent.clone(),
                success,
                status: RunStatus::finished(success),
                error_msg: if success { None } else { Some("exit 1".to_string()) },
                forced_by_conductor: false,
            })
            .await
    }

    /// Scripted agent: ack and finish every dispatched `run-job` until
    /// the conductor stops dispatching. Returns how many jobs ran.
    pub async fn pump_agents(&self, success: bool) -> Result<usize, RuntimeError> {
        let mut completed = 0;
        loop {
            let run_jobs = self.take_pending_run_jobs();
            if run_jobs.is_empty() {
                return Ok(completed);
            }
            for at in run_jobs {
                completed += 1;
                self.ack_job(&at).await?;
                self.finish_job(&at, success).await?;
            }
        }
    }
}

impl Default for TestConductor {
    fn default() -> Self {
        Self::new()
    }
}

/// One `run-job` as observed on an agent topic.
#[derive(Debug, Clone)]
pub struct RunJobAt {
    pub agent: AgentId,
    pub execution_id: ExecutionId,
    pub exec_vertex_id: ExecVertexId,
    pub exec_wf_id: ExecWorkflowId,
}
