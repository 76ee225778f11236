// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Starting executions and driving the DAG forward.

use crate::error::RuntimeError;
use crate::notify::Notifier;
use crate::runtime::handlers::JobOutcome;
use crate::runtime::{ExecInfo, Runtime};
use crate::setup::{self, SetupOutcome};
use crate::transport::Transport;
use baton_core::{
    AgentId, Clock, ExecVertexId, ExecWorkflowId, ExecutionId, NodeId, NodeType, RunStatus,
    StatusEvent, WorkflowId,
};
use baton_store::NodeRecord;
use baton_wire::{JobSpec, ToAgent, TIMEOUT_NONE};
use futures_util::future::BoxFuture;
use std::collections::{BTreeSet, HashMap, HashSet};

impl<T, N, C> Runtime<T, N, C>
where
    T: Transport,
    N: Notifier,
    C: Clock,
{
    /// Launch an execution for a node: a full workflow snapshot, or a
    /// synthetic one-job workflow for job nodes.
    pub async fn trigger_node(&self, node_id: NodeId) -> Result<(), RuntimeError> {
        let node = self.lookup_node(node_id).await?;
        if !node.enabled {
            return Err(RuntimeError::NodeDisabled(node_id));
        }
        let now = self.clock.epoch_ms();

        let outcome = match node.node_type {
            NodeType::Workflow => {
                setup::initial(&self.store, WorkflowId(node_id.as_i64()), now).await?
            }
            NodeType::Job => setup::synthetic(&self.store, node_id, now).await?,
        };
        let SetupOutcome { execution_id, model, name, start_ts } = outcome;
        tracing::info!(execution = %execution_id, node = %node_id, name = %name, "execution starting");

        let root_wf = model
            .root_workflow()
            .ok_or(RuntimeError::Model(baton_core::ModelError::MissingRootWorkflow))?;
        {
            let mut infos = self.exec_infos.lock();
            infos.insert(
                execution_id,
                ExecInfo {
                    running_jobs: model.workflows().map(|wf| (wf, 0)).collect(),
                    in_flight: HashMap::new(),
                    failed_wfs: HashSet::new(),
                    model: model.clone(),
                    root_wf_name: name.clone(),
                    start_ts,
                },
            );
        }

        self.emit(StatusEvent::ExecutionStarted { execution_id, name, start_ts }).await?;
        self.start_exec_wf(execution_id, None, root_wf).await
    }

    /// Cache-first node lookup with a store fallback for rows the
    /// cache has not seen yet.
    async fn lookup_node(&self, node_id: NodeId) -> Result<NodeRecord, RuntimeError> {
        if let Some(node) = self.cache.lock().node(node_id).cloned() {
            return Ok(node);
        }
        let node =
            self.store.node(node_id).await?.ok_or(RuntimeError::NodeNotFound(node_id))?;
        self.cache.lock().put_node(node.clone());
        Ok(node)
    }

    /// Start one exec-workflow: mark it (and its containing vertex)
    /// started, then run its root vertices.
    pub(crate) fn start_exec_wf<'a>(
        &'a self,
        execution_id: ExecutionId,
        containing_vertex: Option<ExecVertexId>,
        exec_wf_id: ExecWorkflowId,
    ) -> BoxFuture<'a, Result<(), RuntimeError>> {
        Box::pin(async move {
            let now = self.clock.epoch_ms();
            self.store.mark_workflow_started(exec_wf_id, now).await?;
            if let Some(vertex) = containing_vertex {
                self.store.mark_vertex_started(vertex, None, now).await?;
            }
            self.emit(StatusEvent::WfStarted { execution_id, exec_wf_id }).await?;

            let model = self.model(execution_id)?;
            let roots =
                model.workflow_graph(exec_wf_id).map(|g| g.roots.clone()).unwrap_or_default();
            if roots.is_empty() {
                // Degenerate empty workflow: nothing can ever run in it.
                return self.when_wf_finished(execution_id, exec_wf_id, containing_vertex).await;
            }
            self.run_nodes(execution_id, roots).await
        })
    }

    /// Dispatch a set of sibling vertices: job vertices to agents,
    /// workflow vertices into child exec-workflows.
    pub(crate) fn run_nodes<'a>(
        &'a self,
        execution_id: ExecutionId,
        vertices: BTreeSet<ExecVertexId>,
    ) -> BoxFuture<'a, Result<(), RuntimeError>> {
        Box::pin(async move {
            if vertices.is_empty() {
                return Ok(());
            }
            let model = self.model(execution_id)?;

            // Safety invariant: one run_nodes call stays within one
            // exec-workflow.
            let mut exec_wf = None;
            let mut jobs = Vec::new();
            let mut workflows = Vec::new();
            for vertex in vertices {
                let attrs = model
                    .vertex_attrs(vertex)
                    .ok_or(RuntimeError::UnknownVertex(vertex, execution_id))?;
                match exec_wf {
                    None => exec_wf = Some(attrs.exec_wf_id),
                    Some(wf) if wf == attrs.exec_wf_id => {}
                    Some(_) => return Err(RuntimeError::MixedWorkflowVertices),
                }
                match attrs.node_type {
                    NodeType::Job => jobs.push(vertex),
                    NodeType::Workflow => workflows.push(vertex),
                }
            }
            let Some(exec_wf) = exec_wf else { return Ok(()) };

            // The whole batch is scheduled work from here on; the
            // exec-workflow stays open until every entry reaches a
            // terminal state, even when an early sibling finishes while
            // the rest are still being dispatched.
            {
                let mut infos = self.exec_infos.lock();
                if let Some(info) = infos.get_mut(&execution_id) {
                    let scheduled = info.in_flight.entry(exec_wf).or_default();
                    scheduled.extend(jobs.iter().copied());
                    scheduled.extend(workflows.iter().copied());
                }
            }

            self.run_jobs(execution_id, exec_wf, jobs).await?;
            for vertex in workflows {
                let child = model
                    .vertex_attrs(vertex)
                    .and_then(|a| a.runs_wf_id)
                    .ok_or(RuntimeError::MissingChildWorkflow(vertex))?;
                self.start_exec_wf(execution_id, Some(vertex), child).await?;
            }
            Ok(())
        })
    }

    /// Dispatch job vertices to agents. A vertex with no eligible agent
    /// fails via a conductor-forced `job-finished`, so the DAG's
    /// failure edges take over without a network round-trip.
    ///
    /// The whole batch is dispatched before any forced failure is
    /// driven: a forced failure walks the DAG (and may close the
    /// exec-workflow), which must not happen while siblings from the
    /// same batch are still waiting for their dispatch.
    pub(crate) async fn run_jobs(
        &self,
        execution_id: ExecutionId,
        exec_wf_id: ExecWorkflowId,
        vertices: Vec<ExecVertexId>,
    ) -> Result<(), RuntimeError> {
        let model = self.model(execution_id)?;
        let mut unplaceable = Vec::new();
        for vertex in vertices {
            let attrs = model
                .vertex_attrs(vertex)
                .ok_or(RuntimeError::UnknownVertex(vertex, execution_id))?;
            let job = self
                .store
                .job(attrs.node_id)
                .await?
                .ok_or(RuntimeError::JobNotFound(attrs.node_id))?;

            let picked = {
                self.tracker.lock().pick_agent(&job, self.settings.max_concurrent_per_agent)
            };
            match picked {
                Some(agent) => {
                    let now = self.clock.epoch_ms();
                    self.tracker.lock().assign_job(&agent, vertex, now);
                    tracing::info!(
                        execution = %execution_id,
                        vertex = %vertex,
                        job = %job.name,
                        agent = %agent,
                        "dispatching job"
                    );
                    let msg = ToAgent::RunJob {
                        job: JobSpec {
                            node_id: job.node_id,
                            name: job.name.clone(),
                            command_line: job.command_line.clone(),
                            execution_directory: job.execution_directory.clone(),
                        },
                        execution_id,
                        exec_vertex_id: vertex,
                        exec_wf_id,
                        timeout: job.timeout_ms.unwrap_or(TIMEOUT_NONE),
                    };
                    self.send_to_agent(&agent, &msg).await?;
                }
                None => {
                    tracing::warn!(
                        execution = %execution_id,
                        vertex = %vertex,
                        job = %job.name,
                        "no eligible agent, forcing failure"
                    );
                    unplaceable.push(vertex);
                }
            }
        }

        for vertex in unplaceable {
            self.job_finished(JobOutcome {
                execution_id,
                exec_vertex_id: vertex,
                exec_wf_id,
                agent_id: AgentId::conductor(),
                success: false,
                status: RunStatus::FinishedError,
                error_msg: Some("no eligible agent".to_string()),
                forced: true,
            })
            .await?;
        }
        Ok(())
    }
}
