// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Abort, resume, and cache-refresh handlers.

use crate::error::RuntimeError;
use crate::notify::Notifier;
use crate::runtime::{ExecInfo, Runtime};
use crate::setup::{self, SetupOutcome};
use crate::transport::Transport;
use baton_core::{
    Clock, ExecVertexId, ExecutionId, NodeId, RunStatus, ScheduleId, StatusEvent,
};
use baton_wire::ToAgent;
use std::collections::{BTreeSet, HashMap, HashSet};

impl<T, N, C> Runtime<T, N, C>
where
    T: Transport,
    N: Notifier,
    C: Clock,
{
    /// Abort a live execution: best-effort kills to agents holding its
    /// vertices, then persist `aborted` everywhere. Vertices count as
    /// aborted from this moment; late agent reports find the execution
    /// purged and are discarded.
    pub(crate) async fn abort_execution(
        &self,
        execution_id: ExecutionId,
    ) -> Result<(), RuntimeError> {
        let model = self.model(execution_id)?;
        tracing::info!(execution = %execution_id, "aborting execution");

        let vertices: HashSet<ExecVertexId> = model.vertices().collect();
        let holders = self.tracker.lock().take_assignments(&vertices);
        for (agent, vertex) in holders {
            self.send_to_agent(
                &agent,
                &ToAgent::KillJob { execution_id, exec_vertex_id: vertex },
            )
            .await?;
        }

        let now = self.clock.epoch_ms();
        self.store.abort_execution(execution_id, now).await?;
        self.emit(StatusEvent::ExecutionFinished {
            execution_id,
            status: RunStatus::Aborted,
            finish_ts: now,
        })
        .await?;
        self.exec_infos.lock().remove(&execution_id);
        Ok(())
    }

    /// Resume a persisted execution from one vertex. Refused while the
    /// execution is live, so issuing the same resume twice schedules
    /// the successors exactly once.
    pub(crate) async fn resume_execution(
        &self,
        execution_id: ExecutionId,
        exec_vertex_id: ExecVertexId,
    ) -> Result<(), RuntimeError> {
        if self.is_live(execution_id) {
            return Err(RuntimeError::ExecutionAlreadyLive(execution_id));
        }
        let SetupOutcome { model, name, .. } = setup::resume(&self.store, execution_id).await?;
        if model.vertex_attrs(exec_vertex_id).is_none() {
            return Err(RuntimeError::UnknownVertex(exec_vertex_id, execution_id));
        }
        tracing::info!(execution = %execution_id, vertex = %exec_vertex_id, "resuming execution");

        let now = self.clock.epoch_ms();
        self.store.reset_vertices(&[exec_vertex_id]).await?;
        self.store.reopen_execution(execution_id, now).await?;

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
                    start_ts: now,
                },
            );
        }
        self.emit(StatusEvent::ExecutionStarted { execution_id, name, start_ts: now }).await?;
        self.run_nodes(execution_id, BTreeSet::from([exec_vertex_id])).await
    }

    /// `node-save`: refresh one node in the cache.
    pub(crate) async fn handle_node_save(&self, node_id: NodeId) -> Result<(), RuntimeError> {
        match self.store.node(node_id).await? {
            Some(node) => self.cache.lock().put_node(node),
            None => self.cache.lock().remove_node(node_id),
        }
        Ok(())
    }

    /// `schedule-save`: refresh the schedule and re-register the timer
    /// for every association on it.
    pub(crate) async fn handle_schedule_save(
        &self,
        schedule_id: ScheduleId,
    ) -> Result<(), RuntimeError> {
        let Some(schedule) = self.store.schedule(schedule_id).await? else {
            tracing::warn!(schedule = %schedule_id, "schedule-save for missing schedule");
            return Ok(());
        };
        let assocs = {
            let mut cache = self.cache.lock();
            cache.put_schedule(schedule.clone());
            cache.assocs_for_schedule(schedule_id)
        };
        for assoc in assocs {
            self.timer.schedule_cron_job(
                assoc.node_schedule_id,
                assoc.node_id,
                &schedule.cron_expression,
            )?;
        }
        Ok(())
    }

    /// `schedule-assoc`: drop the node's triggers, reload its
    /// associations from the store, and register each anew.
    pub(crate) async fn handle_schedule_assoc(
        &self,
        node_id: NodeId,
    ) -> Result<(), RuntimeError> {
        self.timer.remove_node_triggers(node_id);
        let fresh = self.store.node_schedules_for_node(node_id).await?;
        {
            let mut cache = self.cache.lock();
            let stale: Vec<_> =
                cache.assocs_for_node(node_id).iter().map(|a| a.node_schedule_id).collect();
            cache.remove_assocs(&stale);
            cache.put_assocs(fresh.clone());
        }
        for assoc in fresh {
            let cached = self.cache.lock().schedule(assoc.schedule_id).cloned();
            let expression = match cached {
                Some(s) => s.cron_expression,
                None => match self.store.schedule(assoc.schedule_id).await? {
                    Some(s) => {
                        self.cache.lock().put_schedule(s.clone());
                        s.cron_expression
                    }
                    None => {
                        tracing::warn!(
                            assoc = %assoc.node_schedule_id,
                            schedule = %assoc.schedule_id,
                            "association references missing schedule"
                        );
                        continue;
                    }
                },
            };
            self.timer.schedule_cron_job(assoc.node_schedule_id, assoc.node_id, &expression)?;
        }
        Ok(())
    }
}
