// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator notifications for failures and dead agents.

use async_trait::async_trait;
use baton_core::{AgentId, ExecVertexId, ExecutionId};
use lettre::message::Mailbox;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid mail address: {0}")]
    Address(String),

    #[error("mail build failed: {0}")]
    Build(String),

    #[error("smtp error: {0}")]
    Smtp(String),
}

/// Human-addressed alerts.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn execution_failed(
        &self,
        execution_id: ExecutionId,
        name: &str,
        error: &str,
    ) -> Result<(), NotifyError>;

    async fn agents_dead(
        &self,
        dead: &BTreeMap<AgentId, BTreeSet<ExecVertexId>>,
    ) -> Result<(), NotifyError>;
}

/// SMTP notifier addressed to the configured operator mailbox.
///
/// When no recipient is configured the notifier stays quiet and only
/// logs, so a single concrete type serves both deployments.
pub struct MailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Option<Mailbox>,
}

impl MailNotifier {
    pub fn new(relay: &str, error_email_to: Option<&str>) -> Result<Self, NotifyError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(relay).build();
        let from = "baton <baton@localhost>"
            .parse()
            .map_err(|e| NotifyError::Address(format!("{e}")))?;
        let to = error_email_to
            .map(|addr| addr.parse().map_err(|e| NotifyError::Address(format!("{e}: {addr}"))))
            .transpose()?;
        Ok(Self { transport, from, to })
    }

    async fn send(&self, subject: String, body: String) -> Result<(), NotifyError> {
        let Some(to) = &self.to else {
            tracing::info!(subject = %subject, "no operator mailbox configured, notification dropped");
            return Ok(());
        };
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.clone())
            .subject(&subject)
            .body(body)
            .map_err(|e| NotifyError::Build(e.to_string()))?;
        self.transport.send(message).await.map_err(|e| NotifyError::Smtp(e.to_string()))?;
        tracing::info!(subject = %subject, "operator notified");
        Ok(())
    }
}

#[async_trait]
impl Notifier for MailNotifier {
    async fn execution_failed(
        &self,
        execution_id: ExecutionId,
        name: &str,
        error: &str,
    ) -> Result<(), NotifyError> {
        self.send(
            format!("[baton] execution {execution_id} ({name}) failed"),
            format!("Execution {execution_id} of {name} finished with an error.\n\n{error}\n"),
        )
        .await
    }

    async fn agents_dead(
        &self,
        dead: &BTreeMap<AgentId, BTreeSet<ExecVertexId>>,
    ) -> Result<(), NotifyError> {
        let mut body = String::from("Agents stopped heartbeating and were quarantined.\n\n");
        for (agent, vertices) in dead {
            let vs: Vec<String> = vertices.iter().map(|v| v.to_string()).collect();
            body.push_str(&format!("  {agent}: in-flight vertices [{}]\n", vs.join(", ")));
        }
        body.push_str("\nAffected vertices were marked unknown; the jobs may still be running.\n");
        self.send(format!("[baton] {} agent(s) declared dead", dead.len()), body).await
    }
}
