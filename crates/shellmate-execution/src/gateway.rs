//! Confirmation-gated dispatch of command candidates to a live terminal.

use serde::{Deserialize, Serialize};
use shellmate_core::command::{CommandCandidate, SafetyTier};
use shellmate_core::error::{Result, ShellmateError};
use shellmate_core::terminal::{
    ActiveTerminalResolver, ConfirmationPrompt, ConfirmationRequest, Notifier, SinkCapability,
    TerminalSink,
};
use std::sync::Arc;

/// Appended to every command so the shell runs it.
const LINE_TERMINATOR: &str = "\r";

/// Result of an execution request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// The command was written through `capability`
    Executed { capability: SinkCapability },
    /// The user declined the confirmation; nothing was sent
    Declined,
}

impl ExecutionOutcome {
    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed { .. })
    }
}

/// Gates commands behind tier-appropriate confirmation and writes approved
/// ones into the active terminal.
pub struct ExecutionGateway {
    resolver: Arc<dyn ActiveTerminalResolver>,
    prompt: Arc<dyn ConfirmationPrompt>,
    notifier: Arc<dyn Notifier>,
}

impl ExecutionGateway {
    pub fn new(
        resolver: Arc<dyn ActiveTerminalResolver>,
        prompt: Arc<dyn ConfirmationPrompt>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            resolver,
            prompt,
            notifier,
        }
    }

    /// Runs `candidate` and reports the result to the user.
    ///
    /// Returns `true` only when the command reached the terminal. A declined
    /// confirmation returns `false` without a notification; failures produce
    /// exactly one error notification.
    pub async fn execute(&self, candidate: &CommandCandidate) -> bool {
        match self
            .execute_command(&candidate.command, candidate.safety)
            .await
        {
            Ok(ExecutionOutcome::Executed { .. }) => {
                self.notifier
                    .info(&format!("Command sent: {}", candidate.command));
                true
            }
            Ok(ExecutionOutcome::Declined) => false,
            Err(e) => {
                tracing::error!("[ExecutionGateway] {}", e);
                self.notifier.error(&e.user_message());
                false
            }
        }
    }

    /// Resolves the target, asks for confirmation when `tier` requires it and
    /// dispatches `command`. Makes a single attempt per capability.
    pub async fn execute_command(&self, command: &str, tier: SafetyTier) -> Result<ExecutionOutcome> {
        let sink = self
            .resolver
            .resolve()
            .ok_or(ShellmateError::NoActiveTerminal)?;

        if let Some(request) = ConfirmationRequest::for_command(command, tier) {
            if !self.prompt.confirm(&request).await {
                tracing::info!("[ExecutionGateway] {} command declined by user", tier);
                return Ok(ExecutionOutcome::Declined);
            }
        }

        let capability = dispatch(sink.as_ref(), command)?;
        tracing::info!(
            "[ExecutionGateway] Sent {} command to {} via {}",
            tier,
            sink.title(),
            capability
        );
        Ok(ExecutionOutcome::Executed { capability })
    }
}

/// Writes `command` plus a carriage return through the first capability the
/// sink supports and accepts.
fn dispatch(sink: &dyn TerminalSink, command: &str) -> Result<SinkCapability> {
    let data = format!("{}{}", command, LINE_TERMINATOR);
    let mut failures = Vec::new();

    for capability in SinkCapability::DISPATCH_ORDER {
        if !sink.supports(capability) {
            continue;
        }
        match sink.send(capability, &data) {
            Ok(()) => return Ok(capability),
            Err(e) => {
                tracing::warn!("[ExecutionGateway] {} failed: {}", capability, e);
                failures.push(format!("{}: {}", capability, e));
            }
        }
    }

    if failures.is_empty() {
        Err(ShellmateError::send_failed(
            "terminal offers no input capability",
        ))
    } else {
        Err(ShellmateError::send_failed(failures.join("; ")))
    }
}
