//! Subprocess-backed external consultation
//!
//! Bridges the escalation port to an external consultation command (a
//! `consult-llm` style CLI): the escalation prompt goes in on stdin, the
//! arbiter's recommendation comes back on stdout. The caller imposes the
//! timeout; this adapter only maps process failures.

use async_trait::async_trait;
use council_application::ports::consultation::{
    ConsultationError, ConsultationReply, ExternalConsultation,
};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

pub struct CommandConsultation {
    command: Vec<String>,
}

impl CommandConsultation {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl ExternalConsultation for CommandConsultation {
    async fn consult(
        &self,
        prompt: &str,
        preferred_model: Option<&str>,
    ) -> Result<ConsultationReply, ConsultationError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| ConsultationError::Other("empty consultation command".to_string()))?;

        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(model) = preferred_model {
            cmd.arg("--model").arg(model);
        }

        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ConsultationError::Failed(format!("spawn {program}: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .map_err(|e| ConsultationError::Failed(format!("write prompt: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ConsultationError::Failed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConsultationError::Failed(format!(
                "{program} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let content = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if content.is_empty() {
            return Err(ConsultationError::Failed(
                "empty consultation response".to_string(),
            ));
        }

        debug!(model = preferred_model.unwrap_or("auto"), "Consultation complete");
        Ok(ConsultationReply {
            model: preferred_model.unwrap_or("auto").to_string(),
            content,
        })
    }
}
