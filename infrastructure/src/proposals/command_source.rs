//! Subprocess-backed proposal source
//!
//! Each selected agent gets one invocation of the configured command. The
//! command receives a structured prompt on stdin and must answer with
//! proposal JSON on stdout:
//!
//! ```json
//! {
//!   "recommendation": "...",
//!   "reasoning_chain": ["...", "..."],
//!   "confidence": 0.85,
//!   "domain_relevance": 0.9
//! }
//! ```
//!
//! Invocations fan out concurrently; a failing agent is logged and
//! omitted, never fatal to the round.

use crate::config::file_config::FileProposalsConfig;
use async_trait::async_trait;
use council_application::ports::proposal_source::{ProposalRequest, ProposalSource, SourceError};
use council_domain::{ExpertiseProfile, ExpertiseRegistry, Proposal};
use serde::Deserialize;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Domains whose proposals go to the strongest configured model
const CRITICAL_DOMAINS: &[&str] = &["security", "architecture", "ethics"];
/// Domains routed to the code-oriented model
const CODE_DOMAINS: &[&str] = &["api_design", "backend", "frontend"];
/// Domains routed to the reasoning-heavy model
const REASONING_DOMAINS: &[&str] = &["architecture", "database", "performance"];

/// Raw proposal payload emitted by an agent command.
///
/// All four fields are required; anything less is a malformed proposal and
/// the agent's contribution is dropped.
#[derive(Debug, Deserialize)]
struct RawProposal {
    recommendation: String,
    reasoning_chain: Vec<String>,
    confidence: f64,
    domain_relevance: f64,
}

/// Proposal source that shells out once per selected agent
pub struct CommandProposalSource {
    registry: Arc<ExpertiseRegistry>,
    config: FileProposalsConfig,
    per_agent_timeout: Duration,
}

impl CommandProposalSource {
    pub fn new(registry: Arc<ExpertiseRegistry>, config: FileProposalsConfig) -> Self {
        Self {
            registry,
            config,
            per_agent_timeout: Duration::from_secs(25),
        }
    }

    /// Override the per-agent invocation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.per_agent_timeout = timeout;
        self
    }

    /// Select the model for a domain, critical domains first
    fn model_for_domain(&self, domain: &str) -> String {
        if CRITICAL_DOMAINS.contains(&domain) {
            return self
                .config
                .critical_model
                .clone()
                .unwrap_or_else(|| self.config.fast_model.clone());
        }
        if CODE_DOMAINS.contains(&domain) {
            return self.config.code_model.clone();
        }
        if REASONING_DOMAINS.contains(&domain) {
            return self.config.reasoning_model.clone();
        }
        self.config.fast_model.clone()
    }

    /// Agents for this round: domain experts first, top proposers as a
    /// fallback when no expert clears the threshold
    fn select_agents(&self, domain: &str, min_expertise: f64, max_agents: usize) -> Vec<ExpertiseProfile> {
        let mut selected: Vec<ExpertiseProfile> = self
            .registry
            .relevant_agents(domain, min_expertise)
            .into_iter()
            .take(max_agents)
            .cloned()
            .collect();

        if selected.is_empty() {
            selected = self
                .registry
                .proposers()
                .into_iter()
                .take(3)
                .cloned()
                .collect();
        }

        selected
    }
}

#[async_trait]
impl ProposalSource for CommandProposalSource {
    async fn generate(&self, request: &ProposalRequest) -> Result<Vec<Proposal>, SourceError> {
        let agents = self.select_agents(&request.domain, request.min_expertise, request.max_agents);
        if agents.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.model_for_domain(&request.domain);
        let mut set = JoinSet::new();

        for agent in agents {
            let command = self.config.command.clone();
            let prompt = build_proposal_prompt(&agent, request);
            let model = model.clone();
            let timeout = self.per_agent_timeout;
            let domain = request.domain.clone();

            set.spawn(async move {
                let start = Instant::now();
                let output = run_command(&command, &prompt, timeout).await;
                let elapsed = start.elapsed().as_millis() as u64;
                debug!(agent = %agent.name, %domain, elapsed_ms = elapsed, "Agent command finished");
                output.and_then(|stdout| {
                    parse_proposal(&agent.name, &stdout, &model).map(|p| p.with_generation_time(elapsed))
                })
            });
        }

        let mut proposals = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(proposal)) => proposals.push(proposal),
                Ok(Err(e)) => warn!("Dropping failed proposal: {}", e),
                Err(e) => warn!("Proposal task panicked: {}", e),
            }
        }

        // Deterministic order regardless of completion order
        proposals.sort_by(|a, b| a.agent_name.cmp(&b.agent_name));
        Ok(proposals)
    }
}

/// Run one agent command, feeding `prompt` on stdin
async fn run_command(
    command: &[String],
    prompt: &str,
    timeout: Duration,
) -> Result<String, SourceError> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| SourceError::Other("empty agent command".to_string()))?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| SourceError::GenerationFailed(format!("spawn {program}: {e}")))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(prompt.as_bytes())
            .await
            .map_err(|e| SourceError::GenerationFailed(format!("write prompt: {e}")))?;
    }

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| SourceError::Timeout)?
        .map_err(|e| SourceError::GenerationFailed(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SourceError::GenerationFailed(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse an agent's stdout into a domain proposal
fn parse_proposal(agent: &str, response: &str, model: &str) -> Result<Proposal, SourceError> {
    let json_str = strip_code_fences(response.trim());

    let raw: RawProposal =
        serde_json::from_str(json_str).map_err(|e| SourceError::InvalidProposal {
            agent: agent.to_string(),
            reason: format!("invalid JSON: {e}"),
        })?;

    Proposal::new(
        agent,
        raw.recommendation,
        raw.reasoning_chain,
        raw.confidence,
        raw.domain_relevance,
        model,
    )
    .map_err(|e| SourceError::InvalidProposal {
        agent: agent.to_string(),
        reason: e.to_string(),
    })
}

/// Remove a surrounding markdown code fence, if present
fn strip_code_fences(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    // Skip the fence line itself ("```json" or bare "```")
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Structured prompt sent to an agent command
fn build_proposal_prompt(agent: &ExpertiseProfile, request: &ProposalRequest) -> String {
    let expertise = agent.expertise_or(&request.domain, 0.5);
    let context_block = request
        .context
        .as_deref()
        .map(|c| format!("**Context:** {c}\n\n"))
        .unwrap_or_default();

    format!(
        "You are {name}, an expert in {domain} (expertise: {expertise:.1}/1.0).\n\n\
         **COUNCIL DELIBERATION TASK**\n\n\
         An operation requires multi-agent deliberation:\n\n\
         **Domain:** {domain}\n\
         **Operation:** {operation}\n\n\
         {context_block}\
         **YOUR TASK:**\n\
         Provide a structured proposal with:\n\n\
         1. **Recommendation** (1-2 sentences): Your recommended action/decision\n\
         2. **Reasoning Chain** (3-5 bullet points): Step-by-step logic\n\
         3. **Confidence** (0.0-1.0): How confident are you in this recommendation?\n\
         4. **Domain Relevance** (0.0-1.0): How relevant is this to your expertise?\n\n\
         **OUTPUT FORMAT (JSON):**\n\
         {{\n\
           \"recommendation\": \"Your concise recommendation here\",\n\
           \"reasoning_chain\": [\n\
             \"First reasoning step\",\n\
             \"Second reasoning step\",\n\
             \"Third reasoning step\"\n\
           ],\n\
           \"confidence\": 0.85,\n\
           \"domain_relevance\": 0.90\n\
         }}\n\n\
         **IMPORTANT:**\n\
         - Be honest about confidence (don't overstate certainty)\n\
         - Domain relevance should reflect your expertise in {domain}\n\
         - Reasoning should be clear and logical\n\
         - Output ONLY valid JSON\n",
        name = agent.name,
        domain = request.domain,
        operation = request.operation_text,
    )
}
