//! CLI entrypoint for dwa-council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use council_application::{ConveneCouncilUseCase, CouncilParams, ProposalSource, SessionStore};
use council_domain::{
    CouncilSession, CouncilTrigger, RiskLevel, SessionId, TriggerClassifier,
};
use council_infrastructure::{
    CommandConsultation, CommandProposalSource, ConfigLoader, DemoProposalSource, FileConfig,
    InMemorySessionStore, JsonlSessionStore, RegistryLookup, default_registry, load_profiles,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Multi-agent deliberation council with debate-weighted voting
#[derive(Parser, Debug)]
#[command(name = "dwa-council", version, about)]
struct Cli {
    /// Operation text to classify and deliberate on
    operation: Option<String>,

    /// Tool name the operation originates from
    #[arg(long, default_value = "Manual")]
    tool: String,

    /// Risk level from an upstream gate (LOW, MEDIUM, HIGH, CRITICAL)
    #[arg(long)]
    risk: Option<String>,

    /// Additional context passed to the agents
    #[arg(long)]
    context: Option<String>,

    /// Explicit config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of agent profile TOML files
    #[arg(long)]
    agents_dir: Option<PathBuf>,

    /// Override the maximum number of participating agents
    #[arg(long)]
    max_agents: Option<usize>,

    /// Only classify the operation, do not convene
    #[arg(long)]
    classify_only: bool,

    /// Use the offline demo proposal source (no agent commands)
    #[arg(long)]
    demo: bool,

    /// Print the summary of a persisted session and exit
    #[arg(long, value_name = "SESSION_ID")]
    summary: Option<String>,

    /// List the most recent persisted sessions and exit
    #[arg(long, value_name = "N")]
    recent: Option<usize>,

    /// Suppress the banner and decision details
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = ConfigLoader::load(cli.config.as_ref())
        .map_err(|e| anyhow!("config error: {e}"))?;
    if let Some(max_agents) = cli.max_agents {
        config.council.max_agents = max_agents;
    }
    config.validate().context("invalid configuration")?;

    let store = open_store(&config)?;

    if let Some(id) = &cli.summary {
        let session_id: SessionId = id.parse().context("invalid session id")?;
        return print_summary(&store, session_id).await;
    }
    if let Some(limit) = cli.recent {
        return print_recent(&store, limit).await;
    }

    let Some(operation) = cli.operation.clone() else {
        bail!("Operation text is required (or use --summary / --recent)");
    };

    let risk = cli
        .risk
        .as_deref()
        .map(|r| r.parse::<RiskLevel>())
        .transpose()
        .map_err(|e| anyhow!(e))?;

    // Trigger classification
    let classifier = TriggerClassifier::new();
    let Some(trigger) = classifier.classify(&cli.tool, &operation, risk) else {
        println!("No deliberation required for this operation.");
        return Ok(());
    };

    if cli.classify_only {
        print_trigger(&trigger);
        return Ok(());
    }

    // === Dependency Injection ===
    let registry = Arc::new(match cli.agents_dir.as_deref().or(config.agents.profile_dir.as_deref()) {
        Some(dir) => load_profiles(dir)?,
        None => default_registry(),
    });
    if registry.is_empty() {
        bail!("No agent profiles available");
    }

    let lookup = Arc::new(RegistryLookup::new(Arc::clone(&registry)));
    let consultation = Arc::new(CommandConsultation::new(config.consultation.command.clone()));

    info!("Convening council for {}", trigger.inferred_domain);
    if !cli.quiet {
        print_trigger(&trigger);
    }

    let session = if cli.demo {
        // Demo runs stay out of the persistent session log
        let source = Arc::new(DemoProposalSource::new(Arc::clone(&registry)));
        let store = Arc::new(InMemorySessionStore::new());
        convene(source, lookup, consultation, store, config.council.clone(), trigger, cli.context).await
    } else {
        let source = Arc::new(CommandProposalSource::new(
            Arc::clone(&registry),
            config.proposals.clone(),
        ));
        convene(source, lookup, consultation, Arc::new(store), config.council.clone(), trigger, cli.context).await
    };

    print_session(&session, cli.quiet);
    if session.is_failed() {
        std::process::exit(1);
    }
    Ok(())
}

async fn convene<P: ProposalSource + 'static, S: SessionStore + 'static>(
    source: Arc<P>,
    lookup: Arc<RegistryLookup>,
    consultation: Arc<CommandConsultation>,
    store: Arc<S>,
    params: CouncilParams,
    trigger: CouncilTrigger,
    context: Option<String>,
) -> CouncilSession {
    let use_case = ConveneCouncilUseCase::new(source, lookup, consultation, store, params);
    use_case.convene(trigger, context).await
}

fn open_store(config: &FileConfig) -> Result<JsonlSessionStore> {
    let path = config
        .storage
        .sessions_path
        .clone()
        .unwrap_or_else(ConfigLoader::default_sessions_path);
    JsonlSessionStore::new(&path)
        .with_context(|| format!("cannot open session store at {}", path.display()))
}

async fn print_summary(store: &JsonlSessionStore, session_id: SessionId) -> Result<()> {
    let session = store.load(session_id).await?;
    let summary = session.summary();

    println!("Session    {}", summary.session_id);
    println!("Trigger    {} ({})", summary.trigger_condition, summary.domain);
    println!("Agents     {}", summary.agents.join(", "));
    println!("Debate     {} round(s)", summary.debate_round_count);
    println!("Decision   {}", summary.decision.as_deref().unwrap_or("-"));
    println!(
        "Confidence {}",
        summary
            .confidence
            .map(|c| format!("{c:.2}"))
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "Duration   {}",
        summary
            .duration_ms
            .map(|d| format!("{d} ms"))
            .unwrap_or_else(|| "-".to_string())
    );
    println!("Escalated  {}", if summary.escalated { "yes" } else { "no" });
    Ok(())
}

async fn print_recent(store: &JsonlSessionStore, limit: usize) -> Result<()> {
    let sessions = store.recent(limit).await?;
    if sessions.is_empty() {
        println!("No sessions recorded.");
        return Ok(());
    }
    for session in sessions {
        let summary = session.summary();
        println!(
            "{}  {:<18} {:<12} {}",
            summary.session_id,
            summary.trigger_condition,
            summary.domain,
            summary.decision.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

fn print_trigger(trigger: &CouncilTrigger) {
    println!("Trigger:   {}", trigger.condition);
    println!("Domain:    {}", trigger.inferred_domain);
    println!("Tool:      {}", trigger.tool_name);
    if let Some(risk) = trigger.risk_level {
        println!("Risk:      {risk}");
    }
    println!("Operation: {}", trigger.operation_text);
    println!();
}

fn print_session(session: &CouncilSession, quiet: bool) {
    if quiet {
        if let Some(decision) = &session.decision {
            println!("{decision}");
        }
        return;
    }

    println!("=== Council Decision ===");
    println!("Session:    {}", session.session_id);
    println!("Agents:     {}", session.participating_agents.join(", "));
    println!("Debate:     {} round(s)", session.debate_rounds.len());
    if let Some(result) = &session.voting_result {
        println!("Votes:      {}", result.votes.len());
        println!("HHI:        {:.2}", result.vote_concentration_hhi);
        if result.is_tie {
            println!("Tie:        yes");
        }
    }
    if session.escalated_to_external {
        println!(
            "Escalated:  yes ({})",
            session.external_model_used.as_deref().unwrap_or("no reply")
        );
    }
    println!();
    println!("Decision:   {}", session.decision.as_deref().unwrap_or("-"));
    if let Some(confidence) = session.decision_confidence {
        println!("Confidence: {confidence:.2}");
    }
    if let Some(duration) = session.total_duration_ms {
        println!("Duration:   {duration} ms");
    }
}
