//! Trigger classification for council convocation
//!
//! Eight conditions can convene a council. Five of them are derived from an
//! ordered pattern table over the operation text; the remaining three
//! (disagreement, quality failure, low confidence) are produced by dedicated
//! constructors invoked by collaborators that observe those states directly.
//!
//! Pattern precedence is fixed: security rules are checked before
//! architectural rules, then ethical, external-commitment, and novel-query
//! rules. First match wins.

use crate::core::error::DomainError;
use crate::util::truncate_str;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum stored length of operation text, in bytes
const OPERATION_TEXT_MAX: usize = 500;

/// Conditions that trigger council convocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerCondition {
    /// Design choices, tech stack, migrations
    Architectural,
    /// Auth, secrets, vulnerabilities
    Security,
    /// Multiple conflicting proposals
    Disagreement,
    /// Gate failures (tests, linting)
    QualityFailure,
    /// Privacy, bias, misinformation
    Ethical,
    /// Sub-threshold aggregate confidence
    LowConfidence,
    /// Deploys, publishes, external API calls
    ExternalCommitment,
    /// Out-of-distribution tasks
    NovelQuery,
}

impl std::fmt::Display for TriggerCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TriggerCondition::Architectural => "architectural",
            TriggerCondition::Security => "security",
            TriggerCondition::Disagreement => "disagreement",
            TriggerCondition::QualityFailure => "quality_failure",
            TriggerCondition::Ethical => "ethical",
            TriggerCondition::LowConfidence => "low_confidence",
            TriggerCondition::ExternalCommitment => "external_commitment",
            TriggerCondition::NovelQuery => "novel_query",
        };
        write!(f, "{s}")
    }
}

/// Risk level supplied by an upstream gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// High and Critical risk always convene a council
    pub fn is_elevated(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            "CRITICAL" => Ok(RiskLevel::Critical),
            other => Err(DomainError::InvalidTrigger(format!(
                "unknown risk level: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        };
        write!(f, "{s}")
    }
}

/// Why a council was convened
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilTrigger {
    /// Trigger condition type
    pub condition: TriggerCondition,
    /// Tool that triggered the council (e.g. "Bash", "Write")
    pub tool_name: String,
    /// Operation text, truncated for storage
    pub operation_text: String,
    /// Inferred domain (e.g. "security", "architecture")
    pub inferred_domain: String,
    /// Risk level from the upstream gate, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
}

impl CouncilTrigger {
    fn new(
        condition: TriggerCondition,
        tool_name: impl Into<String>,
        operation_text: &str,
        inferred_domain: impl Into<String>,
        risk_level: Option<RiskLevel>,
    ) -> Self {
        Self {
            condition,
            tool_name: tool_name.into(),
            operation_text: truncate_str(operation_text, OPERATION_TEXT_MAX).to_string(),
            inferred_domain: inferred_domain.into(),
            risk_level,
        }
    }

    /// Trigger for a quality gate failure (never pattern-derived)
    pub fn quality_failure(failure_type: &str, details: &str) -> Self {
        let text = format!("{failure_type}: {}", truncate_str(details, 400));
        Self::new(
            TriggerCondition::QualityFailure,
            "quality_gate",
            &text,
            "quality",
            Some(RiskLevel::Medium),
        )
    }

    /// Trigger for sub-threshold aggregate confidence (never pattern-derived)
    pub fn low_confidence(aggregate_confidence: f64, context: &str) -> Self {
        let text = format!(
            "Aggregate confidence {aggregate_confidence:.2} < 0.75: {}",
            truncate_str(context, 400)
        );
        Self::new(
            TriggerCondition::LowConfidence,
            "confidence_check",
            &text,
            "general",
            Some(RiskLevel::Medium),
        )
    }

    /// Trigger for observed multi-proposal disagreement (never pattern-derived)
    pub fn disagreement(agents: &[String], conflict_summary: &str) -> Self {
        let text = format!(
            "Agents disagree ({}): {}",
            agents.join(", "),
            truncate_str(conflict_summary, 400)
        );
        Self::new(
            TriggerCondition::Disagreement,
            "disagreement_detector",
            &text,
            "general",
            Some(RiskLevel::Medium),
        )
    }
}

/// Pattern table: (regex, condition, domain), in precedence order.
///
/// Security rules MUST come before architectural rules.
const TRIGGER_PATTERNS: &[(&str, TriggerCondition, &str)] = &[
    // Security / risk decisions (checked first)
    (
        r"(?i)(auth|authentication|authorization|oauth|jwt|token|session)",
        TriggerCondition::Security,
        "security",
    ),
    (
        r"(?i)(secret|credential|password|api.?key|private.?key|certificate)",
        TriggerCondition::Security,
        "security",
    ),
    (
        r"(?i)(vulnerabilit|exploit|injection|xss|csrf|security.?audit)",
        TriggerCondition::Security,
        "security",
    ),
    (
        r"(?i)(encrypt|decrypt|hash|sign|verify).*(data|password|token)",
        TriggerCondition::Security,
        "security",
    ),
    // Architectural decisions
    (
        r"(?i)(design|architect|structure).*(api|service|system|database|schema|migration)",
        TriggerCondition::Architectural,
        "architecture",
    ),
    (
        r"(?i)(refactor|restructure|redesign).*(codebase|architecture|system)",
        TriggerCondition::Architectural,
        "architecture",
    ),
    (
        r"(?i)(choose|select|decide).*(framework|library|stack|technology|database)",
        TriggerCondition::Architectural,
        "architecture",
    ),
    (
        r"(?i)(migration|migrate).*(database|schema|api)",
        TriggerCondition::Architectural,
        "architecture",
    ),
    // Ethical flags
    (
        r"(?i)(privacy|gdpr|pii|personal.?data|data.?protection)",
        TriggerCondition::Ethical,
        "ethics",
    ),
    (
        r"(?i)(bias|fairness|discriminat|ethical)",
        TriggerCondition::Ethical,
        "ethics",
    ),
    (
        r"(?i)(misinformation|fake|manipulat).*(content|data|user)",
        TriggerCondition::Ethical,
        "ethics",
    ),
    // External commitments
    (
        r"(?i)git.*(push|deploy|publish)",
        TriggerCondition::ExternalCommitment,
        "deployment",
    ),
    (
        r"(?i)(deploy|publish|release).*(production|prod|live)",
        TriggerCondition::ExternalCommitment,
        "deployment",
    ),
    (
        r"(?i)(npm|pypi|docker).*(publish|push|release)",
        TriggerCondition::ExternalCommitment,
        "deployment",
    ),
    (
        r"(?i)(api|http).*(call|request|post|put|delete).*(external|third.?party)",
        TriggerCondition::ExternalCommitment,
        "api",
    ),
    // Novel / out-of-distribution queries
    (
        r"(?i)(unfamiliar|new|novel|never.?seen|unknown).*(technology|framework|pattern)",
        TriggerCondition::NovelQuery,
        "general",
    ),
    (
        r"(?i)(how.?do.?i|what.?is.?the.?best.?way).*(implement|design|build)",
        TriggerCondition::NovelQuery,
        "general",
    ),
    (
        r"(?i)(should.?we.?use|choose.?between|which.?is.?better)",
        TriggerCondition::NovelQuery,
        "general",
    ),
];

/// Classifies operations into council triggers.
///
/// Pure function of the compiled pattern table and its inputs; holds no
/// mutable state. Construct once at the composition root and share.
#[derive(Debug)]
pub struct TriggerClassifier {
    patterns: Vec<(Regex, TriggerCondition, &'static str)>,
}

impl TriggerClassifier {
    /// Compile the pattern table
    pub fn new() -> Self {
        let patterns = TRIGGER_PATTERNS
            .iter()
            .map(|(pattern, condition, domain)| {
                let regex = Regex::new(pattern).expect("trigger pattern table is valid");
                (regex, *condition, *domain)
            })
            .collect();
        Self { patterns }
    }

    /// Classify an operation, returning a trigger if deliberation is required.
    ///
    /// High/Critical risk always produces a trigger, defaulting to
    /// Security/"security" when no pattern matches. Otherwise the first
    /// matching pattern wins; no match means no deliberation.
    pub fn classify(
        &self,
        tool_name: &str,
        operation_text: &str,
        risk_level: Option<RiskLevel>,
    ) -> Option<CouncilTrigger> {
        if risk_level.is_some_and(|r| r.is_elevated()) {
            let (condition, domain) = self
                .match_patterns(operation_text)
                .unwrap_or((TriggerCondition::Security, "security"));

            return Some(CouncilTrigger::new(
                condition,
                tool_name,
                operation_text,
                domain,
                risk_level,
            ));
        }

        self.match_patterns(operation_text)
            .map(|(condition, domain)| {
                CouncilTrigger::new(condition, tool_name, operation_text, domain, risk_level)
            })
    }

    /// Infer the primary domain of an operation.
    ///
    /// The pattern table is consulted first; a keyword-bucket classifier
    /// covers the remainder, defaulting to "general".
    pub fn infer_domain(&self, text: &str) -> String {
        if let Some((_, domain)) = self.match_patterns(text) {
            return domain.to_string();
        }

        let lower = text.to_lowercase();
        let buckets: &[(&[&str], &str)] = &[
            (&["api", "endpoint", "rest", "graphql", "openapi"], "api_design"),
            (&["database", "query", "schema", "migration", "sql"], "database"),
            (&["test", "testing", "pytest", "unittest"], "testing"),
            (&["performance", "optimize", "cache", "speed"], "performance"),
            (&["deploy", "docker", "kubernetes", "ci/cd"], "devops"),
            (
                &["frontend", "react", "vue", "angular", "svelte", "component", "ui", "css"],
                "frontend",
            ),
            (&["backend", "server", "fastapi", "django", "flask"], "backend"),
        ];

        for (keywords, domain) in buckets {
            if keywords.iter().any(|kw| lower.contains(kw)) {
                return domain.to_string();
            }
        }

        "general".to_string()
    }

    fn match_patterns(&self, text: &str) -> Option<(TriggerCondition, &'static str)> {
        self.patterns
            .iter()
            .find(|(regex, _, _)| regex.is_match(text))
            .map(|(_, condition, domain)| (*condition, *domain))
    }
}

impl Default for TriggerClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_table_compiles() {
        // Guards the expect() in the constructor
        let classifier = TriggerClassifier::new();
        assert_eq!(classifier.patterns.len(), TRIGGER_PATTERNS.len());
    }

    #[test]
    fn test_security_detected() {
        let classifier = TriggerClassifier::new();
        let trigger = classifier
            .classify("Bash", "rotate the api key for the payment service", None)
            .unwrap();
        assert_eq!(trigger.condition, TriggerCondition::Security);
        assert_eq!(trigger.inferred_domain, "security");
        assert_eq!(trigger.tool_name, "Bash");
    }

    #[test]
    fn test_security_precedes_architectural() {
        let classifier = TriggerClassifier::new();
        let trigger = classifier
            .classify(
                "Write",
                "design the authentication architecture for the new system",
                None,
            )
            .unwrap();
        assert_eq!(trigger.condition, TriggerCondition::Security);
        assert_eq!(trigger.inferred_domain, "security");
    }

    #[test]
    fn test_architectural_detected() {
        let classifier = TriggerClassifier::new();
        let trigger = classifier
            .classify("Write", "refactor the codebase into modules", None)
            .unwrap();
        assert_eq!(trigger.condition, TriggerCondition::Architectural);
        assert_eq!(trigger.inferred_domain, "architecture");
    }

    #[test]
    fn test_external_commitment_detected() {
        let classifier = TriggerClassifier::new();
        let trigger = classifier
            .classify("Bash", "git push origin main and deploy", None)
            .unwrap();
        assert_eq!(trigger.condition, TriggerCondition::ExternalCommitment);
    }

    #[test]
    fn test_no_match_returns_none() {
        let classifier = TriggerClassifier::new();
        assert!(
            classifier
                .classify("Read", "list the files in the home directory", None)
                .is_none()
        );
    }

    #[test]
    fn test_low_risk_does_not_force_trigger() {
        let classifier = TriggerClassifier::new();
        assert!(
            classifier
                .classify("Read", "list the files", Some(RiskLevel::Low))
                .is_none()
        );
    }

    #[test]
    fn test_critical_risk_always_triggers() {
        let classifier = TriggerClassifier::new();
        let trigger = classifier
            .classify("Bash", "rm -rf the build directory", Some(RiskLevel::Critical))
            .unwrap();
        // No pattern matched, so the risk override defaults to security
        assert_eq!(trigger.condition, TriggerCondition::Security);
        assert_eq!(trigger.inferred_domain, "security");
        assert_eq!(trigger.risk_level, Some(RiskLevel::Critical));
    }

    #[test]
    fn test_high_risk_keeps_matched_condition() {
        let classifier = TriggerClassifier::new();
        let trigger = classifier
            .classify("Bash", "deploy the release to production", Some(RiskLevel::High))
            .unwrap();
        assert_eq!(trigger.condition, TriggerCondition::ExternalCommitment);
        assert_eq!(trigger.inferred_domain, "deployment");
    }

    #[test]
    fn test_operation_text_truncated() {
        let classifier = TriggerClassifier::new();
        let long_text = format!("authentication {}", "x".repeat(600));
        let trigger = classifier.classify("Bash", &long_text, None).unwrap();
        assert!(trigger.operation_text.len() <= 500);
    }

    #[test]
    fn test_infer_domain_pattern_first() {
        let classifier = TriggerClassifier::new();
        assert_eq!(classifier.infer_domain("update the oauth flow"), "security");
    }

    #[test]
    fn test_infer_domain_keyword_buckets() {
        let classifier = TriggerClassifier::new();
        assert_eq!(classifier.infer_domain("tune the cache eviction"), "performance");
        assert_eq!(classifier.infer_domain("add a react component"), "frontend");
        assert_eq!(classifier.infer_domain("write the flask server"), "backend");
    }

    #[test]
    fn test_infer_domain_default_general() {
        let classifier = TriggerClassifier::new();
        assert_eq!(classifier.infer_domain("hello there"), "general");
    }

    #[test]
    fn test_quality_failure_constructor() {
        let trigger = CouncilTrigger::quality_failure("tdd_violation", "3 tests failing");
        assert_eq!(trigger.condition, TriggerCondition::QualityFailure);
        assert_eq!(trigger.tool_name, "quality_gate");
        assert_eq!(trigger.inferred_domain, "quality");
        assert!(trigger.operation_text.contains("tdd_violation"));
    }

    #[test]
    fn test_low_confidence_constructor() {
        let trigger = CouncilTrigger::low_confidence(0.42, "schema migration plan");
        assert_eq!(trigger.condition, TriggerCondition::LowConfidence);
        assert!(trigger.operation_text.contains("0.42"));
    }

    #[test]
    fn test_disagreement_constructor() {
        let agents = vec!["a".to_string(), "b".to_string()];
        let trigger = CouncilTrigger::disagreement(&agents, "conflicting retry strategies");
        assert_eq!(trigger.condition, TriggerCondition::Disagreement);
        assert!(trigger.operation_text.contains("a, b"));
    }

    #[test]
    fn test_risk_level_parse() {
        assert_eq!("critical".parse::<RiskLevel>().unwrap(), RiskLevel::Critical);
        assert_eq!("LOW".parse::<RiskLevel>().unwrap(), RiskLevel::Low);
        assert!("nope".parse::<RiskLevel>().is_err());
    }
}
