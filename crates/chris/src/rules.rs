//! Learned trigger/response rules
//!
//! Admins teach Chris in free-form text ("when someone says hello respond
//! with hi there"). An ordered list of regex templates is tried against the
//! instruction case-insensitively; the first template that captures both a
//! trigger and a response wins, so earlier templates take priority on
//! ambiguous input. Triggers are stored lower-cased with surrounding quotes
//! stripped and matched by substring against caller transcripts.
//!
//! The rule book persists as a small JSON file so taught rules survive
//! restarts.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Instruction templates in priority order. Earlier wins.
static TEMPLATES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)when someone says\s+(.+?)\s+respond\s+with\s+(.+)",
        r"(?i)when.*says?\s+(.+?)\s+respond.*with\s+(.+)",
        r"(?i)add.*response.*for\s+(.+?):\s*(.+)",
        r"(?i)if.*says?\s+(.+?)\s+say\s+(.+)",
        r"(?i)says?\s+(.+?)\s+respond.*with\s+(.+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("rule template regex"))
    .collect()
});

/// A taught trigger -> response pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LearnedRule {
    /// Lower-cased, quote-stripped phrase matched against transcripts
    pub trigger: String,
    /// What Chris says back
    pub response: String,
    /// Which template extracted this rule (0-based priority index)
    pub template_index: usize,
    pub taught_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("no rule template matched the instruction")]
    NoTemplateMatched,

    #[error("failed to persist rule book: {0}")]
    Io(#[from] std::io::Error),

    #[error("rule book file is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Parse one admin instruction into a rule, without registering it.
///
/// Deterministic: the same text always selects the same template and yields
/// the same pair.
pub fn parse_instruction(instruction: &str) -> Option<(usize, String, String)> {
    for (index, template) in TEMPLATES.iter().enumerate() {
        if let Some(caps) = template.captures(instruction) {
            let (Some(trigger), Some(response)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let trigger = normalize(&trigger.as_str().to_lowercase());
            let response = normalize(response.as_str());
            if trigger.is_empty() || response.is_empty() {
                continue;
            }
            return Some((index, trigger, response));
        }
    }
    None
}

/// Trim whitespace, then surrounding single/double quotes.
fn normalize(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .trim()
        .to_string()
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RuleBookState {
    rules: Vec<LearnedRule>,
    instructions_seen: u64,
}

/// Counters surfaced by the admin stats endpoint
#[derive(Debug, Clone, Serialize)]
pub struct RuleStats {
    pub rules: usize,
    pub instructions_seen: u64,
}

/// The set of taught rules, persisted to a JSON file
pub struct RuleBook {
    state: RwLock<RuleBookState>,
    path: PathBuf,
}

impl RuleBook {
    /// Load the rule book from `path`, starting fresh when the file does not
    /// exist yet.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RuleError> {
        let path = path.as_ref().to_path_buf();
        let state = match std::fs::read_to_string(&path) {
            Ok(raw) => {
                let state: RuleBookState = serde_json::from_str(&raw)?;
                info!("Loaded {} learned rules from {}", state.rules.len(), path.display());
                state
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No rule book at {}, starting fresh", path.display());
                RuleBookState::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            state: RwLock::new(state),
            path,
        })
    }

    /// Parse an instruction and register the resulting rule.
    ///
    /// A re-taught trigger replaces its previous response. Returns the rule
    /// as stored, or `RuleError::NoTemplateMatched` when no template fit.
    pub async fn teach(&self, instruction: &str) -> Result<LearnedRule, RuleError> {
        let mut state = self.state.write().await;
        state.instructions_seen += 1;

        let Some((template_index, trigger, response)) = parse_instruction(instruction) else {
            warn!("No rule template matched instruction: '{}'", instruction);
            self.save(&state).await?;
            return Err(RuleError::NoTemplateMatched);
        };

        let rule = LearnedRule {
            trigger,
            response,
            template_index,
            taught_at: Utc::now(),
        };

        if let Some(existing) = state.rules.iter_mut().find(|r| r.trigger == rule.trigger) {
            info!(
                "Replacing response for trigger '{}' (template {})",
                rule.trigger, template_index + 1
            );
            *existing = rule.clone();
        } else {
            info!(
                "Learned rule '{}' -> '{}' (template {})",
                rule.trigger, rule.response, template_index + 1
            );
            state.rules.push(rule.clone());
        }

        self.save(&state).await?;
        Ok(rule)
    }

    /// First taught response whose trigger appears in the transcript.
    pub async fn match_reply(&self, transcript: &str) -> Option<String> {
        let lower = transcript.to_lowercase();
        let state = self.state.read().await;
        state
            .rules
            .iter()
            .find(|rule| lower.contains(&rule.trigger))
            .map(|rule| rule.response.clone())
    }

    pub async fn rules(&self) -> Vec<LearnedRule> {
        self.state.read().await.rules.clone()
    }

    pub async fn stats(&self) -> RuleStats {
        let state = self.state.read().await;
        RuleStats {
            rules: state.rules.len(),
            instructions_seen: state.instructions_seen,
        }
    }

    async fn save(&self, state: &RuleBookState) -> Result<(), RuleError> {
        let json = serde_json::to_string_pretty(state)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_template_wins_on_canonical_form() {
        let (index, trigger, response) =
            parse_instruction("when someone says hello respond with hi there").unwrap();
        assert_eq!(index, 0);
        assert_eq!(trigger, "hello");
        assert_eq!(response, "hi there");
    }

    #[test]
    fn multiword_trigger_and_punctuated_response() {
        let (index, trigger, response) =
            parse_instruction("when someone says hello chris respond with Hi there! I'm Chris!")
                .unwrap();
        assert_eq!(index, 0);
        assert_eq!(trigger, "hello chris");
        assert_eq!(response, "Hi there! I'm Chris!");
    }

    #[test]
    fn add_response_template() {
        let (index, trigger, response) =
            parse_instruction("add response for good morning: Good morning! How can I help?")
                .unwrap();
        assert_eq!(index, 2);
        assert_eq!(trigger, "good morning");
        assert_eq!(response, "Good morning! How can I help?");
    }

    #[test]
    fn if_says_template() {
        let (index, trigger, response) =
            parse_instruction("if someone says thank you say You're welcome!").unwrap();
        assert_eq!(index, 3);
        assert_eq!(trigger, "thank you");
        assert_eq!(response, "You're welcome!");
    }

    #[test]
    fn bare_says_template_is_last_resort() {
        let (index, trigger, response) = parse_instruction("says hello respond with hi").unwrap();
        assert_eq!(index, 4);
        assert_eq!(trigger, "hello");
        assert_eq!(response, "hi");
    }

    #[test]
    fn matching_is_case_insensitive_and_quote_stripping() {
        let (_, trigger, response) =
            parse_instruction("WHEN SOMEONE SAYS 'Good Evening' RESPOND WITH \"Evening!\"")
                .unwrap();
        assert_eq!(trigger, "good evening");
        assert_eq!(response, "Evening!");
    }

    #[test]
    fn unmatched_instruction_reports_no_rule() {
        assert!(parse_instruction("please be nicer to callers").is_none());
    }

    #[test]
    fn parse_is_deterministic() {
        let a = parse_instruction("when someone says hello respond with hi there");
        let b = parse_instruction("when someone says hello respond with hi there");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn teach_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");

        let book = RuleBook::load(&path).unwrap();
        book.teach("when someone says hello respond with hi there")
            .await
            .unwrap();
        book.teach("add response for good morning: Morning!")
            .await
            .unwrap();

        let reloaded = RuleBook::load(&path).unwrap();
        let rules = reloaded.rules().await;
        assert_eq!(rules.len(), 2);
        assert_eq!(
            reloaded.match_reply("Hello, is anyone there?").await,
            Some("hi there".to_string())
        );
        assert_eq!(reloaded.stats().await.instructions_seen, 2);
    }

    #[tokio::test]
    async fn reteaching_a_trigger_replaces_the_response() {
        let dir = tempfile::tempdir().unwrap();
        let book = RuleBook::load(dir.path().join("rules.json")).unwrap();

        book.teach("when someone says hello respond with hi")
            .await
            .unwrap();
        book.teach("when someone says hello respond with hey there")
            .await
            .unwrap();

        let rules = book.rules().await;
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].response, "hey there");
    }
}
