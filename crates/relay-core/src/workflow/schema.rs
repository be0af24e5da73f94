//! YAML schema types for chain definitions.
//!
//! A chain YAML defines the ordered agents every request runs through:
//!
//! ```yaml
//! name: "Research Chain"
//!
//! agents:
//!   - name: ResearchAgent
//!     model: "openai/gpt-4o"
//!     instruction: "You are the research agent; gather data and summarize."
//!     adapter: openai
//!     base_url: "${OPENAI_BASE_URL:-https://api.openai.com/v1}"
//!     api_key: "${OPENAI_API_KEY}"
//!
//!   - name: SummaryAgent
//!     model: "claude-sonnet-4"
//!     instruction: "You are the summary agent; produce a concise summary."
//!     adapter: anthropic
//!     api_key: "${ANTHROPIC_API_KEY}"
//! ```

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use crate::agents::{AgentCapability, EchoAgent, LlmAdapter, LlmAgent};
use crate::error::ConfigError;

/// Top-level chain definition loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainDefinition {
    #[serde(default = "default_chain_name")]
    pub name: String,

    /// Ordered agents; the output of each feeds the next.
    pub agents: Vec<AgentDef>,
}

/// One agent of the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDef {
    /// Unique display name
    pub name: String,

    /// Model identifier, optionally provider-prefixed (`openai/gpt-4o`)
    #[serde(default)]
    pub model: String,

    /// System instruction for this agent
    #[serde(default)]
    pub instruction: String,

    /// Adapter type: "openai", "anthropic", "echo"
    #[serde(default = "default_adapter")]
    pub adapter: String,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub temperature: Option<f64>,
}

fn default_chain_name() -> String {
    "default".to_string()
}

fn default_adapter() -> String {
    "openai".to_string()
}

/// Model identifiers of the three built-in agents.
pub const DEFAULT_MODELS: [&str; 3] = ["openai/gpt-4o", "gemini-2.0", "gemini-2.0-flash"];

impl ChainDefinition {
    /// Parse a chain definition from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml)
            .map_err(|e| ConfigError::Chain(format!("Failed to parse chain YAML: {}", e)))
    }

    /// Load a chain definition from a YAML file.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Chain(format!("Failed to read chain file '{}': {}", path, e))
        })?;
        Self::from_yaml(&content)
    }

    /// The research → analysis → summary chain.
    pub fn builtin(models: [&str; 3]) -> Self {
        let agent = |name: &str, model: &str, instruction: &str| AgentDef {
            name: name.to_string(),
            model: model.to_string(),
            instruction: instruction.to_string(),
            adapter: default_adapter(),
            base_url: Some("${OPENAI_BASE_URL:-https://api.openai.com/v1}".to_string()),
            api_key: Some("${OPENAI_API_KEY:-}".to_string()),
            temperature: None,
        };

        Self {
            name: "Research Chain".to_string(),
            agents: vec![
                agent(
                    "ResearchAgent",
                    models[0],
                    "You are the research agent; gather data and summarize.",
                ),
                agent(
                    "AnalysisAgent",
                    models[1],
                    "You are the analysis agent; analyze the research output.",
                ),
                agent(
                    "SummaryAgent",
                    models[2],
                    "You are the summary agent; produce a concise summary.",
                ),
            ],
        }
    }

    /// Replace every agent's adapter with the offline echo adapter.
    pub fn into_echo(mut self) -> Self {
        for agent in &mut self.agents {
            agent.adapter = "echo".to_string();
        }
        self
    }

    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name.as_str()).collect()
    }

    /// Check the structural invariants of a chain: at least two agents,
    /// each with a non-empty, unique name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_names(self.agents.iter().map(|a| a.name.as_str()))
    }

    /// Instantiate the agents of this chain, in order.
    pub fn build_agents(&self) -> Result<Vec<Arc<dyn AgentCapability>>, ConfigError> {
        self.validate()?;
        self.agents.iter().map(build_agent).collect()
    }
}

fn build_agent(def: &AgentDef) -> Result<Arc<dyn AgentCapability>, ConfigError> {
    if def.adapter.eq_ignore_ascii_case("echo") {
        return Ok(Arc::new(EchoAgent::new(&def.name)));
    }

    let adapter = LlmAdapter::from_str(&def.adapter).ok_or_else(|| ConfigError::UnknownAdapter {
        agent: def.name.clone(),
        adapter: def.adapter.clone(),
    })?;

    let mut agent = LlmAgent::new(
        &def.name,
        adapter,
        resolve_env_vars(&def.model),
        &def.instruction,
    )
    .with_temperature(def.temperature);
    if let Some(ref base_url) = def.base_url {
        agent = agent.with_base_url(resolve_env_vars(base_url));
    }
    if let Some(ref api_key) = def.api_key {
        agent = agent.with_api_key(resolve_env_vars(api_key));
    }

    tracing::debug!(agent = %def.name, adapter = %def.adapter, model = %agent.model(), "Built agent");
    Ok(Arc::new(agent))
}

/// Shared by chain definitions and the orchestrator constructor.
pub(crate) fn validate_names<'a>(names: impl Iterator<Item = &'a str>) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    let mut count = 0;
    for (i, name) in names.enumerate() {
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyAgentName(i + 1));
        }
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateAgentName(name.to_string()));
        }
        count += 1;
    }
    if count < 2 {
        return Err(ConfigError::TooFewAgents(count));
    }
    Ok(())
}

static ENV_VAR_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

/// Resolve environment variable references in a string.
/// Supports `${ENV_VAR}` and `${ENV_VAR:-default}` syntax.
pub fn resolve_env_vars(input: &str) -> String {
    ENV_VAR_RE
        .replace_all(input, |caps: &regex::Captures| {
            let var_expr = &caps[1];
            if let Some(idx) = var_expr.find(":-") {
                let var_name = &var_expr[..idx];
                let default_val = &var_expr[idx + 2..];
                std::env::var(var_name).unwrap_or_else(|_| default_val.to_string())
            } else {
                std::env::var(var_expr).unwrap_or_else(|_| format!("${{{}}}", var_expr))
            }
        })
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_chain() {
        let yaml = r#"
agents:
  - name: A
    model: gpt-4o
  - name: B
    model: gpt-4o-mini
    adapter: anthropic
"#;
        let chain = ChainDefinition::from_yaml(yaml).unwrap();
        assert_eq!(chain.name, "default");
        assert_eq!(chain.agent_names(), vec!["A", "B"]);
        assert_eq!(chain.agents[0].adapter, "openai");
        assert_eq!(chain.agents[1].adapter, "anthropic");
        assert!(chain.validate().is_ok());
        assert_eq!(chain.build_agents().unwrap().len(), 2);
    }

    #[test]
    fn test_builtin_chain() {
        let chain = ChainDefinition::builtin(DEFAULT_MODELS);
        assert_eq!(
            chain.agent_names(),
            vec!["ResearchAgent", "AnalysisAgent", "SummaryAgent"]
        );
        assert_eq!(chain.agents[0].model, "openai/gpt-4o");
        assert_eq!(chain.agents[2].model, "gemini-2.0-flash");

        let agents = chain.into_echo().build_agents().unwrap();
        assert_eq!(agents.len(), 3);
        assert_eq!(agents[1].name(), "AnalysisAgent");
    }

    #[test]
    fn test_validate_rejects_bad_chains() {
        let one = ChainDefinition::from_yaml("agents:\n  - name: Solo\n").unwrap();
        assert_eq!(one.validate(), Err(ConfigError::TooFewAgents(1)));

        let dup = ChainDefinition::from_yaml("agents:\n  - name: A\n  - name: A\n").unwrap();
        assert_eq!(
            dup.validate(),
            Err(ConfigError::DuplicateAgentName("A".to_string()))
        );

        let blank = ChainDefinition::from_yaml("agents:\n  - name: A\n  - name: \" \"\n").unwrap();
        assert_eq!(blank.validate(), Err(ConfigError::EmptyAgentName(2)));
    }

    #[test]
    fn test_unknown_adapter() {
        let chain = ChainDefinition::from_yaml(
            "agents:\n  - name: A\n    adapter: carrier-pigeon\n  - name: B\n",
        )
        .unwrap();
        assert!(matches!(
            chain.build_agents(),
            Err(ConfigError::UnknownAdapter { ref adapter, .. }) if adapter == "carrier-pigeon"
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.yaml");
        std::fs::write(
            &path,
            "name: Two\nagents:\n  - name: A\n    adapter: echo\n  - name: B\n    adapter: echo\n",
        )
        .unwrap();

        let chain = ChainDefinition::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(chain.name, "Two");

        let missing = ChainDefinition::from_file("/nonexistent/chain.yaml");
        assert!(matches!(missing, Err(ConfigError::Chain(_))));
    }

    #[test]
    fn test_resolve_env_vars() {
        std::env::set_var("RELAY_TEST_CHAIN_VAR", "hello");
        assert_eq!(resolve_env_vars("${RELAY_TEST_CHAIN_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix-${RELAY_TEST_CHAIN_VAR}-suffix"),
            "prefix-hello-suffix"
        );
        assert_eq!(
            resolve_env_vars("${RELAY_NONEXISTENT_VAR:-fallback}"),
            "fallback"
        );
        assert_eq!(
            resolve_env_vars("${RELAY_NONEXISTENT_VAR}"),
            "${RELAY_NONEXISTENT_VAR}"
        );
        std::env::remove_var("RELAY_TEST_CHAIN_VAR");
    }
}
