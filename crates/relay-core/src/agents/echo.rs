//! Offline agent that tags its input with its own name.

use async_trait::async_trait;

use super::{AgentCapability, AgentError};

pub struct EchoAgent {
    name: String,
}

impl EchoAgent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl AgentCapability for EchoAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: &str) -> Result<String, AgentError> {
        Ok(format!("[{}] {}", self.name, input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_tags_input() {
        let agent = EchoAgent::new("ResearchAgent");
        assert_eq!(agent.name(), "ResearchAgent");
        assert_eq!(agent.run("hi").await.unwrap(), "[ResearchAgent] hi");
    }
}
