//! `relay agents`: List the agents of the configured chain.

use relay_core::RelaySettings;

pub fn run(settings: RelaySettings) -> Result<(), String> {
    let chain = settings
        .chain()
        .map_err(|e| format!("Failed to load agent chain: {}", e))?;
    chain
        .validate()
        .map_err(|e| format!("Invalid agent chain: {}", e))?;

    println!("Chain: {} ({} agents)", chain.name, chain.agents.len());
    for (i, agent) in chain.agents.iter().enumerate() {
        println!(
            "  {}. {:<16} adapter={:<10} model={}",
            i + 1,
            agent.name,
            agent.adapter,
            agent.model
        );
    }
    println!("Workflow: {}", chain.agent_names().join(" -> "));
    Ok(())
}
