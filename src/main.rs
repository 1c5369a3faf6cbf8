// titanic-agent — service entry point.
//
// Startup order matters: the dataset load is the one unrecoverable
// failure class, so it happens before the listener binds and aborts the
// process on error.

use std::sync::Arc;

use log::info;

use titanic_agent::{server, Agent, AgentConfig, Dataset};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AgentConfig::from_env();
    let dataset = Arc::new(Dataset::load(&config.csv_path)?);
    info!(
        "[main] agent ready: {} passengers, polishing {}",
        dataset.len(),
        if config.polish_token.is_some() { "enabled" } else { "disabled" }
    );

    let agent = Arc::new(Agent::new(dataset, &config));
    server::serve(agent, &config.bind_addr).await?;
    Ok(())
}
