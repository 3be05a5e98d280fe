pub mod application;
pub mod cli;
pub mod config;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::{agent, chat, stdio, tooling};
pub use cli::Cli;
pub use config::AppConfig;
pub use domain::types;
pub use infrastructure::model;

use agent::{AgentLoop, AgentOptions, PromptAssembler};
use chat::ChatSession;
use model::OpenAIClient;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tooling::ToolSessionManager;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    init_tracing(&cli.log);
    info!("Starting mcp-agent");
    debug!(config = ?cli.config, one_shot = cli.prompt.is_some(), "CLI arguments parsed");

    let config_path = cli.config.as_deref().map(Path::new);
    let config = AppConfig::load(config_path)?;
    info!(
        servers = config.servers.len(),
        model = %config.model.model,
        "Loaded configuration"
    );

    let provider = OpenAIClient::from_config(&config.model)?;

    let tools = Arc::new(
        ToolSessionManager::stdio()
            .with_timeouts(config.agent.connect_timeout, config.agent.tool_timeout),
    );
    if let Err(failures) = tools.connect_all(&config.servers).await {
        for failure in &failures {
            warn!(server = %failure.server, error = %failure.source, "Continuing without tool server");
        }
        if failures.len() == config.servers.len() {
            error!("No tool server could be connected");
            return Err("no tool server could be connected".into());
        }
    }

    let prompts = Arc::new(PromptAssembler::load(&config.agent.prompt_template));
    let agent = Arc::new(
        AgentLoop::new(provider, Arc::clone(&tools), prompts)
            .with_options(AgentOptions::from(&config.agent)),
    );
    let mut session = ChatSession::new(agent, config.agent.max_tool_uses)
        .with_persistence(config.agent.persist_history);
    info!(session = session.id(), "Chat session opened");

    let outcome: Result<(), Box<dyn Error>> = match cli.prompt.as_deref().map(str::trim) {
        Some(prompt) if !prompt.is_empty() => {
            let answer = session.respond(prompt).await;
            println!("{answer}");
            Ok(())
        }
        Some(_) => Err("--prompt must not be empty".into()),
        None => stdio::run(&mut session).await.map_err(Into::into),
    };

    tools.shutdown().await;
    info!("mcp-agent finished");
    outcome
}

fn init_tracing(default_filter: &str) {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .init();
    });
}
