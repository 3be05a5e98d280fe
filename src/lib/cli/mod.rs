use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "mcp-agent",
    version,
    about = "Agent that answers with the help of MCP tool servers"
)]
pub struct Cli {
    /// Configuration file (defaults to config/agent.toml)
    #[arg(long, short)]
    pub config: Option<String>,
    /// Answer a single prompt and exit instead of starting the chat
    #[arg(long, short)]
    pub prompt: Option<String>,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log: String,
}
