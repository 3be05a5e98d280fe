use super::chat::ChatSession;
use super::tooling::Catalog;
use crate::model::ModelProvider;
use thiserror::Error;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

#[derive(Debug, Error)]
pub enum StdioError {
    #[error("stdin/stdout I/O error: {0}")]
    Io(#[from] std::io::Error),
}

enum LoopControl {
    Continue,
    Exit,
}

/// Interactive chat on the process's stdin and stdout.
pub async fn run<P: ModelProvider>(session: &mut ChatSession<P>) -> Result<(), StdioError> {
    let stdin = BufReader::new(io::stdin());
    let mut stdout = io::stdout();
    run_with(session, stdin, &mut stdout).await
}

/// Same loop over arbitrary streams.
pub async fn run_with<P, R, W>(
    session: &mut ChatSession<P>,
    input: R,
    output: &mut W,
) -> Result<(), StdioError>
where
    P: ModelProvider,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    print_banner(output).await?;

    loop {
        prompt(output).await?;
        let Some(line) = lines.next_line().await? else {
            write_line(output, "\nInput closed. Leaving chat.").await?;
            break;
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if input.starts_with('/') {
            match handle_command(input, session, output).await? {
                LoopControl::Continue => continue,
                LoopControl::Exit => break,
            }
        } else {
            let answer = session.respond(input).await;
            write_line(output, &answer).await?;
        }
    }

    output.flush().await?;
    Ok(())
}

async fn handle_command<P, W>(
    input: &str,
    session: &mut ChatSession<P>,
    output: &mut W,
) -> Result<LoopControl, StdioError>
where
    P: ModelProvider,
    W: AsyncWrite + Unpin,
{
    let name = input
        .trim_start_matches('/')
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    debug!(command = %name, "Processing chat command");

    match name.as_str() {
        "help" | "?" => {
            print_help(output).await?;
            Ok(LoopControl::Continue)
        }
        "exit" | "quit" | "q" => {
            write_line(output, "Goodbye.").await?;
            Ok(LoopControl::Exit)
        }
        "reset" | "clear" => {
            session.reset();
            write_line(output, "Conversation cleared.").await?;
            Ok(LoopControl::Continue)
        }
        "tools" => {
            let catalog = session.agent().tools().catalog().await;
            print_catalog(output, &catalog).await?;
            Ok(LoopControl::Continue)
        }
        other => {
            write_line(
                output,
                &format!("Unknown command '/{other}'. Type /help for the list."),
            )
            .await?;
            Ok(LoopControl::Continue)
        }
    }
}

async fn print_catalog<W: AsyncWrite + Unpin>(output: &mut W, catalog: &Catalog) -> io::Result<()> {
    if catalog.is_empty() {
        return write_line(output, "No tool servers are connected.").await;
    }
    for (server, tools) in catalog {
        write_line(output, &format!("{server}:")).await?;
        for tool in tools {
            let line = match &tool.description {
                Some(description) => format!("  - {}: {description}", tool.name),
                None => format!("  - {}", tool.name),
            };
            write_line(output, &line).await?;
        }
    }
    Ok(())
}

async fn print_banner<W: AsyncWrite + Unpin>(output: &mut W) -> io::Result<()> {
    write_line(output, "Agent chat ready. Type a message and press Enter.").await?;
    write_line(output, "Use /help for commands.").await
}

async fn print_help<W: AsyncWrite + Unpin>(output: &mut W) -> io::Result<()> {
    write_line(output, "\nAvailable commands:").await?;
    write_line(output, "  /help     Show this help").await?;
    write_line(output, "  /tools    List connected tool servers and their tools").await?;
    write_line(output, "  /reset    Forget the conversation and start over").await?;
    write_line(output, "  /exit     Leave the chat").await?;
    write_line(output, "Anything not starting with / is sent to the agent.").await
}

async fn prompt<W: AsyncWrite + Unpin>(output: &mut W) -> io::Result<()> {
    output.write_all(b"agent> ").await?;
    output.flush().await
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, line: &str) -> io::Result<()> {
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::agent::{AgentLoop, PromptAssembler};
    use crate::application::tooling::{
        ToolDescriptor, ToolInvokeError, ToolSessionManager, ToolTransport, TransportConnector,
    };
    use crate::config::ServerConfig;
    use crate::model::ModelError;
    use crate::types::ChatMessage;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl ModelProvider for Echo {
        async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(format!("echo: {last}"))
        }
    }

    struct OneTool;

    #[async_trait]
    impl ToolTransport for OneTool {
        async fn list_capabilities(&self) -> Result<Vec<ToolDescriptor>, ToolInvokeError> {
            Ok(vec![ToolDescriptor::new("web_search").with_description("Search")])
        }

        async fn call_tool(&self, _tool: &str, _arguments: Value) -> Result<Value, ToolInvokeError> {
            Ok(Value::Null)
        }

        async fn close(&self) -> Result<(), ToolInvokeError> {
            Ok(())
        }
    }

    struct Connector;

    #[async_trait]
    impl TransportConnector for Connector {
        async fn connect(
            &self,
            _config: &ServerConfig,
        ) -> Result<Box<dyn ToolTransport>, ToolInvokeError> {
            Ok(Box::new(OneTool))
        }
    }

    async fn session() -> ChatSession<Echo> {
        let manager = ToolSessionManager::new(Arc::new(Connector));
        manager
            .connect_all(&[ServerConfig::new("search", "stub")])
            .await
            .expect("connects");
        let agent = AgentLoop::new(
            Echo,
            Arc::new(manager),
            Arc::new(PromptAssembler::embedded()),
        );
        ChatSession::new(Arc::new(agent), 1)
    }

    async fn transcript(script: &str) -> String {
        let mut chat = session().await;
        let mut output = Vec::new();
        run_with(&mut chat, script.as_bytes(), &mut output)
            .await
            .expect("loop runs");
        String::from_utf8(output).expect("utf8")
    }

    #[tokio::test]
    async fn messages_are_answered_until_exit() {
        let out = transcript("hello\n/exit\nignored\n").await;
        assert!(out.contains("echo: hello"));
        assert!(out.contains("Goodbye."));
        assert!(!out.contains("ignored"));
    }

    #[tokio::test]
    async fn tools_command_lists_the_catalog() {
        let out = transcript("/tools\n").await;
        assert!(out.contains("search:"));
        assert!(out.contains("  - web_search: Search"));
        assert!(out.contains("Input closed"));
    }

    #[tokio::test]
    async fn unknown_commands_are_reported() {
        let out = transcript("/bogus\n/help\n").await;
        assert!(out.contains("Unknown command '/bogus'"));
        assert!(out.contains("/reset"));
    }
}
