//! stdio adapter - one JSON-RPC message per line.
//!
//! stdout carries protocol traffic only; all logging goes to stderr.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

use crate::mcp::McpServer;
use crate::Result;
use super::Transport;

/// stdio transport for a single MCP client.
pub struct StdioTransport {
    server: Arc<McpServer>,
}

impl StdioTransport {
    pub fn new(server: Arc<McpServer>) -> Self {
        Self { server }
    }
}

impl Transport for StdioTransport {
    fn name(&self) -> &str {
        "stdio"
    }

    async fn serve(&self) -> Result<()> {
        info!("AI Factory MCP server listening on stdio");
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        serve_lines(&self.server, stdin, stdout).await?;
        info!("stdin closed, shutting down");
        Ok(())
    }
}

/// Read messages from `reader` until EOF, writing each response as a line.
///
/// Blank lines are skipped; notifications produce no output. A line that is
/// not valid UTF-8 gets a parse error reply and the session keeps going.
pub async fn serve_lines<R, W>(server: &McpServer, mut reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        if buf.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        if let Some(response) = server.handle_bytes(&buf).await {
            writer.write_all(response.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }

    Ok(())
}
