use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "reverie", version, about = "Reverie — terminal client for the chat relay")]
struct Cli {
    /// Relay server base URL.
    #[arg(long, env = "REVERIE_SERVER_URL", default_value = "http://127.0.0.1:8787")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one chat message and print the reply
    Chat {
        /// The user message
        message: String,
        /// Model identifier to request
        #[arg(long, default_value = "meta-llama/Llama-3.3-70B-Instruct-Turbo")]
        model: String,
        /// Stream the reply as it arrives
        #[arg(long)]
        stream: bool,
        /// Conversation thread identifier
        #[arg(long)]
        thread: Option<String>,
    },
    /// Check that the relay is up
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let server = cli.server.trim_end_matches('/').to_string();

    match cli.command {
        Commands::Chat {
            message,
            model,
            stream,
            thread,
        } => {
            let mut body = json!({
                "model": model,
                "messages": [{ "role": "user", "content": message }],
                "stream": stream,
            });
            if let Some(thread) = thread {
                body["currentThreadId"] = json!(thread);
            }

            let response = client
                .post(format!("{server}/v1/chat/completions"))
                .json(&body)
                .send()
                .await
                .context("Failed to reach the relay")?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("Relay error ({status}): {body}");
            }

            if stream {
                let mut chunks = response.bytes_stream();
                while let Some(chunk) = chunks.next().await {
                    let chunk = chunk.context("Stream interrupted")?;
                    print!("{}", String::from_utf8_lossy(&chunk));
                }
                println!();
            } else {
                let body: Value = response
                    .json()
                    .await
                    .context("Failed to parse relay response")?;
                let reply = body["choices"][0]["message"]["content"]
                    .as_str()
                    .unwrap_or_default();
                println!("{reply}");
            }
            Ok(())
        }
        Commands::Health => {
            let response = client
                .get(format!("{server}/health"))
                .send()
                .await
                .context("Failed to reach the relay")?;
            let body: Value = response
                .json()
                .await
                .context("Failed to parse health response")?;
            println!(
                "Reverie relay v{}: {}",
                body["version"].as_str().unwrap_or("unknown"),
                body["status"].as_str().unwrap_or("unknown"),
            );
            Ok(())
        }
    }
}
