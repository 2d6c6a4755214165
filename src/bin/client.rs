use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use shardq::client::node_client::NodeClient;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Parser)]
#[command(name = "shardq-client")]
#[command(about = "shardq-client http client", long_about = None)]
struct Cli {
    /// Port of the node to talk to. Any node works, requests are forwarded to the owner.
    #[arg(short, long, default_value = "3001")]
    port: u16,
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Node id, address and peers
    Info,
    Produce {
        #[arg(short, long)]
        queue: String,
        /// JSON document
        #[arg(short, long)]
        message: String,
    },
    Consume {
        #[arg(short, long)]
        queue: String,
    },
    Ack {
        #[arg(short, long)]
        token: String,
        /// The JSON document returned by consume
        #[arg(short, long)]
        message: String,
    },
    Stats {
        #[arg(short, long)]
        queue: String,
    },
    CacheGet {
        #[arg(short, long)]
        key: String,
    },
    CachePut {
        #[arg(short, long)]
        key: String,
        /// JSON value
        #[arg(short, long)]
        data: String,
    },
    Metrics,
}

async fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(&serde_json::to_vec_pretty(value)?).await?;
    stdout.write_all(b"\n").await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let client = NodeClient::new(format!("{}:{}", args.host, args.port));

    match args.command {
        Commands::Info => print(&client.node_info().await?).await?,
        Commands::Produce { queue, message } => {
            let message: Value = serde_json::from_str(&message)?;
            print(&client.produce(&queue, &message).await?).await?
        }
        Commands::Consume { queue } => print(&client.consume(&queue).await?).await?,
        Commands::Ack { token, message } => {
            let message: Value = serde_json::from_str(&message)?;
            print(&client.ack(&token, &message).await?).await?
        }
        Commands::Stats { queue } => print(&client.queue_stats(&queue).await?).await?,
        Commands::CacheGet { key } => print(&client.cache_get(&key).await?).await?,
        Commands::CachePut { key, data } => {
            let data: Value = serde_json::from_str(&data)?;
            print(&client.cache_put(&key, &serde_json::json!({ "data": data })).await?).await?
        }
        Commands::Metrics => print(&client.metrics().await?).await?,
    }

    Ok(())
}
