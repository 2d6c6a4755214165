use std::path::PathBuf;

use clap::Parser;
use shardq::{
    server::Server,
    telemetry::{initialize_fmt_subscriber, initialize_jaeger_subscriber},
};

#[derive(Debug, Parser)]
#[command(name = "shardq-server")]
#[command(about = "shardq node: sharded queue and read-through cache over HTTP", long_about = None)]
struct Cli {
    #[arg(long)]
    config_path: PathBuf,
    #[arg(short, long, default_value = "false")]
    tracing_jaeger: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    if args.tracing_jaeger {
        initialize_jaeger_subscriber("http://localhost:4318/v1/traces")?;
    } else {
        initialize_fmt_subscriber()?;
    }

    let server = Server::from_config(args.config_path).await?;
    server.run(tokio::signal::ctrl_c()).await?;

    Ok(())
}
