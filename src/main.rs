use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gh_roast::github::GithubClient;
use gh_roast::roast::GroqClient;
use gh_roast::{Config, Roaster, server};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(version, about = "Roast a GitHub profile from its public activity")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the roast API over HTTP
    Serve {
        #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1")]
        bind: IpAddr,
        #[arg(long, env = "PORT", default_value_t = 8888)]
        port: u16,
    },
    /// Roast one user and print the report as JSON
    Roast { username: String },
    /// Print the derived statistics only; needs no model credentials
    Stats { username: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gh_roast=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let github = GithubClient::new(&config.github.api_url, &config.github.user_agent)?;
    let generator = GroqClient::new(config.groq.clone())?;
    let roaster = Roaster::new(Arc::new(github), Arc::new(generator));

    match cli.command {
        Command::Serve { bind, port } => {
            let addr = SocketAddr::new(bind, port);
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind {addr}"))?;
            info!("listening on http://{addr}");
            axum::serve(listener, server::router(roaster))
                .await
                .context("HTTP server stopped")?;
        }
        Command::Roast { username } => {
            let report = roaster.roast(&username).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Stats { username } => {
            let stats = roaster.stats(&username).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}
