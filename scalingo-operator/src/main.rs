use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod cli;
mod commands;
mod config;

use cli::{Args, Mode};

/// JSON lines by default, plain text when LOG_FORMAT=text
fn initialize_tracing() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "info,\
         scalingo_operator=debug,\
         scalingo_reconciler=debug,\
         kube=warn"
            .into()
    });

    let text = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "text");
    let registry = tracing_subscriber::registry().with(env_filter);
    if text {
        registry.with(fmt::layer().with_ansi(false)).init();
    } else {
        registry.with(fmt::layer().json()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    match args.mode {
        Mode::Run { health_port } => {
            initialize_tracing();
            commands::run::run(health_port).await
        }
        Mode::Crd => commands::crd::print_crd(),
    }
}
