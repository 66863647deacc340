use clap::{Parser, Subcommand};

/// Scalingo Operator - Scalingo managed PostgreSQL as Kubernetes resources
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Watch PostgreSQL resources and reconcile them
    Run {
        /// Health and readiness port (default: HEALTH_PORT or 8080)
        #[arg(long)]
        health_port: Option<u16>,
    },

    /// Print the PostgreSQL CustomResourceDefinition as YAML
    Crd,
}
