mod args;
mod commands;
mod output;

use clap::{Parser, Subcommand};

use args::{CommonArgs, OptionArgs, RemoteArgs};

#[derive(Parser)]
#[command(
    name = "sling",
    about = "Render Docker, compose and nginx artifacts and deploy them to a host over SSH"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render artifacts, upload them, and run the remote build and restart stages
    Deploy {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        remote: RemoteArgs,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Write the artifacts locally without connecting anywhere
    Render {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Show the remote stages a deploy would run
    Plan {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        options: OptionArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Deploy {
            common,
            remote,
            options,
        } => commands::deploy(&common, &options, &remote).await?,
        Commands::Render { common, options } => commands::render(&common, &options).await?,
        Commands::Plan { common, options } => commands::plan(&common, &options).await?,
    }

    Ok(())
}
