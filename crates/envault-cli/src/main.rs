mod cli;
mod env_parser;
mod git_resolver;
mod keychain;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Get { key, env }) => {
            cli::handle_get(key, env)?;
        }
        Some(Commands::Set {
            key,
            value,
            env,
            file,
        }) => {
            cli::handle_set(key, value, env, file)?;
        }
        Some(Commands::Delete { key, env, all }) => {
            cli::handle_delete(key, env, all)?;
        }
        Some(Commands::List { env }) => {
            cli::handle_list(env)?;
        }
        Some(Commands::Ask) => {
            cli::handle_ask()?;
        }
        Some(Commands::Give { recipient, env }) => {
            cli::handle_give(recipient, env)?;
        }
        Some(Commands::Receive { token, env }) => {
            cli::handle_receive(token, env)?;
        }
        None => {
            // Smart command inference
            if let Some(input) = cli.input {
                cli::handle_smart_command(input, cli.env)?;
            } else {
                cli::handle_get(None, Some(cli.env))?;
            }
        }
    }

    Ok(())
}
