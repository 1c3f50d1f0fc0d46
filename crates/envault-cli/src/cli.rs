use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};

use envault_app::EnvaultClient;

use crate::{env_parser::EnvFileParser, git_resolver::GitPathResolver, keychain::KeychainManager};

#[derive(Parser)]
#[command(name = "envault")]
#[command(about = "Secure environment variable manager with post-quantum secret exchange")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Input for smart command inference
    pub input: Option<String>,

    /// Environment name
    #[arg(short, long, default_value = "development")]
    pub env: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Get environment variable(s)
    Get {
        /// Variable name (omit to get all)
        key: Option<String>,

        /// Environment name
        #[arg(short, long)]
        env: Option<String>,
    },

    /// Set environment variable(s)
    Set {
        /// Variable name
        key: Option<String>,

        /// Variable value
        value: Option<String>,

        /// Environment name
        #[arg(short, long)]
        env: Option<String>,

        /// Read from .env file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Delete environment variable(s)
    Delete {
        /// Variable name (omit with --all to delete everything)
        key: Option<String>,

        /// Environment name
        #[arg(short, long)]
        env: Option<String>,

        /// Delete all variables for this environment
        #[arg(short, long)]
        all: bool,
    },

    /// List variable names for this repo and environment
    List {
        /// Environment name
        #[arg(short, long)]
        env: Option<String>,
    },

    /// Print this machine's public key so a teammate can `give` to you
    Ask,

    /// Encrypt this environment's secrets for a teammate's public key
    Give {
        /// Recipient's public key (from their `ask`)
        recipient: String,

        /// Environment name
        #[arg(short, long)]
        env: Option<String>,
    },

    /// Import secrets from a token produced by a teammate's `give`
    Receive {
        /// The pasted token
        token: String,

        /// Environment name
        #[arg(short, long)]
        env: Option<String>,
    },
}

fn keychain_for(env: &str) -> (String, KeychainManager) {
    let resolver = GitPathResolver::new(None);
    let service_name = resolver.generate_service_name(env);
    let keychain = KeychainManager::new(service_name.clone());
    (service_name, keychain)
}

pub fn handle_get(key: Option<String>, env: Option<String>) -> Result<()> {
    let env = env.unwrap_or_else(|| "development".to_string());
    let (service_name, keychain) = keychain_for(&env);

    if let Some(key) = key {
        match keychain.get_var(&key)? {
            Some(value) => {
                println!("{}", value);
            }
            None => {
                eprintln!(
                    "{} Variable '{}' not found in {} environment",
                    "✗".red(),
                    key,
                    env
                );
                std::process::exit(1);
            }
        }
    } else {
        println!(
            "{} {}",
            "Repository:".bright_blue(),
            GitPathResolver::extract_repo_from_service(&service_name)
        );
        println!("{} {}\n", "Environment:".bright_blue(), env);

        let vars = keychain.list_vars()?;
        if vars.is_empty() {
            println!("{}", "No variables stored".yellow());
        } else {
            for (key, value) in vars.iter() {
                println!("{}={}", key, value);
            }
        }
    }

    Ok(())
}

pub fn handle_set(
    key: Option<String>,
    value: Option<String>,
    env: Option<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    let env = env.unwrap_or_else(|| "development".to_string());
    let (_, keychain) = keychain_for(&env);

    if let Some(file_path) = file {
        let vars = EnvFileParser::parse_file(&file_path)?;
        keychain.set_vars(&vars)?;

        println!(
            "{} Set {} variables from {} in {} environment",
            "✓".green(),
            vars.len(),
            file_path.display(),
            env
        );
    } else if let (Some(key), Some(value)) = (key, value) {
        keychain.set_var(&key, &value)?;
        println!("{} Set {} in {} environment", "✓".green(), key, env);
    } else {
        eprintln!("{} Must provide either key/value or --file", "✗".red());
        std::process::exit(1);
    }

    Ok(())
}

pub fn handle_delete(key: Option<String>, env: Option<String>, all: bool) -> Result<()> {
    let env = env.unwrap_or_else(|| "development".to_string());
    let (_, keychain) = keychain_for(&env);

    if all {
        let removed = keychain.clear_all()?;
        println!(
            "{} Deleted {} variables in {} environment",
            "✓".green(),
            removed,
            env
        );
    } else if let Some(key) = key {
        if keychain.delete_var(&key)? {
            println!("{} Deleted {} from {} environment", "✓".green(), key, env);
        } else {
            eprintln!(
                "{} Variable '{}' not found in {} environment",
                "✗".red(),
                key,
                env
            );
            std::process::exit(1);
        }
    } else {
        eprintln!("{} Must provide either key or --all", "✗".red());
        std::process::exit(1);
    }

    Ok(())
}

pub fn handle_list(env: Option<String>) -> Result<()> {
    let env = env.unwrap_or_else(|| "development".to_string());
    let (service_name, keychain) = keychain_for(&env);

    println!(
        "{} {}",
        "Repository:".bright_blue(),
        GitPathResolver::extract_repo_from_service(&service_name)
    );
    println!("{} {}\n", "Environment:".bright_blue(), env);

    let vars = keychain.list_vars()?;
    if vars.is_empty() {
        println!("{}", "No variables stored".yellow());
    } else {
        for (key, _) in vars.iter() {
            println!("{}", key);
        }
    }

    Ok(())
}

pub fn handle_ask() -> Result<()> {
    let client = EnvaultClient::new()?;
    let public_key = client.public_key()?;

    println!("{}", public_key);
    eprintln!(
        "\n{} Send this key to a teammate; they run 'envault give <key>' and paste the token back.",
        "→".blue()
    );

    Ok(())
}

pub fn handle_give(recipient: String, env: Option<String>) -> Result<()> {
    let env = env.unwrap_or_else(|| "development".to_string());
    let (_, keychain) = keychain_for(&env);

    let secrets = keychain.list_vars()?;
    if secrets.is_empty() {
        eprintln!(
            "{} No variables stored for the {} environment - nothing to give",
            "✗".red(),
            env
        );
        std::process::exit(1);
    }

    let client = EnvaultClient::new()?;
    let token = client.seal_for(&secrets, &recipient)?;

    println!("{}", token);
    eprintln!(
        "\n{} Sealed {} variables for the recipient. Only their device key can open this token.",
        "✓".green(),
        secrets.len()
    );

    Ok(())
}

pub fn handle_receive(token: String, env: Option<String>) -> Result<()> {
    let env = env.unwrap_or_else(|| "development".to_string());
    let (_, keychain) = keychain_for(&env);

    let client = EnvaultClient::new()?;
    let secrets = match client.open_with_device_key(&token) {
        Ok(secrets) => secrets,
        Err(e) if e.is_rejected_token() => {
            eprintln!(
                "{} Token could not be decrypted or authenticated - it may be corrupted, \
                 tampered with, or sealed for a different key",
                "✗".red()
            );
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    keychain.set_vars(&secrets)?;
    println!(
        "{} Imported {} variables into the {} environment",
        "✓".green(),
        secrets.len(),
        env
    );

    Ok(())
}

pub fn handle_smart_command(input: String, env: String) -> Result<()> {
    let path = Path::new(&input);

    if path.exists() {
        // It's a file - set variables from it
        handle_set(None, None, Some(env), Some(path.to_path_buf()))?;
    } else if input.contains('=') {
        // It's a key=value pair
        let parts: Vec<&str> = input.splitn(2, '=').collect();
        if parts.len() == 2 {
            handle_set(
                Some(parts[0].to_string()),
                Some(parts[1].to_string()),
                Some(env),
                None,
            )?;
        } else {
            eprintln!("{} Invalid key=value format", "✗".red());
            std::process::exit(1);
        }
    } else if input.ends_with(".env") || input.contains('/') {
        // Looks like a file path - restore stored variables to it
        let (_, keychain) = keychain_for(&env);
        let vars = keychain.list_vars()?;

        if vars.is_empty() {
            eprintln!(
                "{} No variables stored for the {} environment",
                "✗".red(),
                env
            );
            std::process::exit(1);
        }

        EnvFileParser::write_file(path, &vars, true)?;
        println!(
            "{} Restored {} variables to {}",
            "✓".green(),
            vars.len(),
            input
        );
    } else {
        // Treat as variable name to get
        handle_get(Some(input), Some(env))?;
    }

    Ok(())
}
