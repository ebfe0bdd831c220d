//! CLI routing and command dispatch.

use crate::constants;
use crate::core::config_file;
use crate::core::paths::AppPaths;
use crate::models::config::ConfigFile;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::Password;
use std::path::PathBuf;
use zeroize::Zeroizing;

pub mod apis;
pub mod auth;
pub mod cert;
pub mod init;
pub mod macros;
pub mod serve;

/// Shared context passed to all command handlers.
pub struct CliContext {
    pub paths: AppPaths,
    pub config: ConfigFile,
    pub non_interactive: bool,
    pub no_passphrase: bool,
}

impl CliContext {
    /// Passphrase protecting `auth.txt` and `key.pem`.
    ///
    /// Taken from the environment, else prompted for. An empty passphrase
    /// stores secrets unencrypted and is warned about.
    pub fn passphrase(&self, confirm: bool) -> Result<Zeroizing<String>> {
        if self.no_passphrase {
            warn_unencrypted();
            return Ok(Zeroizing::new(String::new()));
        }
        if let Ok(value) = std::env::var(constants::PASSPHRASE_ENV) {
            let value = Zeroizing::new(value);
            if value.is_empty() {
                warn_unencrypted();
            }
            return Ok(value);
        }
        if self.non_interactive {
            bail!(
                "--non-interactive requires {} or --no-passphrase",
                constants::PASSPHRASE_ENV
            );
        }
        let mut prompt = Password::new()
            .with_prompt("Passphrase for stored secrets (empty for none)")
            .allow_empty_password(true);
        if confirm {
            prompt = prompt.with_confirmation("Repeat passphrase", "Passphrases do not match");
        }
        let value = Zeroizing::new(prompt.interact().context("read passphrase from prompt")?);
        if value.is_empty() {
            warn_unencrypted();
        }
        Ok(value)
    }
}

fn warn_unencrypted() {
    eprintln!("warning: no passphrase, secrets are stored unencrypted");
}

#[derive(Parser, Debug)]
#[command(
    name = "keyrelay",
    version,
    about = "Remote keyboard, mouse and clipboard over authenticated HTTPS"
)]
pub struct Cli {
    /// Data directory [default: $KEYRELAY_ROOT, nearest keyrelay.toml, ./keyrelay-data]
    #[arg(long, global = true, value_name = "PATH")]
    pub root: Option<PathBuf>,

    /// Run in non-interactive mode (no prompts, suitable for automation)
    #[arg(long, global = true, env = "KEYRELAY_NON_INTERACTIVE")]
    pub non_interactive: bool,

    /// Store and read secrets without a passphrase
    #[arg(long, global = true)]
    pub no_passphrase: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let paths = AppPaths::resolve(self.root)?;
        let config = config_file::load(&paths.config_toml)?;
        let ctx = CliContext {
            paths,
            config,
            non_interactive: self.non_interactive,
            no_passphrase: self.no_passphrase,
        };

        match self.command {
            Commands::Init => init::run(&ctx),
            Commands::SetAuth(args) => auth::run(&ctx, args),
            Commands::Cert => cert::run(&ctx),
            Commands::Apis(args) => apis::run(&ctx, args),
            Commands::Macros => macros::run(&ctx),
            Commands::Serve(args) => serve::run(&ctx, args),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and a default configuration
    Init,
    /// Set the basic-auth user and password
    SetAuth(auth::SetAuthArgs),
    /// Create the TLS certificate if missing and show its fingerprint
    Cert,
    /// Show or change the enabled APIs
    Apis(apis::ApisArgs),
    /// Check macros.toml and list its macros
    Macros,
    /// Run the HTTPS server
    Serve(serve::ServeArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "keyrelay",
            "apis",
            "--root",
            "/tmp/kr",
            "--no-passphrase",
            "--set",
            "run-macro",
        ])
        .unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/kr")));
        assert!(cli.no_passphrase);
        match cli.command {
            Commands::Apis(args) => assert_eq!(args.set.as_deref(), Some("run-macro")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_no_passphrase_short_circuits() {
        let ctx = CliContext {
            paths: AppPaths::from_root(PathBuf::from("/unused")),
            config: ConfigFile::default(),
            non_interactive: true,
            no_passphrase: true,
        };
        assert!(ctx.passphrase(true).unwrap().is_empty());
    }

    #[test]
    fn test_command_tree_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
