use crate::cli::CliContext;
use crate::constants;
use crate::core::credentials::CredentialStore;
use crate::util::fs as app_fs;
use anyhow::{bail, Context, Result};
use clap::Args;
use dialoguer::{Input, Password};
use std::io::Read;
use zeroize::Zeroizing;

#[derive(Args, Debug)]
pub struct SetAuthArgs {
    /// User name for HTTP basic auth
    #[arg(long)]
    pub user: Option<String>,

    /// Read the password from stdin instead of interactive prompt
    #[arg(long)]
    pub from_stdin: bool,
}

pub fn run(ctx: &CliContext, args: SetAuthArgs) -> Result<()> {
    if ctx.non_interactive && (!args.from_stdin || args.user.is_none()) {
        bail!("--non-interactive requires --user and --from-stdin for set-auth");
    }
    let (user, password) = read_credentials(args.user, args.from_stdin)?;
    let store = CredentialStore::new(&user, &password)?;
    let passphrase = ctx.passphrase(true)?;

    app_fs::ensure_dir(&ctx.paths.root, constants::DATA_DIR_MODE)?;
    store.write_file(&ctx.paths.auth, passphrase.as_bytes())?;
    println!("credentials for '{}' written to {}", user, ctx.paths.auth.display());
    Ok(())
}

/// Ask for user and password. The password prompt asks twice.
pub fn read_credentials(
    user: Option<String>,
    from_stdin: bool,
) -> Result<(String, Zeroizing<String>)> {
    let user = match user {
        Some(u) => u,
        None => Input::<String>::new()
            .with_prompt("User")
            .interact_text()
            .context("read user from prompt")?,
    };
    let password = if from_stdin {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read password from stdin")?;
        Zeroizing::new(buf.trim_end_matches(['\r', '\n']).to_string())
    } else {
        Zeroizing::new(
            Password::new()
                .with_prompt(format!("Password for {}", user))
                .with_confirmation("Repeat password", "Passwords do not match")
                .interact()
                .context("read password from prompt")?,
        )
    };
    if password.is_empty() {
        bail!("password cannot be empty");
    }
    Ok((user, password))
}
