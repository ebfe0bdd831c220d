use crate::cli::{auth, CliContext};
use crate::constants;
use crate::core::credentials::CredentialStore;
use crate::core::identity;
use crate::driver;
use crate::macros::MacroSet;
use crate::server::{self, AppState};
use crate::util::{fs as app_fs, netif};
use anyhow::{bail, Context, Result};
use clap::Args;
use dialoguer::Confirm;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address (overrides [server].addr)
    #[arg(long, value_name = "HOST:PORT")]
    pub addr: Option<String>,
}

pub fn run(ctx: &CliContext, args: ServeArgs) -> Result<()> {
    init_tracing();

    let paths = &ctx.paths;
    app_fs::ensure_dir(&paths.root, constants::DATA_DIR_MODE)?;
    let passphrase = ctx.passphrase(false)?;

    let credentials = load_credentials(ctx, passphrase.as_bytes())?;
    identity::ensure_certificate(&paths.cert, &paths.key, passphrase.as_bytes())?;
    let tls = identity::load_server_config(&paths.cert, &paths.key, passphrase.as_bytes())?;
    let fingerprint = identity::fingerprint(&paths.cert)?;

    let macros = MacroSet::load(&paths.macros_toml)?;
    let local_nets = netif::local_networks().context("enumerate network interfaces")?;
    for net in &local_nets {
        tracing::debug!(net = %net, "local network");
    }
    let (input, clipboard) = driver::build(ctx.config.driver.kind);

    let state = Arc::new(AppState::new(
        paths.clone(),
        &ctx.config,
        credentials,
        local_nets,
        input,
        clipboard,
        macros,
    ));
    tracing::info!(
        realm = %state.realm(),
        apis = %state.apis(),
        macros = state.macros().len(),
        clients = ?ctx.config.access.clients,
        multi_client = ctx.config.access.multi_client,
        "server configured"
    );

    let addr: SocketAddr = args
        .addr
        .as_deref()
        .unwrap_or(&ctx.config.server.addr)
        .parse()
        .context("parse listen address")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start tokio runtime")?;

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("bind {}", addr))?;
        let bound = listener.local_addr().context("listener address")?;
        let host = if bound.ip().is_unspecified() {
            netif::outbound_ip().unwrap_or(bound.ip())
        } else {
            bound.ip()
        };

        println!("realm key:   {}", state.realm_key);
        println!("fingerprint: {}", fingerprint);
        println!("open:        https://{}/", SocketAddr::new(host, bound.port()));

        #[cfg(unix)]
        tokio::spawn(server::reload_on_hangup(state.clone()));

        server::serve(listener, tls, server::router(state), server::shutdown_signal()).await
    })
}

fn init_tracing() {
    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keyrelay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Read `auth.txt`, or ask for credentials when it does not exist yet.
fn load_credentials(ctx: &CliContext, passphrase: &[u8]) -> Result<CredentialStore> {
    let path = &ctx.paths.auth;
    if path.exists() {
        let store = CredentialStore::read_file(path, passphrase)?;
        tracing::info!(user = %store.user(), "credentials loaded");
        return Ok(store);
    }
    if ctx.non_interactive {
        bail!(
            "{} does not exist; run `keyrelay set-auth` first",
            path.display()
        );
    }

    println!("No credentials stored yet.");
    let (user, password) = auth::read_credentials(None, false)?;
    let store = CredentialStore::new(&user, &password)?;
    let save = Confirm::new()
        .with_prompt(format!("Save credentials to {}?", path.display()))
        .default(true)
        .interact()
        .context("read confirmation")?;
    if save {
        store.write_file(path, passphrase)?;
        println!("saved {}", path.display());
    }
    Ok(store)
}
