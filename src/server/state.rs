use crate::constants;
use crate::core::capabilities::ApiSet;
use crate::core::client_policy::{ClientLock, ClientPolicy};
use crate::core::config_file;
use crate::core::credentials::CredentialStore;
use crate::core::paths::AppPaths;
use crate::driver::{Clipboard, InputDriver};
use crate::macros::MacroSet;
use crate::models::config::ConfigFile;
use crate::util::netif::LocalNet;
use rand::{rngs::OsRng, Rng};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Byte limits for request bodies.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub text: usize,
    pub texts: usize,
}

/// Application state shared by the gate and all handlers.
pub struct AppState {
    pub paths: AppPaths,
    pub credentials: Arc<CredentialStore>,
    pub policy: ClientPolicy,
    pub lock: ClientLock,
    pub realm_key: String,
    pub limits: Limits,
    /// Bounds of the randomized delay after a failed login.
    pub failure_delay: (Duration, Duration),
    pub macro_pause: Duration,
    pub driver: Arc<dyn InputDriver>,
    pub clipboard: Arc<dyn Clipboard>,
    apis: RwLock<ApiSet>,
    macros: RwLock<Arc<MacroSet>>,
}

impl AppState {
    pub fn new(
        paths: AppPaths,
        config: &ConfigFile,
        credentials: CredentialStore,
        local_nets: Vec<LocalNet>,
        driver: Arc<dyn InputDriver>,
        clipboard: Arc<dyn Clipboard>,
        macros: MacroSet,
    ) -> Self {
        let [lo, hi] = config.access.failure_delay_ms;
        Self {
            paths,
            credentials: Arc::new(credentials),
            policy: ClientPolicy::new(
                config.access.clients,
                config.access.multi_client,
                local_nets,
            ),
            lock: ClientLock::default(),
            realm_key: realm_key(),
            limits: Limits {
                text: config.server.text_limit,
                texts: config.server.texts_limit,
            },
            failure_delay: (Duration::from_millis(lo), Duration::from_millis(hi.max(lo))),
            macro_pause: Duration::from_millis(config.macros.pause_ms),
            driver,
            clipboard,
            apis: RwLock::new(ApiSet::parse(&config.apis.enabled)),
            macros: RwLock::new(Arc::new(macros)),
        }
    }

    pub fn realm(&self) -> String {
        format!("keyrelay: {}", self.realm_key)
    }

    pub fn apis(&self) -> ApiSet {
        *self.apis.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_apis(&self, apis: ApiSet) {
        *self.apis.write().unwrap_or_else(|e| e.into_inner()) = apis;
        tracing::info!(apis = %apis, "active apis");
    }

    /// Snapshot of the current macro set.
    pub fn macros(&self) -> Arc<MacroSet> {
        self.macros.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn replace_macros(&self, macros: MacroSet) {
        tracing::info!(count = macros.len(), "macros loaded");
        *self.macros.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(macros);
    }

    /// Re-read the capability set and the macros. Whatever fails to load keeps its old value.
    pub fn reload(&self) {
        match config_file::load(&self.paths.config_toml) {
            Ok(config) => self.set_apis(ApiSet::parse(&config.apis.enabled)),
            Err(e) => tracing::error!(
                error = %format!("{:#}", e),
                "reload config failed, keeping apis"
            ),
        }
        match MacroSet::load(&self.paths.macros_toml) {
            Ok(macros) => self.replace_macros(macros),
            Err(e) => tracing::error!(
                error = %format!("{:#}", e),
                "reload macros failed, keeping old set"
            ),
        }
    }
}

/// Random per-process key shown in the basic-auth realm.
pub fn realm_key() -> String {
    let mut rng = OsRng;
    (0..constants::REALM_KEY_LEN)
        .map(|_| {
            let i = rng.gen_range(0..constants::REALM_CHARS.len());
            constants::REALM_CHARS[i] as char
        })
        .collect()
}
