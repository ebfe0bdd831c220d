//! Which peers may reach the API: local-network membership and the single-client lock.

use crate::models::config::ClientScope;
use crate::util::netif::LocalNet;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("forbidden")]
    Forbidden,
    #[error("cannot determine client address")]
    Internal,
}

#[derive(Debug, Clone)]
pub struct ClientPolicy {
    pub scope: ClientScope,
    pub multi_client: bool,
    pub local_nets: Vec<LocalNet>,
}

impl ClientPolicy {
    pub fn new(scope: ClientScope, multi_client: bool, local_nets: Vec<LocalNet>) -> Self {
        Self {
            scope,
            multi_client,
            local_nets,
        }
    }

    /// Network part of the check; the lock part lives in [`ClientLock`].
    pub fn check_network(&self, peer: Option<SocketAddr>) -> Result<IpAddr, Rejection> {
        let ip = peer.ok_or(Rejection::Internal)?.ip().to_canonical();
        if self.scope == ClientScope::Local && !self.local_nets.iter().any(|n| n.contains(ip)) {
            tracing::warn!(%ip, "rejecting client outside local networks");
            return Err(Rejection::Forbidden);
        }
        Ok(ip)
    }

    /// Full pre-authentication check against the current lock holder.
    pub fn check_client(
        &self,
        lock: &ClientLock,
        peer: Option<SocketAddr>,
    ) -> Result<IpAddr, Rejection> {
        let ip = self.check_network(peer)?;
        if !self.multi_client {
            if let Some(holder) = lock.holder() {
                if holder != ip {
                    tracing::warn!(%ip, %holder, "rejecting second client");
                    return Err(Rejection::Forbidden);
                }
            }
        }
        Ok(ip)
    }
}

/// Process-wide single-client lock.
#[derive(Debug, Default)]
pub struct ClientLock {
    holder: Mutex<Option<IpAddr>>,
}

impl ClientLock {
    fn lock(&self) -> MutexGuard<'_, Option<IpAddr>> {
        self.holder.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn holder(&self) -> Option<IpAddr> {
        *self.lock()
    }

    /// Bind to `ip` if unlocked. Returns false if another client holds the lock.
    ///
    /// Check and bind happen under one guard, so of two racing clients only one wins.
    pub fn bind(&self, ip: IpAddr) -> bool {
        let mut holder = self.lock();
        match *holder {
            Some(current) => current == ip,
            None => {
                tracing::info!(%ip, "client lock bound");
                *holder = Some(ip);
                true
            }
        }
    }

    pub fn release(&self) {
        if let Some(ip) = self.lock().take() {
            tracing::info!(%ip, "client lock released");
        }
    }
}
