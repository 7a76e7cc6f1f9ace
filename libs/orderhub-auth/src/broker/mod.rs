//! Delegated token broker.
//!
//! Trades the caller's inbound credential for one scoped to a downstream
//! resource, caching the result per `(subject, tenant, resource)`.
//! Concurrent requests for the same key collapse into one upstream
//! exchange; the identity provider never sees more than one outstanding
//! exchange per key at a time.
//!
//! Keys are never evicted, only replaced on expiry-driven refresh. The
//! distinct key population is small relative to request volume, so the
//! map can grow for the life of the process; a periodic sweep is the
//! known follow-up if that assumption stops holding.

pub mod exchanger;

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use orderhub_security::SecurityContext;
use secrecy::SecretString;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tokio::sync::oneshot;

pub use exchanger::{ExchangeError, ExchangedToken, OboConfig, OboExchanger, TokenExchanger};

/// Identifies one cached delegated credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    subject_id: String,
    tenant_id: String,
    resource: String,
}

impl CacheKey {
    fn for_request(ctx: &SecurityContext, resource: &str) -> Self {
        Self {
            subject_id: ctx.subject_id().to_owned(),
            tenant_id: ctx.tenant_id().to_owned(),
            resource: resource.to_owned(),
        }
    }
}

/// A delegated credential handed to callers.
///
/// Carries only what a downstream call needs; the broker keeps the
/// bookkeeping ([`CachedCredential`]) to itself.
#[derive(Debug, Clone)]
pub struct DelegatedToken {
    token: SecretString,
    expires_at: OffsetDateTime,
}

impl DelegatedToken {
    /// The opaque token value, for the downstream `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }
}

/// Broker-private cache entry. Never leaves this module by value.
#[derive(Debug)]
struct CachedCredential {
    token: SecretString,
    #[allow(dead_code)] // kept for operational introspection/logging
    issued_at: OffsetDateTime,
    expires_at: OffsetDateTime,
}

impl CachedCredential {
    /// Fresh means the expiry is still further out than the safety
    /// margin; a credential inside the margin is treated as expired so
    /// it cannot lapse mid-flight.
    fn is_fresh(&self, margin: Duration, now: OffsetDateTime) -> bool {
        now + margin < self.expires_at
    }

    fn delegated(&self) -> DelegatedToken {
        DelegatedToken {
            token: self.token.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// Token acquisition failed. Not cached; the next acquire starts a
/// fresh exchange.
#[derive(Error, Debug, Clone)]
pub enum BrokerError {
    /// The security context carried no inbound credential to assert.
    #[error("no inbound credential available for on-behalf-of exchange")]
    MissingAssertion,

    /// The identity provider rejected the grant; retrying without a new
    /// inbound credential will not help.
    #[error("token exchange rejected with status {status}: {reason}")]
    ExchangeRejected { status: u16, reason: String },

    /// The identity provider was unreachable after the bounded retries.
    #[error("identity provider unreachable: {reason}")]
    Transport { reason: String },

    /// The shared exchange task was lost before producing a result.
    #[error("token exchange task failed")]
    TaskFailed,
}

/// Tuning knobs for the broker.
#[derive(Debug, Clone, Copy)]
pub struct BrokerSettings {
    /// Buffer subtracted from a credential's expiry before it counts
    /// as expired.
    pub safety_margin: Duration,
    /// Total exchange attempts per flight (first try + retries).
    /// Transport failures are retried up to this budget; grant
    /// rejections never are.
    pub max_attempts: u32,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            safety_margin: Duration::minutes(2),
            max_attempts: 2,
        }
    }
}

type FlightResult = Result<DelegatedToken, BrokerError>;
type Flight = Shared<BoxFuture<'static, FlightResult>>;

struct BrokerInner {
    cache: DashMap<CacheKey, CachedCredential>,
    inflight: DashMap<CacheKey, Flight>,
    exchanger: Arc<dyn TokenExchanger>,
    settings: BrokerSettings,
}

/// Process-wide broker for delegated downstream credentials.
///
/// Created once at startup and shared across all requests; cloning is
/// cheap and shares the cache.
#[derive(Clone)]
pub struct TokenBroker {
    inner: Arc<BrokerInner>,
}

impl TokenBroker {
    #[must_use]
    pub fn new(exchanger: Arc<dyn TokenExchanger>, settings: BrokerSettings) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                cache: DashMap::new(),
                inflight: DashMap::new(),
                exchanger,
                settings,
            }),
        }
    }

    /// Return a valid delegated credential for `resource`, exchanging
    /// the caller's inbound credential if the cache cannot serve it.
    ///
    /// Concurrent callers for the same `(subject, tenant, resource)`
    /// share one exchange. The exchange runs on its own task, so a
    /// caller that goes away (request cancelled, timeout) does not
    /// cancel it for the remaining waiters.
    ///
    /// # Errors
    ///
    /// [`BrokerError::MissingAssertion`] when the context has no bearer
    /// token; otherwise the shared exchange outcome, which every waiter
    /// of that flight observes identically.
    #[tracing::instrument(skip_all, fields(subject = %ctx.subject_id(), resource))]
    pub async fn acquire(
        &self,
        ctx: &SecurityContext,
        resource: &str,
    ) -> Result<DelegatedToken, BrokerError> {
        let key = CacheKey::for_request(ctx, resource);

        if let Some(fresh) = self.lookup_fresh(&key) {
            tracing::trace!("delegated credential served from cache");
            return Ok(fresh);
        }

        let assertion = ctx
            .bearer_token()
            .cloned()
            .ok_or(BrokerError::MissingAssertion)?;

        let flight = match self.inner.inflight.entry(key.clone()) {
            Entry::Occupied(occupied) => occupied.get().clone(),
            Entry::Vacant(vacant) => {
                // Double-check: another flight may have refreshed the
                // cache between our lookup and taking the entry lock.
                if let Some(fresh) = self.lookup_fresh(&key) {
                    return Ok(fresh);
                }
                let (tx, rx) = oneshot::channel::<FlightResult>();
                let flight: Flight = async move {
                    rx.await.unwrap_or_else(|_| Err(BrokerError::TaskFailed))
                }
                .boxed()
                .shared();
                vacant.insert(flight.clone());

                let inner = Arc::clone(&self.inner);
                let task_key = key;
                tokio::spawn(async move {
                    let result = inner.run_exchange(&task_key, &assertion).await;
                    // Remove before releasing waiters so a failed flight
                    // cannot be joined after its outcome is known; the
                    // next acquire starts a fresh exchange.
                    inner.inflight.remove(&task_key);
                    if tx.send(result).is_err() {
                        tracing::debug!("all waiters dropped before the exchange completed");
                    }
                });
                flight
            }
        };

        flight.await
    }

    fn lookup_fresh(&self, key: &CacheKey) -> Option<DelegatedToken> {
        let entry = self.inner.cache.get(key)?;
        entry
            .is_fresh(self.inner.settings.safety_margin, OffsetDateTime::now_utc())
            .then(|| entry.delegated())
    }
}

impl BrokerInner {
    async fn run_exchange(
        &self,
        key: &CacheKey,
        assertion: &SecretString,
    ) -> Result<DelegatedToken, BrokerError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.exchanger.exchange(assertion, &key.resource).await {
                Ok(exchanged) => {
                    let now = OffsetDateTime::now_utc();
                    let credential = CachedCredential {
                        token: exchanged.access_token,
                        issued_at: now,
                        expires_at: now + exchanged.expires_in,
                    };
                    let token = credential.delegated();
                    self.cache.insert(key.clone(), credential);
                    tracing::debug!(resource = %key.resource, "delegated credential refreshed");
                    return Ok(token);
                }
                Err(ExchangeError::Transport(reason)) if attempt < self.settings.max_attempts => {
                    tracing::warn!(
                        attempt,
                        "token exchange transport failure, retrying: {reason}"
                    );
                }
                Err(ExchangeError::Transport(reason)) => {
                    tracing::error!("token exchange failed after {attempt} attempts: {reason}");
                    return Err(BrokerError::Transport { reason });
                }
                Err(ExchangeError::Rejected { status, reason }) => {
                    tracing::warn!(status, "token exchange rejected: {reason}");
                    return Err(BrokerError::ExchangeRejected { status, reason });
                }
            }
        }
    }
}
