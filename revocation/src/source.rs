//! Revocation evidence sources.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use eutl_types::{CertificateToken, Clock, Fingerprint};

use crate::{check_token, RevocationError, RevocationKind, RevocationToken, TokenValidity};

/// Produces revocation evidence for a certificate.
///
/// `Ok(None)` means the source has nothing for this certificate. Errors are
/// reported to the verifier chain, which downgrades them to "nothing".
#[async_trait]
pub trait RevocationSource: Send + Sync {
    fn kind(&self) -> RevocationKind;

    async fn get_revocation_token(
        &self,
        certificate: &CertificateToken,
        issuer: &CertificateToken,
    ) -> Result<Option<RevocationToken>, RevocationError>;
}

#[async_trait]
impl<S: RevocationSource + ?Sized> RevocationSource for Arc<S> {
    fn kind(&self) -> RevocationKind {
        (**self).kind()
    }

    async fn get_revocation_token(
        &self,
        certificate: &CertificateToken,
        issuer: &CertificateToken,
    ) -> Result<Option<RevocationToken>, RevocationError> {
        (**self).get_revocation_token(certificate, issuer).await
    }
}

/// Wraps a source and reuses its tokens while they are fresh.
///
/// Only tokens that pass [`check_token`] are kept. A kept token is reused
/// until its `next_update`, or for `max_freshness_secs` after `this_update`
/// when it has none.
pub struct CachingRevocationSource<S> {
    inner: S,
    clock: Arc<dyn Clock>,
    max_freshness_secs: u64,
    tokens: Mutex<HashMap<(Fingerprint, Fingerprint), RevocationToken>>,
}

impl<S: RevocationSource> CachingRevocationSource<S> {
    pub fn new(inner: S, clock: Arc<dyn Clock>, max_freshness_secs: u64) -> Self {
        Self {
            inner,
            clock,
            max_freshness_secs,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn cached(&self) -> usize {
        self.lock().len()
    }

    fn is_fresh(&self, token: &RevocationToken) -> bool {
        let now = self.clock.now();
        match token.next_update() {
            Some(next) => next >= now,
            None => !token
                .this_update()
                .has_expired(self.max_freshness_secs, now),
        }
    }

    fn lock(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<(Fingerprint, Fingerprint), RevocationToken>> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<S: RevocationSource> RevocationSource for CachingRevocationSource<S> {
    fn kind(&self) -> RevocationKind {
        self.inner.kind()
    }

    async fn get_revocation_token(
        &self,
        certificate: &CertificateToken,
        issuer: &CertificateToken,
    ) -> Result<Option<RevocationToken>, RevocationError> {
        let key = (certificate.fingerprint(), issuer.fingerprint());
        let cached = self.lock().get(&key).filter(|t| self.is_fresh(t)).map(RevocationToken::unbound);
        if let Some(mut token) = cached {
            token.bind_to(certificate)?;
            return Ok(Some(token));
        }

        let token = self.inner.get_revocation_token(certificate, issuer).await?;
        let now = self.clock.now();
        match &token {
            Some(t)
                if self.is_fresh(t)
                    && check_token(t, certificate, issuer, now, self.max_freshness_secs)
                        == TokenValidity::Valid =>
            {
                self.lock().insert(key, t.unbound());
            }
            _ => {
                self.lock().remove(&key);
            }
        }
        Ok(token)
    }
}
