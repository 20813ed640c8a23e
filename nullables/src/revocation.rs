//! Nullable revocation source: a scripted answer and a call counter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use eutl_revocation::{RevocationError, RevocationKind, RevocationSource, RevocationToken};
use eutl_types::CertificateToken;

enum Answer {
    Nothing,
    Token(RevocationToken),
    Network(String),
}

pub struct NullRevocationSource {
    kind: RevocationKind,
    answer: Mutex<Answer>,
    calls: AtomicUsize,
}

impl NullRevocationSource {
    /// A source that never has anything.
    pub fn empty(kind: RevocationKind) -> Self {
        Self {
            kind,
            answer: Mutex::new(Answer::Nothing),
            calls: AtomicUsize::new(0),
        }
    }

    /// A source that always returns `token`.
    pub fn with_token(kind: RevocationKind, token: RevocationToken) -> Self {
        let source = Self::empty(kind);
        source.answer_with(token);
        source
    }

    /// A source whose every request fails with a network error.
    pub fn failing(kind: RevocationKind, message: &str) -> Self {
        let source = Self::empty(kind);
        *source.answer.lock().unwrap() = Answer::Network(message.to_string());
        source
    }

    /// Answer every later request with `token`.
    pub fn answer_with(&self, token: RevocationToken) {
        *self.answer.lock().unwrap() = Answer::Token(token);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RevocationSource for NullRevocationSource {
    fn kind(&self) -> RevocationKind {
        self.kind
    }

    async fn get_revocation_token(
        &self,
        _certificate: &CertificateToken,
        _issuer: &CertificateToken,
    ) -> Result<Option<RevocationToken>, RevocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &*self.answer.lock().unwrap() {
            Answer::Nothing => Ok(None),
            Answer::Token(token) => Ok(Some(token.clone())),
            Answer::Network(message) => Err(RevocationError::Network(message.clone())),
        }
    }
}
