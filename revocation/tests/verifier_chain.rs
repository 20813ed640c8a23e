//! Revocation checks through the verifier chain with offline and nullable sources.

use std::sync::Arc;

use eutl_crypto::{issue_certificate, keypair_from_seed, self_signed_certificate};
use eutl_nullables::{NullClock, NullRevocationSource};
use eutl_revocation::{
    CachingRevocationSource, CertificateStatus, CrlEntry, CrlList, OcspResponse, OfflineCrlSource,
    OfflineOcspSource, RevocationKind, RevocationPolicy, RevocationReason, RevocationSource,
    RevocationVerifierChain, SingleResponse,
};
use eutl_types::{CertificateToken, KeyPair, TbsCertificate, Timestamp};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Pki {
    ca_keys: KeyPair,
    ca: CertificateToken,
    leaf: CertificateToken,
}

fn tbs(serial: u64, subject: &str, issuer: &str, keys: &KeyPair) -> TbsCertificate {
    TbsCertificate {
        serial_number: serial,
        subject: subject.to_string(),
        issuer: issuer.to_string(),
        public_key: keys.public.clone(),
        not_before: Timestamp::new(0),
        not_after: Timestamp::new(100_000),
        ca: serial == 1,
    }
}

fn pki() -> Pki {
    let ca_keys = keypair_from_seed(&[1; 32]);
    let leaf_keys = keypair_from_seed(&[2; 32]);
    let ca = self_signed_certificate(tbs(1, "CN=CA", "", &ca_keys), &ca_keys.private).unwrap();
    let leaf =
        issue_certificate(tbs(42, "CN=Leaf", "CN=CA", &leaf_keys), &ca_keys.private).unwrap();
    Pki { ca_keys, ca, leaf }
}

fn crl(pki: &Pki, this_update: u64, next_update: Option<u64>, entries: Vec<CrlEntry>) -> CrlList {
    CrlList::sign(
        "CN=CA",
        Timestamp::new(this_update),
        next_update.map(Timestamp::new),
        entries,
        pki.ca.clone(),
        &pki.ca_keys.private,
    )
    .unwrap()
}

fn ocsp(pki: &Pki, produced_at: u64, next_update: Option<u64>, archive_cutoff: Option<u64>) -> OcspResponse {
    let single = SingleResponse {
        serial_number: pki.leaf.serial_number(),
        issuer: pki.ca.fingerprint(),
        status: CertificateStatus::Good,
        this_update: Timestamp::new(produced_at),
        next_update: next_update.map(Timestamp::new),
        archive_cutoff: archive_cutoff.map(Timestamp::new),
        cert_hash: Some(pki.leaf.fingerprint()),
    };
    OcspResponse::sign(
        pki.ca.clone(),
        &pki.ca_keys.private,
        Timestamp::new(produced_at),
        vec![single],
    )
    .unwrap()
}

fn chain(policy: RevocationPolicy, now: u64) -> (Arc<NullClock>, RevocationVerifierChain) {
    let clock = Arc::new(NullClock::new(now));
    let chain = RevocationVerifierChain::new(policy, clock.clone()).unwrap();
    (clock, chain)
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn no_evidence_is_unknown() {
    let pki = pki();
    let (_, chain) = chain(RevocationPolicy::default(), 2_000);
    let chain = chain
        .with_source("crl", Arc::new(OfflineCrlSource::new(Vec::new())))
        .with_source("ocsp", Arc::new(OfflineOcspSource::new(Vec::new())));

    let outcome = chain.check(&pki.leaf, &pki.ca).await;

    assert!(outcome.is_unknown());
    assert!(!outcome.is_revoked());
}

#[tokio::test]
async fn crl_from_another_issuer_is_ignored() {
    let pki = pki();
    let other_keys = keypair_from_seed(&[7; 32]);
    let other = self_signed_certificate(tbs(1, "CN=Other CA", "", &other_keys), &other_keys.private)
        .unwrap();
    let foreign = CrlList::sign(
        "CN=Other CA",
        Timestamp::new(1_000),
        Some(Timestamp::new(5_000)),
        Vec::new(),
        other,
        &other_keys.private,
    )
    .unwrap();
    let (_, chain) = chain(RevocationPolicy::default(), 2_000);
    let chain = chain.with_source("crl", Arc::new(OfflineCrlSource::new(vec![foreign])));

    assert!(chain.check(&pki.leaf, &pki.ca).await.is_unknown());
}

#[tokio::test]
async fn revoked_entry_reports_reason() {
    let pki = pki();
    let entry = CrlEntry {
        serial_number: 42,
        revocation_date: Timestamp::new(1_500),
        reason: RevocationReason::KeyCompromise,
    };
    let list = crl(&pki, 1_800, Some(5_000), vec![entry]).with_url("http://crl.example/ca.crl");
    let (_, chain) = chain(RevocationPolicy::default(), 2_000);
    let chain = chain.with_source("crl", Arc::new(OfflineCrlSource::new(vec![list])));

    let outcome = chain.check(&pki.leaf, &pki.ca).await;

    assert!(outcome.is_revoked());
    let token = outcome.token().unwrap();
    assert_eq!(token.reason(), Some(RevocationReason::KeyCompromise));
    assert_eq!(token.related_certificate(), Some(pki.leaf.fingerprint()));
    assert_eq!(token.source_url(), Some("http://crl.example/ca.crl"));
    assert!(token.is_valid());
}

#[tokio::test]
async fn archived_response_without_next_update_is_accepted() {
    let pki = pki();
    // Far past the freshness window, but the responder keeps history back to 500.
    let response = ocsp(&pki, 1_000, None, Some(500));
    let policy = RevocationPolicy {
        max_freshness_secs: 60,
        ..Default::default()
    };
    let (_, chain) = chain(policy, 90_000);
    let chain = chain.with_source("ocsp", Arc::new(OfflineOcspSource::new(vec![response])));

    let outcome = chain.check(&pki.leaf, &pki.ca).await;

    assert!(!outcome.is_unknown());
    assert_eq!(outcome.token().unwrap().kind(), RevocationKind::Ocsp);
}

#[tokio::test]
async fn stale_evidence_without_next_update_is_not_accepted() {
    let pki = pki();
    let list = crl(&pki, 1_000, None, Vec::new());
    let policy = RevocationPolicy {
        max_freshness_secs: 60,
        ..Default::default()
    };
    let (clock, chain) = chain(policy, 1_030);
    let chain = chain.with_source("crl", Arc::new(OfflineCrlSource::new(vec![list])));

    assert!(!chain.check(&pki.leaf, &pki.ca).await.is_unknown());
    clock.advance(1_000);
    assert!(chain.check(&pki.leaf, &pki.ca).await.is_unknown());
}

// ---------------------------------------------------------------------------
// Ordering and resilience
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_source_does_not_abort_the_chain() {
    let pki = pki();
    let broken = Arc::new(NullRevocationSource::failing(RevocationKind::Crl, "connection refused"));
    let (_, chain) = chain(RevocationPolicy::default(), 2_000);
    let chain = chain
        .with_source("crl", broken.clone())
        .with_source(
            "ocsp",
            Arc::new(OfflineOcspSource::new(vec![ocsp(&pki, 1_900, Some(5_000), None)])),
        );

    let outcome = chain.check(&pki.leaf, &pki.ca).await;

    assert_eq!(broken.calls(), 1);
    assert_eq!(outcome.token().unwrap().kind(), RevocationKind::Ocsp);
}

#[tokio::test]
async fn first_accepted_kind_wins() {
    let pki = pki();
    let crls = Arc::new(OfflineCrlSource::new(vec![crl(&pki, 1_000, Some(5_000), Vec::new())]));
    let ocsp_probe = Arc::new(NullRevocationSource::empty(RevocationKind::Ocsp));
    let (_, chain) = chain(RevocationPolicy::default(), 2_000);
    let chain = chain
        .with_source("ocsp", ocsp_probe.clone())
        .with_source("crl", crls);

    let outcome = chain.check(&pki.leaf, &pki.ca).await;

    assert_eq!(outcome.token().unwrap().kind(), RevocationKind::Crl);
    assert_eq!(ocsp_probe.calls(), 0);
}

#[tokio::test]
async fn anchor_override_reorders_sources() {
    let pki = pki();
    let crl_probe = Arc::new(NullRevocationSource::empty(RevocationKind::Crl));
    let responses = OfflineOcspSource::new(vec![ocsp(&pki, 1_900, Some(5_000), None)]);
    let policy = RevocationPolicy::default().with_anchor_order(
        &pki.ca.fingerprint(),
        vec![RevocationKind::Ocsp, RevocationKind::Crl],
    );
    let (_, chain) = chain(policy, 2_000);
    let chain = chain
        .with_source("crl", crl_probe.clone())
        .with_source("ocsp", Arc::new(responses));

    let outcome = chain.check(&pki.leaf, &pki.ca).await;
    assert_eq!(outcome.token().unwrap().kind(), RevocationKind::Ocsp);
    assert_eq!(crl_probe.calls(), 0);

    // Without the anchor the default order applies.
    chain.check_under_anchor(&pki.leaf, &pki.ca, None).await;
    assert_eq!(crl_probe.calls(), 1);
}

#[tokio::test]
async fn caching_source_reuses_fresh_tokens() {
    let pki = pki();
    let token = crl(&pki, 1_000, Some(5_000), Vec::new())
        .token_for(&pki.leaf, &pki.ca)
        .unwrap()
        .unwrap();
    let clock = Arc::new(NullClock::new(2_000));
    let inner = Arc::new(NullRevocationSource::with_token(RevocationKind::Crl, token));
    let caching = CachingRevocationSource::new(inner.clone(), clock.clone(), 3_600);

    assert!(caching.get_revocation_token(&pki.leaf, &pki.ca).await.unwrap().is_some());
    assert!(caching.get_revocation_token(&pki.leaf, &pki.ca).await.unwrap().is_some());
    assert_eq!(inner.calls(), 1);
    assert_eq!(caching.cached(), 1);

    clock.advance(10_000);
    caching.get_revocation_token(&pki.leaf, &pki.ca).await.unwrap();
    assert_eq!(inner.calls(), 2);
    assert_eq!(caching.cached(), 0);
}

#[tokio::test]
async fn caching_source_keeps_only_accepted_tokens() {
    let pki = pki();
    let forger = keypair_from_seed(&[9; 32]);
    let forged = CrlList::sign(
        "CN=CA",
        Timestamp::new(1_000),
        Some(Timestamp::new(5_000)),
        Vec::new(),
        pki.ca.clone(),
        &forger.private,
    )
    .unwrap()
    .token_for(&pki.leaf, &pki.ca)
    .unwrap()
    .unwrap();
    let genuine = crl(&pki, 1_000, Some(5_000), Vec::new())
        .token_for(&pki.leaf, &pki.ca)
        .unwrap()
        .unwrap();
    let inner = Arc::new(NullRevocationSource::with_token(RevocationKind::Crl, forged));
    let (clock, chain) = chain(RevocationPolicy::default(), 2_000);
    let caching = CachingRevocationSource::new(inner.clone(), clock, 3_600);
    let chain = chain.with_source("crl", Arc::new(caching));

    assert!(chain.check(&pki.leaf, &pki.ca).await.is_unknown());

    inner.answer_with(genuine);
    let outcome = chain.check(&pki.leaf, &pki.ca).await;

    assert_eq!(inner.calls(), 2);
    assert_eq!(outcome.token().unwrap().status(), &CertificateStatus::Good);
}

#[tokio::test]
async fn unknown_status_falls_through_to_the_next_source() {
    let pki = pki();
    let mut response = ocsp(&pki, 1_900, Some(5_000), None);
    response.responses[0].status = CertificateStatus::Unknown;
    let response = OcspResponse::sign(
        pki.ca.clone(),
        &pki.ca_keys.private,
        Timestamp::new(1_900),
        response.responses,
    )
    .unwrap();
    let entry = CrlEntry {
        serial_number: 42,
        revocation_date: Timestamp::new(1_500),
        reason: RevocationReason::KeyCompromise,
    };
    let policy = RevocationPolicy {
        order: vec![RevocationKind::Ocsp, RevocationKind::Crl],
        ..Default::default()
    };
    let (_, chain) = chain(policy, 2_000);
    let chain = chain
        .with_source("ocsp", Arc::new(OfflineOcspSource::new(vec![response])))
        .with_source(
            "crl",
            Arc::new(OfflineCrlSource::new(vec![crl(&pki, 1_800, Some(5_000), vec![entry])])),
        );

    let outcome = chain.check(&pki.leaf, &pki.ca).await;

    assert!(outcome.is_revoked());
    assert_eq!(outcome.token().unwrap().kind(), RevocationKind::Crl);
}
