//! Signature validation against a published trust store and revocation chain.

use std::collections::HashSet;
use std::sync::Arc;

use eutl_crypto::{issue_certificate, keypair_from_seed, self_signed_certificate};
use eutl_nullables::NullClock;
use eutl_revocation::{
    CertificateStatus, CrlEntry, CrlList, OcspResponse, OfflineCrlSource, OfflineOcspSource,
    RevocationPolicy, RevocationReason, RevocationVerifierChain, SingleResponse,
};
use eutl_tsl::{LotlSource, TrustSnapshotBuilder, TrustedListsCertificateSource};
use eutl_types::{
    CertificateToken, CommonCertificateSource, Indication, KeyPair, OtherTslPointer,
    ServiceStatus, SubIndication, TbsCertificate, Timestamp, TrustService, TrustServiceProvider,
};
use eutl_validation::{CertificateVerifier, DocumentValidator, SignatureDialect, SignedArtifact};

const NOW: u64 = 5_000;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Pki {
    ca_keys: KeyPair,
    ca: CertificateToken,
    signer_keys: KeyPair,
    signer: CertificateToken,
}

fn tbs(serial: u64, subject: &str, issuer: &str, keys: &KeyPair, not_after: u64) -> TbsCertificate {
    TbsCertificate {
        serial_number: serial,
        subject: subject.to_string(),
        issuer: issuer.to_string(),
        public_key: keys.public.clone(),
        not_before: Timestamp::new(0),
        not_after: Timestamp::new(not_after),
        ca: serial == 1,
    }
}

fn pki_with_signer_expiry(not_after: u64) -> Pki {
    let ca_keys = keypair_from_seed(&[1; 32]);
    let signer_keys = keypair_from_seed(&[2; 32]);
    let ca = self_signed_certificate(tbs(1, "CN=Qualified CA", "", &ca_keys, 100_000), &ca_keys.private)
        .unwrap();
    let signer = issue_certificate(
        tbs(77, "CN=Alice", "CN=Qualified CA", &signer_keys, not_after),
        &ca_keys.private,
    )
    .unwrap();
    Pki {
        ca_keys,
        ca,
        signer_keys,
        signer,
    }
}

fn pki() -> Pki {
    pki_with_signer_expiry(100_000)
}

fn trust_store(anchor: &CertificateToken, status: ServiceStatus) -> Arc<TrustedListsCertificateSource> {
    let lotl = LotlSource::new("https://lotl.example/eu.xml", CommonCertificateSource::new()).unwrap();
    let tl = lotl.child(&OtherTslPointer {
        location: "https://tl.example/be.xml".into(),
        territory: Some("BE".into()),
        mime_type: None,
        certificates: Vec::new(),
    });
    let provider = TrustServiceProvider {
        name: "Example QTSP".into(),
        trade_names: Vec::new(),
        territory: Some("BE".into()),
        services: vec![TrustService {
            name: "Qualified CA".into(),
            service_type: "CA/QC".into(),
            status,
            status_starting_time: Timestamp::new(1),
            certificates: vec![anchor.clone()],
            qualifiers: Vec::new(),
        }],
    };
    let mut builder = TrustSnapshotBuilder::new(Timestamp::new(NOW));
    builder.add_list(&tl, &[provider]);
    let store = Arc::new(TrustedListsCertificateSource::new());
    store.publish(builder.build());
    store
}

fn crl(pki: &Pki, entries: Vec<CrlEntry>) -> CrlList {
    CrlList::sign(
        "CN=Qualified CA",
        Timestamp::new(4_000),
        Some(Timestamp::new(9_000)),
        entries,
        pki.ca.clone(),
        &pki.ca_keys.private,
    )
    .unwrap()
}

fn validator(store: Arc<TrustedListsCertificateSource>, crls: Vec<CrlList>) -> DocumentValidator {
    let chain = RevocationVerifierChain::new(RevocationPolicy::default(), Arc::new(NullClock::new(NOW)))
        .unwrap()
        .with_source("crl", Arc::new(OfflineCrlSource::new(crls)));
    DocumentValidator::new(Arc::new(CertificateVerifier::new(store, Arc::new(chain))))
}

fn signed_once(pki: &Pki) -> SignedArtifact {
    let mut artifact = SignedArtifact::new("contract.xml", b"<contract>pay 10 EUR</contract>".to_vec());
    artifact.sign(
        SignatureDialect::Xades132,
        pki.signer.clone(),
        vec![pki.ca.clone()],
        &pki.signer_keys.private,
        Timestamp::new(4_500),
    );
    artifact
}

/// Copy of `artifact` with one byte replaced and every signature kept.
fn tampered(artifact: &SignedArtifact, position: usize, byte: u8) -> SignedArtifact {
    let mut value = serde_json::to_value(artifact).unwrap();
    value["content"][position] = serde_json::json!(byte);
    serde_json::from_value(value).unwrap()
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signing_twice_yields_distinct_identifiers() {
    let pki = pki();
    let validator = validator(trust_store(&pki.ca, ServiceStatus::Granted), vec![crl(&pki, Vec::new())]);

    let mut artifact = signed_once(&pki);
    let first = validator.validate(&artifact, Timestamp::new(NOW)).await;
    assert_eq!(first.signatures_count(), 1);

    // Same signer, same claimed time: only the covered bytes differ.
    artifact.sign(
        SignatureDialect::Xades132,
        pki.signer.clone(),
        vec![pki.ca.clone()],
        &pki.signer_keys.private,
        Timestamp::new(4_500),
    );
    let second = validator.validate(&artifact, Timestamp::new(NOW)).await;

    let ids: HashSet<_> = second.signature_id_list().into_iter().collect();
    assert_eq!(ids.len(), 2);
    assert_eq!(second.first_signature_id(), first.first_signature_id());
    assert_eq!(second.valid_signatures_count(), 2);
}

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn trusted_unrevoked_chain_passes() {
    let pki = pki();
    let validator = validator(trust_store(&pki.ca, ServiceStatus::Granted), vec![crl(&pki, Vec::new())]);

    let report = validator.validate(&signed_once(&pki), Timestamp::new(NOW)).await;

    let signature = &report.signatures[0];
    assert_eq!(signature.conclusion.indication, Indication::TotalPassed);
    assert_eq!(signature.signed_by, "CN=Alice");
    assert!(signature.conclusion.errors.is_empty());
    assert!(signature
        .conclusion
        .infos
        .iter()
        .any(|i| i.contains("CN=Qualified CA") && i.contains("CA/QC")));
}

#[tokio::test]
async fn revoked_signer_fails() {
    let pki = pki();
    let entry = CrlEntry {
        serial_number: 77,
        revocation_date: Timestamp::new(3_000),
        reason: RevocationReason::KeyCompromise,
    };
    let validator = validator(trust_store(&pki.ca, ServiceStatus::Granted), vec![crl(&pki, vec![entry])]);

    let report = validator.validate(&signed_once(&pki), Timestamp::new(NOW)).await;

    let conclusion = &report.signatures[0].conclusion;
    assert_eq!(conclusion.indication, Indication::TotalFailed);
    assert_eq!(conclusion.sub_indication, Some(SubIndication::Revoked));
    assert!(conclusion.errors[0].contains("keyCompromise"));
}

#[tokio::test]
async fn missing_revocation_data_is_try_later() {
    let pki = pki();
    let validator = validator(trust_store(&pki.ca, ServiceStatus::Granted), Vec::new());

    let report = validator.validate(&signed_once(&pki), Timestamp::new(NOW)).await;

    let conclusion = &report.signatures[0].conclusion;
    assert_eq!(conclusion.indication, Indication::Indeterminate);
    assert_eq!(conclusion.sub_indication, Some(SubIndication::TryLater));
    assert_eq!(conclusion.warnings.len(), 1);
}

#[tokio::test]
async fn unknown_responder_status_is_try_later() {
    let pki = pki();
    let response = OcspResponse::sign(
        pki.ca.clone(),
        &pki.ca_keys.private,
        Timestamp::new(4_000),
        vec![SingleResponse {
            serial_number: pki.signer.serial_number(),
            issuer: pki.ca.fingerprint(),
            status: CertificateStatus::Unknown,
            this_update: Timestamp::new(4_000),
            next_update: Some(Timestamp::new(9_000)),
            archive_cutoff: None,
            cert_hash: None,
        }],
    )
    .unwrap();
    let chain = RevocationVerifierChain::new(RevocationPolicy::default(), Arc::new(NullClock::new(NOW)))
        .unwrap()
        .with_source("ocsp", Arc::new(OfflineOcspSource::new(vec![response])));
    let verifier = CertificateVerifier::new(trust_store(&pki.ca, ServiceStatus::Granted), Arc::new(chain));

    let conclusion = verifier
        .verify_chain(&pki.signer, &[pki.ca.clone()], Timestamp::new(NOW))
        .await;

    assert_eq!(conclusion.indication, Indication::Indeterminate);
    assert_eq!(conclusion.sub_indication, Some(SubIndication::TryLater));
    assert!(conclusion.infos.iter().all(|info| !info.contains("not revoked")));
}

#[tokio::test]
async fn expired_signer_is_out_of_bounds() {
    let pki = pki_with_signer_expiry(4_800);
    let validator = validator(trust_store(&pki.ca, ServiceStatus::Granted), vec![crl(&pki, Vec::new())]);

    let report = validator.validate(&signed_once(&pki), Timestamp::new(NOW)).await;

    let conclusion = &report.signatures[0].conclusion;
    assert_eq!(conclusion.indication, Indication::Indeterminate);
    assert_eq!(conclusion.sub_indication, Some(SubIndication::OutOfBoundsNoPoe));
}

#[tokio::test]
async fn withdrawn_anchor_yields_no_chain() {
    let pki = pki();
    let validator = validator(trust_store(&pki.ca, ServiceStatus::Withdrawn), vec![crl(&pki, Vec::new())]);

    let report = validator.validate(&signed_once(&pki), Timestamp::new(NOW)).await;

    assert_eq!(
        report.signatures[0].conclusion.sub_indication,
        Some(SubIndication::NoCertificateChainFound)
    );
}

#[tokio::test]
async fn modified_content_is_a_hash_failure() {
    let pki = pki();
    let validator = validator(trust_store(&pki.ca, ServiceStatus::Granted), vec![crl(&pki, Vec::new())]);
    let artifact = tampered(&signed_once(&pki), 15, b'9');

    let report = validator.validate(&artifact, Timestamp::new(NOW)).await;

    let conclusion = &report.signatures[0].conclusion;
    assert_eq!(conclusion.indication, Indication::TotalFailed);
    assert_eq!(conclusion.sub_indication, Some(SubIndication::HashFailure));
}

#[tokio::test]
async fn facade_answers_trust_and_revocation_queries() {
    let pki = pki();
    let store = trust_store(&pki.ca, ServiceStatus::Granted);
    let chain = RevocationVerifierChain::new(RevocationPolicy::default(), Arc::new(NullClock::new(NOW)))
        .unwrap()
        .with_source("crl", Arc::new(OfflineCrlSource::new(vec![crl(&pki, Vec::new())])));
    let verifier = CertificateVerifier::new(store, Arc::new(chain));

    assert!(verifier.is_trusted(&pki.ca));
    assert!(!verifier.is_trusted(&pki.signer));
    let outcome = verifier.check_revocation(&pki.signer, &pki.ca).await;
    assert!(!outcome.is_unknown());
    assert!(!outcome.is_revoked());
}
