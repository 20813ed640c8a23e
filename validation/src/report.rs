//! Report DTOs handed to the reporting layer.

use serde::Serialize;

use eutl_types::{Fingerprint, Indication, SubIndication, Timestamp};

use crate::{SignatureDialect, SignatureIdentifier};

/// Verdict plus the ordered messages that explain it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Conclusion {
    pub indication: Indication,
    pub sub_indication: Option<SubIndication>,
    pub infos: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Conclusion {
    pub fn passed() -> Self {
        Self::with(Indication::TotalPassed, None)
    }

    pub fn failed(sub_indication: SubIndication) -> Self {
        Self::with(Indication::TotalFailed, Some(sub_indication))
    }

    pub fn indeterminate(sub_indication: SubIndication) -> Self {
        Self::with(Indication::Indeterminate, Some(sub_indication))
    }

    fn with(indication: Indication, sub_indication: Option<SubIndication>) -> Self {
        Self {
            indication,
            sub_indication,
            infos: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn is_passed(&self) -> bool {
        self.indication.is_passed()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.infos.push(message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Replace the verdict, keeping the messages gathered so far.
    pub fn set_verdict(&mut self, indication: Indication, sub_indication: Option<SubIndication>) {
        self.indication = indication;
        self.sub_indication = sub_indication;
    }

    /// Append `other`'s messages after this conclusion's own.
    pub fn absorb_messages(&mut self, other: Conclusion) {
        self.infos.extend(other.infos);
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SignatureReport {
    pub id: SignatureIdentifier,
    pub dialect: SignatureDialect,
    pub signing_certificate: Fingerprint,
    pub signed_by: String,
    pub signing_time: Timestamp,
    pub conclusion: Conclusion,
}

#[derive(Clone, Debug, Serialize)]
pub struct SimpleReport {
    pub document_name: String,
    pub validation_time: Timestamp,
    pub signatures: Vec<SignatureReport>,
}

impl SimpleReport {
    pub fn signature_id_list(&self) -> Vec<SignatureIdentifier> {
        self.signatures.iter().map(|s| s.id).collect()
    }

    pub fn first_signature_id(&self) -> Option<SignatureIdentifier> {
        self.signatures.first().map(|s| s.id)
    }

    pub fn signature(&self, id: &SignatureIdentifier) -> Option<&SignatureReport> {
        self.signatures.iter().find(|s| &s.id == id)
    }

    pub fn indication(&self, id: &SignatureIdentifier) -> Option<Indication> {
        self.signature(id).map(|s| s.conclusion.indication)
    }

    pub fn signatures_count(&self) -> usize {
        self.signatures.len()
    }

    pub fn valid_signatures_count(&self) -> usize {
        self.signatures
            .iter()
            .filter(|s| s.conclusion.is_passed())
            .count()
    }
}
