//! XML signature dialects.
//!
//! Legacy and current profiles name the same concepts differently. The
//! dialect is resolved once from the declared namespace and then answers
//! every name lookup for that signature.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ValidationError;

pub const XMLDSIG_NAMESPACE: &str = "http://www.w3.org/2000/09/xmldsig#";
pub const XADES_111_NAMESPACE: &str = "http://uri.etsi.org/01903/v1.1.1#";
pub const XADES_122_NAMESPACE: &str = "http://uri.etsi.org/01903/v1.2.2#";
pub const XADES_132_NAMESPACE: &str = "http://uri.etsi.org/01903/v1.3.2#";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureDialect {
    XmlDsig,
    Xades111,
    Xades122,
    Xades132,
}

/// Attributes whose presence or spelling depends on the dialect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DialectAttribute {
    Algorithm,
    Encoding,
    Id,
    MimeType,
    Target,
    Type,
    /// URI of a referenced object.
    Uri,
    /// URI inside revocation references (`CRLIdentifier`, `OCSPIdentifier`).
    RevocationRefUri,
    ObjectReference,
    Qualifier,
}

impl SignatureDialect {
    pub const ALL: [SignatureDialect; 4] = [
        SignatureDialect::XmlDsig,
        SignatureDialect::Xades111,
        SignatureDialect::Xades122,
        SignatureDialect::Xades132,
    ];

    pub fn from_namespace(namespace: &str) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|d| d.namespace() == namespace)
            .ok_or_else(|| ValidationError::UnsupportedDialect(namespace.to_string()))
    }

    pub fn namespace(&self) -> &'static str {
        match self {
            Self::XmlDsig => XMLDSIG_NAMESPACE,
            Self::Xades111 => XADES_111_NAMESPACE,
            Self::Xades122 => XADES_122_NAMESPACE,
            Self::Xades132 => XADES_132_NAMESPACE,
        }
    }

    pub fn is_xades(&self) -> bool {
        !matches!(self, Self::XmlDsig)
    }

    /// Attribute name in this dialect, or `None` where the dialect has no such attribute.
    pub fn attribute(&self, attribute: DialectAttribute) -> Option<&'static str> {
        use DialectAttribute::*;
        let name = match (self, attribute) {
            (_, Id) => "Id",
            (_, Target) => "Target",
            (_, Uri) => "URI",
            (Self::XmlDsig, Algorithm) => "Algorithm",
            (Self::XmlDsig, Encoding) => "Encoding",
            (Self::XmlDsig, MimeType) => "MimeType",
            (Self::XmlDsig, Type) => "Type",
            (Self::XmlDsig, _) => return None,
            (Self::Xades111, RevocationRefUri) => "uri",
            (_, RevocationRefUri) => "URI",
            (_, ObjectReference) => "ObjectReference",
            (_, Qualifier) => "Qualifier",
            (_, Algorithm | Encoding | MimeType | Type) => return None,
        };
        Some(name)
    }

    /// Element carrying the signing-certificate reference, `None` for plain XMLDSig.
    pub fn signing_certificate_element(&self) -> Option<&'static str> {
        match self {
            Self::XmlDsig => None,
            Self::Xades111 | Self::Xades122 => Some("SigningCertificate"),
            Self::Xades132 => Some("SigningCertificateV2"),
        }
    }

    pub fn signing_time_element(&self) -> Option<&'static str> {
        self.is_xades().then_some("SigningTime")
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::XmlDsig => "XMLDSig",
            Self::Xades111 => "XAdES 1.1.1",
            Self::Xades122 => "XAdES 1.2.2",
            Self::Xades132 => "XAdES 1.3.2",
        }
    }
}

impl fmt::Display for SignatureDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
