//! This crate provisions the credentials of a reseed server: the long-lived
//! signing identity a publisher uses to certify content, and the host-bound
//! TLS identity a server uses to authenticate itself.
//!
//! For both identities the crate makes sure a private key, a self-signed
//! certificate and an accompanying revocation list exist on disk. Missing
//! material is only generated after the operator confirmed it, see
//! [`store::IdentityStore`].
//!
//! The crate is structured bottom-up:
//!
//! - [`keys`]: RSA and ECDSA key pairs with their on-disk encodings.
//! - [`pem`]: ordered multi-block PEM artifacts.
//! - [`cert_builder`] and [`crl`]: self-signed certificates and revocation
//!   lists.
//! - [`role`] and [`issuer`]: the issuance pipeline, parameterized by the
//!   role of the identity.
//! - [`operator`] and [`store`]: the load-or-create gate.
//!
//! ## References
//!
//! - <https://datatracker.ietf.org/doc/html/rfc5280>
//! - <https://datatracker.ietf.org/doc/html/rfc5480>
//! - <https://datatracker.ietf.org/doc/html/rfc7468>
use x509_cert::Certificate;

use crate::keys::CertificateKeypair;

pub mod cert_builder;
pub mod consts;
pub mod crl;
pub mod identity;
pub mod issuer;
pub mod keys;
pub mod operator;
pub mod pem;
pub mod role;
pub mod store;

/// Contains the certificate and the signing / embedded key pair.
///
/// All certificates issued by this crate are self-signed: the key pair is
/// bound to the certificate and signed it at the same time.
#[derive(Debug)]
pub struct CertificatePair<S>
where
    S: CertificateKeypair,
{
    certificate: Certificate,
    key_pair: S,
}

impl<S> CertificatePair<S>
where
    S: CertificateKeypair,
{
    /// Returns a reference to the [`Certificate`].
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Returns a reference to the (signing) key pair.
    pub fn key_pair(&self) -> &S {
        &self.key_pair
    }
}

/// Coarse classification of every error this crate can return.
///
/// Each module keeps its own detailed error enum; this allows callers to
/// decide how to react without matching on individual variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// No usable key material exists and the operator could not be asked.
    MissingInput,

    /// The operator refused to generate new key material.
    UserDeclined,

    /// Key, certificate or revocation list generation failed.
    Generation,

    /// Marshalling to DER or PEM failed.
    Encoding,

    /// A file could not be opened, read or written.
    Io,

    /// A freshly produced certificate or revocation list did not parse back
    /// into what was requested.
    RoundTripValidation,

    /// Existing key material could not be decoded.
    KeyDecode,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorClass::MissingInput => write!(f, "missing input"),
            ErrorClass::UserDeclined => write!(f, "declined by user"),
            ErrorClass::Generation => write!(f, "generation"),
            ErrorClass::Encoding => write!(f, "encoding"),
            ErrorClass::Io => write!(f, "I/O"),
            ErrorClass::RoundTripValidation => write!(f, "round-trip validation"),
            ErrorClass::KeyDecode => write!(f, "key decode"),
        }
    }
}
