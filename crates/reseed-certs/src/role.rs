//! Role descriptors parameterizing the issuance pipeline.
//!
//! A role fixes the key algorithm, the certificate extension policy and the
//! wording used when talking to the operator. The pipeline in
//! [`crate::issuer`] is the same for every role.
use std::{net::IpAddr, time::Duration};

use const_oid::{
    ObjectIdentifier,
    db::rfc5280::{ID_KP_CLIENT_AUTH, ID_KP_SERVER_AUTH},
};
use x509_cert::ext::pkix::{KeyUsage, KeyUsages};

use crate::{
    consts::{SIGNING_CERTIFICATE_VALIDITY, TLS_CERTIFICATE_VALIDITY},
    keys::{CertificateKeypair, ecdsa, rsa},
};

/// Where the subject key identifier of a certificate comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubjectKeyIdSource {
    /// The raw bytes of the identity name.
    Identity,

    /// The SHA-1 hash of the subject public key (RFC 5280, section 4.2.1.2).
    PublicKeyHash,
}

/// The certificate extension policy of a role.
#[derive(Clone, Debug)]
pub struct CertificatePolicy {
    pub validity: Duration,
    pub key_usage: KeyUsage,
    pub extended_key_usage: Vec<ObjectIdentifier>,
    pub subject_key_id: SubjectKeyIdSource,

    /// Whether the identity is published as subject alternative names.
    pub subject_alternative_names: bool,
}

/// Subject alternative names split into DNS names and IP addresses.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SubjectAlternativeNames<'a> {
    pub dns_names: Vec<&'a str>,
    pub ip_addresses: Vec<IpAddr>,
}

impl<'a> SubjectAlternativeNames<'a> {
    /// Splits a comma separated host list. Entries which parse as IP
    /// addresses become IP SANs, all other non-empty entries DNS SANs.
    pub fn from_hosts(hosts: &'a str) -> Self {
        let mut names = Self::default();

        for host in hosts.split(',').map(str::trim).filter(|host| !host.is_empty()) {
            match host.parse::<IpAddr>() {
                Ok(ip_address) => names.ip_addresses.push(ip_address),
                Err(_) => names.dns_names.push(host),
            }
        }

        names
    }
}

pub trait IdentityRole {
    type Keypair: CertificateKeypair;

    /// Prefix of the operator-facing messages, e.g. `Signing` or `TLS`.
    const TITLE: &'static str;

    /// The role as used within a sentence, e.g. `signing` or `TLS`.
    const NOUN: &'static str;

    fn policy() -> CertificatePolicy;
}

/// The long-lived identity used to sign published content.
#[derive(Debug)]
pub struct SigningRole;

impl IdentityRole for SigningRole {
    type Keypair = rsa::SigningKey;

    const TITLE: &'static str = "Signing";
    const NOUN: &'static str = "signing";

    fn policy() -> CertificatePolicy {
        CertificatePolicy {
            validity: SIGNING_CERTIFICATE_VALIDITY,
            key_usage: KeyUsage(
                KeyUsages::DigitalSignature | KeyUsages::KeyCertSign | KeyUsages::CRLSign,
            ),
            extended_key_usage: vec![ID_KP_CLIENT_AUTH, ID_KP_SERVER_AUTH],
            subject_key_id: SubjectKeyIdSource::Identity,
            subject_alternative_names: false,
        }
    }
}

/// The host-bound identity used to authenticate a server's TLS endpoint.
#[derive(Debug)]
pub struct TlsRole;

impl IdentityRole for TlsRole {
    type Keypair = ecdsa::SigningKey;

    const TITLE: &'static str = "TLS";
    const NOUN: &'static str = "TLS";

    fn policy() -> CertificatePolicy {
        CertificatePolicy {
            validity: TLS_CERTIFICATE_VALIDITY,
            key_usage: KeyUsage(
                KeyUsages::DigitalSignature
                    | KeyUsages::KeyEncipherment
                    | KeyUsages::KeyCertSign
                    | KeyUsages::CRLSign,
            ),
            extended_key_usage: vec![ID_KP_SERVER_AUTH],
            subject_key_id: SubjectKeyIdSource::PublicKeyHash,
            subject_alternative_names: true,
        }
    }
}
