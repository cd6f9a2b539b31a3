use std::{net::IpAddr, time::Duration};

use bon::Builder;
use const_oid::{ObjectIdentifier, db::rfc4519::CN};
use snafu::{ResultExt, Snafu};
use tracing::{debug, instrument};
use x509_cert::{
    builder::{Builder, CertificateBuilder, Profile},
    der::{
        Decode,
        asn1::{Ia5String, OctetString},
        referenced::OwnedToRef,
    },
    ext::pkix::{
        BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAltName, SubjectKeyIdentifier,
        name::GeneralName,
    },
    name::Name,
    serial_number::SerialNumber,
    spki::{EncodePublicKey, SubjectPublicKeyInfoOwned},
    time::Validity,
};

use crate::{CertificatePair, consts::SUBJECT_SUFFIX, keys::CertificateKeypair};

/// Defines all error variants which can occur when creating a certificate
#[derive(Debug, Snafu)]
pub enum CreateCertificateError {
    #[snafu(display("failed to parse validity"))]
    ParseValidity { source: x509_cert::der::Error },

    #[snafu(display("failed to parse \"{subject}\" as subject"))]
    ParseSubject {
        source: x509_cert::der::Error,
        subject: String,
    },

    #[snafu(display("failed to serialize public key as DER"))]
    SerializePublicKey { source: x509_cert::spki::Error },

    #[snafu(display("failed to decode SPKI from DER"))]
    DecodeSpkiFromDer { source: x509_cert::der::Error },

    #[snafu(display("failed to derive the subject key identifier"))]
    DeriveSubjectKeyIdentifier { source: x509_cert::der::Error },

    #[snafu(display("failed to create certificate builder"))]
    CreateCertificateBuilder { source: x509_cert::builder::Error },

    #[snafu(display("failed to add certificate extension"))]
    AddCertificateExtension { source: x509_cert::builder::Error },

    #[snafu(display(
        "failed to parse subject alternative DNS name \"{subject_alternative_dns_name}\" as a Ia5 string"
    ))]
    ParseSubjectAlternativeDnsName {
        subject_alternative_dns_name: String,
        source: x509_cert::der::Error,
    },

    #[snafu(display("failed to build certificate"))]
    BuildCertificate { source: x509_cert::builder::Error },
}

/// This builder builds self-signed certificates of type [`CertificatePair`].
///
/// Issuer and subject are identical and the certificate is signed by the
/// private half of `key_pair`. Every certificate is marked as a CA, so that it
/// is allowed to sign its own revocation list.
///
/// This builder has a few default values, notably;
///
/// - A randomly generated serial number
/// - A subject key identifier derived from the SHA-1 hash of the public key,
///   unless an explicit `subject_key_identifier` is provided
///
/// ```no_run
/// use std::time::Duration;
///
/// use reseed_certs::{
///     cert_builder::SelfSignedCertificateBuilder,
///     keys::{CertificateKeypair, ecdsa},
/// };
/// use x509_cert::ext::pkix::{KeyUsage, KeyUsages};
///
/// let certificate = SelfSignedCertificateBuilder::builder()
///     .common_name("reseed.example.org")
///     .subject_alternative_dns_names(&["reseed.example.org"])
///     .validity(Duration::from_secs(3600))
///     .key_usage(KeyUsage(KeyUsages::DigitalSignature.into()))
///     .key_pair(ecdsa::SigningKey::new().unwrap())
///     .build()
///     .expect("failed to build certificate");
/// ```
#[derive(Builder)]
#[builder(start_fn = start_builder, finish_fn = finish_builder)]
pub struct SelfSignedCertificateBuilder<'a, KP>
where
    KP: CertificateKeypair,
{
    /// The common name of the subject. The remaining subject attributes are
    /// fixed, see [`SUBJECT_SUFFIX`].
    common_name: &'a str,

    /// Optional list of subject alternative name DNS entries
    /// that are added to the certificate.
    #[builder(default)]
    subject_alternative_dns_names: &'a [&'a str],

    /// Optional list of subject alternative name IP address entries
    /// that are added to the certificate.
    #[builder(default)]
    subject_alternative_ip_addresses: &'a [IpAddr],

    /// Validity/lifetime of the certificate, starting now.
    validity: Duration,

    key_usage: KeyUsage,

    #[builder(default)]
    extended_key_usage: &'a [ObjectIdentifier],

    /// Raw subject key identifier. Derived from the public key if not set.
    subject_key_identifier: Option<&'a [u8]>,

    /// Cryptographic keypair which is bound to and signs the certificate.
    key_pair: KP,
}

impl<'a, KP> SelfSignedCertificateBuilder<'a, KP>
where
    KP: CertificateKeypair,
{
    /// Use this function in combination with the generated builder methods.
    pub fn builder() -> SelfSignedCertificateBuilderBuilder<'a, KP> {
        Self::start_builder()
    }
}

impl<KP, S> SelfSignedCertificateBuilderBuilder<'_, KP, S>
where
    KP: CertificateKeypair,
    S: self_signed_certificate_builder_builder::IsComplete,
{
    /// Convenience function to avoid calling `builder().finish_builder().build()`
    pub fn build(self) -> Result<CertificatePair<KP>, CreateCertificateError> {
        self.finish_builder().build()
    }
}

impl<KP> SelfSignedCertificateBuilder<'_, KP>
where
    KP: CertificateKeypair,
{
    #[instrument(
        name = "build_self_signed_certificate",
        skip(self),
        fields(common_name = self.common_name),
    )]
    pub fn build(self) -> Result<CertificatePair<KP>, CreateCertificateError> {
        let validity = Validity::from_now(self.validity).context(ParseValiditySnafu)?;
        let subject_string = format_subject(self.common_name);
        let subject: Name = subject_string.parse().context(ParseSubjectSnafu {
            subject: subject_string.clone(),
        })?;

        // By choosing a random serial number we can make the reasonable assumption that we generate
        // a unique serial for each certificate.
        let serial_number = SerialNumber::from(rand::random::<u64>());

        let spki_der = self
            .key_pair
            .verifying_key()
            .to_public_key_der()
            .context(SerializePublicKeySnafu)?;
        let spki = SubjectPublicKeyInfoOwned::from_der(spki_der.as_bytes())
            .context(DecodeSpkiFromDerSnafu)?;

        let ski = match self.subject_key_identifier {
            Some(identifier) => OctetString::new(identifier)
                .map(SubjectKeyIdentifier)
                .context(DeriveSubjectKeyIdentifierSnafu)?,
            None => SubjectKeyIdentifier::try_from(spki.owned_to_ref())
                .context(DeriveSubjectKeyIdentifierSnafu)?,
        };

        debug!(
            certificate.subject = %subject,
            certificate.not_after = %validity.not_after,
            certificate.not_before = %validity.not_before,
            certificate.serial = %serial_number,
            certificate.san.dns_names = ?self.subject_alternative_dns_names,
            certificate.san.ip_addresses = ?self.subject_alternative_ip_addresses,
            certificate.public_key.algorithm = KP::algorithm_name(),
            certificate.public_key.size = KP::key_size(),
            "creating self-signed certificate"
        );
        let signing_key = self.key_pair.signing_key();

        // The manual profile adds no extensions on its own and uses the
        // subject as issuer.
        let mut builder = CertificateBuilder::new(
            Profile::Manual { issuer: None },
            serial_number,
            validity,
            subject,
            spki,
            signing_key,
        )
        .context(CreateCertificateBuilderSnafu)?;

        builder
            .add_extension(&BasicConstraints {
                ca: true,
                path_len_constraint: None,
            })
            .context(AddCertificateExtensionSnafu)?;
        builder
            .add_extension(&self.key_usage)
            .context(AddCertificateExtensionSnafu)?;
        builder
            .add_extension(&ski)
            .context(AddCertificateExtensionSnafu)?;

        if !self.extended_key_usage.is_empty() {
            builder
                .add_extension(&ExtendedKeyUsage(self.extended_key_usage.to_vec()))
                .context(AddCertificateExtensionSnafu)?;
        }

        let san_dns = self.subject_alternative_dns_names.iter().map(|dns_name| {
            Ok(GeneralName::DnsName(
                Ia5String::new(dns_name).with_context(|_| ParseSubjectAlternativeDnsNameSnafu {
                    subject_alternative_dns_name: dns_name.to_string(),
                })?,
            ))
        });
        let san_ips = self
            .subject_alternative_ip_addresses
            .iter()
            .copied()
            .map(GeneralName::from)
            .map(Result::Ok);
        let sans = san_dns
            .chain(san_ips)
            .collect::<Result<Vec<_>, CreateCertificateError>>()?;

        if !sans.is_empty() {
            builder
                .add_extension(&SubjectAltName(sans))
                .context(AddCertificateExtensionSnafu)?;
        }

        let certificate = builder.build().context(BuildCertificateSnafu)?;

        Ok(CertificatePair {
            certificate,
            key_pair: self.key_pair,
        })
    }
}

/// Formats the RFC 4514 subject of an identity certificate.
fn format_subject(common_name: &str) -> String {
    format!("CN={},{SUBJECT_SUFFIX}", escape_attribute_value(common_name))
}

/// Escapes an attribute value as required by RFC 4514, section 2.4.
fn escape_attribute_value(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut escaped = String::with_capacity(value.len());

    for (index, char) in value.chars().enumerate() {
        let needs_escape = matches!(char, '"' | '+' | ',' | ';' | '<' | '>' | '\\')
            || (index == 0 && matches!(char, '#' | ' '))
            || (index == last && char == ' ');

        if needs_escape {
            escaped.push('\\');
        }
        escaped.push(char);
    }

    escaped
}

/// Returns the first common name of `name`, if any.
pub fn common_name(name: &Name) -> Option<String> {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .find(|attribute| attribute.oid == CN)
        .and_then(|attribute| std::str::from_utf8(attribute.value.value()).ok())
        .map(str::to_owned)
}
