//! Issuance of revocation lists signed by an identity's own key.
use std::time::SystemTime;

use const_oid::db::rfc5280::ID_CE_SUBJECT_KEY_IDENTIFIER;
use signature::Signer;
use snafu::{ResultExt, Snafu};
use tracing::{debug, instrument};
use x509_cert::{
    Certificate,
    certificate::Version,
    crl::{CertificateList, RevokedCert, TbsCertList},
    der::{Decode, Encode},
    ext::{
        AsExtension,
        pkix::{AuthorityKeyIdentifier, SubjectKeyIdentifier},
    },
    serial_number::SerialNumber,
    spki::{DynSignatureAlgorithmIdentifier, SignatureBitStringEncoding},
    time::Time,
};

use crate::{CertificatePair, keys::CertificateKeypair};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to convert the current time into an X.509 time"))]
    ConvertTime { source: x509_cert::der::Error },

    #[snafu(display("failed to determine the signature algorithm"))]
    SignatureAlgorithm { source: x509_cert::spki::Error },

    #[snafu(display("failed to decode the subject key identifier of the issuer"))]
    DecodeSubjectKeyIdentifier { source: x509_cert::der::Error },

    #[snafu(display("failed to encode the authority key identifier extension"))]
    EncodeAuthorityKeyIdentifier { source: x509_cert::der::Error },

    #[snafu(display("failed to encode the TBS revocation list as DER"))]
    EncodeTbsRevocationList { source: x509_cert::der::Error },

    #[snafu(display("failed to sign the revocation list"))]
    SignRevocationList { source: signature::Error },

    #[snafu(display("failed to encode the revocation list signature"))]
    EncodeSignature { source: x509_cert::der::Error },
}

/// Builds a version 2 revocation list issued and signed by a
/// [`CertificatePair`].
///
/// `thisUpdate`, `nextUpdate` and the revocation date of every entry are set
/// to the instant [`Self::build`] is called. When the issuer certificate carries a subject key
/// identifier, it is referenced by an authority key identifier extension.
pub struct RevocationListBuilder<'a, KP>
where
    KP: CertificateKeypair,
{
    issuer: &'a CertificatePair<KP>,
    revoked: Vec<SerialNumber>,
}

impl<'a, KP> RevocationListBuilder<'a, KP>
where
    KP: CertificateKeypair,
{
    pub fn new(issuer: &'a CertificatePair<KP>) -> Self {
        Self {
            issuer,
            revoked: Vec::new(),
        }
    }

    /// Adds the serial number of a revoked certificate.
    pub fn revoke(mut self, serial_number: SerialNumber) -> Self {
        self.revoked.push(serial_number);
        self
    }

    #[instrument(name = "build_revocation_list", skip(self))]
    pub fn build(self) -> Result<CertificateList, Error> {
        let now = Time::try_from(SystemTime::now()).context(ConvertTimeSnafu)?;
        let issuer_certificate = self.issuer.certificate();
        let issuer = issuer_certificate.tbs_certificate.subject.clone();
        let signing_key = self.issuer.key_pair().signing_key();

        let signature_algorithm =
            DynSignatureAlgorithmIdentifier::signature_algorithm_identifier(signing_key)
                .context(SignatureAlgorithmSnafu)?;

        let crl_extensions = match authority_key_identifier(issuer_certificate)? {
            Some(aki) => Some(vec![
                aki.to_extension(&issuer, &[])
                    .context(EncodeAuthorityKeyIdentifierSnafu)?,
            ]),
            None => None,
        };

        debug!(
            crl.issuer = %issuer,
            crl.this_update = %now,
            crl.revoked = self.revoked.len(),
            "creating revocation list"
        );
        let revoked_certificates = self
            .revoked
            .into_iter()
            .map(|serial_number| RevokedCert {
                serial_number,
                revocation_date: now,
                crl_entry_extensions: None,
            })
            .collect::<Vec<_>>();

        let tbs_cert_list = TbsCertList {
            version: Version::V2,
            signature: signature_algorithm.clone(),
            issuer,
            this_update: now,
            next_update: Some(now),
            revoked_certificates: (!revoked_certificates.is_empty())
                .then_some(revoked_certificates),
            crl_extensions,
        };

        let tbs_der = tbs_cert_list
            .to_der()
            .context(EncodeTbsRevocationListSnafu)?;
        let signature: KP::Signature = signing_key
            .try_sign(&tbs_der)
            .context(SignRevocationListSnafu)?;

        Ok(CertificateList {
            tbs_cert_list,
            signature_algorithm,
            signature: signature.to_bitstring().context(EncodeSignatureSnafu)?,
        })
    }
}

/// Derives the authority key identifier of revocation lists issued by
/// `certificate` from its subject key identifier extension.
fn authority_key_identifier(
    certificate: &Certificate,
) -> Result<Option<AuthorityKeyIdentifier>, Error> {
    let Some(extension) = certificate
        .tbs_certificate
        .extensions
        .iter()
        .flatten()
        .find(|extension| extension.extn_id == ID_CE_SUBJECT_KEY_IDENTIFIER)
    else {
        return Ok(None);
    };

    let ski = SubjectKeyIdentifier::from_der(extension.extn_value.as_bytes())
        .context(DecodeSubjectKeyIdentifierSnafu)?;

    Ok(Some(AuthorityKeyIdentifier {
        key_identifier: Some(ski.0),
        authority_cert_issuer: None,
        authority_cert_serial_number: None,
    }))
}
