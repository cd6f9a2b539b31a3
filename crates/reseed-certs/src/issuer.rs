//! The issuance pipeline shared by all identity roles.
//!
//! Issuing an identity generates a fresh key pair, self-signs a certificate
//! according to the [`IdentityRole`], revokes that certificate in an initial
//! revocation list and persists the three artifacts named by
//! [`ArtifactPaths`]. Every artifact is encoded and validated before the first
//! file is written.
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use snafu::{ResultExt, Snafu, ensure};
use tracing::{info, instrument};
use x509_cert::{
    Certificate,
    crl::CertificateList,
    der::{Decode, Encode},
    serial_number::SerialNumber,
};
use zeroize::Zeroizing;

use crate::{
    CertificatePair, ErrorClass,
    cert_builder::{CreateCertificateError, SelfSignedCertificateBuilder, common_name},
    crl::{self, RevocationListBuilder},
    identity::ArtifactPaths,
    keys::{CertificateKeypair, ecdsa, rsa},
    operator::Operator,
    pem::{CERTIFICATE_LABEL, CRL_LABEL, PemBlock, PemBundle},
    role::{IdentityRole, SigningRole, SubjectAlternativeNames, SubjectKeyIdSource, TlsRole},
};

/// Mode of files containing private key material or revocation lists.
#[cfg(unix)]
const PRIVATE_FILE_MODE: u32 = 0o600;

/// The error returned when issuing an identity of role `R`.
pub type RoleIssueError<R> =
    IssueError<<<R as IdentityRole>::Keypair as CertificateKeypair>::Error>;

#[derive(Debug, Snafu)]
pub enum IssueError<E>
where
    E: std::error::Error + 'static,
{
    #[snafu(display("failed to generate the key pair"))]
    CreateKeyPair { source: E },

    #[snafu(display("failed to build the self-signed certificate"))]
    BuildCertificate { source: CreateCertificateError },

    #[snafu(display("failed to serialize the private key"))]
    SerializePrivateKey { source: E },

    #[snafu(display("failed to encode the key parameters"))]
    EncodeParameters { source: E },

    #[snafu(display("failed to encode the certificate as DER"))]
    EncodeCertificate { source: x509_cert::der::Error },

    #[snafu(display("failed to build the revocation list"))]
    BuildRevocationList { source: crl::Error },

    #[snafu(display("failed to encode the revocation list as DER"))]
    EncodeRevocationList { source: x509_cert::der::Error },

    #[snafu(display("failed to re-parse the freshly encoded certificate"))]
    ReparseCertificate { source: x509_cert::der::Error },

    #[snafu(display("re-parsed certificate does not carry the requested {field}"))]
    CertificateMismatch { field: &'static str },

    #[snafu(display("failed to re-parse the freshly encoded revocation list"))]
    ReparseRevocationList { source: x509_cert::der::Error },

    #[snafu(display(
        "re-parsed revocation list must revoke exactly the issued certificate, found {entries} entries"
    ))]
    RevocationListMismatch { entries: usize },

    #[snafu(display("failed to write {path:?}"))]
    WriteFile {
        source: std::io::Error,
        path: PathBuf,
    },
}

impl<E> IssueError<E>
where
    E: std::error::Error + 'static,
{
    pub fn class(&self) -> ErrorClass {
        match self {
            IssueError::CreateKeyPair { .. }
            | IssueError::BuildCertificate { .. }
            | IssueError::BuildRevocationList { .. } => ErrorClass::Generation,
            IssueError::SerializePrivateKey { .. }
            | IssueError::EncodeParameters { .. }
            | IssueError::EncodeCertificate { .. }
            | IssueError::EncodeRevocationList { .. } => ErrorClass::Encoding,
            IssueError::ReparseCertificate { .. }
            | IssueError::CertificateMismatch { .. }
            | IssueError::ReparseRevocationList { .. }
            | IssueError::RevocationListMismatch { .. } => ErrorClass::RoundTripValidation,
            IssueError::WriteFile { .. } => ErrorClass::Io,
        }
    }
}

/// Issues the signing identity of publisher `signer_id` into `directory`.
pub fn issue_signing_identity<O>(
    directory: &Path,
    signer_id: &str,
    operator: O,
) -> Result<ArtifactPaths, IssueError<rsa::Error>>
where
    O: Operator,
{
    issue::<SigningRole, _>(directory, signer_id, operator)
}

/// Issues the TLS identity of `host` into `directory`.
///
/// `host` may be a comma separated list, each entry is added as a subject
/// alternative name.
pub fn issue_tls_identity<O>(
    directory: &Path,
    host: &str,
    operator: O,
) -> Result<ArtifactPaths, IssueError<ecdsa::Error>>
where
    O: Operator,
{
    issue::<TlsRole, _>(directory, host, operator)
}

/// Issues a new identity of role `R`, overwriting existing artifacts of the
/// same name.
#[instrument(skip(directory, operator), fields(role = R::TITLE, directory = %directory.display()))]
pub fn issue<R, O>(
    directory: &Path,
    identity: &str,
    mut operator: O,
) -> Result<ArtifactPaths, RoleIssueError<R>>
where
    R: IdentityRole,
    O: Operator,
{
    operator.notify(&format!(
        "Generating {noun} keys. This may take a minute...",
        noun = R::NOUN
    ));

    let key_pair = R::Keypair::new().context(CreateKeyPairSnafu)?;
    let certificate_pair = self_sign::<R>(identity, key_pair)?;
    let certificate = certificate_pair.certificate();

    let certificate_der = certificate.to_der().context(EncodeCertificateSnafu)?;
    let serial_number = verify_certificate(&certificate_der, identity)?;

    let revocation_list = RevocationListBuilder::new(&certificate_pair)
        .revoke(serial_number.clone())
        .build()
        .context(BuildRevocationListSnafu)?;
    let revocation_list_der = revocation_list
        .to_der()
        .context(EncodeRevocationListSnafu)?;
    verify_revocation_list(&revocation_list_der, &serial_number)?;

    let certificate_block = PemBlock::new(CERTIFICATE_LABEL, certificate_der);
    let certificate_pem = certificate_block.to_pem();
    let key_pem = encode_key_artifact(certificate_pair.key_pair(), certificate_block)?;
    let revocation_list_pem = PemBlock::new(CRL_LABEL, revocation_list_der).to_pem();

    let paths = ArtifactPaths::for_identity(directory, identity);

    write_file(&paths.certificate, certificate_pem.as_bytes(), false)?;
    saved::<R>(&mut operator, "certificate", &paths.certificate);

    write_file(&paths.key, key_pem.as_bytes(), true)?;
    saved::<R>(&mut operator, "private key", &paths.key);

    write_file(&paths.revocation_list, revocation_list_pem.as_bytes(), true)?;
    saved::<R>(&mut operator, "CRL", &paths.revocation_list);

    Ok(paths)
}

fn self_sign<R>(
    identity: &str,
    key_pair: R::Keypair,
) -> Result<CertificatePair<R::Keypair>, RoleIssueError<R>>
where
    R: IdentityRole,
{
    let policy = R::policy();

    let subject_alternative_names = if policy.subject_alternative_names {
        SubjectAlternativeNames::from_hosts(identity)
    } else {
        SubjectAlternativeNames::default()
    };
    let subject_key_identifier = match policy.subject_key_id {
        SubjectKeyIdSource::Identity => Some(identity.as_bytes()),
        SubjectKeyIdSource::PublicKeyHash => None,
    };

    SelfSignedCertificateBuilder::builder()
        .common_name(identity)
        .subject_alternative_dns_names(&subject_alternative_names.dns_names)
        .subject_alternative_ip_addresses(&subject_alternative_names.ip_addresses)
        .validity(policy.validity)
        .key_usage(policy.key_usage)
        .extended_key_usage(&policy.extended_key_usage)
        .maybe_subject_key_identifier(subject_key_identifier)
        .key_pair(key_pair)
        .build()
        .context(BuildCertificateSnafu)
}

/// Re-parses `der` and returns its serial number after checking that it is
/// bound to `identity`.
fn verify_certificate<E>(der: &[u8], identity: &str) -> Result<SerialNumber, IssueError<E>>
where
    E: std::error::Error + 'static,
{
    let certificate = Certificate::from_der(der).context(ReparseCertificateSnafu)?;
    let tbs = certificate.tbs_certificate;

    ensure!(
        common_name(&tbs.subject).as_deref() == Some(identity),
        CertificateMismatchSnafu {
            field: "subject common name"
        }
    );
    ensure!(
        tbs.issuer == tbs.subject,
        CertificateMismatchSnafu { field: "issuer" }
    );

    Ok(tbs.serial_number)
}

fn verify_revocation_list<E>(der: &[u8], serial_number: &SerialNumber) -> Result<(), IssueError<E>>
where
    E: std::error::Error + 'static,
{
    let revocation_list = CertificateList::from_der(der).context(ReparseRevocationListSnafu)?;
    let revoked = revocation_list
        .tbs_cert_list
        .revoked_certificates
        .unwrap_or_default();

    ensure!(
        revoked.len() == 1 && revoked[0].serial_number == *serial_number,
        RevocationListMismatchSnafu {
            entries: revoked.len()
        }
    );

    Ok(())
}

/// Encodes the key artifact: parameter blocks, the private key and a copy of
/// the certificate, in this order.
fn encode_key_artifact<K>(
    key_pair: &K,
    certificate_block: PemBlock,
) -> Result<Zeroizing<String>, IssueError<K::Error>>
where
    K: CertificateKeypair,
{
    let private_key_der = key_pair
        .to_private_key_der()
        .context(SerializePrivateKeySnafu)?;

    let mut bundle = K::parameter_blocks()
        .context(EncodeParametersSnafu)?
        .into_iter()
        .collect::<PemBundle>();
    bundle
        .push(PemBlock::new(K::PRIVATE_KEY_LABEL, private_key_der.as_slice()))
        .push(certificate_block);

    Ok(Zeroizing::new(bundle.to_pem()))
}

fn write_file<E>(path: &Path, contents: &[u8], private: bool) -> Result<(), IssueError<E>>
where
    E: std::error::Error + 'static,
{
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    if private {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(PRIVATE_FILE_MODE);
    }

    let mut file = options.open(path).context(WriteFileSnafu { path })?;
    file.write_all(contents).context(WriteFileSnafu { path })?;

    // The creation mode does not apply to files which already existed.
    #[cfg(unix)]
    if private {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(PRIVATE_FILE_MODE))
            .context(WriteFileSnafu { path })?;
    }
    #[cfg(not(unix))]
    let _ = private;

    Ok(())
}

fn saved<R>(operator: &mut impl Operator, artifact: &str, path: &Path)
where
    R: IdentityRole,
{
    info!(role = R::TITLE, artifact, path = %path.display(), "artifact written");
    operator.notify(&format!(
        "\t{title} {artifact} saved to: {path}",
        title = R::TITLE,
        path = path.display()
    ));
}
