//! Naming of identities and their on-disk artifacts.
use std::path::{Path, PathBuf};

/// Replacement for `@` in file stems.
pub const AT_REPLACEMENT: &str = "_at_";

pub const KEY_EXTENSION: &str = "pem";
pub const CERTIFICATE_EXTENSION: &str = "crt";
pub const REVOCATION_LIST_EXTENSION: &str = "crl";

/// Derives the filesystem-safe stem of an identity, e.g.
/// `alice@example.com` becomes `alice_at_example.com`.
///
/// The result never contains `@`, so applying it twice yields the same stem.
pub fn file_stem(identity: &str) -> String {
    identity.replace('@', AT_REPLACEMENT)
}

/// The three files persisted for an identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Private key material followed by the certificate.
    pub key: PathBuf,

    /// The self-signed certificate.
    pub certificate: PathBuf,

    /// The revocation list issued alongside the certificate.
    pub revocation_list: PathBuf,
}

impl ArtifactPaths {
    pub fn for_identity(directory: impl AsRef<Path>, identity: &str) -> Self {
        // Path::with_extension would eat the last label of a host name.
        let stem = file_stem(identity);
        let path = |extension: &str| directory.as_ref().join(format!("{stem}.{extension}"));

        Self {
            key: path(KEY_EXTENSION),
            certificate: path(CERTIFICATE_EXTENSION),
            revocation_list: path(REVOCATION_LIST_EXTENSION),
        }
    }
}
