//! Abstraction layer around the [`rsa`] crate. This module provides types
//! which abstract away the generation of RSA keys used for signing
//! identities.
use rand_core::{CryptoRngCore, OsRng};
use rsa::{
    RsaPrivateKey,
    pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey},
};
use sha2::Sha512;
use signature::Keypair;
use snafu::{ResultExt, Snafu};
use tracing::instrument;
use zeroize::Zeroizing;

use crate::{keys::CertificateKeypair, pem::RSA_PRIVATE_KEY_LABEL};

#[cfg(not(test))]
const KEY_SIZE: usize = 4096;

// PKCS#1 v1.5 with SHA-512 needs at least 94 bytes of modulus.
#[cfg(test)]
const KEY_SIZE: usize = 1024;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Snafu)]
pub enum Error {
    #[snafu(display("failed to create RSA key"))]
    CreateKey { source: rsa::Error },

    #[snafu(display("failed to serialize the signing (private) key as PKCS1 DER"))]
    SerializeSigningKey { source: rsa::pkcs1::Error },

    #[snafu(display("failed to deserialize the signing (private) key from PKCS1 DER"))]
    DeserializeSigningKey { source: rsa::pkcs1::Error },
}

#[derive(Debug)]
pub struct SigningKey(rsa::pkcs1v15::SigningKey<Sha512>);

impl SigningKey {
    fn private_key(&self) -> &RsaPrivateKey {
        self.0.as_ref()
    }
}

impl CertificateKeypair for SigningKey {
    type Error = Error;
    type Signature = rsa::pkcs1v15::Signature;
    type SigningKey = rsa::pkcs1v15::SigningKey<Sha512>;
    type VerifyingKey = rsa::pkcs1v15::VerifyingKey<Sha512>;

    const PRIVATE_KEY_LABEL: &'static str = RSA_PRIVATE_KEY_LABEL;

    /// Generates a new RSA key with the default random-number generator
    /// [`OsRng`].
    ///
    /// It should be noted that the generation of the key takes longer for
    /// larger key sizes. The generation of an RSA key with a key size of
    /// `4096` (which is used) can take up to multiple seconds.
    #[instrument(name = "create_rsa_signing_key")]
    fn new() -> Result<Self> {
        let mut csprng = OsRng;
        Self::new_with_rng(&mut csprng)
    }

    /// Generates a new RSA key with a custom random-number generator.
    #[instrument(name = "create_rsa_signing_key_custom_rng", skip_all)]
    fn new_with_rng<Rng>(rng: &mut Rng) -> Result<Self>
    where
        Rng: CryptoRngCore + ?Sized,
    {
        let private_key = RsaPrivateKey::new(rng, KEY_SIZE).context(CreateKeySnafu)?;
        Ok(Self(rsa::pkcs1v15::SigningKey::new(private_key)))
    }

    fn signing_key(&self) -> &Self::SigningKey {
        &self.0
    }

    fn verifying_key(&self) -> Self::VerifyingKey {
        self.0.verifying_key()
    }

    fn to_private_key_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        let document = self
            .private_key()
            .to_pkcs1_der()
            .context(SerializeSigningKeySnafu)?;

        Ok(Zeroizing::new(document.as_bytes().to_vec()))
    }

    #[instrument(name = "create_rsa_signing_key_from_pkcs1_der", skip_all)]
    fn from_private_key_der(input: &[u8]) -> Result<Self> {
        let private_key =
            RsaPrivateKey::from_pkcs1_der(input).context(DeserializeSigningKeySnafu)?;

        Ok(Self(rsa::pkcs1v15::SigningKey::new(private_key)))
    }

    fn algorithm_name() -> &'static str {
        "rsa"
    }

    fn key_size() -> usize {
        KEY_SIZE
    }
}
