//! Contains primitives to create private keys, which are used to sign the
//! self-signed identity certificates and their revocation lists.
//!
//! This module currently provides the following algorithms:
//!
//! ## RSA
//!
//! Signing identities use 4096 bit RSA keys, provided by the [`rsa`] crate.
//! Keys are persisted as PKCS#1 (`RSA PRIVATE KEY`).
//!
//! ```no_run
//! use reseed_certs::keys::{rsa::SigningKey, CertificateKeypair};
//! let key = SigningKey::new().unwrap();
//! ```
//!
//! It should be noted, that the crate is currently vulnerable to the recently
//! discovered Marvin attack. See:
//!
//! - <https://people.redhat.com/~hkario/marvin/>
//! - <https://rustsec.org/advisories/RUSTSEC-2023-0071.html>
//! - <https://github.com/RustCrypto/RSA/issues/19>
//!
//! ## ECDSA
//!
//! TLS identities use ECDSA keys on the NIST P-384 curve, provided by
//! [`ecdsa`] and [`p384`]. Keys are persisted as SEC1 (`EC PRIVATE KEY`),
//! preceded by an explicit `EC PARAMETERS` block naming the curve.
//!
//! ```no_run
//! use reseed_certs::keys::{ecdsa::SigningKey, CertificateKeypair};
//! let key = SigningKey::new().unwrap();
//! ```
use std::fmt::Debug;

use rand_core::CryptoRngCore;
use signature::{Keypair, Signer};
use x509_cert::spki::{EncodePublicKey, SignatureAlgorithmIdentifier, SignatureBitStringEncoding};
use zeroize::Zeroizing;

use crate::pem::PemBlock;

pub mod ecdsa;
pub mod rsa;

pub trait CertificateKeypair
where
    Self: Debug + Sized,
{
    type SigningKey: SignatureAlgorithmIdentifier
        + Keypair<VerifyingKey = Self::VerifyingKey>
        + Signer<Self::Signature>;
    type Signature: SignatureBitStringEncoding;
    type VerifyingKey: EncodePublicKey;

    type Error: std::error::Error + 'static;

    /// The PEM label of the persisted private key block.
    const PRIVATE_KEY_LABEL: &'static str;

    /// Generates a new key with the default random-number generator [`rand_core::OsRng`].
    fn new() -> Result<Self, Self::Error>;

    /// Generates a new key with a custom random-number generator.
    fn new_with_rng<Rng>(rng: &mut Rng) -> Result<Self, Self::Error>
    where
        Rng: CryptoRngCore + ?Sized;

    /// Returns the signing (private) key half of the keypair.
    fn signing_key(&self) -> &Self::SigningKey;

    /// Returns the verifying (public) half of the keypair.
    fn verifying_key(&self) -> Self::VerifyingKey;

    /// Serializes the private key in the algorithm specific DER encoding
    /// labelled by [`Self::PRIVATE_KEY_LABEL`].
    fn to_private_key_der(&self) -> Result<Zeroizing<Vec<u8>>, Self::Error>;

    /// Creates a signing key pair from the algorithm specific DER encoding.
    fn from_private_key_der(input: &[u8]) -> Result<Self, Self::Error>;

    /// Blocks which must precede the private key block in a key artifact.
    ///
    /// Algorithms which are unambiguous without additional parameters return
    /// an empty list.
    fn parameter_blocks() -> Result<Vec<PemBlock>, Self::Error> {
        Ok(Vec::new())
    }

    /// The name of the algorithm such as `rsa` or `ecdsa`.
    fn algorithm_name() -> &'static str;

    /// The key length in bits
    fn key_size() -> usize;
}
