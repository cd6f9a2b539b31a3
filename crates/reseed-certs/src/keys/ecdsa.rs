//! Abstraction layer around the [`ecdsa`] crate. This module provides types
//! which abstract away the generation of ECDSA keys on the NIST P-384 curve
//! used for TLS identities.
use const_oid::{AssociatedOid, ObjectIdentifier};
use p384::{NistP384, elliptic_curve::sec1::ToEncodedPoint};
use rand_core::{CryptoRngCore, OsRng};
use sec1::{EcParameters, EcPrivateKey};
use snafu::{ResultExt, Snafu};
use tracing::instrument;
use x509_cert::der::Encode;
use zeroize::Zeroizing;

use crate::{
    keys::CertificateKeypair,
    pem::{EC_PARAMETERS_LABEL, EC_PRIVATE_KEY_LABEL, PemBlock},
};

/// The named curve used by every TLS identity, `secp384r1` (1.3.132.0.34).
pub const CURVE_OID: ObjectIdentifier = NistP384::OID;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to serialize the ECDSA key as SEC1 DER"))]
    SerializeKey { source: x509_cert::der::Error },

    #[snafu(display("failed to deserialize the ECDSA key from SEC1 DER"))]
    DeserializeKey { source: p384::elliptic_curve::Error },

    #[snafu(display("failed to encode the curve parameters"))]
    EncodeParameters { source: x509_cert::der::Error },
}

#[derive(Debug)]
pub struct SigningKey(p384::ecdsa::SigningKey);

impl CertificateKeypair for SigningKey {
    type Error = Error;
    type Signature = ecdsa::der::Signature<NistP384>;
    type SigningKey = p384::ecdsa::SigningKey;
    type VerifyingKey = p384::ecdsa::VerifyingKey;

    const PRIVATE_KEY_LABEL: &'static str = EC_PRIVATE_KEY_LABEL;

    #[instrument(name = "create_ecdsa_signing_key")]
    fn new() -> Result<Self> {
        let mut csprng = OsRng;
        Self::new_with_rng(&mut csprng)
    }

    #[instrument(name = "create_ecdsa_signing_key_custom_rng", skip_all)]
    fn new_with_rng<Rng>(rng: &mut Rng) -> Result<Self>
    where
        Rng: CryptoRngCore + ?Sized,
    {
        let signing_key = p384::ecdsa::SigningKey::random(&mut &mut *rng);
        Ok(Self(signing_key))
    }

    fn signing_key(&self) -> &Self::SigningKey {
        &self.0
    }

    fn verifying_key(&self) -> Self::VerifyingKey {
        *self.0.verifying_key()
    }

    /// Serializes the key as SEC1 `ECPrivateKey` including the named curve,
    /// which strict parsers such as OpenSSL require.
    fn to_private_key_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        let secret_key = p384::SecretKey::from(&self.0);
        let private_key = Zeroizing::new(secret_key.to_bytes().to_vec());
        let public_key = secret_key.public_key().to_encoded_point(false);

        EcPrivateKey {
            private_key: &private_key,
            parameters: Some(EcParameters::NamedCurve(CURVE_OID)),
            public_key: Some(public_key.as_bytes()),
        }
        .to_der()
        .map(Zeroizing::new)
        .context(SerializeKeySnafu)
    }

    #[instrument(name = "create_ecdsa_signing_key_from_sec1_der", skip_all)]
    fn from_private_key_der(input: &[u8]) -> Result<Self> {
        let secret_key = p384::SecretKey::from_sec1_der(input).context(DeserializeKeySnafu)?;
        Ok(Self(p384::ecdsa::SigningKey::from(secret_key)))
    }

    fn parameter_blocks() -> Result<Vec<PemBlock>> {
        let der = CURVE_OID.to_der().context(EncodeParametersSnafu)?;
        Ok(vec![PemBlock::new(EC_PARAMETERS_LABEL, der)])
    }

    fn algorithm_name() -> &'static str {
        "ecdsa"
    }

    fn key_size() -> usize {
        384
    }
}
