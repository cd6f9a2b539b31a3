use std::time::Duration;

use const_format::concatcp;

const DAY: u64 = 24 * 60 * 60;

/// Signing certificates outlive any practical publishing horizon (ten years).
pub const SIGNING_CERTIFICATE_VALIDITY: Duration = Duration::from_secs(10 * 365 * DAY);

/// TLS certificates are valid for two years.
pub const TLS_CERTIFICATE_VALIDITY: Duration = Duration::from_secs(2 * 365 * DAY);

pub const ORGANIZATIONAL_UNIT_DN: &str = "OU=I2P";
pub const ORGANIZATION_DN: &str = "O=I2P Anonymous Network";
pub const LOCALITY_DN: &str = "L=XX";
pub const COUNTRY_DN: &str = "C=XX";

/// Attributes following the common name in every identity subject.
pub const SUBJECT_SUFFIX: &str = concatcp!(
    ORGANIZATIONAL_UNIT_DN,
    ",",
    ORGANIZATION_DN,
    ",",
    LOCALITY_DN,
    ",",
    COUNTRY_DN
);
