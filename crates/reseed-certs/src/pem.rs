//! Ordered multi-block PEM artifacts.
//!
//! Key artifacts are not a single PEM document: a signing key file carries
//! the private key followed by its certificate, a TLS key file additionally
//! starts with the curve parameters. A [`PemBundle`] models such a file as an
//! ordered list of labelled [`PemBlock`]s. Blocks are written in the order
//! they were pushed and are looked up by label when reading.
use ::pem::{EncodeConfig, LineEnding, Pem, PemError};
use snafu::{OptionExt, ResultExt, Snafu};

pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
pub const CRL_LABEL: &str = "X509 CRL";
pub const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";
pub const EC_PRIVATE_KEY_LABEL: &str = "EC PRIVATE KEY";
pub const EC_PARAMETERS_LABEL: &str = "EC PARAMETERS";

/// Line ending used for every artifact written to disk.
pub const PEM_LINE_ENDING: LineEnding = LineEnding::LF;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to decode PEM blocks"))]
    DecodeBlocks { source: PemError },

    #[snafu(display("no {label:?} block found"))]
    MissingBlock { label: String },
}

/// A single labelled PEM block holding DER contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PemBlock {
    label: String,
    contents: Vec<u8>,
}

impl PemBlock {
    pub fn new(label: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            label: label.into(),
            contents: contents.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub fn to_pem(&self) -> String {
        let pem = Pem::new(self.label.as_str(), self.contents.as_slice());
        ::pem::encode_config(&pem, EncodeConfig::new().set_line_ending(PEM_LINE_ENDING))
    }
}

impl From<Pem> for PemBlock {
    fn from(pem: Pem) -> Self {
        let label = pem.tag().to_owned();
        Self::new(label, pem.into_contents())
    }
}

/// An ordered sequence of [`PemBlock`]s, serialized as their concatenation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PemBundle {
    blocks: Vec<PemBlock>,
}

impl PemBundle {
    pub fn push(&mut self, block: PemBlock) -> &mut Self {
        self.blocks.push(block);
        self
    }

    pub fn blocks(&self) -> &[PemBlock] {
        &self.blocks
    }

    /// Returns the labels of all blocks in file order.
    pub fn labels(&self) -> Vec<&str> {
        self.blocks.iter().map(PemBlock::label).collect()
    }

    /// Returns the first block with the given label.
    pub fn find(&self, label: &str) -> Option<&PemBlock> {
        self.blocks.iter().find(|block| block.label == label)
    }

    /// Same as [`Self::find`], but a missing block is an error.
    pub fn require(&self, label: &str) -> Result<&PemBlock> {
        self.find(label).context(MissingBlockSnafu { label })
    }

    pub fn to_pem(&self) -> String {
        self.blocks.iter().map(PemBlock::to_pem).collect()
    }

    /// Parses every PEM block contained in `input`.
    ///
    /// Anything outside of BEGIN/END boundaries is ignored, which allows
    /// explanatory headers some tools prepend to key files. Input without any
    /// complete block yields an empty bundle.
    pub fn from_pem(input: impl AsRef<[u8]>) -> Result<Self> {
        let blocks = ::pem::parse_many(input).context(DecodeBlocksSnafu)?;
        Ok(blocks.into_iter().map(PemBlock::from).collect())
    }
}

impl FromIterator<PemBlock> for PemBundle {
    fn from_iter<T: IntoIterator<Item = PemBlock>>(iter: T) -> Self {
        Self {
            blocks: iter.into_iter().collect(),
        }
    }
}
