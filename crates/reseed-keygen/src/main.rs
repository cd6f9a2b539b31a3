//! Makes sure a reseed server has a signing identity and, optionally, a TLS
//! identity before it starts.
use std::path::PathBuf;

use clap::Parser;
use reseed_certs::{
    operator::TerminalOperator,
    store::{self, IdentityStore, TlsResolution},
};
use snafu::{ResultExt, Snafu};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt};

const LOG_ENV_VAR: &str = "RESEED_LOG";

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to initialize logging"))]
    InitTracing {
        source: tracing::subscriber::SetGlobalDefaultError,
    },

    #[snafu(display("failed to resolve the signing identity"))]
    ResolveSigningIdentity { source: store::Error },

    #[snafu(display("failed to resolve the TLS identity of {host:?}"))]
    ResolveTlsIdentity { source: store::Error, host: String },
}

/// Load or create the signing and TLS identities of a reseed server.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Identifier of the publisher, usually an e-mail address.
    #[arg(long, env = "RESEED_SIGNER")]
    signer: String,

    /// Signing key file. Defaults to the key file of the signer within the
    /// output directory.
    #[arg(long, env = "RESEED_KEY")]
    key: Option<PathBuf>,

    /// Host name (or comma separated list of host names and IP addresses) of
    /// the TLS identity. TLS is skipped if not set.
    #[arg(long, env = "RESEED_TLS_HOST")]
    tls_host: Option<String>,

    /// TLS certificate file. Defaults to the certificate of the host within
    /// the output directory.
    #[arg(long, env = "RESEED_TLS_CERT", requires = "tls_host")]
    tls_cert: Option<PathBuf>,

    /// TLS key file. Defaults to the key file of the host within the output
    /// directory.
    #[arg(long, env = "RESEED_TLS_KEY", requires = "tls_host")]
    tls_key: Option<PathBuf>,

    /// Directory newly generated identities are written to.
    #[arg(long, env = "RESEED_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Generate missing identities without asking.
    #[arg(long, short)]
    yes: bool,
}

#[snafu::report]
fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    init_tracing()?;

    let operator = TerminalOperator::stdio().assume_yes(cli.yes);
    let mut store = IdentityStore::new(&cli.output_dir, operator);

    let signing = store
        .resolve_signing_identity(cli.key.as_deref(), &cli.signer)
        .context(ResolveSigningIdentitySnafu)?;
    info!(
        signer = %cli.signer,
        key_path = %signing.key_path.display(),
        generated = signing.generated,
        "signing identity ready"
    );
    println!("Signing key: {}", signing.key_path.display());

    if let Some(host) = &cli.tls_host {
        let resolution = store
            .resolve_tls_identity(host, cli.tls_cert.as_deref(), cli.tls_key.as_deref())
            .context(ResolveTlsIdentitySnafu { host })?;

        if let TlsResolution::Ready(paths) = resolution {
            info!(
                %host,
                certificate_path = %paths.certificate.display(),
                key_path = %paths.key.display(),
                "TLS identity ready"
            );
            println!("TLS certificate: {}", paths.certificate.display());
            println!("TLS key: {}", paths.key.display());
        }
    }

    Ok(())
}

/// Logs go to stderr, stdout is reserved for the operator dialogue.
fn init_tracing() -> Result<(), Error> {
    let env_filter = EnvFilter::builder()
        .with_env_var(LOG_ENV_VAR)
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    tracing::subscriber::set_global_default(tracing_subscriber::registry().with(console_layer))
        .context(InitTracingSnafu)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn tls_paths_require_a_host() {
        let result = Cli::try_parse_from(["reseed-keygen", "--signer", "a@b", "--tls-key", "k.pem"]);
        assert!(result.is_err());
    }
}
