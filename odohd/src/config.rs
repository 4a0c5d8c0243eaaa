// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use odoh_common::{EphemeralKeyStore, KeyStore, SeedFileKeyStore};
use odoh_proxy::ProxyConfig;
use odoh_target::{TargetConfig, MAX_RESPONSE_PADDING};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("--cert and --key must be set when TLS is enabled")]
    MissingTlsFiles,

    #[error("--{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("seed file {} does not exist", .0.display())]
    MissingSeedFile(PathBuf),

    #[error("--response-padding {got} exceeds the maximum of {max} bytes")]
    ResponsePadding { got: usize, max: usize },

    #[error("unsupported target scheme {0:?}, expected http or https")]
    TargetScheme(String),

    #[error("failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificates found in {}", .0.display())]
    NoCertificates(PathBuf),

    #[error("no private key found in {}", .0.display())]
    NoPrivateKey(PathBuf),

    #[error("invalid TLS configuration: {0}")]
    Tls(#[from] rustls::Error),
}

#[derive(Parser, Debug)]
#[command(name = "odohd", version, about = "Oblivious DoH target and proxy")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Address to listen on
    #[arg(short = 'l', long, env = "ODOH_LISTEN", default_value = "localhost:8080")]
    pub listen: String,

    /// Address to serve Prometheus metrics on
    #[arg(short = 'm', long, env = "ODOH_METRICS_LISTEN", default_value = "localhost:8081")]
    pub metrics_listen: String,

    /// Upstream DNS resolver (host:port)
    #[arg(short = 'r', long, env = "ODOH_RESOLVER", default_value = "127.0.0.1:53")]
    pub resolver: String,

    /// Serve plain HTTP instead of HTTPS
    #[arg(short = 't', long, env = "ODOH_NO_TLS")]
    pub no_tls: bool,

    /// TLS certificate chain (PEM)
    #[arg(short = 'c', long, env = "ODOH_CERT")]
    pub cert: Option<PathBuf>,

    /// TLS private key (PEM)
    #[arg(short = 'k', long, env = "ODOH_KEY")]
    pub key: Option<PathBuf>,

    /// Seed file written by `odohd keygen`. Without one, a fresh keypair is
    /// generated at every start.
    #[arg(long, env = "ODOH_SEED_FILE")]
    pub seed_file: Option<PathBuf>,

    /// Resolver timeout (seconds)
    #[arg(long, env = "ODOH_RESOLVER_TIMEOUT", default_value = "2.5", value_parser = parse_seconds)]
    pub resolver_timeout: Duration,

    /// Proxy timeout (seconds)
    #[arg(long, env = "ODOH_PROXY_TIMEOUT", default_value = "2.5", value_parser = parse_seconds)]
    pub proxy_timeout: Duration,

    /// Pad encrypted responses to a multiple of this many bytes
    #[arg(long, env = "ODOH_RESPONSE_PADDING", default_value_t = 0)]
    pub response_padding: usize,

    /// Scheme the proxy uses to reach targets
    #[arg(long, env = "ODOH_TARGET_SCHEME", default_value = "https")]
    pub target_scheme: String,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "ODOH_LOG_JSON")]
    pub log_json: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Generate a key seed, print it base64-encoded and exit
    Keygen,
}

/// Seconds as a decimal, e.g. `2.5`.
fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid seconds: {e}"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid seconds: {e}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Ephemeral,
    SeedFile(PathBuf),
}

/// Validated runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub listen: String,
    pub metrics_listen: String,
    pub resolver: String,
    pub tls: Option<TlsFiles>,
    pub keys: KeySource,
    pub target: TargetConfig,
    pub proxy: ProxyConfig,
}

impl Settings {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let tls = if args.no_tls {
            None
        } else {
            match (&args.cert, &args.key) {
                (Some(cert), Some(key)) => Some(TlsFiles {
                    cert: cert.clone(),
                    key: key.clone(),
                }),
                _ => return Err(ConfigError::MissingTlsFiles),
            }
        };

        if args.resolver_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("resolver-timeout"));
        }
        if args.proxy_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("proxy-timeout"));
        }

        if args.response_padding > MAX_RESPONSE_PADDING {
            return Err(ConfigError::ResponsePadding {
                got: args.response_padding,
                max: MAX_RESPONSE_PADDING,
            });
        }

        let keys = match &args.seed_file {
            Some(path) if !path.exists() => return Err(ConfigError::MissingSeedFile(path.clone())),
            Some(path) => KeySource::SeedFile(path.clone()),
            None => KeySource::Ephemeral,
        };

        let scheme = args.target_scheme.to_ascii_lowercase();
        if scheme != "https" && scheme != "http" {
            return Err(ConfigError::TargetScheme(args.target_scheme.clone()));
        }

        Ok(Self {
            listen: args.listen.clone(),
            metrics_listen: args.metrics_listen.clone(),
            resolver: args.resolver.clone(),
            tls,
            keys,
            target: TargetConfig {
                resolver_timeout: args.resolver_timeout,
                response_padding: args.response_padding,
            },
            proxy: ProxyConfig {
                timeout: args.proxy_timeout,
                target_scheme: scheme,
                ..Default::default()
            },
        })
    }

    pub fn key_store(&self) -> Box<dyn KeyStore> {
        match &self.keys {
            KeySource::Ephemeral => Box::new(EphemeralKeyStore),
            KeySource::SeedFile(path) => Box::new(SeedFileKeyStore::new(path.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("odohd").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let settings = Settings::from_args(&parse(&["--no-tls"])).unwrap();
        assert_eq!(settings.listen, "localhost:8080");
        assert_eq!(settings.metrics_listen, "localhost:8081");
        assert_eq!(settings.resolver, "127.0.0.1:53");
        assert_eq!(settings.tls, None);
        assert_eq!(settings.keys, KeySource::Ephemeral);
        assert_eq!(settings.target.resolver_timeout, Duration::from_millis(2500));
        assert_eq!(settings.proxy.timeout, Duration::from_millis(2500));
        assert_eq!(settings.proxy.target_scheme, "https");
    }

    #[test]
    fn tls_needs_cert_and_key() {
        let err = Settings::from_args(&parse(&["--cert", "cert.pem"])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingTlsFiles));

        let settings =
            Settings::from_args(&parse(&["-c", "cert.pem", "-k", "key.pem"])).unwrap();
        assert_eq!(
            settings.tls,
            Some(TlsFiles {
                cert: "cert.pem".into(),
                key: "key.pem".into(),
            })
        );
    }

    #[test]
    fn fractional_timeouts() {
        let args = parse(&["-t", "--resolver-timeout", "0.25", "--proxy-timeout", "4"]);
        let settings = Settings::from_args(&args).unwrap();
        assert_eq!(settings.target.resolver_timeout, Duration::from_millis(250));
        assert_eq!(settings.proxy.timeout, Duration::from_secs(4));
    }

    #[test]
    fn rejects_bad_timeouts() {
        let err = Settings::from_args(&parse(&["-t", "--resolver-timeout", "0"])).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroTimeout("resolver-timeout")));

        assert!(Args::try_parse_from(["odohd", "--proxy-timeout", "-1"]).is_err());
        assert!(Args::try_parse_from(["odohd", "--proxy-timeout", "soon"]).is_err());
    }

    #[test]
    fn response_padding_is_bounded() {
        let settings = Settings::from_args(&parse(&["-t", "--response-padding", "4096"])).unwrap();
        assert_eq!(settings.target.response_padding, MAX_RESPONSE_PADDING);

        for block in ["4097", "65535", "70000"] {
            let err = Settings::from_args(&parse(&["-t", "--response-padding", block])).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::ResponsePadding { max: MAX_RESPONSE_PADDING, .. }
            ));
        }
    }

    #[test]
    fn missing_seed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed");
        let err = Settings::from_args(&parse(&["-t", "--seed-file", path.to_str().unwrap()]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSeedFile(_)));
    }

    #[test]
    fn target_scheme_is_checked() {
        let err = Settings::from_args(&parse(&["-t", "--target-scheme", "ftp"])).unwrap_err();
        assert!(matches!(err, ConfigError::TargetScheme(_)));

        let settings = Settings::from_args(&parse(&["-t", "--target-scheme", "HTTP"])).unwrap();
        assert_eq!(settings.proxy.target_scheme, "http");
    }

    #[test]
    fn keygen_subcommand() {
        assert_eq!(parse(&["keygen"]).command, Some(Command::Keygen));
        assert_eq!(parse(&[]).command, None);
    }
}
