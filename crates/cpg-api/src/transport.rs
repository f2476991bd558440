// Builds the shared `reqwest::Client` from `Settings`.
//
// One client per authenticated session: clones of a `Connection` reuse it,
// so they share the connection pool and the cookie jar.

use std::sync::Arc;

use reqwest::cookie::Jar;

use crate::error::Error;
use crate::settings::{Settings, TlsMode};

/// Build a `reqwest::Client` with TLS policy, timeout, user agent, and a
/// fresh cookie jar.
pub(crate) fn build_client(settings: &Settings) -> Result<reqwest::Client, Error> {
    let mut builder = reqwest::Client::builder()
        .timeout(settings.timeout)
        .user_agent(settings.user_agent())
        .cookie_provider(Arc::new(Jar::default()));

    match &settings.tls {
        TlsMode::System => {}
        TlsMode::CustomCa(path) => {
            let cert_pem = std::fs::read(path)
                .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
            let certs = reqwest::Certificate::from_pem_bundle(&cert_pem)
                .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
            if certs.is_empty() {
                return Err(Error::Tls(format!(
                    "CA bundle {} contains no certificates",
                    path.display()
                )));
            }
            builder = builder.tls_built_in_root_certs(false);
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }
        TlsMode::DangerAcceptInvalid => {
            builder = builder.danger_accept_invalid_certs(true);
        }
    }

    builder
        .build()
        .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ca_bundle_is_a_tls_error() {
        let settings =
            Settings::default().with_tls(TlsMode::CustomCa("/nonexistent/ca.pem".into()));
        let err = build_client(&settings).err();
        assert!(matches!(err, Some(Error::Tls(msg)) if msg.contains("failed to read CA cert")));
    }

    #[test]
    fn custom_ca_bundle_builds() {
        let bundle = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/test-ca.pem");
        let settings = Settings::default().with_tls(TlsMode::CustomCa(bundle.into()));
        assert!(build_client(&settings).is_ok());
    }

    #[test]
    fn bundle_without_certificates_is_rejected() {
        // Built-in roots are off for custom bundles.
        let not_a_bundle = concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml");
        let settings = Settings::default().with_tls(TlsMode::CustomCa(not_a_bundle.into()));
        let err = build_client(&settings).err();
        assert!(matches!(err, Some(Error::Tls(msg)) if msg.contains("contains no certificates")));
    }

    #[test]
    fn insecure_client_builds() {
        let settings = Settings::default().with_tls(TlsMode::DangerAcceptInvalid);
        assert!(build_client(&settings).is_ok());
    }
}
