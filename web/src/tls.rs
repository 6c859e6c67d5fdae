use axum_server::tls_rustls::RustlsConfig;
use log::*;
use service::config::TlsPaths;
use std::io;

/// Loads the key and the certificate chain into a rustls server config.
pub(crate) async fn rustls_config(paths: &TlsPaths) -> io::Result<RustlsConfig> {
    let chain = read_certificate_chain(paths).await?;
    let private_key = tokio::fs::read(&paths.private_key).await?;

    debug!(
        "Loaded TLS certificate {} and key {}",
        paths.certificate.display(),
        paths.private_key.display()
    );

    RustlsConfig::from_pem(chain, private_key).await
}

/// The server certificate followed by the intermediate certificate, if any.
pub(crate) async fn read_certificate_chain(paths: &TlsPaths) -> io::Result<Vec<u8>> {
    let mut chain = tokio::fs::read(&paths.certificate).await?;

    if let Some(intermediate) = &paths.intermediate_certificate {
        if !chain.is_empty() && !chain.ends_with(b"\n") {
            chain.push(b'\n');
        }
        chain.extend(tokio::fs::read(intermediate).await?);
    }

    Ok(chain)
}
