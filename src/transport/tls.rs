// ABOUTME: GMP over a TLS-wrapped TCP connection using rustls.
// ABOUTME: Verifies against --cafile when given, otherwise accepts gvmd's self-signed cert.

use super::error::{Error, Result};
use super::{Connection, read_response, with_timeout};
use async_trait::async_trait;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

pub struct TlsConnection {
    hostname: String,
    port: u16,
    certfile: Option<PathBuf>,
    keyfile: Option<PathBuf>,
    cafile: Option<PathBuf>,
    timeout: Option<Duration>,
    stream: Option<TlsStream<TcpStream>>,
}

impl std::fmt::Debug for TlsConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConnection")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("cafile", &self.cafile)
            .field("connected", &self.stream.is_some())
            .finish()
    }
}

impl TlsConnection {
    pub fn new(
        hostname: String,
        port: u16,
        certfile: Option<PathBuf>,
        keyfile: Option<PathBuf>,
        cafile: Option<PathBuf>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            hostname,
            port,
            certfile,
            keyfile,
            cafile,
            timeout,
            stream: None,
        }
    }

    fn client_config(&self) -> Result<ClientConfig> {
        let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
        let builder = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| Error::Tls(e.to_string()))?;

        let builder = match &self.cafile {
            Some(cafile) => {
                let mut roots = RootCertStore::empty();
                for cert in load_certs(cafile)? {
                    roots.add(cert).map_err(|e| Error::CertificateLoadFailed {
                        path: cafile.clone(),
                        reason: e.to_string(),
                    })?;
                }
                builder.with_root_certificates(roots)
            }
            None => {
                tracing::debug!("No CA file given; server certificate will not be verified");
                builder
                    .dangerous()
                    .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert { provider }))
            }
        };

        match (&self.certfile, &self.keyfile) {
            (Some(certfile), Some(keyfile)) => {
                let certs = load_certs(certfile)?;
                let key = load_key(keyfile)?;
                builder
                    .with_client_auth_cert(certs, key)
                    .map_err(|e| Error::Tls(e.to_string()))
            }
            _ => Ok(builder.with_no_client_auth()),
        }
    }
}

#[async_trait]
impl Connection for TlsConnection {
    async fn connect(&mut self) -> Result<()> {
        let connector = TlsConnector::from(Arc::new(self.client_config()?));
        let server_name = ServerName::try_from(self.hostname.clone())
            .map_err(|e| Error::Tls(format!("invalid hostname {}: {}", self.hostname, e)))?;

        let stream = with_timeout(self.timeout, async {
            let tcp = TcpStream::connect((self.hostname.as_str(), self.port))
                .await
                .map_err(|e| {
                    Error::Connection(format!("{}:{}: {}", self.hostname, self.port, e))
                })?;
            connector
                .connect(server_name, tcp)
                .await
                .map_err(|e| Error::Tls(e.to_string()))
        })
        .await?;

        self.stream = Some(stream);
        Ok(())
    }

    async fn send(&mut self, data: &str) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        with_timeout(self.timeout, async {
            stream.write_all(data.as_bytes()).await?;
            stream.flush().await?;
            Ok(())
        })
        .await
    }

    async fn read(&mut self) -> Result<String> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        with_timeout(self.timeout, read_response(stream)).await
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
        }
        Ok(())
    }

    fn endpoint(&self) -> String {
        format!("tls://{}:{}", self.hostname, self.port)
    }
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path).map_err(|e| Error::CertificateLoadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::CertificateLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    if certs.is_empty() {
        return Err(Error::CertificateLoadFailed {
            path: path.to_path_buf(),
            reason: "no certificates found".to_string(),
        });
    }
    Ok(certs)
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let file = File::open(path).map_err(|e| Error::KeyLoadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|e| Error::KeyLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
        .ok_or_else(|| Error::KeyLoadFailed {
            path: path.to_path_buf(),
            reason: "no private key found".to_string(),
        })
}

/// Accepts any server certificate but still checks handshake signatures.
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
