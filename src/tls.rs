use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::rustls::{self, Certificate, PrivateKey};
use tokio_rustls::TlsAcceptor;

/// PEM 인증서 체인과 개인키(PKCS#8 또는 RSA)로 TLS 수락자를 만듭니다.
pub fn load_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor, Box<dyn std::error::Error + Send + Sync>> {
    let certs: Vec<Certificate> = rustls_pemfile::certs(&mut BufReader::new(File::open(cert_path)?))?
        .into_iter()
        .map(Certificate)
        .collect();
    if certs.is_empty() {
        return Err(format!("인증서를 찾을 수 없음: {}", cert_path.display()).into());
    }

    let key = load_private_key(key_path)?;

    let config = rustls::ServerConfig::builder()
        .with_safe_defaults()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn load_private_key(key_path: &Path) -> Result<PrivateKey, Box<dyn std::error::Error + Send + Sync>> {
    let mut reader = BufReader::new(File::open(key_path)?);
    if let Some(key) = rustls_pemfile::pkcs8_private_keys(&mut reader)?.into_iter().next() {
        return Ok(PrivateKey(key));
    }

    let mut reader = BufReader::new(File::open(key_path)?);
    rustls_pemfile::rsa_private_keys(&mut reader)?
        .into_iter()
        .next()
        .map(PrivateKey)
        .ok_or_else(|| format!("개인키를 찾을 수 없음: {}", key_path.display()).into())
}
