//! OAuth2 authentication management for Gmail API

use google_gmail1::{hyper_rustls, hyper_util, yup_oauth2, Gmail};
use std::env;
use std::path::Path;
use tracing::{debug, info};
use yup_oauth2::ApplicationSecret;

use crate::error::{GmailError, Result};

pub const SCOPE_READONLY: &str = "https://www.googleapis.com/auth/gmail.readonly";
pub const SCOPE_SEND: &str = "https://www.googleapis.com/auth/gmail.send";
pub const SCOPE_LABELS: &str = "https://www.googleapis.com/auth/gmail.labels";
pub const SCOPE_FULL: &str = "https://mail.google.com/";

/// Gmail API scopes requested for the auto-responder
///
/// - gmail.readonly: list and read inbox messages
/// - gmail.send: send replies
/// - gmail.labels: create and list the marker label
/// - mail.google.com: full access, needed for modifying message labels
pub const REQUIRED_SCOPES: &[&str] = &[SCOPE_READONLY, SCOPE_SEND, SCOPE_LABELS, SCOPE_FULL];

/// Type alias for Gmail Hub to simplify type signatures
pub type GmailHub = Gmail<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>;

/// Initialize Gmail API hub with OAuth2 authentication
///
/// Sets up the Gmail API client with:
/// - OAuth2 authentication using InstalledFlow (desktop app flow)
/// - Token persistence to disk for automatic refresh
/// - HTTP/1 client with TLS support
///
/// Credentials are read from `credentials_path` when it exists, otherwise
/// from the environment (see [`load_credentials_from_env`]).
pub async fn initialize_gmail_hub(credentials_path: &Path, token_cache_path: &Path) -> Result<GmailHub> {
    let secret = load_application_secret(credentials_path).await?;

    if let Some(parent) = token_cache_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // HTTPRedirect opens a browser for user authorization
    let auth = yup_oauth2::InstalledFlowAuthenticator::builder(
        secret,
        yup_oauth2::InstalledFlowReturnMethod::HTTPRedirect,
    )
    .persist_tokens_to_disk(token_cache_path)
    .build()
    .await
    .map_err(|e| GmailError::AuthError(format!("Failed to build authenticator: {}", e)))?;

    // Cache a token carrying every scope so later per-call scopes are satisfied from it
    let _token = auth
        .token(REQUIRED_SCOPES)
        .await
        .map_err(|e| GmailError::AuthError(format!("Failed to obtain token: {}", e)))?;

    if token_cache_path.exists() {
        secure_token_file(token_cache_path).await?;
    }
    info!("Authenticated with Gmail API ({} scopes)", REQUIRED_SCOPES.len());

    // Use HTTP/1 for compatibility (HTTP/2 is default but HTTP/1 works better with google-gmail1)
    let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
        .build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|e| GmailError::AuthError(format!("Failed to load TLS roots: {}", e)))?
                .https_or_http()
                .enable_http1()
                .build(),
        );

    Ok(Gmail::new(client, auth))
}

/// Read the OAuth2 client secret from a file, falling back to the environment
pub async fn load_application_secret(credentials_path: &Path) -> Result<ApplicationSecret> {
    if credentials_path.exists() {
        debug!("Reading OAuth2 credentials from {:?}", credentials_path);
        return yup_oauth2::read_application_secret(credentials_path)
            .await
            .map_err(|e| GmailError::AuthError(format!("Failed to read credentials: {}", e)));
    }

    debug!(
        "Credentials file {:?} not found, trying environment variables",
        credentials_path
    );
    load_credentials_from_env().map_err(|e| {
        GmailError::AuthError(format!(
            "No credentials file at {:?} and {}",
            credentials_path, e
        ))
    })
}

/// Load OAuth2 credentials from environment variables
///
/// # Environment Variables
/// - `GMAIL_CLIENT_ID`: OAuth2 client ID
/// - `GMAIL_CLIENT_SECRET`: OAuth2 client secret
/// - `GMAIL_REDIRECT_URI`: Redirect URI (optional, defaults to http://localhost:8080)
pub fn load_credentials_from_env() -> Result<ApplicationSecret> {
    let client_id = env::var("GMAIL_CLIENT_ID")
        .map_err(|_| GmailError::ConfigError("GMAIL_CLIENT_ID not set".to_string()))?;
    let client_secret = env::var("GMAIL_CLIENT_SECRET")
        .map_err(|_| GmailError::ConfigError("GMAIL_CLIENT_SECRET not set".to_string()))?;
    let redirect_uri = env::var("GMAIL_REDIRECT_URI")
        .unwrap_or_else(|_| "http://localhost:8080".to_string());

    Ok(ApplicationSecret {
        client_id,
        client_secret,
        auth_uri: "https://accounts.google.com/o/oauth2/auth".to_string(),
        token_uri: "https://oauth2.googleapis.com/token".to_string(),
        redirect_uris: vec![redirect_uri],
        ..Default::default()
    })
}

/// Restrict the token cache to owner read/write (0600)
#[cfg(unix)]
pub async fn secure_token_file(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

/// Windows uses ACLs instead of Unix permission bits
#[cfg(windows)]
pub async fn secure_token_file(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_load_application_secret_from_file() {
        let credentials_json = r#"{
            "installed": {
                "client_id": "test-client-id",
                "project_id": "test-project",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "client_secret": "test-secret",
                "redirect_uris": ["http://localhost:8080"]
            }
        }"#;

        let temp_file = NamedTempFile::new().unwrap();
        tokio::fs::write(temp_file.path(), credentials_json)
            .await
            .unwrap();

        let secret = load_application_secret(temp_file.path()).await.unwrap();
        assert_eq!(secret.client_id, "test-client-id");
        assert_eq!(secret.client_secret, "test-secret");
    }

    #[tokio::test]
    #[serial]
    async fn test_load_application_secret_falls_back_to_env() {
        env::set_var("GMAIL_CLIENT_ID", "env-id");
        env::set_var("GMAIL_CLIENT_SECRET", "env-secret");

        let secret = load_application_secret(Path::new("/tmp/missing-credentials-98765.json"))
            .await
            .unwrap();
        assert_eq!(secret.client_id, "env-id");

        env::remove_var("GMAIL_CLIENT_ID");
        env::remove_var("GMAIL_CLIENT_SECRET");
    }

    #[tokio::test]
    #[serial]
    async fn test_load_application_secret_missing_everywhere() {
        env::remove_var("GMAIL_CLIENT_ID");
        env::remove_var("GMAIL_CLIENT_SECRET");

        let result = load_application_secret(Path::new("/tmp/missing-credentials-98765.json")).await;
        assert!(matches!(result, Err(GmailError::AuthError(_))));
    }

    #[tokio::test]
    async fn test_secure_token_file() {
        let temp_file = NamedTempFile::new().unwrap();
        tokio::fs::write(temp_file.path(), "test content")
            .await
            .unwrap();

        secure_token_file(temp_file.path()).await.unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = tokio::fs::metadata(temp_file.path()).await.unwrap();
            assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
        }
    }

    #[test]
    #[serial]
    fn test_load_credentials_from_env() {
        env::set_var("GMAIL_CLIENT_ID", "test-id");
        env::set_var("GMAIL_CLIENT_SECRET", "test-secret");
        env::set_var("GMAIL_REDIRECT_URI", "http://localhost:9999");

        let secret = load_credentials_from_env().unwrap();
        assert_eq!(secret.client_id, "test-id");
        assert_eq!(secret.client_secret, "test-secret");
        assert_eq!(secret.redirect_uris[0], "http://localhost:9999");

        env::remove_var("GMAIL_CLIENT_ID");
        env::remove_var("GMAIL_CLIENT_SECRET");
        env::remove_var("GMAIL_REDIRECT_URI");
    }

    #[test]
    #[serial]
    fn test_load_credentials_from_env_default_redirect() {
        env::set_var("GMAIL_CLIENT_ID", "test-id");
        env::set_var("GMAIL_CLIENT_SECRET", "test-secret");
        env::remove_var("GMAIL_REDIRECT_URI");

        let secret = load_credentials_from_env().unwrap();
        assert_eq!(secret.redirect_uris[0], "http://localhost:8080");

        env::remove_var("GMAIL_CLIENT_ID");
        env::remove_var("GMAIL_CLIENT_SECRET");
    }

    #[test]
    fn test_scopes_constants() {
        assert_eq!(REQUIRED_SCOPES.len(), 4);
        assert!(REQUIRED_SCOPES.contains(&"https://www.googleapis.com/auth/gmail.readonly"));
        assert!(REQUIRED_SCOPES.contains(&"https://www.googleapis.com/auth/gmail.send"));
        assert!(REQUIRED_SCOPES.contains(&"https://www.googleapis.com/auth/gmail.labels"));
        assert!(REQUIRED_SCOPES.contains(&"https://mail.google.com/"));
    }
}
