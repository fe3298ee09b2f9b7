use std::env;
use std::path::PathBuf;

/// Which backend holds uploaded image payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageStorage {
    Database,
    File,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub frontend_url: String,
    pub allowed_origins: Vec<String>,
    pub image_storage: ImageStorage,
    pub upload_dir: PathBuf,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub oauth_callback_url: String,
    pub session_secret: String,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let allowed_origins =
            parse_origins(&env::var("ALLOWED_ORIGINS").unwrap_or_default(), &frontend_url);

        let image_storage = match env::var("IMAGE_STORAGE").as_deref() {
            Ok("file") => ImageStorage::File,
            _ => ImageStorage::Database,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            frontend_url,
            allowed_origins,
            image_storage,
            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),
            google_client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            oauth_callback_url: env::var("OAUTH_CALLBACK_URL")
                .unwrap_or_else(|_| "http://localhost:8080/auth/google/callback".to_string()),
            session_secret: env::var("SESSION_SECRET").unwrap_or_default(),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| "10485760".to_string())
                .parse()
                .unwrap_or(10 << 20),
        })
    }

    /// Secret used to sign OAuth `state` values. Falls back to the token secret.
    pub fn oauth_state_secret(&self) -> &str {
        if self.session_secret.is_empty() {
            &self.jwt_secret
        } else {
            &self.session_secret
        }
    }
}

/// Splits a comma-separated origin list, falling back to the frontend URL.
fn parse_origins(raw: &str, frontend_url: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() {
        vec![frontend_url.to_string()]
    } else {
        origins
    }
}
