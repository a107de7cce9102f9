use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Wardline";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is not set
pub fn default_log_filter() -> &'static str {
    "wardline=info"
}

/// Get the application data directory
/// ~/Wardline/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Wardline")
}

/// Path of the local replica database
pub fn replica_db_path() -> PathBuf {
    app_data_dir().join("replica.db")
}

/// Connection details for the remote clinical store. The bearer
/// credential is carried opaquely; authentication mechanics live with
/// the remote API, not here.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub bearer_token: Option<String>,
    pub timeout_secs: u64,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bearer_token: None,
            timeout_secs: 10,
        }
    }

    /// Read WARDLINE_REMOTE_URL / WARDLINE_API_TOKEN from the environment.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("WARDLINE_REMOTE_URL").ok()?;
        Some(Self {
            bearer_token: std::env::var("WARDLINE_API_TOKEN").ok(),
            ..Self::new(base_url)
        })
    }
}
