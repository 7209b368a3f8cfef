use serde::{Deserialize, Serialize};
use std::path::Path;
use std::path::PathBuf;

/// Credentials for authenticated feed requests. Absent means the poller runs
/// unauthenticated against the public endpoints.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RedditConfig {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_auth_base_url")]
    pub auth_base_url: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    #[serde(skip)]
    path: PathBuf,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_create_database")]
    pub create_database: bool,
    #[serde(default = "default_update_interval")]
    pub update_interval: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_feed_base_url")]
    pub feed_base_url: String,
    #[serde(default = "default_board")]
    pub board: String,
    #[serde(default = "default_flair")]
    pub flair: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    pub reddit: Option<RedditConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: mangamark_home().join("config.yml"),
            database_path: default_database_path(),
            create_database: default_create_database(),
            update_interval: default_update_interval(),
            request_timeout: default_request_timeout(),
            feed_base_url: default_feed_base_url(),
            board: default_board(),
            flair: default_flair(),
            user_agent: default_user_agent(),
            reddit: None,
        }
    }
}

fn mangamark_home() -> PathBuf {
    match std::env::var("MANGAMARK_HOME") {
        Ok(path) => PathBuf::from(path),
        Err(_) => dirs::home_dir().expect("should have home").join(".mangamark"),
    }
}

fn default_update_interval() -> u64 {
    3600
}

fn default_request_timeout() -> u64 {
    10
}

fn default_feed_base_url() -> String {
    "https://www.reddit.com".to_string()
}

fn default_auth_base_url() -> String {
    "https://www.reddit.com".to_string()
}

fn default_board() -> String {
    "manga".to_string()
}

fn default_flair() -> String {
    "DISC".to_string()
}

fn default_user_agent() -> String {
    format!("rust:mangamark:v{}", env!("CARGO_PKG_VERSION"))
}

fn default_redirect_uri() -> String {
    "http://localhost:8000/redirect".to_string()
}

fn default_scope() -> String {
    "read".to_string()
}

fn default_database_path() -> String {
    let path = mangamark_home();
    if !path.exists() {
        let _ = std::fs::create_dir_all(&path);
    }
    path.join("mangamark.db").display().to_string()
}

fn default_create_database() -> bool {
    true
}

impl Config {
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Config, anyhow::Error> {
        let config_path = match path {
            Some(p) => PathBuf::new().join(p),
            None => mangamark_home().join("config.yml"),
        };

        match std::fs::File::open(config_path.clone()) {
            Ok(file) => {
                info!("Open config from {:?}", config_path);
                let mut cfg: Self = serde_yml::from_reader(file)?;
                cfg.path = config_path;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Config {
                    path: config_path,
                    ..Default::default()
                };
                cfg.save()?;
                info!("Write default config at {:?}", cfg.path);
                Ok(cfg)
            }
        }
    }

    pub fn save(&self) -> Result<(), anyhow::Error> {
        std::fs::write(&self.path, serde_yml::to_string(&self)?)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");

        let config = Config::open(Some(&path)).unwrap();

        assert!(path.exists());
        assert_eq!(config.update_interval, 3600);
        assert_eq!(config.request_timeout, 10);
        assert_eq!(config.board, "manga");
        assert_eq!(config.flair, "DISC");
        assert!(config.reddit.is_none());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(
            &path,
            "database_path: /tmp/test.db\nreddit:\n  client_id: abc\n",
        )
        .unwrap();

        let config = Config::open(Some(&path)).unwrap();

        assert_eq!(config.database_path, "/tmp/test.db");
        assert_eq!(config.update_interval, 3600);
        let reddit = config.reddit.unwrap();
        assert_eq!(reddit.client_id, "abc");
        assert_eq!(reddit.scope, "read");
        assert!(reddit.client_secret.is_none());
    }
}
