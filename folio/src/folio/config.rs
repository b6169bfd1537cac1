use std::path::Path;

use confik::{Configuration, EnvSource};
use serde::{Deserialize, Serialize};

use self::yaml::YamlFileSource;

#[derive(Debug, Clone, Serialize, Deserialize, Configuration)]
pub struct SiteSettings {
    pub name: String,
    /// Public origin used for canonical URLs, without a trailing slash.
    pub base_url: String,
    pub locale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Configuration)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// Largest accepted request body for `/api/render`, in KiB.
    pub max_payload_kb: usize,
}

impl ServerConfig {
    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_kb.saturating_mul(1024)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Configuration)]
pub struct CmsConfig {
    /// WordPress origin, e.g. `https://cms.example.com`.
    pub api_base: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Configuration)]
pub struct ContentConfig {
    /// Upper bound on promo cards interleaved into one post.
    pub max_promo_inserts: usize,
    /// Accessible iframe title for embeds without a caption.
    pub embed_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Configuration)]
pub struct SiteConfig {
    pub site: SiteSettings,
    pub server: ServerConfig,
    pub cms: CmsConfig,
    pub content: ContentConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site: SiteSettings {
                name: "Folio".into(),
                base_url: "http://localhost:8080".into(),
                locale: "en-US".into(),
            },
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 8080,
                cors_origins: vec!["*".into()],
                max_payload_kb: 2048,
            },
            cms: CmsConfig {
                api_base: "http://localhost:8081".into(),
                timeout_secs: 10,
            },
            content: ContentConfig {
                max_promo_inserts: 3,
                embed_title: crate::folio::plugins::embeds::DEFAULT_EMBED_TITLE.into(),
            },
        }
    }
}

impl SiteConfig {
    /// Load configuration from `config.yml` (if present) and environment variables.
    /// Falls back to the compiled-in defaults when the sources are incomplete.
    pub fn load() -> Self {
        let config_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.yml");
        let mut builder = SiteConfig::builder();

        if config_path.exists() {
            builder.override_with(YamlFileSource::new(config_path));
        }

        builder.override_with(EnvSource::new());

        match builder.try_build() {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("Failed to load config.yml or env overrides: {err}. Using defaults.");
                SiteConfig::default()
            }
        }
    }
}

mod yaml {
    use std::error::Error;
    use std::path::PathBuf;

    use confik::Source;
    use serde::de::DeserializeOwned;

    #[derive(Debug)]
    pub struct YamlFileSource {
        path: PathBuf,
    }

    impl YamlFileSource {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }
    }

    impl<T> Source<T> for YamlFileSource
    where
        T: DeserializeOwned + confik::ConfigurationBuilder,
    {
        fn allows_secrets(&self) -> bool {
            false
        }

        fn provide(&self) -> Result<T, Box<dyn Error + Sync + Send>> {
            let contents = std::fs::read_to_string(&self.path)?;
            let parsed = serde_yaml::from_str(&contents)?;
            Ok(parsed)
        }
    }
}
