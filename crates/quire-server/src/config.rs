use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use quire_assembler::{AssemblerConfig, PageSizes, DEFAULT_MIN_IMAGE_BYTES};
use quire_lock::LockPolicy;
use quire_types::DocumentLayout;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Everything a quire process needs, loadable from one TOML file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuireConfig {
    pub bind_addr: SocketAddr,
    /// `file:///path`, `memory:///` or `s3://bucket/prefix`.
    pub store_url: String,
    /// Base of the URLs handed to readers.
    pub public_base_url: String,
    pub documents_root: String,
    pub images_root: String,
    /// Extra URL prefixes stripped from incoming image paths. The public
    /// images URL is always stripped.
    pub image_url_prefixes: Vec<String>,
    pub min_image_bytes: usize,
    pub lock: LockConfig,
    pub page_sizes: PageSizes,
}

impl Default for QuireConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8787)),
            store_url: "memory:///".to_string(),
            public_base_url: "http://127.0.0.1:8787/storage".to_string(),
            documents_root: "pdfs".to_string(),
            images_root: "images".to_string(),
            image_url_prefixes: Vec::new(),
            min_image_bytes: DEFAULT_MIN_IMAGE_BYTES,
            lock: LockConfig::default(),
            page_sizes: PageSizes::default(),
        }
    }
}

/// Lock retry settings in config-file units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub growth: f64,
    pub max_delay_ms: u64,
    pub jitter_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay_ms: 100,
            growth: 2.0,
            max_delay_ms: 5_000,
            jitter_ms: 100,
        }
    }
}

impl LockConfig {
    pub fn policy(&self) -> LockPolicy {
        LockPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            growth: self.growth,
            max_delay: Duration::from_millis(self.max_delay_ms),
            jitter: Duration::from_millis(self.jitter_ms),
        }
    }
}

impl QuireConfig {
    /// Read a TOML config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        let config: QuireConfig =
            toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.lock.max_attempts == 0 {
            return Err(ServerError::Config("lock.max_attempts must be at least 1".into()));
        }
        if !self.lock.growth.is_finite() || self.lock.growth < 1.0 {
            return Err(ServerError::Config("lock.growth must be at least 1.0".into()));
        }
        for (role, size) in [
            ("customer", self.page_sizes.customer),
            ("lulu_interior", self.page_sizes.lulu_interior),
        ] {
            if !size.is_valid() {
                return Err(ServerError::Config(format!(
                    "page_sizes.{role} must have positive width and height"
                )));
            }
        }
        Ok(())
    }

    pub fn layout(&self) -> DocumentLayout {
        DocumentLayout::new(self.documents_root.clone())
    }

    pub fn assembler(&self) -> AssemblerConfig {
        AssemblerConfig {
            min_image_bytes: self.min_image_bytes,
            page_sizes: self.page_sizes.clone(),
            ..AssemblerConfig::default()
        }
    }

    /// Prefixes stripped from image paths: the configured ones, then the
    /// public URL of the images root.
    pub fn image_prefixes(&self) -> Vec<String> {
        let mut prefixes = self.image_url_prefixes.clone();
        prefixes.push(format!(
            "{}/{}/",
            self.public_base_url.trim_end_matches('/'),
            self.images_root.trim_matches('/')
        ));
        prefixes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_assembler::PageSize;

    #[test]
    fn default_config() {
        let c = QuireConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8787".parse::<SocketAddr>().unwrap());
        assert_eq!(c.documents_root, "pdfs");
        assert_eq!(c.min_image_bytes, 1000);
        assert_eq!(c.lock.policy(), LockPolicy::default());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_toml() {
        let c = QuireConfig::from_toml(
            r#"
            store_url = "file:///tmp/quire"
            image_url_prefixes = ["https://cdn.example.com/img/"]

            [lock]
            max_attempts = 3
            jitter_ms = 20

            [page_sizes.lulu_interior]
            width = 400.0
            height = 600.0
            "#,
        )
        .unwrap();
        assert_eq!(c.store_url, "file:///tmp/quire");
        assert_eq!(c.lock.max_attempts, 3);
        assert_eq!(c.lock.base_delay_ms, 100);
        assert_eq!(c.lock.policy().jitter, Duration::from_millis(20));
        assert_eq!(c.page_sizes.lulu_interior, PageSize { width: 400.0, height: 600.0 });
        assert_eq!(c.page_sizes.customer, PageSize::LETTER);
        assert_eq!(
            c.image_prefixes(),
            vec![
                "https://cdn.example.com/img/".to_string(),
                "http://127.0.0.1:8787/storage/images/".to_string(),
            ]
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            QuireConfig::from_toml("[lock]\nmax_attempts = 0"),
            Err(ServerError::Config(_))
        ));
        assert!(matches!(
            QuireConfig::from_toml("[page_sizes.customer]\nwidth = -1.0\nheight = 10.0"),
            Err(ServerError::Config(_))
        ));
        assert!(matches!(
            QuireConfig::from_toml("bind_addr = 12"),
            Err(ServerError::Config(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quire.toml");
        std::fs::write(&path, "documents_root = \"books\"\n").unwrap();
        let c = QuireConfig::load(&path).unwrap();
        assert_eq!(c.layout().root(), "books");
    }
}
