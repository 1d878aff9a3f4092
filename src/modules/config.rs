use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const DEFAULT_CONFIG_PATH: &str = "daily_blog.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub paths: PathConfig,
    pub site: SiteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub secret_key: String, // 会话 cookie 签名密钥，为空时首次加载生成并写回
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    pub templates_dir: PathBuf,
    pub static_dir: PathBuf,
    pub database_path: PathBuf, // 博客数据库路径
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub title: String,
    pub description: String,
    pub author: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                secret_key: generate_secret(),
            },
            paths: PathConfig {
                templates_dir: PathBuf::from("templates"),
                static_dir: PathBuf::from("static"),
                database_path: PathBuf::from("blog.db"),
            },
            site: SiteConfig {
                title: "Daily Blog".to_string(),
                description: "A collection of random musings.".to_string(),
                author: "Daily Blog".to_string(),
            },
        }
    }
}

/// 生成随机签名密钥
fn generate_secret() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        // 优先读取配置文件，不存在时使用默认值
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let mut config: Config = toml::from_str(&content)?;
            if config.server.secret_key.trim().is_empty() {
                config.server.secret_key = generate_secret();
                match config.save(path) {
                    Ok(()) => log::info!("Generated secret_key and saved it to {}", path.display()),
                    Err(e) => log::warn!(
                        "Generated secret_key but could not save {}: {}; sessions will not survive a restart",
                        path.display(),
                        e
                    ),
                }
            }
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn database_path(&self) -> String {
        self.paths.database_path.to_string_lossy().to_string()
    }
}
