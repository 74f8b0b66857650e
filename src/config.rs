use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_PATH: &str = ".config.yaml";
const ENV_PREFIX: &str = "BILLING";

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub log_level: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// 查询最多尝试次数, 0 视为 1
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub run_migrations: bool,
    /// 建表后写入 seeds/ 示例数据
    pub run_seeds: bool,
}

impl AppConfig {
    /// 加载配置: 默认值 < YAML 文件 (CONFIG_PATH) < BILLING__* 环境变量 < DATABASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(&path)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080_i64)?
            .set_default("database.url", "postgres://localhost/billing")?
            .set_default("database.max_connections", 10_i64)?
            .set_default("database.max_retries", 3_i64)?
            .set_default("database.retry_base_delay_ms", 50_i64)?
            .set_default("database.retry_max_delay_ms", 1000_i64)?
            .set_default("database.run_migrations", true)?
            .set_default("database.run_seeds", false)?
            .set_default("log_level", "info")?
            .set_default("version", env!("CARGO_PKG_VERSION"))?
            .add_source(File::new(path, FileFormat::Yaml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .build()?;

        let mut config: AppConfig = settings.try_deserialize()?;
        config.database.max_retries = config.database.max_retries.max(1);
        Ok(config)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
