use crate::config::DatabaseConfig;
use sqlx::migrate::MigrateError;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;
use std::time::Duration;

/// 创建数据库连接池
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let mut connect_options = PgConnectOptions::from_str(&config.url)?;

    // 慢查询日志阈值 5秒
    connect_options = connect_options.log_slow_statements(
        tracing::log::LevelFilter::Warn,
        Duration::from_secs(5),
    );

    PgPoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options)
        .await
}

/// 执行 migrations/ 下的建表脚本
///
/// 与 seeds/ 共用 _sqlx_migrations 表, 双方都忽略对方的版本
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    tracing::info!("Running database migrations");
    let mut migrator = sqlx::migrate!("./migrations");
    migrator.set_ignore_missing(true);
    migrator.run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

/// 写入 seeds/ 下的示例数据, 须在建表之后执行
pub async fn run_seeds(pool: &PgPool) -> Result<(), MigrateError> {
    tracing::info!("Running seed data");
    let mut migrator = sqlx::migrate!("./seeds");
    migrator.set_ignore_missing(true);
    migrator.run(pool).await?;
    tracing::info!("Seed data applied");
    Ok(())
}
