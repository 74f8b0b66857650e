use billing_tools::db::{
    InvoiceStoreRepository, MovementStoreRepository, PgInvoiceStore, PgMovementStore, RetryPolicy,
};
use billing_tools::{
    create_pool, router, run_migrations, run_seeds, AppConfig, AppState, InvoiceService, MovementService,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载配置 (日志级别来自配置, RUST_LOG 优先)
    let config = AppConfig::load()?;

    // 初始化日志 - 使用本地时间格式
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .init();

    info!(version = %config.version, "Starting billing tools server");
    info!("Config: {:?}", config.server);

    // 创建数据库连接池
    let pool = create_pool(&config.database).await?;
    info!(max_connections = config.database.max_connections, "Database pool created");

    if config.database.run_migrations {
        run_migrations(&pool).await?;
    }

    // 示例数据失败不阻止启动
    if config.database.run_seeds {
        if let Err(e) = run_seeds(&pool).await {
            error!(error = %e, "Failed to run seed data");
        }
    }

    // 存储 -> 仓储 -> 服务
    let retry = RetryPolicy::from_config(&config.database);
    let invoice_store = Arc::new(PgInvoiceStore::new(pool.clone(), retry.clone()));
    let movement_store = Arc::new(PgMovementStore::new(pool.clone(), retry));

    let state = AppState {
        invoices: Arc::new(InvoiceService::new(Arc::new(InvoiceStoreRepository::new(invoice_store)))),
        movements: Arc::new(MovementService::new(Arc::new(MovementStoreRepository::new(movement_store)))),
    };

    let app = router(state);

    // 启动服务器
    let addr = config.listen_addr();
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET  /health      - health check");
    info!("  GET  /tools       - tool definitions");
    info!("  POST /tools/call  - invoke a tool");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Database pool closed");

    Ok(())
}
