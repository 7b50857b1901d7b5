use anyhow::Result;
use axum::Router;
use clap::Parser;
use paperdex_core::{IndexConfig, Language};
use paperdex_server::{build_app, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Index root directory (holds CURRENT and the generation folders)
    #[arg(long, default_value = "./index")]
    index: PathBuf,
    /// Corpus folder used by POST /index/rebuild
    #[arg(long, env = "CORPUS_DIR")]
    corpus: Option<PathBuf>,
    /// Token expected in the X-ADMIN-TOKEN header for admin endpoints
    #[arg(long, env = "ADMIN_TOKEN", hide_env_values = true)]
    admin_token: Option<String>,
    /// Stopword language for rebuilds
    #[arg(long, default_value_t = Language::English)]
    language: Language,
    #[arg(long, default_value_t = false)]
    sublinear_tf: bool,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let config = ServerConfig {
        corpus_dir: args.corpus,
        admin_token: args.admin_token,
        index: IndexConfig { language: args.language, sublinear_tf: args.sublinear_tf },
        ..ServerConfig::new(args.index)
    };
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
