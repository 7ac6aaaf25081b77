use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use wetl_cli::args::{Args, Command};
use wetl_config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();

    // Observability
    wetl_obs::init("wetl", wetl_obs::LogFormat::from_env());

    // Config
    let cfg = match &args.config {
        Some(path) => AppConfig::load_from(Path::new(path)),
        None => AppConfig::load(),
    }
    .context("loading configuration")?;

    match args.command {
        Some(Command::Run(run)) => {
            let plan = match run.plan() {
                Ok(plan) => plan,
                Err(message) => {
                    eprintln!("{message}");
                    std::process::exit(1);
                }
            };
            let service = wetl_cli::build_service(&cfg).await?;
            let result =
                wetl_cli::run::execute(&service, &plan, run.output, run.csv_path.as_deref()).await;
            print!("{}", wetl_cli::run::render_summary(&result));
            std::process::exit(if result.success { 0 } else { 1 });
        }
        Some(Command::Serve(serve)) => serve_http(&cfg, serve.bind).await,
        None => serve_http(&cfg, None).await,
    }
}

async fn serve_http(cfg: &AppConfig, bind: Option<String>) -> anyhow::Result<()> {
    let service = wetl_cli::build_service(cfg).await?;
    let (app, state) = wetl_cli::build_app(Arc::new(service))?;

    let http_bind = bind.unwrap_or_else(|| cfg.http_bind());
    let addr: SocketAddr = http_bind
        .parse()
        .with_context(|| format!("invalid HTTP bind address {http_bind}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    // Mark ready just before serving
    wetl_cli::set_ready(&state, true);

    tracing::info!(%addr, "HTTP server listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
