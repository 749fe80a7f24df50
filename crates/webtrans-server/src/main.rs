//! webtrans: machine translation through provider web pages.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("WEBTRANS_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn print_help() {
    println!("webtrans: translate text through provider web pages");
    println!();
    println!("Usage: webtrans [command]");
    println!();
    println!("Commands:");
    println!("  (none)                       Start the HTTP server");
    println!("  translate <target> <text..>  Translate text and print the result");
    println!("  help                         Show this help message");
    println!();
    println!("Environment:");
    println!("  WEBTRANS_DATA_DIR   data directory (default ./data)");
    println!("  WEBTRANS_PORT       HTTP port (default {})", webtrans_core::config::DEFAULT_PORT);
    println!("  RUST_LOG            log filter (default info)");
}

async fn translate_once(target: &str, text: &str) -> anyhow::Result<()> {
    let config = webtrans_core::WebTransConfig::from_env(resolve_data_dir())?;
    let state = AppState::new(config);

    let result = async {
        let translator = state.translator().await?;
        translator.translate(text, "auto", target).await
    }
    .await;
    state.stop().await;

    let outcome = result?;
    info!("Translated via {}", outcome.provider);
    println!("{}", outcome.translated);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "translate" => {
                if args.len() < 4 {
                    eprintln!("Usage: webtrans translate <target-language> <text...>");
                    std::process::exit(1);
                }
                let text = args[3..].join(" ");
                return translate_once(&args[2], &text).await;
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'webtrans help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = webtrans_core::WebTransConfig::from_env(&data_dir)?;
    let port = config.port;
    let state = Arc::new(AppState::new(config));

    let app = routes::build_router(state.clone());

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("webtrans server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    state.stop().await;
    info!("Shut down");
    Ok(())
}
