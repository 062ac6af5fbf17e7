//! SmartFDX Web Gateway
//!
//! Login, session management and workspace routing for the SmartFDX
//! laboratory data-entry platform.

use clap::Parser;
use smartfdx_web::server::SmartFdxServerBuilder;
use smartfdx_web::{init_logging, WebConfig};

/// SmartFDX Web Gateway - login, sessions and workspace routing
#[derive(Parser)]
#[command(name = "smartfdx-web")]
#[command(about = "Web gateway for the SmartFDX platform")]
#[command(version)]
struct Args {
    /// Server host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Enable development mode
    #[arg(long)]
    dev: bool,

    /// Path to the TOML settings file
    #[arg(long)]
    config: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Set up logging first: the settings file's logging section wins, the
    // env-based subscriber is the fallback
    let file_logging = args
        .config
        .as_deref()
        .and_then(|path| smartfdx_core::SmartFdxConfig::from_file(path).ok())
        .map(|settings| smartfdx_core::init_logging(&settings.logging).is_ok())
        .unwrap_or(false);

    if !file_logging {
        std::env::set_var(
            "RUST_LOG",
            format!("smartfdx_web={},tower_http=debug", args.log_level),
        );
        init_logging();
    }

    // Load environment variables
    dotenvy::dotenv().ok();

    // Create web configuration
    let mut config = WebConfig::from_env();

    // Override with command line arguments
    config.host = args.host;
    config.port = args.port;
    config.dev_mode = args.dev;
    if args.config.is_some() {
        config.config_file = args.config;
    }

    // Print startup information
    println!("🚀 Starting SmartFDX Web Gateway");
    println!("📍 Server: http://{}:{}", config.host, config.port);
    println!("🔧 Development mode: {}", config.dev_mode);

    if let Some(config_file) = &config.config_file {
        println!("⚙️  Settings file: {}", config_file);
    }

    if config.store_endpoint.is_none() && config.config_file.is_none() {
        println!("⚠️  Warning: credential store is not configured");
        println!("   Set SMARTFDX_STORE_ENDPOINT and SMARTFDX_STORE_KEY, or pass --config.");
        println!("   The gateway will start but login will be unavailable.");
    }

    // Build and start the server
    let mut builder = SmartFdxServerBuilder::new()
        .host(config.host.clone())
        .port(config.port)
        .dev_mode(config.dev_mode);
    if let Some(config_file) = &config.config_file {
        builder = builder.config_file(config_file.clone());
    }
    if let Some(endpoint) = &config.store_endpoint {
        builder = builder.store_endpoint(endpoint.clone());
    }
    if let Some(key) = &config.store_key {
        builder = builder.store_key(key.clone());
    }

    let server = match builder.build().await {
        Ok(server) => server,
        Err(e) => {
            eprintln!("❌ Failed to build server: {}", e);
            std::process::exit(1);
        }
    };

    // Start the server (this will block until shutdown)
    if let Err(e) = server.start().await {
        eprintln!("❌ Server failed to start: {}", e);
        std::process::exit(1);
    }
}
