//! Museum guide binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Install the tracing subscriber
//! 3. Load secrets and require the Google API key
//! 4. Build the Gemini gateway and the speech recognizer
//! 5. Serve the guide page and API

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use guide_api::AppState;
use guide_core::secrets::API_KEY_NAME;
use guide_core::{GuideConfig, GuideError, SecretStore};
use guide_gateway::{GeminiConfig, GeminiGateway};
use guide_speech::GoogleSpeechRecognizer;

use cli::CliArgs;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Config is read before tracing exists; its outcome is logged below.
    let config_path = args.resolve_config_path();
    let loaded = GuideConfig::load(&config_path);
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => GuideConfig::default(),
    };
    config.general.port = args.resolve_port(config.general.port);
    config.general.host = args.resolve_host(&config.general.host);
    config.general.log_level = args.resolve_log_level(&config.general.log_level);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting museum guide v{}", env!("CARGO_PKG_VERSION"));
    match loaded {
        Ok(_) => tracing::info!(path = %config_path.display(), "Configuration loaded"),
        Err(e) => tracing::warn!(
            path = %config_path.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
    }

    match run(&args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &CliArgs, config: GuideConfig) -> Result<(), GuideError> {
    let secrets_path = args.resolve_secrets_path(&config.secrets.path);
    let secrets = SecretStore::load(&secrets_path, &[API_KEY_NAME]);
    let api_key = secrets.require(API_KEY_NAME)?;

    let gateway = GeminiGateway::new(GeminiConfig::new(
        api_key.clone(),
        &config.model,
        &config.facts,
    ))
    .map_err(|e| GuideError::Config(e.to_string()))?;
    let speech = GoogleSpeechRecognizer::new(&config.voice, api_key)
        .map_err(|e| GuideError::Config(e.to_string()))?;

    let server_config = config.clone();
    let state = AppState::new(config, Arc::new(gateway), Arc::new(speech));
    tracing::info!(
        "Guide page at http://{}:{}/",
        server_config.general.host,
        server_config.general.port
    );

    guide_api::start_server(&server_config, state).await
}
