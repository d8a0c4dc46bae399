//! vgsales - Main Entry Point
//!
//! Serves the sales analytics and prediction API, and queries it from the terminal.

use clap::Parser;
use vgsales::cli::{cmd_explore, cmd_filters, cmd_health, cmd_predict, cmd_preprocess, cmd_serve, Cli, Commands};
use vgsales::server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vgsales=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port, host, data, encoder, model }) => {
            let defaults = ServerConfig::default();
            let config = ServerConfig {
                host: host.unwrap_or(defaults.host),
                port: port.unwrap_or(defaults.port),
                data_path: data.unwrap_or(defaults.data_path),
                encoder_path: encoder.unwrap_or(defaults.encoder_path),
                model_path: model.unwrap_or(defaults.model_path),
                cors_origin: defaults.cors_origin,
            };
            cmd_serve(config).await?;
        }
        Some(Commands::Health { api }) => {
            cmd_health(&api).await?;
        }
        Some(Commands::Filters { api }) => {
            cmd_filters(&api).await?;
        }
        Some(Commands::Explore { api, genres, start, end }) => {
            cmd_explore(&api, genres, start, end).await?;
        }
        Some(Commands::Predict {
            api,
            platform,
            genre,
            rating_esrb,
            gen_platform,
            classification_user_score,
            year,
            user_score,
            critic_score,
        }) => {
            cmd_predict(
                &api,
                platform,
                genre,
                rating_esrb,
                gen_platform,
                classification_user_score,
                year,
                user_score,
                critic_score,
            )
            .await?;
        }
        Some(Commands::Preprocess { input, output }) => {
            cmd_preprocess(&input, &output)?;
        }
        None => {
            cmd_serve(ServerConfig::default()).await?;
        }
    }

    Ok(())
}
