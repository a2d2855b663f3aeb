use chat_relay::{RelayConfig, server, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = telemetry::init_from_env()?;

    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid relay configuration");
            return Err(e.into());
        }
    };

    server::serve(config).await?;
    Ok(())
}
