//! `clickmon serve`: start the HTTP control surface.

use clickmon_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Clickmon Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Provider:  {} ({})", config.default_provider, config.default_model);
    if !config.has_clickup_token() {
        println!("   Warning:   no ClickUp token (set CLICKUP_API_TOKEN)");
    }

    clickmon_gateway::start(config).await?;

    Ok(())
}
