//! `clickmon status`: show the effective configuration.

use clickmon_config::AppConfig;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Clickmon Status");
    println!("===============");
    println!("  Config dir:     {}", AppConfig::config_dir().display());
    println!("  Provider:       {}", config.default_provider);
    println!("  Model:          {}", clickmon_providers::router::default_model(&config));
    println!("  Temperature:    {}", config.default_temperature);
    println!("  LLM API key:    {}", set_or_missing(config.api_key.is_some()));
    println!("  ClickUp API:    {}", config.clickup.base_url);
    println!("  ClickUp token:  {}", set_or_missing(config.has_clickup_token()));
    println!("  Marker:         {}", config.monitor.marker);
    println!("  Poll interval:  {}s", config.monitor.poll_interval_secs);
    println!("  Fallbacks:      {:?}", config.monitor.fallback_policy);
    println!("  Duplicates:     {:?}", config.monitor.duplicate_sessions);
    println!("  Gateway:        {}:{}", config.gateway.host, config.gateway.port);

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file, using defaults (see `clickmon config`)");
    }

    Ok(())
}

fn set_or_missing(set: bool) -> &'static str {
    if set { "set" } else { "missing" }
}
