//! `clickmon config`: print the default configuration or its path.

use clickmon_config::AppConfig;

pub fn run(path_only: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path_only {
        println!("{}", config_path().display());
    } else {
        print!("{}", AppConfig::default_toml());
    }
    Ok(())
}

fn config_path() -> std::path::PathBuf {
    AppConfig::config_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn config_path_is_valid() {
        assert!(config_path().ends_with(".clickmon/config.toml"));
    }

    #[test]
    fn printed_defaults_parse_back() {
        let config: AppConfig = toml_roundtrip(&AppConfig::default_toml());
        assert_eq!(config.monitor.marker, "@AI");
        assert_eq!(config.gateway.port, 8000);
    }

    fn toml_roundtrip(text: &str) -> AppConfig {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        AppConfig::load_from(file.path()).unwrap()
    }
}
