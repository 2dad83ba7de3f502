//! `cachet init`: write a default node configuration.

use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (defaults to current directory).
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

const DEFAULT_CONFIG: &str = r#"# Cachet Node Configuration

[api]
listen_addr = "127.0.0.1"
port = 9101

[storage]
data_dir = "./data"

[logging]
level = "info"
format = "text"

[resolver]
remote_fetch = true

[engine]
history_capacity = 100
resolution_timeout_ms = 5000
resolver_cache_ttl_secs = 300
default_web_domain = "example.com"
default_web_segment = "users"
"#;

pub fn run(args: &InitArgs) -> anyhow::Result<()> {
    let config_path = args.dir.join("cachet.toml");

    if config_path.exists() {
        anyhow::bail!("configuration file already exists at {}", config_path.display());
    }

    std::fs::create_dir_all(&args.dir)?;
    std::fs::write(&config_path, DEFAULT_CONFIG)?;
    std::fs::create_dir_all(args.dir.join("data"))?;

    println!("Initialized Cachet node at {}", config_path.display());
    println!("Edit cachet.toml to customize your configuration.");
    println!("Run 'cachet-node --config {}' to start the node.", config_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_engine_defaults() {
        let table: toml::Table = toml::from_str(DEFAULT_CONFIG).unwrap();
        let engine: cachet_core::EngineConfig = table["engine"].clone().try_into().unwrap();
        assert_eq!(engine, cachet_core::EngineConfig::default());
        assert_eq!(table["api"]["port"].as_integer(), Some(9101));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = std::env::temp_dir().join(format!("cachet-cli-init-{}", std::process::id()));
        let args = InitArgs { dir: dir.clone() };
        run(&args).unwrap();
        assert!(dir.join("cachet.toml").exists());
        assert!(run(&args).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
