use crate::cli::args::{ConfigArgs, ConfigCommand};
use crate::config::{Config, CONFIG_KEYS};
use crate::error::Result;

/// Execute config command
pub fn execute(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            println!("✅ Configuration updated: {} = {}", key, display_value(&key, &value));
        }
        ConfigCommand::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{}: {}", key, display_value(&key, &value)),
                None => println!("Configuration key '{}' not found", key),
            }
        }
        ConfigCommand::List => {
            let config = Config::load()?;
            for key in CONFIG_KEYS {
                let value = config
                    .get(key)
                    .map(|v| display_value(key, &v))
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<22} {}", key, value);
            }
        }
        ConfigCommand::Path => {
            println!("Configuration file: {}", Config::config_file_path()?.display());
        }
        ConfigCommand::Init => {
            let path = Config::config_file_path()?;
            if !path.exists() {
                Config::default().save_to(&path)?;
            }
            println!("✅ Configuration initialized at {}", path.display());
            println!();
            println!("To set your API key, run:");
            println!("  warp config set law.key YOUR_API_KEY");
            println!();
            println!("Get your API key from: https://open.law.go.kr");
        }
    }
    Ok(())
}

/// Keys are masked; other settings print as is
fn display_value(key: &str, value: &str) -> String {
    if key.ends_with(".key") {
        mask_value(value)
    } else {
        value.to_string()
    }
}

fn mask_value(value: &str) -> String {
    let count = value.chars().count();
    if count > 4 {
        let shown: String = value.chars().take(4).collect();
        format!("{}{} ({} characters)", shown, "*".repeat(count - 4), count)
    } else {
        "*".repeat(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_value() {
        assert_eq!(mask_value("abcdefgh"), "abcd**** (8 characters)");
        assert_eq!(mask_value("abc"), "***");
        assert_eq!(display_value("api.timeout", "30"), "30");
        assert_eq!(display_value("law.nlic.key", "secret-key"), "secr****** (10 characters)");
    }
}
