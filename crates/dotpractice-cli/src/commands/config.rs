use clap::Subcommand;
use dotpractice_core::Config;

use super::CliResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting
    Get {
        /// Dotted key: session.poll_interval_ms, session.immersive,
        /// session.countdown or log.filter
        key: String,
    },
    /// Change one setting and save
    Set {
        /// Dotted key, as for `get`
        key: String,
        /// New value, parsed as the setting's type
        value: String,
    },
    /// Print every setting as `key = value`
    List {
        /// Print the raw TOML file instead
        #[arg(long)]
        toml: bool,
    },
    /// Restore the default settings
    Reset,
}

/// Every leaf of the config as a dotted key and its display value.
fn settings(config: &Config) -> Result<Vec<(String, String)>, serde_json::Error> {
    fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
        match value {
            serde_json::Value::Object(fields) => {
                for (name, child) in fields {
                    let key = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{prefix}.{name}")
                    };
                    walk(&key, child, out);
                }
            }
            serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
            other => out.push((prefix.to_string(), other.to_string())),
        }
    }

    let mut out = Vec::new();
    walk("", &serde_json::to_value(config)?, &mut out);
    Ok(out)
}

pub fn run(action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    let known: Vec<String> =
                        settings(&config)?.into_iter().map(|(k, _)| k).collect();
                    return Err(
                        format!("unknown key: {key} (known: {})", known.join(", ")).into(),
                    );
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("{key} = {}", config.get(&key).unwrap_or(value));
        }
        ConfigAction::List { toml } => {
            let config = Config::load()?;
            if toml {
                print!("{}", toml::to_string_pretty(&config)?);
            } else {
                for (key, value) in settings(&config)? {
                    println!("{key} = {value}");
                }
            }
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
