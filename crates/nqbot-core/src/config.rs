use std::{env, fs, path::Path};

use crate::{errors::Error, Result};

/// Typed configuration, loaded from the environment (with an optional local
/// `.env` file).
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    pub database_url: String,
    pub health_port: u16,
}

const DEFAULT_DATABASE_URL: &str = "sqlite://data/nqbot.db";

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        // The bot token is the only required variable; everything else has a
        // workable default.
        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let database_url =
            env_str("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        if database_url == DEFAULT_DATABASE_URL {
            fs::create_dir_all("data")
                .map_err(|e| Error::Config(format!("cannot create data directory: {e}")))?;
        }

        let health_port = env_u16("HEALTH_PORT").unwrap_or(5000);

        Ok(Self {
            telegram_bot_token,
            database_url,
            health_port,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u16(key: &str) -> Option<u16> {
    env_str(key).and_then(|v| v.trim().parse::<u16>().ok())
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}
