use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use storage::services::{FormulaChoice, LinearPoints, RecalculationConfig};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub formula: FormulaChoice,
    pub points: LinearPoints,
    pub recalculation: RecalculationConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = LinearPoints::default();
        let recalculation = RecalculationConfig::default();

        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("PORT must be a number")?
                .parse()?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            formula: match std::env::var("POINTS_FORMULA") {
                Ok(value) => value.parse::<FormulaChoice>().map_err(anyhow::Error::msg)?,
                Err(_) => FormulaChoice::default(),
            },
            points: LinearPoints {
                winner: env_or("POINTS_WINNER", defaults.winner)?,
                step: env_or("POINTS_STEP", defaults.step)?,
                floor: env_or("POINTS_FLOOR", defaults.floor)?,
            },
            recalculation: RecalculationConfig {
                max_attempts: env_or("RECALC_MAX_ATTEMPTS", recalculation.max_attempts)?,
                initial_backoff: Duration::from_millis(env_or(
                    "RECALC_BACKOFF_MS",
                    recalculation.initial_backoff.as_millis() as u64,
                )?),
                ..recalculation
            },
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", key, value)),
        Err(_) => Ok(default),
    }
}
