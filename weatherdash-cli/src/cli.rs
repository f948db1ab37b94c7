use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{InquireError, Password, Select, Text};
use weatherdash_core::{
    Config, FileCache, LocationCache, MemoryCache, TemperatureUnit, VisualCrossingFetcher,
    WeatherSession, provider::fetcher_from_config,
};

use crate::render;

type Session = WeatherSession<VisualCrossingFetcher, dyn LocationCache>;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherdash", version, about = "Terminal weather dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the provider API key and display preferences.
    Configure,

    /// Show the dashboard for a location.
    Show {
        /// Location exactly as the provider should resolve it, e.g. "Manila".
        location: String,

        /// Display unit: "c" or "f". Defaults to the configured unit.
        #[arg(long)]
        unit: Option<String>,

        /// Ignore any cached snapshot and fetch fresh data.
        #[arg(long)]
        refresh: bool,

        /// Keep snapshots in memory only for this run.
        #[arg(long)]
        no_cache: bool,
    },

    /// Search repeatedly; `:u` toggles the unit, `:r` refreshes, `:q` quits.
    Interactive {
        #[arg(long)]
        unit: Option<String>,

        /// Location to load before the first prompt. Defaults to the configured one.
        #[arg(long)]
        location: Option<String>,
    },

    /// Manage the location cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Delete every cached snapshot.
    Clear,
}

/// What a line typed at the interactive prompt means.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Search(String),
    ToggleUnit,
    Refresh,
    Quit,
    Nothing,
}

impl Input {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Input::Nothing,
            ":u" => Input::ToggleUnit,
            ":r" => Input::Refresh,
            ":q" => Input::Quit,
            // Blank-checked above, but the location itself is passed untrimmed.
            _ => Input::Search(line.to_string()),
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { location, unit, refresh, no_cache } => {
                let config = Config::load()?;
                let unit = resolve_unit(unit.as_deref(), &config)?;
                let session = build_session(&config, no_cache)?;

                let ticket = if refresh {
                    session.request_uncached(location)
                } else {
                    session.request(location)
                };
                session.resolve(ticket).await;

                let state = session.state();
                print!("{}", render::dashboard(&state, unit));

                // The dashboard already shows the fixed message; details stay in the logs.
                match state.error {
                    Some(err) => Err(anyhow::anyhow!(err.user_message())),
                    None => Ok(()),
                }
            }
            Command::Interactive { unit, location } => {
                let config = Config::load()?;
                let unit = resolve_unit(unit.as_deref(), &config)?;
                let seed = initial_location(location, &config);
                let session = build_session(&config, false)?;
                interactive(&session, unit, seed).await
            }
            Command::Cache { action: CacheAction::Clear } => {
                let config = Config::load()?;
                let cache = FileCache::new(&config.cache_dir()?);
                cache.clear()?;
                println!("Cleared {}", cache.path().display());
                Ok(())
            }
        }
    }
}

fn resolve_unit(flag: Option<&str>, config: &Config) -> anyhow::Result<TemperatureUnit> {
    flag.map(TemperatureUnit::try_from).transpose().map(|u| u.unwrap_or(config.default_unit))
}

fn initial_location(flag: Option<String>, config: &Config) -> Option<String> {
    flag.or_else(|| config.default_location.clone()).filter(|l| !l.trim().is_empty())
}

fn build_session(config: &Config, no_cache: bool) -> anyhow::Result<Session> {
    let fetcher = Arc::new(fetcher_from_config(config)?);
    let cache: Arc<dyn LocationCache> = if no_cache {
        Arc::new(MemoryCache::new())
    } else {
        Arc::new(FileCache::new(&config.cache_dir()?))
    };

    Ok(WeatherSession::new(fetcher, cache, config.cache_policy()))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("Visual Crossing API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key.trim().to_string());

    let units = vec![TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit];
    let start = units.iter().position(|u| *u == config.default_unit).unwrap_or(0);
    config.default_unit = Select::new("Default unit:", units)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read default unit")?;

    config.save()?;
    println!("Saved {}", Config::config_file_path()?.display());
    Ok(())
}

async fn prompt_line() -> anyhow::Result<Option<String>> {
    let answer = tokio::task::spawn_blocking(|| {
        Text::new("Location:").with_help_message(":u unit  :r refresh  :q quit").prompt()
    })
    .await?;

    match answer {
        Ok(line) => Ok(Some(line)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

async fn interactive(
    session: &Session,
    mut unit: TemperatureUnit,
    seed: Option<String>,
) -> anyhow::Result<()> {
    if let Some(location) = seed {
        session.set_location(location).await;
        println!("{}", render::dashboard(&session.state(), unit));
    }

    while let Some(line) = prompt_line().await? {
        match Input::parse(&line) {
            Input::Quit => break,
            Input::Nothing => continue,
            Input::ToggleUnit => unit = unit.toggle(),
            Input::Refresh => session.refresh().await,
            Input::Search(location) => session.set_location(location).await,
        }

        println!("{}", render::dashboard(&session.state(), unit));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prompt_commands() {
        assert_eq!(Input::parse(":u"), Input::ToggleUnit);
        assert_eq!(Input::parse(" :q "), Input::Quit);
        assert_eq!(Input::parse(":r"), Input::Refresh);
        assert_eq!(Input::parse("   "), Input::Nothing);
    }

    #[test]
    fn search_keeps_location_verbatim() {
        assert_eq!(Input::parse("Cebu City "), Input::Search("Cebu City ".into()));
    }

    #[test]
    fn unit_flag_overrides_config() {
        let mut config = Config::default();
        config.default_unit = TemperatureUnit::Fahrenheit;

        assert_eq!(resolve_unit(None, &config).unwrap(), TemperatureUnit::Fahrenheit);
        assert_eq!(resolve_unit(Some("c"), &config).unwrap(), TemperatureUnit::Celsius);
        assert!(resolve_unit(Some("k"), &config).is_err());
    }

    #[test]
    fn interactive_seed_prefers_flag_over_config() {
        let mut config = Config::default();
        assert_eq!(initial_location(None, &config), None);

        config.default_location = Some("Philippines".into());
        assert_eq!(initial_location(None, &config).as_deref(), Some("Philippines"));
        assert_eq!(initial_location(Some("Cebu".into()), &config).as_deref(), Some("Cebu"));
        assert_eq!(initial_location(Some("  ".into()), &Config::default()), None);
    }

    #[test]
    fn cli_parses_interactive_location() {
        let cli = Cli::parse_from(["weatherdash", "interactive", "--location", "Manila"]);

        match cli.command {
            Command::Interactive { location, unit } => {
                assert_eq!(location.as_deref(), Some("Manila"));
                assert_eq!(unit, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_parses_show() {
        let cli = Cli::parse_from(["weatherdash", "show", "Manila", "--unit", "f", "--refresh"]);

        match cli.command {
            Command::Show { location, unit, refresh, no_cache } => {
                assert_eq!(location, "Manila");
                assert_eq!(unit.as_deref(), Some("f"));
                assert!(refresh);
                assert!(!no_cache);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
