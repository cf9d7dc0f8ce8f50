use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Datelike, Utc};
use serde::{Deserialize, de::DeserializeOwned};

const DEFAULT_FPL_BOOTSTRAP_URL: &str = "https://fantasy.premierleague.com/api/bootstrap-static/";
const DEFAULT_FBREF_STATS_URL: &str = "https://fbref.com/en/comps/9/Premier-League-Stats";
const DEFAULT_FPL_HISTORIC_BASE_URL: &str =
    "https://raw.githubusercontent.com/vaastav/Fantasy-Premier-League/master/data";
const DEFAULT_DATA_DIR: &str = "data/raw";

/// The env vars recognised by the collector. Every one of them is optional.
#[derive(Debug, Deserialize)]
struct CollectorEnv {
    season_year: Option<i32>,
    fpl_bootstrap_url: Option<String>,
    fbref_stats_url: Option<String>,
    fpl_historic_base_url: Option<String>,
    data_dir: Option<String>,
    scout_player_limit: Option<usize>,
}

#[derive(Debug)]
pub struct CollectorConfig {
    pub season_year: i32,
    pub fpl_bootstrap_url: String,
    fbref_stats_url: String,
    fpl_historic_base_url: String,
    data_dir: PathBuf,
    pub scout_player_limit: Option<usize>,
}

impl CollectorConfig {
    pub fn new() -> anyhow::Result<Self> {
        let env = CollectorEnv::load_from_env()?;
        Ok(Self::from_env(env))
    }

    fn from_env(env: CollectorEnv) -> Self {
        Self {
            season_year: env.season_year.unwrap_or_else(|| Utc::now().year()),
            fpl_bootstrap_url: env
                .fpl_bootstrap_url
                .unwrap_or_else(|| DEFAULT_FPL_BOOTSTRAP_URL.to_string()),
            fbref_stats_url: env
                .fbref_stats_url
                .unwrap_or_else(|| DEFAULT_FBREF_STATS_URL.to_string()),
            fpl_historic_base_url: env
                .fpl_historic_base_url
                .unwrap_or_else(|| DEFAULT_FPL_HISTORIC_BASE_URL.to_string()),
            data_dir: PathBuf::from(env.data_dir.unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())),
            scout_player_limit: env.scout_player_limit,
        }
    }

    /// The FBRef stats page for the configured season. A literal `year` in
    /// the configured URL is substituted with the season year.
    pub fn fbref_stats_url_for_season(&self) -> String {
        self.fbref_stats_url
            .replace("year", &self.season_year.to_string())
    }

    /// Season directory name used by the historic FPL archive, e.g. season
    /// year 2026 becomes "2025-26".
    pub fn historic_season_label(&self) -> String {
        format!("{}-{}", self.season_year - 1, self.season_year - 2000)
    }

    pub fn historic_players_url(&self) -> String {
        format!(
            "{}/{}/cleaned_players.csv",
            self.fpl_historic_base_url.trim_end_matches('/'),
            self.historic_season_label()
        )
    }

    pub fn raw_path(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenv::dotenv();
        let config =
            envy::from_env::<Self>().context("failed to load env variables into config struct")?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for_year(season_year: i32) -> CollectorConfig {
        CollectorConfig::from_env(CollectorEnv {
            season_year: Some(season_year),
            fpl_bootstrap_url: None,
            fbref_stats_url: None,
            fpl_historic_base_url: None,
            data_dir: None,
            scout_player_limit: None,
        })
    }

    #[test]
    fn defaults_fill_every_field() {
        let config = config_for_year(2026);
        assert_eq!(config.fpl_bootstrap_url, DEFAULT_FPL_BOOTSTRAP_URL);
        assert_eq!(config.fbref_stats_url, DEFAULT_FBREF_STATS_URL);
        assert_eq!(config.raw_path("fpl_player.csv"), PathBuf::from("data/raw/fpl_player.csv"));
        assert_eq!(config.scout_player_limit, None);
    }

    #[test]
    fn historic_season_label_matches_archive_layout() {
        assert_eq!(config_for_year(2026).historic_season_label(), "2025-26");
        assert_eq!(config_for_year(2023).historic_season_label(), "2022-23");
    }

    #[test]
    fn historic_players_url_joins_base_label_and_file() {
        let mut config = config_for_year(2026);
        config.fpl_historic_base_url = "https://example.com/data/".to_string();
        assert_eq!(
            config.historic_players_url(),
            "https://example.com/data/2025-26/cleaned_players.csv"
        );
    }

    #[test]
    fn fbref_url_year_placeholder_is_substituted() {
        let mut config = config_for_year(2026);
        config.fbref_stats_url = "https://fbref.com/en/comps/9/year/stats".to_string();
        assert_eq!(
            config.fbref_stats_url_for_season(),
            "https://fbref.com/en/comps/9/2026/stats"
        );
    }

    #[test]
    fn fbref_url_without_placeholder_is_unchanged() {
        let config = config_for_year(2026);
        assert_eq!(config.fbref_stats_url_for_season(), DEFAULT_FBREF_STATS_URL);
    }
}
