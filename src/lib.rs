mod collect_context;
mod config;
mod ratelimit;
mod requests;
mod table;
mod text_manipulators;

mod fbref_scout_scraper;
mod fbref_team_scraper;
mod fpl_scraper;
mod historic_scraper;

pub use collect_context::CollectContext;
pub use config::CollectorConfig;
pub use fbref_scout_scraper::FbrefScoutScraper;
pub use fbref_team_scraper::FbrefTeamScraper;
pub use fpl_scraper::FplScraper;
pub use historic_scraper::HistoricFplScraper;
pub use requests::RequestClient;
pub use table::Table;
