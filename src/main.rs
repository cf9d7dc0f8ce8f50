use std::process::ExitCode;

use anyhow::Context;
use dotenv::dotenv;
use fplscrape::{
    CollectContext, FbrefScoutScraper, FbrefTeamScraper, FplScraper, HistoricFplScraper, Table,
};
use log::{LevelFilter, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Job {
    Fpl,
    Fbref,
    Scout,
    Historic,
}

impl Job {
    const ALL: [Job; 4] = [Job::Fpl, Job::Fbref, Job::Scout, Job::Historic];

    fn name(self) -> &'static str {
        match self {
            Job::Fpl => "fpl",
            Job::Fbref => "fbref",
            Job::Scout => "scout",
            Job::Historic => "historic",
        }
    }

    fn from_name(name: &str) -> Option<Job> {
        Job::ALL.into_iter().find(|job| job.name() == name)
    }
}

/// Job names from argv; no args means run everything.
fn selected_jobs(args: impl Iterator<Item = String>) -> anyhow::Result<Vec<Job>> {
    let mut jobs = Vec::new();
    for arg in args {
        let job = Job::from_name(&arg)
            .with_context(|| format!("unknown job '{arg}' (expected fpl, fbref, scout or historic)"))?;
        if !jobs.contains(&job) {
            jobs.push(job);
        }
    }
    if jobs.is_empty() {
        jobs.extend(Job::ALL);
    }
    Ok(jobs)
}

fn persist(table: &Table, context: &CollectContext, file_name: &str) -> anyhow::Result<()> {
    let path = context.config.raw_path(file_name);
    table.write_csv(&path)?;
    info!("Wrote {} rows to {}", table.rows.len(), path.display());
    Ok(())
}

async fn run_fpl_job(context: &CollectContext) -> anyhow::Result<()> {
    let mut scraper = FplScraper::new(context.config.fpl_bootstrap_url.clone());
    scraper.scrape(&context.request_client).await?;

    let players = scraper.players.context("FPL players missing after scrape")?;
    let teams = scraper.teams.context("FPL teams missing after scrape")?;
    let positions = scraper.positions.context("FPL positions missing after scrape")?;
    persist(&players, context, "fpl_player.csv")?;
    persist(&teams, context, "fpl_team.csv")?;
    persist(&positions, context, "fpl_pos.csv")?;
    Ok(())
}

async fn run_fbref_job(context: &CollectContext) -> anyhow::Result<()> {
    let mut scraper = FbrefTeamScraper::new(context.config.fbref_stats_url_for_season());
    scraper.scrape(&context.request_client).await?;

    let squad = scraper.squad.context("squad table missing after scrape")?;
    persist(&squad, context, "fbref_squad.csv")?;
    match scraper.opponents {
        Some(opponents) => persist(&opponents, context, "fbref_opponents.csv")?,
        None => warn!("season page had no opponent tables, fbref_opponents.csv not written"),
    }
    Ok(())
}

async fn run_scout_job(context: &CollectContext) -> anyhow::Result<()> {
    let mut scraper = FbrefScoutScraper::new(
        context.config.fbref_stats_url_for_season(),
        context.config.scout_player_limit,
    );
    scraper.scrape(&context.request_client).await?;

    let scout = scraper.scout.context("scout table missing after scrape")?;
    if scout.is_empty() {
        warn!("no scouting rows collected");
    }
    persist(&scout, context, "fbref_scout.csv")?;
    Ok(())
}

async fn run_historic_job(context: &CollectContext) -> anyhow::Result<()> {
    let mut scraper = HistoricFplScraper::new(context.config.historic_players_url());
    scraper.scrape(&context.request_client).await?;

    let table = scraper.table.context("historic table missing after scrape")?;
    persist(&table, context, "historic_fpl.csv")?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let jobs = match selected_jobs(std::env::args().skip(1)) {
        Ok(jobs) => jobs,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let context = match CollectContext::new() {
        Ok(context) => context,
        Err(e) => {
            error!("could not initialise collector: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    info!(
        "Collecting for season year {} into {}",
        context.config.season_year,
        context.config.data_dir().display()
    );

    // Jobs are independent; one failing should not starve the others.
    let mut any_failed = false;
    for job in jobs {
        let result = match job {
            Job::Fpl => run_fpl_job(&context).await,
            Job::Fbref => run_fbref_job(&context).await,
            Job::Scout => run_scout_job(&context).await,
            Job::Historic => run_historic_job(&context).await,
        };
        match result {
            Ok(()) => info!("{} job finished", job.name()),
            Err(e) => {
                error!("{} job failed: {e:#}", job.name());
                any_failed = true;
            }
        }
    }

    if any_failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(names: &[&str]) -> impl Iterator<Item = String> {
        names
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn no_args_selects_every_job() {
        let jobs = selected_jobs(args(&[])).unwrap();
        assert_eq!(jobs, Job::ALL.to_vec());
    }

    #[test]
    fn named_jobs_run_once_each() {
        let jobs = selected_jobs(args(&["scout", "fpl", "scout"])).unwrap();
        assert_eq!(jobs, vec![Job::Scout, Job::Fpl]);
    }

    #[test]
    fn unknown_job_is_an_error() {
        assert!(selected_jobs(args(&["understat"])).is_err());
    }
}
