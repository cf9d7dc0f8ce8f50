use log::{info, warn};
use regex::Regex;
use scraper::{Html, Selector};

use crate::{
    fbref_team_scraper::unhide_commented_tables,
    requests::RequestClient,
    table::Table,
    text_manipulators::{absolute_fbref_url, clean_cell, extract_text},
};

const SCOUT_COLUMNS: [&str; 4] = ["Player", "Statistic", "Per90", "Percentile"];

/// One player's scouting-report page.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoutReportScraper {
    pub player: String,
    pub url: String,
}

/// Two-stage scrape: collect scouting-report links off the season stats
/// page, then pull each report and stack the rows into one table. The
/// report pages are where FBRef rate-limits hardest, so everything goes
/// through the shared retrying client.
#[derive(Debug, Default)]
pub struct FbrefScoutScraper {
    pub index_url: String,
    pub player_limit: Option<usize>,
    pub reports: Vec<ScoutReportScraper>,
    pub scout: Option<Table>,
}

impl FbrefScoutScraper {
    pub fn new(index_url: String, player_limit: Option<usize>) -> Self {
        FbrefScoutScraper {
            index_url,
            player_limit,
            ..Default::default()
        }
    }

    pub async fn scrape(&mut self, client: &RequestClient) -> anyhow::Result<()> {
        info!("Collecting scouting report links from {}", self.index_url);
        let html = client.fetch_url_body(&self.index_url).await?;
        self.reports = collect_report_links(&html, self.player_limit);
        info!("Found {} scouting reports to fetch", self.reports.len());

        let mut scout = Table::new(SCOUT_COLUMNS.iter().map(|c| c.to_string()).collect());
        for report in &self.reports {
            let html = match client.fetch_url_body(&report.url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("could not fetch scouting report for {}: {e:#}", report.player);
                    continue;
                }
            };
            let rows = parse_scout_rows(&html);
            if rows.is_empty() {
                warn!("no scouting table on report page for {}", report.player);
                continue;
            }
            for (statistic, per90, percentile) in rows {
                scout
                    .rows
                    .push(vec![report.player.clone(), statistic, per90, percentile]);
            }
        }

        self.scout = Some(scout);
        Ok(())
    }
}

/// Player cells link to "/en/players/{id}/{Name-Slug}"; the 365-day
/// scouting report lives at a sibling path derived from id and slug.
pub(crate) fn collect_report_links(html: &str, limit: Option<usize>) -> Vec<ScoutReportScraper> {
    // The player-link tables sit inside comment wrappers like every other
    // FBRef stats table.
    let document = Html::parse_document(&unhide_commented_tables(html));
    let player_cell_selector = Selector::parse("td[data-stat=\"player\"] a").unwrap();
    let player_href = Regex::new(r"^/en/players/([0-9a-f]{8})/([^/]+)$").unwrap();

    let mut reports = Vec::new();
    for anchor in document.select(&player_cell_selector) {
        if limit.is_some_and(|l| reports.len() >= l) {
            break;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(caps) = player_href.captures(href) else {
            continue;
        };
        let url = absolute_fbref_url(&format!(
            "/en/players/{}/scout/365_m1/{}-Scouting-Report",
            &caps[1], &caps[2]
        ));
        let report = ScoutReportScraper {
            player: clean_cell(&extract_text(anchor)),
            url,
        };
        if !reports.contains(&report) {
            reports.push(report);
        }
    }
    reports
}

/// Rows of the scouting table: (statistic, per-90 value, percentile).
pub(crate) fn parse_scout_rows(html: &str) -> Vec<(String, String, String)> {
    let document = Html::parse_document(&unhide_commented_tables(html));
    let row_selector = Selector::parse("table[id^=\"scout\"] tbody tr").unwrap();
    let statistic_selector = Selector::parse("th[data-stat=\"statistic\"]").unwrap();
    let per90_selector = Selector::parse("td[data-stat=\"per90\"]").unwrap();
    let percentile_selector = Selector::parse("td[data-stat=\"percentile\"]").unwrap();

    let mut rows = Vec::new();
    for row in document.select(&row_selector) {
        let Some(statistic) = row.select(&statistic_selector).next() else {
            continue;
        };
        let statistic = clean_cell(&extract_text(statistic));
        // Section divider rows repeat the header with no values.
        if statistic.is_empty() || statistic == "Statistic" {
            continue;
        }
        let per90 = row
            .select(&per90_selector)
            .next()
            .map(|c| clean_cell(&extract_text(c)))
            .unwrap_or_default();
        let percentile = row
            .select(&percentile_selector)
            .next()
            .map(|c| clean_cell(&extract_text(c)))
            .unwrap_or_default();
        rows.push((statistic, per90, percentile));
    }
    rows
}
