use log::info;

use crate::{
    requests::RequestClient,
    table::{Table, table_from_csv_text},
};

/// Downloads the GitHub-hosted historic FPL archive's cleaned player file
/// for one season and re-emits it as a normalized local CSV.
#[derive(Debug, Default)]
pub struct HistoricFplScraper {
    pub url: String,
    pub table: Option<Table>,
}

impl HistoricFplScraper {
    pub fn new(url: String) -> Self {
        HistoricFplScraper {
            url,
            ..Default::default()
        }
    }

    pub async fn scrape(&mut self, client: &RequestClient) -> anyhow::Result<()> {
        info!("Fetching historic FPL archive from {}", self.url);
        let body = client.fetch_url_body(&self.url).await?;
        let table = table_from_csv_text(&body)?;
        info!("Historic archive parsed: {} player rows", table.rows.len());
        self.table = Some(table);
        Ok(())
    }
}
