use anyhow::Context;
use log::info;
use serde_json::Value;

use crate::{requests::RequestClient, table::Table};

/// Pulls the FPL `bootstrap-static` payload apart into the three record
/// arrays the analysis pipeline wants: players, teams and positions.
#[derive(Debug, Default)]
pub struct FplScraper {
    pub url: String,
    pub players: Option<Table>,
    pub teams: Option<Table>,
    pub positions: Option<Table>,
}

impl FplScraper {
    pub fn new(url: String) -> Self {
        FplScraper {
            url,
            ..Default::default()
        }
    }

    pub async fn scrape(&mut self, client: &RequestClient) -> anyhow::Result<()> {
        info!("Collecting FPL bootstrap data from {}", self.url);
        let bootstrap: Value = client.fetch_json(&self.url).await?;

        self.players = Some(section_table(&bootstrap, "elements")?);
        self.teams = Some(section_table(&bootstrap, "teams")?);
        self.positions = Some(section_table(&bootstrap, "element_types")?);
        info!(
            "FPL bootstrap parsed: {} players, {} teams, {} positions",
            self.players.as_ref().map_or(0, |t| t.rows.len()),
            self.teams.as_ref().map_or(0, |t| t.rows.len()),
            self.positions.as_ref().map_or(0, |t| t.rows.len()),
        );
        Ok(())
    }
}

fn section_table(bootstrap: &Value, section: &str) -> anyhow::Result<Table> {
    let records = bootstrap
        .get(section)
        .and_then(Value::as_array)
        .with_context(|| format!("FPL bootstrap response has no '{section}' array"))?;
    Ok(Table::from_json_records(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sections_become_tables() {
        let bootstrap = json!({
            "elements": [{"id": 1, "web_name": "Saka", "team": 1}],
            "teams": [{"id": 1, "name": "Arsenal"}],
            "element_types": [{"id": 3, "singular_name": "Midfielder"}],
        });
        let players = section_table(&bootstrap, "elements").unwrap();
        assert_eq!(players.columns, vec!["id", "web_name", "team"]);
        assert_eq!(players.rows, vec![vec!["1", "Saka", "1"]]);

        let positions = section_table(&bootstrap, "element_types").unwrap();
        assert_eq!(positions.rows[0][1], "Midfielder");
    }

    #[test]
    fn missing_section_names_itself_in_the_error() {
        let bootstrap = json!({"teams": []});
        let err = section_table(&bootstrap, "elements").unwrap_err();
        assert!(err.to_string().contains("elements"));
    }

    #[test]
    fn non_array_section_is_an_error() {
        let bootstrap = json!({"elements": {"id": 1}});
        assert!(section_table(&bootstrap, "elements").is_err());
    }
}
