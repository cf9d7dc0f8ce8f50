use anyhow::bail;
use log::{info, warn};
use scraper::{ElementRef, Html, Selector};

use crate::{
    requests::RequestClient,
    table::Table,
    text_manipulators::{clean_cell, extract_text},
};

/// Scrapes every stats table off an FBRef season page and folds them into
/// a squad table and a vs-opponent table.
#[derive(Debug, Default)]
pub struct FbrefTeamScraper {
    pub url: String,
    pub squad: Option<Table>,
    pub opponents: Option<Table>,
}

impl FbrefTeamScraper {
    pub fn new(url: String) -> Self {
        FbrefTeamScraper {
            url,
            ..Default::default()
        }
    }

    pub async fn scrape(&mut self, client: &RequestClient) -> anyhow::Result<()> {
        info!("Scraping FBRef squad tables from {}", self.url);
        let html = client.fetch_url_body(&self.url).await?;
        let tables = parse_stats_tables(&html);
        info!("Found {} stats tables", tables.len());

        let (squad, opponents) = build_squad_tables(&tables)?;
        self.squad = Some(squad);
        self.opponents = opponents;
        Ok(())
    }
}

/// FBRef ships most stats tables inside HTML comments so they render lazily;
/// dropping the comment markers makes them visible to the parser.
pub(crate) fn unhide_commented_tables(html: &str) -> String {
    html.replace("<!--", "").replace("-->", "")
}

pub(crate) fn parse_stats_tables(html: &str) -> Vec<Table> {
    let document = Html::parse_document(&unhide_commented_tables(html));
    let table_selector = Selector::parse("table").unwrap();
    document
        .select(&table_selector)
        .map(parse_table)
        .filter(|t| !t.columns.is_empty())
        .collect()
}

fn parse_table(table: ElementRef) -> Table {
    let head_row_selector = Selector::parse("thead tr").unwrap();
    let body_row_selector = Selector::parse("tbody tr").unwrap();
    let cell_selector = Selector::parse("th, td").unwrap();

    let head_rows: Vec<ElementRef> = table.select(&head_row_selector).collect();
    let columns = match head_rows.as_slice() {
        [] => Vec::new(),
        [row] => row_cell_texts(*row, &cell_selector),
        // Two header rows: the first carries the stat-group names spanning
        // several columns, the second the column names proper. They merge
        // as "{group}_{column}", matching the raw CSVs the analysis reads.
        [.., over_row, column_row] => {
            let over = expand_spans(*over_row, &cell_selector);
            row_cell_texts(*column_row, &cell_selector)
                .into_iter()
                .enumerate()
                .map(|(i, column)| {
                    let group = over.get(i).cloned().unwrap_or_default();
                    format!("{group}_{column}")
                })
                .collect()
        }
    };

    let mut parsed = Table::new(columns);
    for row in table.select(&body_row_selector) {
        // FBRef repeats the header mid-table on long listings.
        if row.value().classes().any(|c| c == "thead" || c == "spacer") {
            continue;
        }
        parsed.rows.push(
            row.select(&cell_selector)
                .map(|cell| clean_cell(&extract_text(cell)))
                .collect(),
        );
    }
    parsed
}

fn row_cell_texts(row: ElementRef, cell_selector: &Selector) -> Vec<String> {
    row.select(cell_selector)
        .map(|cell| clean_cell(&extract_text(cell)))
        .collect()
}

/// Over-header cells spanning N columns repeat their name N times.
fn expand_spans(row: ElementRef, cell_selector: &Selector) -> Vec<String> {
    let mut expanded = Vec::new();
    for cell in row.select(cell_selector) {
        let span: usize = cell
            .value()
            .attr("colspan")
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);
        let text = clean_cell(&extract_text(cell));
        expanded.extend(std::iter::repeat_n(text, span));
    }
    expanded
}

/// The squad-name column is "Squad" on single-header tables and
/// "{blank group}_Squad" on merged two-header ones.
fn squad_key(table: &Table) -> Option<String> {
    table
        .columns
        .iter()
        .find(|c| *c == "Squad" || c.ends_with("_Squad"))
        .cloned()
}

/// Folds the page's tables the way the raw dataset is laid out: tables 0
/// and 1 glue together positionally as the squad seed, then the remainder
/// alternates squad/opponent, each joined on the squad name. Tables that
/// fail to join are logged and skipped.
pub(crate) fn build_squad_tables(tables: &[Table]) -> anyhow::Result<(Table, Option<Table>)> {
    let [first, second, rest @ ..] = tables else {
        bail!("expected at least two stats tables, found {}", tables.len());
    };

    let mut squad = first.merge_side_by_side(second);
    let mut opponents: Option<Table> = None;

    for (i, table) in rest.iter().enumerate() {
        let Some(right_key) = squad_key(table) else {
            warn!("stats table {i} has no squad column, skipping");
            continue;
        };
        if i % 2 == 0 {
            let Some(left_key) = squad_key(&squad) else {
                bail!("squad seed table has no squad column");
            };
            match squad.join_on(table, &left_key, &right_key) {
                Ok(joined) => squad = joined,
                Err(e) => warn!("skipping squad stats table {i}: {e}"),
            }
        } else {
            match opponents.take() {
                None => opponents = Some(table.clone()),
                Some(current) => {
                    let Some(left_key) = squad_key(&current) else {
                        opponents = Some(current);
                        continue;
                    };
                    match current.join_on(table, &left_key, &right_key) {
                        Ok(joined) => opponents = Some(joined),
                        Err(e) => {
                            warn!("skipping opponent stats table {i}: {e}");
                            opponents = Some(current);
                        }
                    }
                }
            }
        }
    }

    let squad = squad.drop_duplicate_columns();
    let opponents = opponents.map(|t| t.drop_duplicate_columns());
    Ok((squad, opponents))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_LEVEL_TABLE: &str = r#"
        <table>
          <thead>
            <tr><th></th><th colspan="2">Expected</th></tr>
            <tr><th>Squad</th><th>xG</th><th>xGA</th></tr>
          </thead>
          <tbody>
            <tr><th>Arsenal</th><td>75.2</td><td>30.1</td></tr>
            <tr class="thead"><th>Squad</th><td>xG</td><td>xGA</td></tr>
            <tr><th>Chelsea</th><td>60.4</td><td>44.0</td></tr>
          </tbody>
        </table>"#;

    #[test]
    fn two_level_headers_merge_with_colspan() {
        let tables = parse_stats_tables(TWO_LEVEL_TABLE);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].columns, vec!["_Squad", "Expected_xG", "Expected_xGA"]);
        // The repeated mid-table header row is dropped.
        assert_eq!(tables[0].rows.len(), 2);
        assert_eq!(tables[0].rows[0], vec!["Arsenal", "75.2", "30.1"]);
    }

    #[test]
    fn single_level_headers_pass_through() {
        let html = r#"
            <table>
              <thead><tr><th>Squad</th><th>MP</th></tr></thead>
              <tbody><tr><th>Arsenal</th><td>38</td></tr></tbody>
            </table>"#;
        let tables = parse_stats_tables(html);
        assert_eq!(tables[0].columns, vec!["Squad", "MP"]);
    }

    #[test]
    fn commented_tables_are_unhidden() {
        let html = format!("<div><!--{TWO_LEVEL_TABLE}--></div>");
        let tables = parse_stats_tables(&html);
        assert_eq!(tables.len(), 1);
    }

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        let mut t = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            t.rows.push(row.iter().map(|c| c.to_string()).collect());
        }
        t
    }

    #[test]
    fn squad_and_opponent_tables_alternate() {
        let tables = vec![
            table(&["Squad", "MP"], &[&["Arsenal", "38"]]),
            table(&["Gls"], &[&["91"]]),
            table(&["_Squad", "xG"], &[&["Arsenal", "75.2"]]),
            table(&["_Squad", "xGA"], &[&["Arsenal", "30.1"]]),
            table(&["_Squad", "Poss"], &[&["Arsenal", "61"]]),
            table(&["_Squad", "Saves"], &[&["Arsenal", "101"]]),
        ];
        let (squad, opponents) = build_squad_tables(&tables).unwrap();
        assert_eq!(squad.columns, vec!["Squad", "MP", "Gls", "xG", "Poss"]);
        assert_eq!(squad.rows, vec![vec!["Arsenal", "38", "91", "75.2", "61"]]);

        let opponents = opponents.unwrap();
        assert_eq!(opponents.columns, vec!["_Squad", "xGA", "Saves"]);
        assert_eq!(opponents.rows, vec![vec!["Arsenal", "30.1", "101"]]);
    }

    #[test]
    fn unjoinable_table_is_skipped_not_fatal() {
        let tables = vec![
            table(&["Squad", "MP"], &[&["Arsenal", "38"]]),
            table(&["Gls"], &[&["91"]]),
            table(&["Day", "Result"], &[&["Sat", "W"]]),
        ];
        let (squad, _) = build_squad_tables(&tables).unwrap();
        assert_eq!(squad.columns, vec!["Squad", "MP", "Gls"]);
    }

    #[test]
    fn fewer_than_two_tables_is_an_error() {
        let tables = vec![table(&["Squad"], &[])];
        assert!(build_squad_tables(&tables).is_err());
    }
}
