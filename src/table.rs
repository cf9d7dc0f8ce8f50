use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use serde_json::Value;

/// A plain header-plus-rows table. Stands in for the dataframes the raw
/// CSVs are later loaded into; here we only reshape and persist, so string
/// cells are enough.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from an array of JSON objects, e.g. the `elements`
    /// section of the FPL bootstrap payload. Columns are the union of all
    /// keys in first-seen order; cells missing from a record are empty.
    pub fn from_json_records(records: &[Value]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            if let Value::Object(map) = record {
                for key in map.keys() {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                }
            }
        }

        let mut table = Table::new(columns);
        for record in records {
            let Value::Object(map) = record else { continue };
            let row = table
                .columns
                .iter()
                .map(|column| map.get(column).map(render_cell).unwrap_or_default())
                .collect();
            table.rows.push(row);
        }
        table
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn cell(&self, row: &[String], index: usize) -> String {
        row.get(index).cloned().unwrap_or_default()
    }

    /// Positional concatenation: row i of `other` is glued onto row i of
    /// `self`. Rows past the shorter table are dropped.
    pub fn merge_side_by_side(&self, other: &Table) -> Table {
        let mut columns = self.columns.clone();
        columns.extend(other.columns.iter().cloned());

        let mut merged = Table::new(columns);
        for (left, right) in self.rows.iter().zip(other.rows.iter()) {
            let mut row = left.clone();
            row.extend(right.iter().cloned());
            merged.rows.push(row);
        }
        merged
    }

    /// Inner join: keeps rows of `self` whose `left_key` value appears in
    /// `other`'s `right_key` column, gluing on the first matching row. The
    /// duplicated key column is cleaned up later by
    /// [`Table::drop_duplicate_columns`].
    pub fn join_on(&self, other: &Table, left_key: &str, right_key: &str) -> anyhow::Result<Table> {
        let left_index = self
            .column_index(left_key)
            .with_context(|| format!("left table has no '{left_key}' column"))?;
        let right_index = other
            .column_index(right_key)
            .with_context(|| format!("right table has no '{right_key}' column"))?;

        let mut by_key: HashMap<String, &Vec<String>> = HashMap::new();
        for row in &other.rows {
            by_key
                .entry(other.cell(row, right_index))
                .or_insert(row);
        }

        let mut columns = self.columns.clone();
        columns.extend(other.columns.iter().cloned());

        let mut joined = Table::new(columns);
        for row in &self.rows {
            if let Some(matched) = by_key.get(&self.cell(row, left_index)) {
                let mut out = row.clone();
                out.extend(matched.iter().cloned());
                joined.rows.push(out);
            }
        }
        Ok(joined)
    }

    /// Drops columns whose full contents duplicate an earlier column,
    /// regardless of name. First occurrence wins.
    pub fn drop_duplicate_columns(&self) -> Table {
        let mut seen: Vec<Vec<String>> = Vec::new();
        let mut keep: Vec<usize> = Vec::new();
        for index in 0..self.columns.len() {
            let values: Vec<String> = self.rows.iter().map(|row| self.cell(row, index)).collect();
            if !seen.contains(&values) {
                seen.push(values);
                keep.push(index);
            }
        }

        let mut deduped = Table::new(keep.iter().map(|&i| self.columns[i].clone()).collect());
        for row in &self.rows {
            deduped
                .rows
                .push(keep.iter().map(|&i| self.cell(row, i)).collect());
        }
        deduped
    }

    /// Full overwrite, parent directories created. Ragged rows are padded
    /// to the header width.
    pub fn write_csv(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("could not create {}", parent.display()))?;
        }

        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("could not open {} for writing", path.display()))?;
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            let record: Vec<String> = (0..self.columns.len()).map(|i| self.cell(row, i)).collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Nested arrays/objects survive as compact JSON.
        other => other.to_string(),
    }
}

/// Reads CSV text into a table, skipping rows that fail to parse. Flexible
/// mode so a ragged upstream row does not abort the whole file.
pub fn table_from_csv_text(text: &str) -> anyhow::Result<Table> {
    if text.trim().is_empty() {
        bail!("CSV body is empty");
    }
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let columns = reader
        .headers()
        .context("CSV body has no header row")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut table = Table::new(columns);
    for record in reader.records() {
        match record {
            Ok(row) => table.rows.push(row.iter().map(str::to_string).collect()),
            Err(e) => log::warn!("skipping malformed CSV row: {e}"),
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        let mut t = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            t.rows.push(row.iter().map(|c| c.to_string()).collect());
        }
        t
    }

    #[test]
    fn json_records_union_columns_in_first_seen_order() {
        let records = vec![
            json!({"id": 1, "web_name": "Saka"}),
            json!({"id": 2, "web_name": "Haaland", "news": "knock"}),
        ];
        let t = Table::from_json_records(&records);
        assert_eq!(t.columns, vec!["id", "web_name", "news"]);
        assert_eq!(t.rows[0], vec!["1", "Saka", ""]);
        assert_eq!(t.rows[1], vec!["2", "Haaland", "knock"]);
    }

    #[test]
    fn json_scalars_render_bare_and_composites_as_json() {
        let records = vec![json!({"a": true, "b": 1.5, "c": null, "d": [1, 2]})];
        let t = Table::from_json_records(&records);
        assert_eq!(t.rows[0], vec!["true", "1.5", "", "[1,2]"]);
    }

    #[test]
    fn side_by_side_merge_is_positional() {
        let left = table(&["Squad", "MP"], &[&["Arsenal", "38"], &["Chelsea", "38"]]);
        let right = table(&["Gls"], &[&["91"], &["77"]]);
        let merged = left.merge_side_by_side(&right);
        assert_eq!(merged.columns, vec!["Squad", "MP", "Gls"]);
        assert_eq!(merged.rows[1], vec!["Chelsea", "38", "77"]);
    }

    #[test]
    fn join_on_keeps_matching_rows_only() {
        let left = table(&["Squad", "MP"], &[&["Arsenal", "38"], &["Leeds", "38"]]);
        let right = table(&["_Squad", "xG"], &[&["Arsenal", "75.2"]]);
        let joined = left.join_on(&right, "Squad", "_Squad").unwrap();
        assert_eq!(joined.columns, vec!["Squad", "MP", "_Squad", "xG"]);
        assert_eq!(joined.rows, vec![vec!["Arsenal", "38", "Arsenal", "75.2"]]);
    }

    #[test]
    fn join_on_missing_key_is_an_error() {
        let left = table(&["Squad"], &[]);
        let right = table(&["xG"], &[]);
        assert!(left.join_on(&right, "Squad", "Squad").is_err());
    }

    #[test]
    fn duplicate_columns_dropped_by_contents() {
        let t = table(
            &["Squad", "_Squad", "xG"],
            &[&["Arsenal", "Arsenal", "75.2"], &["Chelsea", "Chelsea", "60.1"]],
        );
        let deduped = t.drop_duplicate_columns();
        assert_eq!(deduped.columns, vec!["Squad", "xG"]);
        assert_eq!(deduped.rows[0], vec!["Arsenal", "75.2"]);
    }

    #[test]
    fn csv_text_roundtrip_skips_nothing_on_clean_input() {
        let t = table_from_csv_text("name,team\nSaka,Arsenal\nPalmer,Chelsea\n").unwrap();
        assert_eq!(t.columns, vec!["name", "team"]);
        assert_eq!(t.rows.len(), 2);
    }

    #[test]
    fn empty_csv_text_is_an_error() {
        assert!(table_from_csv_text("  \n").is_err());
    }
}
