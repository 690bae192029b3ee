use chrono::NaiveDate;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::auth::Scope;
use crate::error::LedgerResult;
use crate::models::organization::OrganizationData;

pub const CSV_HEADER: [&str; 6] = ["date", "team", "department", "item", "description", "amount"];
const UTF8_BOM: &[u8] = "\u{feff}".as_bytes();

pub fn json_file_name(date: NaiveDate) -> String {
    format!("NLOC_BUDGET_EXPENSE_{}.json", date.format("%Y-%m-%d"))
}

pub fn csv_file_name(date: NaiveDate) -> String {
    format!("expenses_{}.csv", date.format("%Y-%m-%d"))
}

/// Writes the whole store as indented JSON into `dir`.
pub fn export_json(data: &OrganizationData, dir: &Path, date: NaiveDate) -> LedgerResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(json_file_name(date));
    let payload = serde_json::to_string_pretty(data)?;
    fs::write(&path, payload)?;
    tracing::info!(path = %path.display(), "store exported");
    Ok(path)
}

/// Writes one CSV row per expense line, in ledger order. Names fall back to
/// codes when a reference no longer resolves. Returns the number of data rows.
pub fn write_expense_csv<W: Write>(
    data: &OrganizationData,
    scope: &Scope,
    writer: W,
) -> LedgerResult<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;

    let mut rows = 0;
    let in_scope = data
        .expenses
        .iter()
        .filter(|e| scope.includes_team(&e.team_code));
    for expense in in_scope {
        let team = data
            .team(&expense.team_code)
            .map(|t| t.name.as_str())
            .unwrap_or(&expense.team_code);
        let dept = data
            .department(&expense.dept_code)
            .map(|d| d.name.as_str())
            .unwrap_or(&expense.dept_code);
        let item = data
            .item(&expense.item_code)
            .map(|i| i.name.as_str())
            .unwrap_or(&expense.item_code);
        let date = expense.date.format("%Y-%m-%d").to_string();

        for line in &expense.line_items {
            let amount = line.amount.normalize().to_string();
            csv_writer.write_record([
                date.as_str(),
                team,
                dept,
                item,
                line.description.as_str(),
                amount.as_str(),
            ])?;
            rows += 1;
        }
    }
    csv_writer.flush()?;
    Ok(rows)
}

pub fn export_csv(
    data: &OrganizationData,
    scope: &Scope,
    dir: &Path,
    date: NaiveDate,
) -> LedgerResult<(PathBuf, usize)> {
    fs::create_dir_all(dir)?;
    let path = dir.join(csv_file_name(date));
    let mut file = File::create(&path)?;
    file.write_all(UTF8_BOM)?;
    let rows = write_expense_csv(data, scope, file)?;
    tracing::info!(path = %path.display(), rows, "expenses exported");
    Ok((path, rows))
}
