use std::fmt::Write;

use crate::models::expense::{Expense, MAX_LINE_ITEMS};
use crate::models::organization::OrganizationData;

const WIDTH: usize = 60;

fn resolved(name: Option<&str>, code: &str) -> String {
    match name {
        Some(name) => format!("{} ({})", name, code),
        None => code.to_string(),
    }
}

/// Renders a printable expense claim. The line table always has
/// five rows; unused rows are left blank for handwritten additions.
pub fn render_claim(data: &OrganizationData, expense: &Expense) -> String {
    let team_row = data.team(&expense.team_code);
    let dept_row = data.department(&expense.dept_code);
    let team = team_row.map(|t| t.name.as_str());
    let dept = dept_row.map(|d| d.name.as_str());
    let item = data.item(&expense.item_code).map(|i| i.name.as_str());
    let rule = "=".repeat(WIDTH);
    let thin = "-".repeat(WIDTH);

    let mut out = String::new();
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "{:^width$}", "EXPENSE CLAIM", width = WIDTH);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "No.          {}", expense.id);
    let _ = writeln!(out, "Date         {}", expense.date.format("%Y-%m-%d"));
    let _ = writeln!(out, "Team         {}", resolved(team, &expense.team_code));
    let _ = writeln!(out, "Department   {}", resolved(dept, &expense.dept_code));
    let _ = writeln!(out, "Item         {}", resolved(item, &expense.item_code));
    let _ = writeln!(out, "Requested by {}", expense.created_by);
    let _ = writeln!(out, "{}", thin);
    let _ = writeln!(out, "{:<4}{:<40}{:>16}", "#", "Description", "Amount");
    let _ = writeln!(out, "{}", thin);
    for row in 0..MAX_LINE_ITEMS.max(expense.line_items.len()) {
        match expense.line_items.get(row) {
            Some(line) => {
                let _ = writeln!(
                    out,
                    "{:<4}{:<40}{:>16}",
                    row + 1,
                    line.description,
                    format!("{:.2}", line.amount)
                );
            }
            None => {
                let _ = writeln!(out, "{:<4}", row + 1);
            }
        }
    }
    let _ = writeln!(out, "{}", thin);
    let _ = writeln!(
        out,
        "{:<44}{:>16}",
        "TOTAL",
        format!("{:.2}", expense.total_amount)
    );
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "{:<20}{:<20}{:<20}", "________", "________", "________");
    let _ = writeln!(
        out,
        "{:<20}{:<20}{:<20}",
        format!("청구자: {}", expense.created_by),
        format!("부서장: {}", dept_row.map(|d| d.leader.as_str()).unwrap_or("")),
        format!("팀장: {}", team_row.map(|t| t.leader.as_str()).unwrap_or("")),
    );
    out
}
