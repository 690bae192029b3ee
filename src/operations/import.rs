use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{LedgerError, LedgerResult};
use crate::models::backup::Backup;
use crate::models::department::Department;
use crate::models::expense::Expense;
use crate::models::item::Item;
use crate::models::organization::OrganizationData;
use crate::models::team::Team;
use crate::models::user::User;
use crate::workspace::Workspace;

#[derive(Debug, Deserialize)]
struct ImportPayload {
    teams: Option<Vec<Team>>,
    departments: Option<Vec<Department>>,
    items: Option<Vec<Item>>,
    #[serde(default)]
    expenses: Vec<Expense>,
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    backups: Vec<Backup>,
}

fn required_collection<T>(rows: Option<Vec<T>>, name: &str) -> LedgerResult<Vec<T>> {
    match rows {
        Some(rows) if !rows.is_empty() => Ok(rows),
        _ => Err(LedgerError::InvalidImport(format!(
            "'{}' is missing or empty",
            name
        ))),
    }
}

/// Parses an exported store. Teams, departments and items must be present
/// and non-empty.
pub fn parse_import(raw: &str) -> LedgerResult<OrganizationData> {
    let payload: ImportPayload =
        serde_json::from_str(raw).map_err(|e| LedgerError::InvalidImport(e.to_string()))?;

    Ok(OrganizationData {
        teams: required_collection(payload.teams, "teams")?,
        departments: required_collection(payload.departments, "departments")?,
        items: required_collection(payload.items, "items")?,
        expenses: payload.expenses,
        users: payload.users,
        backups: payload.backups,
    })
}

/// Replaces the whole store with the contents of `path`. Nothing changes
/// unless the file reads and validates.
pub fn import_json(workspace: &mut Workspace, path: &Path) -> LedgerResult<()> {
    let raw = fs::read_to_string(path)?;
    let data = parse_import(&raw)?;
    workspace.replace(data)?;
    tracing::info!(path = %path.display(), "store replaced from import");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::seed::seed_data;
    use crate::models::expense::LineItem;
    use crate::operations::backup::create_backup;
    use crate::operations::expense::{ExpenseDraft, record_expense};
    use crate::operations::export::export_json;
    use crate::workspace::test_workspace;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    fn write_temp_json(contents: &str) -> NamedTempFile {
        let mut tmp = NamedTempFile::new().expect("Failed to create temp file");
        write!(tmp, "{}", contents).expect("Failed to write test JSON");
        tmp
    }

    #[test]
    fn test_import_replaces_store() {
        let mut ws = test_workspace();
        let json = r#"{
            "teams": [{"code": "X1", "name": "Youth", "leader": "Seo"}],
            "departments": [{"code": "XD1", "name": "Camp", "teamCode": "X1", "leader": "Ryu"}],
            "items": [{"code": "XI1", "name": "Tents", "deptCode": "XD1", "budget": 800.5, "spent": 0}],
            "expenses": [],
            "users": [{"id": "admin", "password": "pw", "isAdmin": true, "name": "Admin"}],
            "backups": []
        }"#;
        let tmp = write_temp_json(json);

        import_json(&mut ws, tmp.path()).unwrap();
        assert_eq!(ws.data().teams.len(), 1);
        assert_eq!(ws.data().team("X1").unwrap().name, "Youth");
        assert!(ws.data().item("I001").is_none());
        assert_eq!(ws.data().users.len(), 1);
    }

    #[test]
    fn test_import_missing_items_leaves_store_untouched() {
        let mut ws = test_workspace();
        let before = ws.data().clone();
        let tmp = write_temp_json(
            r#"{"teams":[{"code":"X1","name":"A","leader":"B"}],
                "departments":[{"code":"XD1","name":"C","teamCode":"X1","leader":"D"}]}"#,
        );

        let result = import_json(&mut ws, tmp.path());
        match result {
            Err(LedgerError::InvalidImport(msg)) => assert!(msg.contains("items")),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(ws.data(), &before);
    }

    #[test]
    fn test_import_empty_departments_rejected() {
        let result = parse_import(
            r#"{"teams":[{"code":"X1","name":"A","leader":"B"}],"departments":[],
                "items":[{"code":"I","name":"N","deptCode":"D","budget":1}]}"#,
        );
        assert!(matches!(result, Err(LedgerError::InvalidImport(_))));
    }

    #[test]
    fn test_import_malformed_json_rejected() {
        let mut ws = test_workspace();
        let before = ws.data().clone();
        let tmp = write_temp_json("{\"teams\": [");

        assert!(matches!(
            import_json(&mut ws, tmp.path()),
            Err(LedgerError::InvalidImport(_))
        ));
        assert_eq!(ws.data(), &before);
    }

    #[test]
    fn test_import_nonexistent_file() {
        let mut ws = test_workspace();
        let result = import_json(&mut ws, Path::new("nonexistent.json"));
        assert!(matches!(result, Err(LedgerError::Io(_))));
    }

    #[test]
    fn test_export_then_import_round_trip() {
        let mut ws = test_workspace();
        let dir = tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 4, 30).unwrap();
        let mut data = seed_data();
        data.item_mut("I002").unwrap().spent = "12.34".parse().unwrap();

        let path = export_json(&data, dir.path(), date).unwrap();
        import_json(&mut ws, &path).unwrap();
        assert_eq!(ws.data(), &data);
    }

    #[test]
    fn test_round_trip_keeps_fractional_expenses_and_backups() {
        let mut source = test_workspace();
        let draft = ExpenseDraft {
            team_code: "T001".to_string(),
            dept_code: "D001".to_string(),
            item_code: "I001".to_string(),
            line_items: vec![
                LineItem::new("Tape", "0.1".parse().unwrap()),
                LineItem::new("Mixer", "1234.5678".parse().unwrap()),
            ],
        };
        let date = NaiveDate::from_ymd_opt(2025, 4, 30).unwrap();
        record_expense(&mut source, &draft, "관리자", date, false).unwrap();
        create_backup(&mut source).unwrap();
        let snapshot = source.data().clone();
        assert_eq!(snapshot.expenses.len(), 1);
        assert_eq!(snapshot.backups.len(), 1);

        let dir = tempdir().unwrap();
        let path = export_json(&snapshot, dir.path(), date).unwrap();
        let mut target = test_workspace();
        import_json(&mut target, &path).unwrap();

        assert_eq!(target.data(), &snapshot);
        assert_eq!(
            target.data().expenses[0].total_amount,
            "1234.6678".parse::<rust_decimal::Decimal>().unwrap()
        );
    }
}
