//! Interactive prompt loop for a signed-in user.
use chrono::Local;
use std::io::BufRead;
use std::path::Path;

use crate::config::Settings;
use crate::error::{LedgerError, LedgerResult};
use crate::models::expense::{LineItem, MAX_LINE_ITEMS};
use crate::models::user::User;
use crate::operations::auth::{Scope, authenticate};
use crate::operations::backup::{create_backup, delete_backup, list_backups, restore_backup};
use crate::operations::browse::run_browse;
use crate::operations::budget::{Totals, check_budget, rollup};
use crate::operations::expense::{
    BudgetCheck, ExpenseDraft, can_add_line, delete_expense, expenses_in_scope, parse_line_item,
    preview_expense, record_expense,
};
use crate::operations::export::{export_csv, export_json};
use crate::operations::import::import_json;
use crate::operations::invoice::render_claim;
use crate::operations::organization::{
    add_department, add_item, add_team, change_password, edit_department, edit_item, edit_team,
};
use crate::operations::remove::{CascadeSummary, delete_department, delete_item, delete_team};
use crate::workspace::Workspace;

pub enum UserCommands {
    Dashboard,
    Expenses,
    AddExpense,
    DeleteExpense,
    ShowExpense,
    CheckBudget,
    Browse,
    ExportCsv,
    ExportJson,
    Import,
    Team,
    Department,
    Item,
    Passwd,
    Backup,
    Help,
    Logout,
    Exit,
    Unknown,
}

fn check_for_command(input: &str) -> UserCommands {
    match input {
        "dashboard" => UserCommands::Dashboard,
        "expenses" => UserCommands::Expenses,
        "add-expense" => UserCommands::AddExpense,
        "delete-expense" => UserCommands::DeleteExpense,
        "show-expense" => UserCommands::ShowExpense,
        "check-budget" => UserCommands::CheckBudget,
        "browse" => UserCommands::Browse,
        "export-csv" => UserCommands::ExportCsv,
        "export-json" => UserCommands::ExportJson,
        "import" => UserCommands::Import,
        "team" => UserCommands::Team,
        "dept" => UserCommands::Department,
        "item" => UserCommands::Item,
        "passwd" => UserCommands::Passwd,
        "backup" => UserCommands::Backup,
        "help" => UserCommands::Help,
        "logout" => UserCommands::Logout,
        "exit" => UserCommands::Exit,
        _ => UserCommands::Unknown,
    }
}

const USER_HELP: &str = "Commands: dashboard, expenses, add-expense, delete-expense <id>, \
show-expense <id>, check-budget, browse, export-csv, passwd, help, logout, exit";

const ADMIN_HELP: &str = "Admin commands: export-json, import <file>, \
team add|edit|delete, dept add|edit|delete, item add|edit|delete, passwd [user], \
backup create|list|restore <id>|delete <id>";

/// How a session ended.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionEnd {
    Logout,
    /// The store was swapped by import or restore; sign in again without a
    /// logout backup.
    Reload,
    Exit,
}

/// Line-oriented reader over stdin or, in tests, a byte buffer.
pub struct Console<R> {
    input: R,
}

impl<R: BufRead> Console<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    /// Next trimmed line, or `None` at end of input.
    pub fn read_user_input(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                println!("Error reading input: {}", e);
                None
            }
        }
    }

    pub fn ask(&mut self, label: &str) -> Option<String> {
        println!("{}:", label);
        self.read_user_input()
    }

    pub fn confirm(&mut self, question: &str) -> bool {
        println!("{} (y/N)", question);
        matches!(self.read_user_input().as_deref(), Some("y" | "Y" | "yes"))
    }
}

/// The signed-in user and what they may see.
pub struct Session {
    pub user: User,
    pub scope: Scope,
}

impl Session {
    fn is_admin(&self) -> bool {
        self.user.is_admin
    }
}

/// Asks for credentials until they match. `None` means the user typed
/// `exit` or input ran out.
pub fn login<R: BufRead>(console: &mut Console<R>, workspace: &Workspace) -> Option<Session> {
    loop {
        let id = console.ask("User id (or 'exit')")?;
        if id == "exit" {
            return None;
        }
        let password = console.ask("Password")?;
        match authenticate(workspace.data(), &id, &password) {
            Some(user) => {
                tracing::info!(user = %user.id, "signed in");
                println!("Welcome, {}!", user.name);
                return Some(Session {
                    user: user.clone(),
                    scope: Scope::for_user(user),
                });
            }
            None => println!("Invalid user id or password."),
        }
    }
}

pub fn run_session<R: BufRead>(
    console: &mut Console<R>,
    workspace: &mut Workspace,
    settings: &Settings,
    session: &Session,
) -> SessionEnd {
    print_help(session);
    loop {
        println!("Please enter a command ('help' lists them):");
        let Some(input) = console.read_user_input() else {
            return SessionEnd::Exit;
        };
        let parts: Vec<&str> = input.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }
        let args = &parts[1..];

        let result = match check_for_command(parts[0]) {
            UserCommands::Dashboard => {
                print_dashboard(workspace, session);
                Ok(())
            }
            UserCommands::Expenses => {
                print_expenses(workspace, session);
                Ok(())
            }
            UserCommands::AddExpense => add_expense_flow(console, workspace, session),
            UserCommands::DeleteExpense => delete_expense_flow(workspace, session, args),
            UserCommands::ShowExpense => show_expense(workspace, session, args),
            UserCommands::CheckBudget => {
                print_budget_check(workspace, session);
                Ok(())
            }
            UserCommands::Browse => run_browse(workspace.data(), &session.scope)
                .map_err(LedgerError::Validation),
            UserCommands::ExportCsv => {
                export_csv(
                    workspace.data(),
                    &session.scope,
                    &settings.export.directory,
                    Local::now().date_naive(),
                )
                .map(|(path, rows)| println!("Exported {} rows to {}", rows, path.display()))
            }
            UserCommands::ExportJson => admin_only(session).and_then(|_| {
                export_json(
                    workspace.data(),
                    &settings.export.directory,
                    Local::now().date_naive(),
                )
                .map(|path| println!("Exported data to {}", path.display()))
            }),
            UserCommands::Import => {
                match admin_only(session).and_then(|_| import_flow(console, workspace, args)) {
                    Ok(true) => return store_replaced(),
                    other => other.map(|_| ()),
                }
            }
            UserCommands::Team => admin_only(session)
                .and_then(|_| team_flow(console, workspace, settings, args)),
            UserCommands::Department => {
                admin_only(session).and_then(|_| department_flow(console, workspace, args))
            }
            UserCommands::Item => {
                admin_only(session).and_then(|_| item_flow(console, workspace, args))
            }
            UserCommands::Passwd => passwd_flow(console, workspace, session, args),
            UserCommands::Backup => {
                match admin_only(session).and_then(|_| backup_flow(workspace, args)) {
                    Ok(true) => return store_replaced(),
                    other => other.map(|_| ()),
                }
            }
            UserCommands::Help => {
                print_help(session);
                Ok(())
            }
            UserCommands::Logout => return SessionEnd::Logout,
            UserCommands::Exit => return SessionEnd::Exit,
            UserCommands::Unknown => {
                println!("Unknown command: {}", parts[0]);
                Ok(())
            }
        };

        match result {
            Ok(()) => {}
            Err(LedgerError::NotFound(what)) => println!("Notice: {} not found.", what),
            Err(err) => println!("Error: {}", err),
        }
    }
}

fn store_replaced() -> SessionEnd {
    println!("Data was replaced. Please sign in again.");
    SessionEnd::Reload
}

fn admin_only(session: &Session) -> LedgerResult<()> {
    if session.is_admin() {
        Ok(())
    } else {
        Err(LedgerError::Validation(
            "This command requires an administrator".to_string(),
        ))
    }
}

fn print_help(session: &Session) {
    println!("{}", USER_HELP);
    if session.is_admin() {
        println!("{}", ADMIN_HELP);
    }
}

fn print_dashboard(workspace: &Workspace, session: &Session) {
    let rollup = rollup(workspace.data(), &session.scope);
    let row = |indent: usize, label: &str, totals: &Totals| {
        println!(
            "{:<40} {:>12.2} {:>12.2} {:>12.2}",
            format!("{}{}", "  ".repeat(indent), label),
            totals.budget,
            totals.spent,
            totals.balance()
        );
    };

    println!("{:<40} {:>12} {:>12} {:>12}", "", "Budget", "Spent", "Balance");
    for team in &rollup.teams {
        row(0, &format!("{} {}", team.code, team.name), &team.totals);
        for dept in &team.departments {
            row(1, &format!("{} {}", dept.code, dept.name), &dept.totals);
            for item in &dept.items {
                row(2, &format!("{} {}", item.code, item.name), &item.totals);
            }
        }
    }
    for dept in &rollup.orphan_departments {
        row(0, &format!("{} {} (no team)", dept.code, dept.name), &dept.totals);
    }
    row(0, "TOTAL", &rollup.totals);
}

fn print_expenses(workspace: &Workspace, session: &Session) {
    let expenses = expenses_in_scope(workspace.data(), &session.scope);
    if expenses.is_empty() {
        println!("No expenses recorded.");
        return;
    }
    for e in expenses {
        println!(
            "{:>14}  {}  {} / {} / {}  {:.2}  ({})",
            e.id,
            e.date.format("%Y-%m-%d"),
            e.team_code,
            e.dept_code,
            e.item_code,
            e.total_amount,
            e.created_by
        );
    }
}

fn print_budget_check(workspace: &Workspace, session: &Session) {
    let report = check_budget(workspace.data(), &session.scope);
    if report.is_healthy() {
        println!("All items are within budget.");
    } else {
        for overrun in &report.overruns {
            println!(
                "{} / {} / {} {} over by {:.2}",
                overrun.team_name.as_deref().unwrap_or("-"),
                overrun.department_name.as_deref().unwrap_or("-"),
                overrun.item_code,
                overrun.item_name,
                overrun.excess
            );
        }
    }
    println!(
        "Budget {:.2}, spent {:.2}, balance {:.2}",
        report.totals.budget,
        report.totals.spent,
        report.totals.balance()
    );
}

fn pick_team<R: BufRead>(
    console: &mut Console<R>,
    workspace: &Workspace,
    session: &Session,
) -> Option<String> {
    match &session.scope {
        Scope::Team(code) => Some(code.clone()),
        Scope::All => {
            for team in &workspace.data().teams {
                println!("  {} {}", team.code, team.name);
            }
            console.ask("Team code")
        }
    }
}

fn add_expense_flow<R: BufRead>(
    console: &mut Console<R>,
    workspace: &mut Workspace,
    session: &Session,
) -> LedgerResult<()> {
    let cancelled = || LedgerError::Validation("Expense entry cancelled".to_string());

    let team_code = pick_team(console, workspace, session).ok_or_else(cancelled)?;
    for dept in workspace
        .data()
        .departments
        .iter()
        .filter(|d| d.team_code == team_code)
    {
        println!("  {} {}", dept.code, dept.name);
    }
    let dept_code = console.ask("Department code").ok_or_else(cancelled)?;
    for item in workspace
        .data()
        .items
        .iter()
        .filter(|i| i.dept_code == dept_code)
    {
        println!("  {} {} (balance {:.2})", item.code, item.name, item.balance());
    }
    let item_code = console.ask("Item code").ok_or_else(cancelled)?;

    let mut line_items: Vec<LineItem> = Vec::new();
    println!(
        "Enter up to {} lines as 'description, amount'. Empty line to finish.",
        MAX_LINE_ITEMS
    );
    while can_add_line(line_items.len()) {
        let Some(raw) = console.read_user_input() else {
            break;
        };
        if raw.is_empty() {
            break;
        }
        match parse_line_item(&raw) {
            Ok(line) => line_items.push(line),
            Err(e) => println!("{}", e),
        }
    }

    let draft = ExpenseDraft {
        team_code,
        dept_code,
        item_code,
        line_items,
    };

    let confirm_overrun = match preview_expense(workspace.data(), &draft)? {
        BudgetCheck::Overrun { balance, total } => {
            let question = format!(
                "Budget exceeded: balance {:.2}, expense {:.2}. Record anyway?",
                balance, total
            );
            if !console.confirm(&question) {
                println!("Expense not recorded.");
                return Ok(());
            }
            true
        }
        BudgetCheck::UnknownItem { .. } => {
            println!("Warning: item {} does not exist.", draft.item_code);
            false
        }
        BudgetCheck::Within { .. } => false,
    };

    let today = Local::now().date_naive();
    let expense = record_expense(workspace, &draft, &session.user.name, today, confirm_overrun)?;
    println!(
        "Expense {} recorded, total {:.2}.",
        expense.id, expense.total_amount
    );
    if console.confirm("Show the claim form?") {
        println!("{}", render_claim(workspace.data(), &expense));
    }
    Ok(())
}

fn parse_id(args: &[&str], what: &str) -> LedgerResult<i64> {
    let raw = args
        .first()
        .ok_or_else(|| LedgerError::Validation(format!("Usage: {} <id>", what)))?;
    raw.parse::<i64>()
        .map_err(|_| LedgerError::Validation(format!("Invalid id: {}", raw)))
}

fn delete_expense_flow(
    workspace: &mut Workspace,
    session: &Session,
    args: &[&str],
) -> LedgerResult<()> {
    let id = parse_id(args, "delete-expense")?;
    let visible = workspace
        .data()
        .expense(id)
        .is_some_and(|e| session.scope.includes_team(&e.team_code));
    if !visible {
        return Err(LedgerError::NotFound(format!("Expense {}", id)));
    }
    let expense = delete_expense(workspace, id)?;
    println!(
        "Expense {} deleted, {:.2} returned to {}.",
        expense.id, expense.total_amount, expense.item_code
    );
    Ok(())
}

fn show_expense(workspace: &Workspace, session: &Session, args: &[&str]) -> LedgerResult<()> {
    let id = parse_id(args, "show-expense")?;
    let expense = workspace
        .data()
        .expense(id)
        .filter(|e| session.scope.includes_team(&e.team_code))
        .ok_or_else(|| LedgerError::NotFound(format!("Expense {}", id)))?;
    println!("{}", render_claim(workspace.data(), expense));
    Ok(())
}

fn import_flow<R: BufRead>(
    console: &mut Console<R>,
    workspace: &mut Workspace,
    args: &[&str],
) -> LedgerResult<bool> {
    let path = match args.first() {
        Some(path) => path.to_string(),
        None => console
            .ask("File path to import")
            .unwrap_or_default(),
    };
    if !console.confirm("Importing replaces all current data. Continue?") {
        println!("Import cancelled.");
        return Ok(false);
    }
    import_json(workspace, Path::new(&path))?;
    println!("Import complete.");
    Ok(true)
}

fn print_cascade(what: &str, summary: &CascadeSummary) {
    println!(
        "{} deleted ({} departments, {} items, {} expenses, {} users removed).",
        what, summary.departments, summary.items, summary.expenses, summary.users
    );
}

/// Reads the listed fields in order; `None` if input ran out.
fn ask_fields<R: BufRead>(console: &mut Console<R>, labels: &[&str]) -> Option<Vec<String>> {
    labels.iter().map(|label| console.ask(label)).collect()
}

fn subcommand<'a>(args: &[&'a str], usage: &str) -> LedgerResult<(&'a str, Option<&'a str>)> {
    match args {
        [action] => Ok((*action, None)),
        [action, code, ..] => Ok((*action, Some(*code))),
        [] => Err(LedgerError::Validation(format!("Usage: {}", usage))),
    }
}

fn code_arg<R: BufRead>(
    console: &mut Console<R>,
    code: Option<&str>,
    label: &str,
) -> LedgerResult<String> {
    code.map(str::to_string)
        .or_else(|| console.ask(label))
        .ok_or_else(|| LedgerError::Validation(format!("{} is required", label)))
}

fn team_flow<R: BufRead>(
    console: &mut Console<R>,
    workspace: &mut Workspace,
    settings: &Settings,
    args: &[&str],
) -> LedgerResult<()> {
    let missing = || LedgerError::Validation("Input ended".to_string());
    let (action, code) = subcommand(args, "team add|edit|delete [code]")?;
    match action {
        "add" => {
            let code = code_arg(console, code, "Team code")?;
            let fields = ask_fields(console, &["Team name", "Team leader"]).ok_or_else(missing)?;
            let team = add_team(
                workspace,
                &code,
                &fields[0],
                &fields[1],
                &settings.users.default_password,
            )?;
            println!("Team {} added with user '{}'.", team.name, team.code);
        }
        "edit" => {
            let code = code_arg(console, code, "Team code")?;
            let fields = ask_fields(console, &["Team name", "Team leader"]).ok_or_else(missing)?;
            edit_team(workspace, &code, &fields[0], &fields[1])?;
            println!("Team {} updated.", code);
        }
        "delete" => {
            let code = code_arg(console, code, "Team code")?;
            if console.confirm(&format!("Delete team {} and everything under it?", code)) {
                let summary = delete_team(workspace, &code)?;
                print_cascade(&format!("Team {}", code), &summary);
            }
        }
        other => println!("Unknown team action: {}", other),
    }
    Ok(())
}

fn department_flow<R: BufRead>(
    console: &mut Console<R>,
    workspace: &mut Workspace,
    args: &[&str],
) -> LedgerResult<()> {
    let missing = || LedgerError::Validation("Input ended".to_string());
    let (action, code) = subcommand(args, "dept add|edit|delete [code]")?;
    let labels = ["Team code", "Department name", "Department leader"];
    match action {
        "add" => {
            let code = code_arg(console, code, "Department code")?;
            let fields = ask_fields(console, &labels).ok_or_else(missing)?;
            let dept = add_department(workspace, &fields[0], &code, &fields[1], &fields[2])?;
            println!("Department {} added.", dept.name);
        }
        "edit" => {
            let code = code_arg(console, code, "Department code")?;
            let fields = ask_fields(console, &labels).ok_or_else(missing)?;
            edit_department(workspace, &code, &fields[0], &fields[1], &fields[2])?;
            println!("Department {} updated.", code);
        }
        "delete" => {
            let code = code_arg(console, code, "Department code")?;
            if console.confirm(&format!("Delete department {}?", code)) {
                let summary = delete_department(workspace, &code)?;
                print_cascade(&format!("Department {}", code), &summary);
            }
        }
        other => println!("Unknown dept action: {}", other),
    }
    Ok(())
}

fn item_flow<R: BufRead>(
    console: &mut Console<R>,
    workspace: &mut Workspace,
    args: &[&str],
) -> LedgerResult<()> {
    let missing = || LedgerError::Validation("Input ended".to_string());
    let (action, code) = subcommand(args, "item add|edit|delete [code]")?;
    let labels = ["Department code", "Item name", "Budget"];
    match action {
        "add" => {
            let code = code_arg(console, code, "Item code")?;
            let fields = ask_fields(console, &labels).ok_or_else(missing)?;
            let item = add_item(workspace, &fields[0], &code, &fields[1], &fields[2])?;
            println!("Item {} added with budget {:.2}.", item.name, item.budget);
        }
        "edit" => {
            let code = code_arg(console, code, "Item code")?;
            let fields = ask_fields(console, &labels).ok_or_else(missing)?;
            edit_item(workspace, &code, &fields[0], &fields[1], &fields[2])?;
            println!("Item {} updated.", code);
        }
        "delete" => {
            let code = code_arg(console, code, "Item code")?;
            if console.confirm(&format!("Delete item {} and its expenses?", code)) {
                let summary = delete_item(workspace, &code)?;
                print_cascade(&format!("Item {}", code), &summary);
            }
        }
        other => println!("Unknown item action: {}", other),
    }
    Ok(())
}

fn passwd_flow<R: BufRead>(
    console: &mut Console<R>,
    workspace: &mut Workspace,
    session: &Session,
    args: &[&str],
) -> LedgerResult<()> {
    let target = match args.first() {
        Some(other) if *other != session.user.id => {
            admin_only(session)?;
            other.to_string()
        }
        _ => session.user.id.clone(),
    };
    let password = console.ask("New password").unwrap_or_default();
    change_password(workspace, &target, &password)?;
    println!("Password changed for {}.", target);
    Ok(())
}

/// Returns `true` when a restore replaced the store.
fn backup_flow(workspace: &mut Workspace, args: &[&str]) -> LedgerResult<bool> {
    let (action, _) = subcommand(args, "backup create|list|restore <id>|delete <id>")?;
    match action {
        "create" => {
            let backup = create_backup(workspace)?;
            println!("Backup {} created.", backup.id);
        }
        "list" => {
            let backups = list_backups(workspace);
            if backups.is_empty() {
                println!("No backups.");
            }
            for backup in backups {
                println!(
                    "{:>14}  {}  {} expenses",
                    backup.id,
                    backup.date.format("%Y-%m-%d %H:%M:%S"),
                    backup.data.expenses.len()
                );
            }
        }
        "restore" => {
            let id = parse_id(&args[1..], "backup restore")?;
            restore_backup(workspace, id)?;
            println!("Backup {} restored.", id);
            return Ok(true);
        }
        "delete" => {
            let id = parse_id(&args[1..], "backup delete")?;
            delete_backup(workspace, id)?;
            println!("Backup {} deleted.", id);
        }
        other => println!("Unknown backup action: {}", other),
    }
    Ok(false)
}

/// Snapshot taken when a user signs out.
pub fn logout(workspace: &mut Workspace, session: &Session) {
    match create_backup(workspace) {
        Ok(backup) => {
            tracing::info!(user = %session.user.id, backup = backup.id, "signed out");
            println!("Logged out. Backup {} created.", backup.id);
        }
        Err(e) => {
            tracing::warn!(error = %e, "automatic backup failed");
            println!("Logged out. Automatic backup failed: {}", e);
        }
    }
}
