use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::app::{App, InputMode, PendingAction, Screen};
use crate::ai::WorkerRequest;
use crate::db::Database;
use crate::import::{export_to_csv, skip_duplicates, CsvImporter};
use crate::models::{parse_amount, Category, MonthKey, NewTransaction, Transaction, TxnType};

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App, &mut Database) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit Budgetrack", cmd_quit, r);
    register_command!("quit", "Quit Budgetrack", cmd_quit, r);
    register_command!("d", "Go to Dashboard", cmd_dashboard, r);
    register_command!("dashboard", "Go to Dashboard", cmd_dashboard, r);
    register_command!("t", "Go to Transactions", cmd_transactions, r);
    register_command!("transactions", "Go to Transactions", cmd_transactions, r);
    register_command!("b", "Go to Budgets", cmd_budgets, r);
    register_command!("budgets", "Go to Budgets", cmd_budgets, r);
    register_command!("i", "Go to Insights", cmd_insights, r);
    register_command!("insights", "Go to Insights", cmd_insights, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!(
        "add",
        "Add transaction (e.g. :add expense 4.50 Coffee @Food 2026-03-01)",
        cmd_add,
        r
    );
    register_command!("a", "Add transaction (e.g. :a income 900 Salary)", cmd_add, r);
    register_command!("budget", "Set budget (e.g. :budget Food 150)", cmd_budget, r);
    register_command!("month", "Set month (e.g. :month 2026-01, next, prev)", cmd_month, r);
    register_command!("m", "Set month (e.g. :m 2026-01)", cmd_month, r);
    register_command!("next-month", "Go to next month", cmd_next_month, r);
    register_command!("prev-month", "Go to previous month", cmd_prev_month, r);
    register_command!(
        "delete",
        "Delete selected transaction (or :delete <id>)",
        cmd_delete,
        r
    );
    register_command!(
        "learn",
        "Teach a category (e.g. :learn Grocery weekly shop)",
        cmd_learn,
        r
    );
    register_command!(
        "export",
        "Export month to CSV (e.g. :export ~/budget.csv)",
        cmd_export,
        r
    );
    register_command!("import", "Import a CSV file (e.g. :import ~/bank.csv)", cmd_import, r);
    register_command!(
        "receipt",
        "Read a receipt image or text file (e.g. :receipt ~/r.png)",
        cmd_receipt,
        r
    );

    r
});

pub(crate) fn handle_command(input: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        (cmd.run)(args, app, db)?;
    } else {
        // Try fuzzy match
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }

    Ok(())
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 1) // skip single-letter aliases for suggestions
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

// ── :add parsing ─────────────────────────────────────────────

/// What is known so far about an `:add` being typed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AddPreview {
    pub(crate) kind: TxnType,
    pub(crate) amount: Option<Decimal>,
    pub(crate) item: String,
}

fn is_date_token(token: &str) -> bool {
    NaiveDate::parse_from_str(token, "%Y-%m-%d").is_ok()
}

fn item_words<'a>(tokens: impl Iterator<Item = &'a str>) -> String {
    tokens
        .filter(|t| !t.starts_with('@') && !is_date_token(t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Partial parse of the command line for live suggestions. `None` until a
/// type, an amount and at least one item word are present.
pub(crate) fn preview_add(input: &str) -> Option<AddPreview> {
    let mut tokens = input.split_whitespace();
    if !matches!(tokens.next()?, "add" | "a") {
        return None;
    }
    let kind = TxnType::parse(tokens.next()?)?;
    let amount = parse_amount(tokens.next()?).ok();
    let item = item_words(tokens);
    if item.is_empty() {
        return None;
    }
    Some(AddPreview { kind, amount, item })
}

/// `<type> <amount> <item...> [@category] [YYYY-MM-DD]` into a raw form.
/// The category stays empty when none was given.
pub(crate) fn parse_add(args: &str, today: NaiveDate) -> Option<NewTransaction> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    if tokens.len() < 3 {
        return None;
    }
    let rest = &tokens[2..];
    let category = rest
        .iter()
        .find_map(|t| t.strip_prefix('@'))
        .unwrap_or("")
        .to_string();
    let entry_date = rest
        .iter()
        .find(|t| is_date_token(t))
        .map(|t| t.to_string())
        .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());

    Some(NewTransaction {
        item: item_words(rest.iter().copied()),
        amount: tokens[1].to_string(),
        kind: tokens[0].to_string(),
        category,
        entry_date,
    })
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_dashboard(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.switch_screen(Screen::Dashboard);
    Ok(())
}

fn cmd_transactions(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.switch_screen(Screen::Transactions);
    Ok(())
}

fn cmd_budgets(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.switch_screen(Screen::Budgets);
    Ok(())
}

fn cmd_insights(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.switch_screen(Screen::Insights);
    Ok(())
}

fn cmd_help(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_add(args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    let Some(mut form) = parse_add(args, app.today) else {
        app.set_status("Usage: :add <income|expense> <amount> <item> [@category] [YYYY-MM-DD]");
        return Ok(());
    };

    let mut suggested = None;
    if form.category.is_empty() {
        if let Some(kind) = TxnType::parse(&form.kind) {
            let live = app
                .suggestions
                .current()
                .filter(|s| s.category.kind() == kind)
                .cloned();
            let suggestion = live.unwrap_or_else(|| {
                app.suggester
                    .suggest(&form.item, kind, parse_amount(&form.amount).ok())
            });
            form.category = suggestion.category.key().to_string();
            suggested = Some(suggestion.confidence);
        }
    }
    app.suggestions.reset();

    match form.validate() {
        Ok(txn) => {
            let mut msg = format!(
                "Added {} ${} to {} on {}",
                txn.item, txn.amount, txn.category, txn.entry_date
            );
            if let Some(confidence) = suggested {
                msg.push_str(&format!(" (suggested, {:.0}%)", confidence * 100.0));
            }
            let event = app.state.add_transaction(txn);
            app.emit(event);
            app.set_status(msg);
        }
        Err(e) => app.set_status(format!("Not added: {e}")),
    }
    Ok(())
}

fn cmd_budget(args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    let Some((name, amount)) = args.rsplit_once(' ') else {
        app.set_status("Usage: :budget <category> <amount>");
        return Ok(());
    };

    let Some(category) = Category::parse(name) else {
        app.set_status(format!("Unknown category: {}", name.trim()));
        return Ok(());
    };

    match parse_amount(amount) {
        Ok(limit) => {
            if let Some(event) = app.state.set_budget(category, limit) {
                app.emit(event);
            }
            app.set_status(format!("Budget for {category}: ${}", app.state.budgets.get(category)));
        }
        Err(e) => app.set_status(e.to_string()),
    }
    Ok(())
}

fn cmd_month(args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    let current = app.state.selected_month;
    let target = match args {
        "" => {
            app.set_status(format!("Month: {current} (use :month YYYY-MM, next or prev)"));
            return Ok(());
        }
        "next" => current.next(),
        "prev" => current.prev(),
        other => match other.parse::<MonthKey>() {
            Ok(month) => month,
            Err(e) => {
                app.set_status(e.to_string());
                return Ok(());
            }
        },
    };
    select_month(app, target);
    Ok(())
}

fn cmd_next_month(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    select_month(app, app.state.selected_month.next());
    Ok(())
}

fn cmd_prev_month(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    select_month(app, app.state.selected_month.prev());
    Ok(())
}

fn select_month(app: &mut App, month: MonthKey) {
    let event = app.state.select_month(month);
    app.emit(event);
    app.transaction_index = 0;
    app.transaction_scroll = 0;
    app.set_status(format!("Month: {}", month.long_name()));
}

fn cmd_delete(args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    let target: Option<&Transaction> = if args.is_empty() {
        if app.screen != Screen::Transactions {
            app.set_status("Navigate to Transactions and select one first");
            return Ok(());
        }
        app.selected_transaction()
    } else {
        app.state.transactions.get(args)
    };

    match target.map(|t| (t.id.clone(), t.item.clone())) {
        Some((id, item)) => {
            app.confirm_message = format!("Delete '{item}'?");
            app.pending_action = Some(PendingAction::DeleteTransaction { id, item });
            app.input_mode = InputMode::Confirm;
        }
        None if args.is_empty() => app.set_status("No transaction selected"),
        None => app.set_status(format!("No transaction with id {args}")),
    }
    Ok(())
}

fn cmd_learn(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some((name, item)) = args.split_once(' ') else {
        app.set_status("Usage: :learn <category> <item>");
        return Ok(());
    };
    let item = item.trim();
    let Some(category) = Category::parse(name) else {
        app.set_status(format!("Unknown category: {name}"));
        return Ok(());
    };
    if item.is_empty() {
        app.set_status("Usage: :learn <category> <item>");
        return Ok(());
    }

    db.learn_category(item, category)?;
    app.suggester.learn(item, category);
    app.outbox.push(WorkerRequest::Learn {
        item: item.to_string(),
        category,
    });
    app.set_status(format!("'{item}' will be suggested as {category}"));
    Ok(())
}

fn cmd_export(args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    let month = app.state.selected_month;
    let path = if args.is_empty() {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/budgetrack-export-{month}.csv")
    } else {
        crate::run::shellexpand(args)
    };

    let txns = app.month_transactions();
    if txns.is_empty() {
        app.set_status(format!("No transactions in {month} to export"));
        return Ok(());
    }
    let count = export_to_csv(Path::new(&path), &txns)?;
    app.set_status(format!("Exported {count} transactions to {path}"));
    Ok(())
}

fn cmd_import(args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :import <file.csv>");
        return Ok(());
    }
    let path = crate::run::shellexpand(args);

    let incoming = match CsvImporter::from_path(Path::new(&path)) {
        Ok(txns) => txns,
        Err(e) => {
            app.set_status(format!("Import failed: {e}"));
            return Ok(());
        }
    };
    let (fresh, skipped) = skip_duplicates(app.state.transactions.all(), incoming);
    let count = fresh.len();
    if count > 0 {
        let event = app.state.import(fresh);
        app.emit(event);
    }
    app.set_status(format!("Imported {count} transactions ({skipped} duplicates skipped)"));
    Ok(())
}

fn cmd_receipt(args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :receipt <image or text file>");
        return Ok(());
    }
    let path = PathBuf::from(crate::run::shellexpand(args));
    if !path.is_file() {
        app.set_status(format!("File not found: {}", path.display()));
        return Ok(());
    }
    app.outbox.push(WorkerRequest::Receipt(path));
    app.set_status("Reading receipt…");
    Ok(())
}
