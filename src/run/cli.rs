use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::path::Path;

use crate::ai::{AiService, Assisted, Source};
use crate::analytics::{aggregate_month, predict_month, recommendations, InsightGenerator};
use crate::categorize::CategorySuggester;
use crate::config::Config;
use crate::db::Database;
use crate::import::{export_to_csv, skip_duplicates, CsvImporter};
use crate::models::{parse_amount, Category, MonthKey, NewTransaction, TxnType};
use crate::state::AppState;

/// Everything a one-shot command needs, loaded once by `main`.
pub(crate) struct CliContext<'a> {
    pub(crate) db: &'a mut Database,
    pub(crate) config: &'a Config,
    pub(crate) state: AppState,
    pub(crate) suggester: CategorySuggester,
}

impl CliContext<'_> {
    fn service(&self) -> AiService {
        AiService::from_config(&self.config.ai, self.suggester.clone())
    }

    fn generator(&self) -> InsightGenerator {
        InsightGenerator::new(self.config.analytics.clone())
    }

    fn save(&mut self) -> Result<()> {
        self.db.save_state(&self.state)
    }
}

pub(crate) fn as_cli(args: &[String], mut ctx: CliContext<'_>) -> Result<()> {
    let rest = &args[2..];
    match args[1].as_str() {
        "add" | "a" => cli_add(rest, &mut ctx),
        "summary" | "s" => cli_summary(rest, &ctx),
        "predict" | "p" => cli_predict(rest, &ctx),
        "insights" | "i" => cli_insights(rest, &mut ctx),
        "suggest" => cli_suggest(rest, &ctx),
        "budget" => cli_budget(rest, &mut ctx),
        "categories" => cli_categories(rest, &ctx),
        "receipt" => cli_receipt(rest, &mut ctx),
        "import" => cli_import(rest, &mut ctx),
        "export" => cli_export(rest, &ctx),
        "delete" => cli_delete(rest, &mut ctx),
        "learn" => cli_learn(rest, &mut ctx),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("budgetrack {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("Budgetrack - local-first budget tracker with predictions and insights");
    println!();
    println!("Usage: budgetrack [command]");
    println!();
    println!("Commands:");
    println!("  (none)                                 Launch interactive TUI");
    println!("  add <income|expense> <amount> <item>   Record a transaction");
    println!("    --category <name>                    Category (suggested when omitted)");
    println!("    --date <YYYY-MM-DD>                  Entry date (default: today)");
    println!("  summary [YYYY-MM]                      Totals and budgets for a month");
    println!("  predict [YYYY-MM]                      Month-end spending projection");
    println!("  insights [YYYY-MM]                     Ranked spending insights");
    println!("  suggest <income|expense> <item>        Suggest a category");
    println!("    --amount <N>                         Amount hint");
    println!("  budget <category> <amount>             Set a monthly budget");
    println!("  categories [income|expense]            List categories");
    println!("  receipt <file> [--add]                 Read a receipt image or text file");
    println!("  import <file.csv>                      Import transactions from CSV");
    println!("  export [path] [--month YYYY-MM]        Export a month to CSV");
    println!("  delete <id>                            Delete a transaction");
    println!("  learn <category> <item>                Always suggest <category> for <item>");
    println!("  --help, -h                             Show this help");
    println!("  --version, -V                          Show version");
}

// ── Argument helpers ─────────────────────────────────────────

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// Arguments that are neither `--flag` nor the value following one.
/// `--add` is the only flag without a value.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--add" {
            continue;
        }
        if arg.starts_with("--") {
            iter.next();
            continue;
        }
        out.push(arg.as_str());
    }
    out
}

fn month_arg(args: &[String], state: &AppState) -> Result<MonthKey> {
    match positional(args).first() {
        Some(raw) => Ok(raw.parse::<MonthKey>()?),
        None => Ok(state.selected_month),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_notice<T>(result: &Assisted<T>) {
    if let Some(notice) = &result.notice {
        eprintln!("{notice}");
    }
}

fn source_label(source: Source) -> &'static str {
    match source {
        Source::Remote => "AI",
        Source::Local => "local",
    }
}

// ── Commands ─────────────────────────────────────────────────

fn cli_add(args: &[String], ctx: &mut CliContext<'_>) -> Result<()> {
    let pos = positional(args);
    if pos.len() < 3 {
        anyhow::bail!("Usage: budgetrack add <income|expense> <amount> <item...> [--category C] [--date YYYY-MM-DD]");
    }
    let today = today();
    let mut form = NewTransaction {
        item: pos[2..].join(" "),
        amount: pos[1].to_string(),
        kind: pos[0].to_string(),
        category: flag_value(args, "--category").unwrap_or("").to_string(),
        entry_date: flag_value(args, "--date")
            .map(str::to_string)
            .unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
    };

    if form.category.is_empty() {
        if let Some(kind) = TxnType::parse(&form.kind) {
            let date = NaiveDate::parse_from_str(&form.entry_date, "%Y-%m-%d").unwrap_or(today);
            let mut service = ctx.service();
            let result = service.suggest_category(&form.item, kind, parse_amount(&form.amount).ok(), date);
            print_notice(&result);
            println!(
                "Suggested category: {} ({:.0}%, {}) - {}",
                result.value.category,
                result.value.confidence * 100.0,
                source_label(result.source),
                result.value.reasoning
            );
            form.category = result.value.category.key().to_string();
        }
    }

    let txn = form.validate()?;
    println!(
        "Added {} {} ${} to {} on {} (id {})",
        txn.kind, txn.item, txn.amount, txn.category, txn.entry_date, txn.id
    );
    ctx.state.add_transaction(txn);
    ctx.save()
}

fn cli_summary(args: &[String], ctx: &CliContext<'_>) -> Result<()> {
    let month = month_arg(args, &ctx.state)?;
    let agg = aggregate_month(ctx.state.transactions.all(), month, &ctx.state.budgets);
    let count = ctx.state.transactions.for_month(month).count();

    println!("Budgetrack - {}", month.long_name());
    println!("{}", "─".repeat(56));
    println!("  Income:     ${:.2}", agg.total_income());
    println!("  Expenses:   ${:.2}", agg.total_expense());
    println!("  Net:        ${:.2}", agg.net());
    println!("  Txns:       {count}");

    for kind in [TxnType::Expense, TxnType::Income] {
        println!();
        println!(
            "{:<18} {:>12} {:>12} {:>12} {:>8}",
            match kind {
                TxnType::Expense => "Expenses",
                TxnType::Income => "Income",
            },
            "Actual",
            "Budget",
            "Left",
            "Used"
        );
        for total in agg.totals(kind) {
            let flag = if kind == TxnType::Expense && total.is_over() { " !" } else { "" };
            println!(
                "  {:<16} {:>12.2} {:>12.2} {:>12.2} {:>7.0}%{flag}",
                total.category.display_name(),
                total.total,
                total.budget,
                total.remaining(),
                total.ratio() * 100.0
            );
        }
    }
    Ok(())
}

fn cli_predict(args: &[String], ctx: &CliContext<'_>) -> Result<()> {
    let month = month_arg(args, &ctx.state)?;
    let txns = ctx.state.transactions.all();
    let prediction = predict_month(txns, month, today());

    println!("Spending forecast - {}", month.long_name());
    println!("{}", "─".repeat(48));
    if prediction.is_insufficient() {
        println!("  Not enough data: no expenses recorded for {month}");
        return Ok(());
    }
    println!("  Spent so far:     ${:.2}", prediction.current_spending);
    println!("  Projected total:  ${:.2}", prediction.projected_total);
    println!("  Daily average:    ${:.2}", prediction.avg_daily);
    println!("  Recent daily:     ${:.2}", prediction.recent_daily);
    println!(
        "  Day:              {} of {} ({} remaining)",
        prediction.current_day, prediction.days_in_month, prediction.days_remaining
    );
    println!("  Data quality:     {}", prediction.data_quality);

    let mut service = ctx.service();
    let forecast = service.predict_spending(txns, &prediction);
    print_notice(&forecast);
    let f = &forecast.value;
    println!();
    println!(
        "Next {} days ({}): ${:.2} (range ${:.2} to ${:.2}, {})",
        f.days_ahead,
        source_label(forecast.source),
        f.amount,
        f.low,
        f.high,
        f.trend
    );
    for factor in &f.factors {
        println!("  - {factor}");
    }

    let recs = recommendations(&prediction, &ctx.state.budgets);
    if !recs.is_empty() {
        println!();
        for rec in &recs {
            println!("{}: {}", rec.title, rec.message);
        }
    }
    Ok(())
}

fn cli_insights(args: &[String], ctx: &mut CliContext<'_>) -> Result<()> {
    let month = month_arg(args, &ctx.state)?;
    ctx.state.selected_month = month;
    let generator = ctx.generator();
    let txns = ctx.state.transactions.all();
    let prediction = predict_month(txns, month, today());
    let local = generator.generate(txns, &ctx.state.budgets, month, &prediction);

    let mut service = ctx.service();
    let result = service.advanced_insights(&ctx.state, &generator, local);
    print_notice(&result);

    println!("Insights - {}", month.long_name());
    println!("{}", "─".repeat(48));
    if result.value.is_empty() {
        println!("  Nothing to report yet");
    }
    for insight in &result.value {
        println!(
            "[{}/{}] {}",
            insight.priority.as_str(),
            insight.kind.as_str(),
            insight.title
        );
        println!("    {}", insight.message);
        if !insight.action.is_empty() {
            println!("    -> {}", insight.action);
        }
    }
    Ok(())
}

fn cli_suggest(args: &[String], ctx: &CliContext<'_>) -> Result<()> {
    let pos = positional(args);
    let kind = pos
        .first()
        .and_then(|k| TxnType::parse(k))
        .context("Usage: budgetrack suggest <income|expense> <item...> [--amount N]")?;
    let item = pos[1..].join(" ");
    let amount = flag_value(args, "--amount").map(parse_amount).transpose()?;

    let mut service = ctx.service();
    let result = service.suggest_category(&item, kind, amount, today());
    print_notice(&result);
    let s = &result.value;
    println!(
        "{} ({:.0}% confidence, {})",
        s.category,
        s.confidence * 100.0,
        source_label(result.source)
    );
    println!("  {}", s.reasoning);
    Ok(())
}

fn cli_budget(args: &[String], ctx: &mut CliContext<'_>) -> Result<()> {
    let (Some(name), Some(raw)) = (args.first(), args.get(1)) else {
        anyhow::bail!("Usage: budgetrack budget <category> <amount>");
    };
    let category = Category::parse(name).with_context(|| format!("Unknown category: {name}"))?;
    let limit = parse_amount(raw)?;
    if ctx.state.set_budget(category, limit).is_some() {
        ctx.save()?;
    }
    println!("Budget for {category}: ${}", ctx.state.budgets.get(category));
    Ok(())
}

fn cli_categories(args: &[String], ctx: &CliContext<'_>) -> Result<()> {
    let kinds: Vec<TxnType> = match args.first() {
        Some(raw) => vec![TxnType::parse(raw).with_context(|| format!("Unknown transaction type: {raw}"))?],
        None => TxnType::all().to_vec(),
    };
    for kind in kinds {
        println!("{kind}:");
        for category in Category::all_for(kind) {
            println!(
                "  {:<10} {:<16} default ${}",
                category.key(),
                category.display_name(),
                category.default_budget()
            );
        }
    }
    let learned = ctx.suggester.learned_count();
    if learned > 0 {
        println!("{learned} learned item mappings");
    }
    Ok(())
}

fn cli_receipt(args: &[String], ctx: &mut CliContext<'_>) -> Result<()> {
    let Some(raw) = positional(args).first().copied() else {
        anyhow::bail!("Usage: budgetrack receipt <file> [--add]");
    };
    let path = shellexpand(raw);
    let path = Path::new(&path);
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let mut service = ctx.service();
    let result = service.process_receipt(path);
    print_notice(&result);
    let source = result.source;
    let data = result
        .value
        .with_context(|| format!("Could not read receipt {}", path.display()))?;

    println!("Receipt ({}, {:.0}% confident)", source_label(source), data.confidence * 100.0);
    println!("  Vendor:   {}", data.vendor.as_deref().unwrap_or("-"));
    println!(
        "  Amount:   {}",
        data.amount.map_or_else(|| "-".to_string(), |a| format!("${a}"))
    );
    println!(
        "  Date:     {}",
        data.date.map_or_else(|| "-".to_string(), |d| d.to_string())
    );
    println!(
        "  Category: {}",
        data.suggested_category.map_or("-", |c| c.display_name())
    );

    if !args.iter().any(|a| a == "--add") {
        return Ok(());
    }
    let form = data
        .to_form(today())
        .context("No total found on the receipt, nothing to add")?;
    let txn = form.validate()?;
    println!("Added {} ${} to {} (id {})", txn.item, txn.amount, txn.category, txn.id);
    ctx.state.add_transaction(txn);
    ctx.save()
}

fn cli_import(args: &[String], ctx: &mut CliContext<'_>) -> Result<()> {
    let Some(file_path) = args.first() else {
        anyhow::bail!("Usage: budgetrack import <file.csv>");
    };
    let expanded = shellexpand(file_path);
    let path = Path::new(&expanded);
    if !path.exists() {
        anyhow::bail!("File not found: {file_path}");
    }

    let incoming = CsvImporter::from_path(path)?;
    println!("Parsed {} transactions", incoming.len());
    let (fresh, skipped) = skip_duplicates(ctx.state.transactions.all(), incoming);
    let count = fresh.len();
    if count > 0 {
        ctx.state.import(fresh);
        ctx.save()?;
    }
    println!("Imported {count} new transactions ({skipped} duplicates skipped)");
    Ok(())
}

fn cli_export(args: &[String], ctx: &CliContext<'_>) -> Result<()> {
    let month = match flag_value(args, "--month") {
        Some(raw) => raw.parse::<MonthKey>()?,
        None => ctx.state.selected_month,
    };

    let output_path = positional(args)
        .first()
        .map(|a| shellexpand(a))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            format!("{home}/budgetrack-export-{month}.csv")
        });

    let txns: Vec<_> = ctx.state.transactions.for_month(month).collect();
    if txns.is_empty() {
        println!("No transactions for {month}");
        return Ok(());
    }
    let count = export_to_csv(Path::new(&output_path), &txns)?;
    println!("Exported {count} transactions to {output_path}");
    Ok(())
}

fn cli_delete(args: &[String], ctx: &mut CliContext<'_>) -> Result<()> {
    let Some(id) = args.first() else {
        anyhow::bail!("Usage: budgetrack delete <id>");
    };
    let item = ctx
        .state
        .transactions
        .get(id)
        .map(|t| t.item.clone())
        .with_context(|| format!("No transaction with id {id}"))?;
    ctx.state.delete_transaction(id);
    ctx.save()?;
    println!("Deleted: {item}");
    Ok(())
}

fn cli_learn(args: &[String], ctx: &mut CliContext<'_>) -> Result<()> {
    let Some(name) = args.first() else {
        anyhow::bail!("Usage: budgetrack learn <category> <item...>");
    };
    let category = Category::parse(name).with_context(|| format!("Unknown category: {name}"))?;
    let item = args[1..].join(" ");
    if item.trim().is_empty() {
        anyhow::bail!("Usage: budgetrack learn <category> <item...>");
    }
    ctx.db.learn_category(&item, category)?;
    println!("'{}' will be suggested as {category}", item.trim());
    Ok(())
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}
