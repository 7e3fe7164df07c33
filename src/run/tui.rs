use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::{Duration, Instant};

use crate::ai::{AiService, AiWorker, WorkerReply, WorkerRequest};
use crate::analytics::InsightGenerator;
use crate::categorize::CategorySuggester;
use crate::config::Config;
use crate::db::Database;
use crate::state::AppState;
use crate::ui::app::{App, InputMode, PendingAction, Screen};
use crate::ui::commands;
use crate::ui::util::{scroll_down, scroll_to_bottom, scroll_to_top, scroll_up};

const TICK: Duration = Duration::from_millis(100);

pub(crate) fn as_tui(
    db: &mut Database,
    config: &Config,
    state: AppState,
    suggester: CategorySuggester,
) -> Result<()> {
    let generator = InsightGenerator::new(config.analytics.clone());
    let service = AiService::from_config(&config.ai, suggester.clone());
    let ai_enabled = service.is_configured();
    let service_endpoint = service.endpoint().map(str::to_owned);
    let worker = AiWorker::spawn(service, generator.clone())?;

    let mut app = App::new(state, generator, suggester, config.ai.debounce(), ai_enabled);
    if ai_enabled {
        tracing::info!(endpoint = ?service_endpoint, "AI assistant configured");
        worker.send(WorkerRequest::Health);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, db, &worker);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        tracing::error!("TUI exited with error: {e:?}");
        eprintln!("Error: {e:?}");
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    db: &mut Database,
    worker: &AiWorker,
) -> Result<()> {
    while app.running {
        app.flush_events(db)?;
        app.refresh_report();
        for request in app.outbox.drain(..) {
            worker.send(request);
        }

        terminal.draw(|f| {
            // tab + status + command bars, borders and table header
            let content_height = f.area().height.saturating_sub(6) as usize;
            app.visible_rows = content_height.max(1);
            crate::ui::render::render(f, app);
        })?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.show_help {
                    app.show_help = false;
                    continue;
                }
                match app.input_mode {
                    InputMode::Normal => handle_normal_input(key, app, db)?,
                    InputMode::Command => handle_command_input(key, app, db)?,
                    InputMode::Confirm => handle_confirm_input(key, app)?,
                }
            }
        }

        while let Some(reply) = worker.try_recv() {
            handle_reply(reply, app);
        }
        if let Some(request) = app.suggestions.poll(Instant::now()) {
            let amount = commands::preview_add(&app.command_input).and_then(|p| p.amount);
            worker.send(WorkerRequest::Suggest {
                request,
                amount,
                date: app.today,
            });
        }
    }
    Ok(())
}

// ── Worker replies ───────────────────────────────────────────

fn handle_reply(reply: WorkerReply, app: &mut App) {
    match reply {
        WorkerReply::Health(result) => app.note_assisted(&result),
        WorkerReply::Suggestion { generation, result } => {
            app.note_assisted(&result);
            app.suggestions.complete(generation, result.value);
        }
        WorkerReply::Receipt { path, result } => {
            app.note_assisted(&result);
            match result.value {
                Ok(data) => match data.to_form(app.today) {
                    Some(form) => {
                        app.command_input = format!(
                            "add {} {} {} @{} {}",
                            form.kind, form.amount, form.item, form.category, form.entry_date
                        );
                        app.input_mode = InputMode::Command;
                        app.track_command_input(Instant::now());
                        app.set_status(format!(
                            "Receipt read ({:.0}% confident), press Enter to add",
                            data.confidence * 100.0
                        ));
                    }
                    None => app.set_status(format!("No amount found in {}", path.display())),
                },
                Err(e) => app.set_status(format!("Could not read receipt: {e}")),
            }
        }
        WorkerReply::Insights {
            generation,
            month,
            result,
        } => {
            app.note_assisted(&result);
            let current = generation == app.insight_generation && month == app.state.selected_month;
            if current && !app.report.is_stale(&app.state, app.today) {
                app.report.set_insights(result.value);
            }
        }
    }
}

// ── Input handlers ───────────────────────────────────────────

fn handle_normal_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Char(':') => {
            app.input_mode = InputMode::Command;
            app.command_input.clear();
            app.suggestions.reset();
        }
        KeyCode::Char('q') | KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.running = false;
        }
        KeyCode::Char('j') | KeyCode::Down => handle_move_down(app),
        KeyCode::Char('k') | KeyCode::Up => handle_move_up(app),
        KeyCode::Char(c @ '1'..='4') => {
            let idx = c as usize - '1' as usize;
            if let Some(screen) = Screen::all().get(idx) {
                app.switch_screen(*screen);
            }
        }
        KeyCode::Tab => cycle_screen(app, true),
        KeyCode::BackTab => cycle_screen(app, false),
        KeyCode::Char('H') => commands::handle_command("prev-month", app, db)?,
        KeyCode::Char('L') => commands::handle_command("next-month", app, db)?,
        KeyCode::Char('g') => handle_goto_top(app),
        KeyCode::Char('G') => handle_goto_bottom(app),
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Char('+') | KeyCode::Char('=') if app.screen == Screen::Budgets => step_budget(app, true),
        KeyCode::Char('-') if app.screen == Screen::Budgets => step_budget(app, false),
        KeyCode::Char('D') if app.screen == Screen::Transactions => {
            commands::handle_command("delete", app, db)?;
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..app.visible_rows / 2 {
                handle_move_down(app);
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..app.visible_rows / 2 {
                handle_move_up(app);
            }
        }
        KeyCode::Esc => app.set_status(""),
        _ => {}
    }
    Ok(())
}

fn handle_command_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.clone();
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
            commands::handle_command(&input, app, db)?;
            app.suggestions.reset();
            return Ok(());
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
        }
        KeyCode::Backspace => {
            app.command_input.pop();
            if app.command_input.is_empty() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let trimmed = app.command_input.trim_end();
            if let Some(pos) = trimmed.rfind(' ') {
                app.command_input.truncate(pos + 1);
            } else {
                app.command_input.clear();
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char(c) => app.command_input.push(c),
        _ => return Ok(()),
    }
    app.track_command_input(Instant::now());
    Ok(())
}

fn handle_confirm_input(key: event::KeyEvent, app: &mut App) -> Result<()> {
    if let KeyCode::Char('y') | KeyCode::Char('Y') = key.code {
        if let Some(PendingAction::DeleteTransaction { id, item }) = app.pending_action.take() {
            match app.state.delete_transaction(&id) {
                Some(event) => {
                    app.emit(event);
                    app.set_status(format!("Deleted: {item}"));
                }
                None => app.set_status(format!("Already gone: {item}")),
            }
        }
    } else {
        app.pending_action = None;
        app.set_status("Cancelled");
    }
    app.input_mode = InputMode::Normal;
    app.confirm_message.clear();
    Ok(())
}

// ── Navigation ───────────────────────────────────────────────

fn cycle_screen(app: &mut App, forward: bool) {
    let screens = Screen::all();
    let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
    let next = if forward {
        (idx + 1) % screens.len()
    } else {
        (idx + screens.len() - 1) % screens.len()
    };
    app.switch_screen(screens[next]);
}

fn step_budget(app: &mut App, up: bool) {
    if let Some(category) = app.selected_budget() {
        let event = app.state.step_budget(category, up);
        app.emit(event);
        app.set_status(format!("{category}: ${}", app.state.budgets.get(category)));
    }
}

fn handle_move_down(app: &mut App) {
    match app.screen {
        Screen::Transactions => {
            let len = app.month_transactions().len();
            scroll_down(&mut app.transaction_index, &mut app.transaction_scroll, len, app.visible_rows);
        }
        Screen::Budgets => {
            if app.budget_index + 1 < app.budget_rows().len() {
                app.budget_index += 1;
            }
        }
        Screen::Dashboard | Screen::Insights => {}
    }
}

fn handle_move_up(app: &mut App) {
    match app.screen {
        Screen::Transactions => scroll_up(&mut app.transaction_index, &mut app.transaction_scroll),
        Screen::Budgets => app.budget_index = app.budget_index.saturating_sub(1),
        Screen::Dashboard | Screen::Insights => {}
    }
}

fn handle_goto_top(app: &mut App) {
    match app.screen {
        Screen::Transactions => scroll_to_top(&mut app.transaction_index, &mut app.transaction_scroll),
        Screen::Budgets => app.budget_index = 0,
        Screen::Dashboard | Screen::Insights => {}
    }
}

fn handle_goto_bottom(app: &mut App) {
    match app.screen {
        Screen::Transactions => {
            let len = app.month_transactions().len();
            scroll_to_bottom(&mut app.transaction_index, &mut app.transaction_scroll, len, app.visible_rows);
        }
        Screen::Budgets => app.budget_index = app.budget_rows().len().saturating_sub(1),
        Screen::Dashboard | Screen::Insights => {}
    }
}
