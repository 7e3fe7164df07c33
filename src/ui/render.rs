use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use super::app::{AiStatus, App, InputMode, Screen};
use super::commands;
use super::theme;

pub(crate) fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Tab bar
            Constraint::Min(5),    // Main content
            Constraint::Length(1), // Status bar
            Constraint::Length(1), // Command bar
        ])
        .split(f.area());

    render_tab_bar(f, chunks[0], app);
    render_screen(f, chunks[1], app);
    render_status_bar(f, chunks[2], app);
    render_command_bar(f, chunks[3], app);

    if app.show_help {
        render_help_overlay(f, f.area());
    }
}

fn render_tab_bar(f: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<Line> = Screen::all()
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let num = i + 1;
            if *s == app.screen {
                Line::from(vec![
                    Span::styled(format!("{num}:"), theme::dim_style()),
                    Span::styled(
                        format!("{s}"),
                        Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD),
                    ),
                ])
            } else {
                Line::from(Span::styled(format!("{num}:{s}"), theme::dim_style()))
            }
        })
        .collect();

    let tabs = Tabs::new(titles)
        .divider(Span::styled(" | ", Style::default().fg(theme::OVERLAY)))
        .style(Style::default().bg(theme::HEADER_BG));

    f.render_widget(tabs, area);
}

fn render_screen(f: &mut Frame, area: Rect, app: &App) {
    let Some(report) = app.month_report() else {
        let msg = Paragraph::new(Span::styled("Loading…", theme::dim_style())).centered();
        f.render_widget(msg, area);
        return;
    };

    match app.screen {
        Screen::Dashboard => super::screens::dashboard::render(f, area, app, report),
        Screen::Transactions => super::screens::transactions::render(f, area, app),
        Screen::Budgets => super::screens::budgets::render(f, area, app, report),
        Screen::Insights => super::screens::insights::render(f, area, app, report),
    }
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mode_label = format!(" {} ", app.input_mode);
    let mode_bg = match app.input_mode {
        InputMode::Normal => theme::ACCENT,
        InputMode::Command => theme::GREEN,
        InputMode::Confirm => theme::RED,
    };
    let mode_style = Style::default()
        .fg(theme::HEADER_BG)
        .bg(mode_bg)
        .add_modifier(Modifier::BOLD);

    let info = format!(
        " {} | {} | {} txns | ",
        app.screen,
        app.state.selected_month.long_name(),
        app.month_transactions().len()
    );
    let ai_label = format!("{}", app.ai_status);
    let ai_style = match app.ai_status {
        AiStatus::Online => Style::default().fg(theme::GREEN).bg(theme::SURFACE),
        AiStatus::Offline => Style::default().fg(theme::YELLOW).bg(theme::SURFACE),
        AiStatus::Checking | AiStatus::Disabled => theme::status_bar_style(),
    };

    let right = match app.screen {
        Screen::Dashboard => " H/L month | :add | ? help ",
        Screen::Transactions => " j/k move | D delete | ? help ",
        Screen::Budgets => " j/k move | +/- adjust | ? help ",
        Screen::Insights => " H/L month | :learn | ? help ",
    };

    let available = area.width as usize;
    let used = mode_label.chars().count() + info.chars().count() + ai_label.chars().count() + right.len();
    let pad = available.saturating_sub(used);

    let bar = Paragraph::new(Line::from(vec![
        Span::styled(&mode_label, mode_style),
        Span::styled(&info, theme::status_bar_style()),
        Span::styled(&ai_label, ai_style),
        Span::styled(" ".repeat(pad), theme::status_bar_style()),
        Span::styled(right, theme::status_bar_style()),
    ]));
    f.render_widget(bar, area);
}

fn render_command_bar(f: &mut Frame, area: Rect, app: &App) {
    let (content, cursor_offset) = match app.input_mode {
        InputMode::Command => {
            let mut spans = vec![
                Span::styled(":", Style::default().fg(theme::ACCENT)),
                Span::styled(&app.command_input, theme::command_bar_style()),
            ];
            if let Some(s) = app.suggestions.current() {
                spans.push(Span::styled(
                    format!("   → {} ({:.0}%)", s.category, s.confidence * 100.0),
                    theme::suggestion_style(),
                ));
            }
            (
                Line::from(spans),
                Some(1 + app.command_input.chars().count() as u16),
            )
        }
        InputMode::Confirm => (
            Line::from(vec![
                Span::styled(&app.confirm_message, Style::default().fg(theme::YELLOW)),
                Span::styled(" [y/N] ", Style::default().fg(theme::RED)),
            ]),
            None,
        ),
        InputMode::Normal => (
            if app.status_message.is_empty() {
                Line::from(Span::styled(" Press : for commands, ? for help", theme::dim_style()))
            } else {
                Line::from(Span::styled(&app.status_message, theme::command_bar_style()))
            },
            None,
        ),
    };

    let bar = Paragraph::new(content).style(Style::default().bg(theme::COMMAND_BG));
    f.render_widget(bar, area);

    if let Some(offset) = cursor_offset {
        f.set_cursor_position((area.x + offset, area.y));
    }
}

fn help_row(text: &str) -> Line<'_> {
    Line::from(Span::styled(text, theme::normal_style()))
}

fn render_help_overlay(f: &mut Frame, area: Rect) {
    let mut help_text = vec![
        Line::from(Span::styled(
            " Budgetrack Help ",
            Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", theme::section_style())),
        help_row("  j/k or Up/Down   Move cursor           1-4        Switch tabs"),
        help_row("  Tab/Shift-Tab    Cycle tabs            g/G        Top/Bottom"),
        help_row("  H/L              Prev/Next month       Ctrl-q     Quit"),
        Line::from(""),
        Line::from(Span::styled(" Actions", theme::section_style())),
        help_row("  :                Command mode          Esc        Cancel"),
        help_row("  D (Transactions) Delete transaction    +/- (Budgets) Adjust by 50"),
        help_row("  While typing :add, the suggested category appears on the right"),
        Line::from(""),
        Line::from(Span::styled(" Commands", theme::section_style())),
    ];

    // One line per command, skipping short aliases
    let mut seen = std::collections::HashSet::new();
    let mut cmd_lines: Vec<(&str, &str)> = commands::COMMANDS
        .iter()
        .filter(|(name, _)| name.len() > 2)
        .filter(|(_, cmd)| seen.insert(cmd.description))
        .map(|(&name, cmd)| (name, cmd.description))
        .collect();
    cmd_lines.sort_by_key(|(name, _)| *name);
    for (name, desc) in &cmd_lines {
        help_text.push(Line::from(Span::styled(
            format!("  :{name:<14} {desc}"),
            theme::normal_style(),
        )));
    }

    help_text.push(Line::from(""));
    help_text.push(Line::from(Span::styled(" Press any key to close ", theme::dim_style())));

    let popup_height = (help_text.len() as u16 + 2).min(area.height.saturating_sub(2));
    let popup_width = 80.min(area.width.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(x, y, popup_width, popup_height);

    f.render_widget(Clear, popup_area);
    let help = Paragraph::new(help_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::ACCENT))
            .style(Style::default().bg(theme::HEADER_BG)),
    );
    f.render_widget(help, popup_area);
}
