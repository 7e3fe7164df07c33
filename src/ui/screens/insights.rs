use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::analytics::{InsightKind, MonthReport, TrendDirection};
use crate::ui::app::App;
use crate::ui::theme;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App, report: &MonthReport) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(4)])
        .split(cols[0]);

    render_prediction(f, left[0], report);
    render_trends(f, left[1], report);
    render_insights(f, cols[1], app, report);
}

fn block(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(title, theme::title_style()))
}

fn render_prediction(f: &mut Frame, area: Rect, report: &MonthReport) {
    let p = &report.prediction;
    let lines = if p.is_insufficient() {
        vec![
            Line::from(""),
            Line::from(Span::styled("Not enough data to project this month", theme::dim_style())),
        ]
    } else {
        let mut lines = vec![
            Line::from(vec![
                Span::styled("Spent so far     ", theme::dim_style()),
                Span::styled(format!("${:.2}", p.current_spending), theme::expense_style()),
            ]),
            Line::from(vec![
                Span::styled("Projected total  ", theme::dim_style()),
                Span::styled(
                    format!("${:.2}", p.projected_total),
                    Style::default().fg(theme::YELLOW).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("Daily average    ", theme::dim_style()),
                Span::styled(format!("${:.2}", p.avg_daily), theme::normal_style()),
            ]),
            Line::from(vec![
                Span::styled("Last 7 days      ", theme::dim_style()),
                Span::styled(format!("${:.2}/day", p.recent_daily), theme::normal_style()),
            ]),
            Line::from(vec![
                Span::styled("Day              ", theme::dim_style()),
                Span::styled(
                    format!("{} of {} ({} left)", p.current_day, p.days_in_month, p.days_remaining),
                    theme::normal_style(),
                ),
            ]),
            Line::from(vec![
                Span::styled("Data quality     ", theme::dim_style()),
                Span::styled(p.data_quality.as_str(), theme::normal_style()),
            ]),
        ];
        for rec in report.recommendations.iter().take(2) {
            lines.push(Line::from(Span::styled(
                format!("• {}", rec.message),
                theme::dim_style(),
            )));
        }
        lines
    };

    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(block(format!(" Forecast for {} ", p.month.long_name())));
    f.render_widget(widget, area);
}

fn render_trends(f: &mut Frame, area: Rect, report: &MonthReport) {
    let lines: Vec<Line> = if report.category_trends.is_empty() {
        vec![Line::from(Span::styled("No spending history yet", theme::dim_style()))]
    } else {
        report
            .category_trends
            .iter()
            .map(|t| {
                let (arrow, style) = match t.direction {
                    TrendDirection::Increasing => ("↑", theme::expense_style()),
                    TrendDirection::Decreasing => ("↓", theme::income_style()),
                    TrendDirection::Stable => ("→", theme::dim_style()),
                };
                Line::from(vec![
                    Span::styled(format!("{arrow} "), style),
                    Span::styled(format!("{:<14}", t.category.display_name()), theme::normal_style()),
                    Span::styled(
                        format!(
                            "{:<11} avg ${:.0}  recent ${:.0}",
                            t.direction.as_str(),
                            t.average,
                            t.recent
                        ),
                        theme::dim_style(),
                    ),
                ])
            })
            .collect()
    };

    let widget = Paragraph::new(lines).block(block(" Category Trends ".to_string()));
    f.render_widget(widget, area);
}

fn render_insights(f: &mut Frame, area: Rect, app: &App, report: &MonthReport) {
    let mut lines: Vec<Line> = Vec::new();
    if report.insights.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Nothing to report yet. Keep adding transactions.",
            theme::dim_style(),
        )));
    }

    for insight in &report.insights {
        let icon = match insight.kind {
            InsightKind::Warning => "!",
            InsightKind::Success => "✓",
            InsightKind::Info => "i",
        };
        let color = theme::priority_color(insight.priority);
        lines.push(Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(theme::HEADER_BG).bg(color)),
            Span::styled(
                format!(" {} ", insight.title),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("[{}]", insight.priority.as_str()), theme::dim_style()),
        ]));
        lines.push(Line::from(Span::styled(
            format!("    {}", insight.message),
            theme::normal_style(),
        )));
        if !insight.action.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("    → {}", insight.action),
                theme::dim_style(),
            )));
        }
        lines.push(Line::from(""));
    }

    let title = format!(" Insights ({}) · {} ", report.insights.len(), app.ai_status);
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(block(title));
    f.render_widget(widget, area);
}
