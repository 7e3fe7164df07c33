use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Sparkline},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::analytics::{monthly_expense_totals, to_f64, MonthReport};
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App, report: &MonthReport) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Summary cards
            Constraint::Min(8),    // Spending chart
            Constraint::Length(4), // Trend sparkline
        ])
        .split(area);

    render_summary_cards(f, chunks[0], app, report);
    render_spending_chart(f, chunks[1], report);
    render_trend_sparkline(f, chunks[2], report);
}

fn titled_block(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(format!(" {title} "), theme::title_style()))
}

fn render_summary_cards(f: &mut Frame, area: Rect, app: &App, report: &MonthReport) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25); 4])
        .split(area);

    let agg = &report.aggregate;
    let txns = app.month_transactions();
    let income_count = txns.iter().filter(|t| t.is_income()).count();
    let expense_count = txns.len() - income_count;
    let net = agg.net();

    render_card(
        f,
        cards[0],
        "Income",
        format_amount(agg.total_income()),
        theme::GREEN,
        format!("{income_count} txns"),
    );
    render_card(
        f,
        cards[1],
        "Expenses",
        format_amount(agg.total_expense()),
        theme::RED,
        format!("{expense_count} txns"),
    );
    render_card(
        f,
        cards[2],
        "Net",
        format_amount(net),
        if net >= Decimal::ZERO { theme::GREEN } else { theme::RED },
        String::new(),
    );

    let prediction = &report.prediction;
    let (projected, note) = if prediction.is_insufficient() {
        ("-".to_string(), prediction.data_quality.as_str().to_string())
    } else {
        (
            format!("${:.2}", prediction.projected_total),
            format!("{} days left", prediction.days_remaining),
        )
    };
    let budget = to_f64(app.state.budgets.total_for(crate::models::TxnType::Expense));
    let color = if !prediction.is_insufficient() && prediction.projected_total > budget {
        theme::RED
    } else {
        theme::YELLOW
    };
    render_card(f, cards[3], "Projected", projected, color, note);
}

fn render_card(f: &mut Frame, area: Rect, title: &str, value: String, color: Color, subtitle: String) {
    let text = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(subtitle, theme::dim_style())),
    ])
    .centered()
    .block(titled_block(title));

    f.render_widget(text, area);
}

fn render_spending_chart(f: &mut Frame, area: Rect, report: &MonthReport) {
    let spending = report.aggregate.expense_by_category();
    if spending.values().all(|v| v.is_zero()) {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No expenses for this month", theme::dim_style())),
            Line::from(Span::styled(
                "Add one with :add expense <amount> <item>",
                theme::dim_style(),
            )),
        ])
        .centered()
        .block(titled_block("Spending by Category"));
        f.render_widget(msg, area);
        return;
    }

    let bars: Vec<Bar> = spending
        .iter()
        .filter(|(_, amt)| !amt.is_zero())
        .map(|(category, amt)| {
            Bar::default()
                .value(amt.round().to_u64().unwrap_or(0))
                .label(Line::from(truncate(category.display_name(), 9)))
                .style(Style::default().fg(theme::ACCENT))
                .value_style(
                    Style::default()
                        .fg(theme::HEADER_BG)
                        .bg(theme::ACCENT)
                        .add_modifier(Modifier::BOLD),
                )
        })
        .collect();

    let chart = BarChart::default()
        .block(titled_block("Spending by Category"))
        .data(BarGroup::default().bars(&bars))
        .bar_width(9)
        .bar_gap(1);

    f.render_widget(chart, area);
}

fn render_trend_sparkline(f: &mut Frame, area: Rect, report: &MonthReport) {
    let data = monthly_expense_totals(&report.trend);

    let title = match (report.trend.first(), report.trend.last()) {
        (Some(first), Some(last)) => format!("Spending {} to {}", first.month, last.month),
        _ => "Spending Trend".to_string(),
    };

    let sparkline = Sparkline::default()
        .block(titled_block(&title))
        .data(&data)
        .style(Style::default().fg(theme::YELLOW));

    f.render_widget(sparkline, area);
}
