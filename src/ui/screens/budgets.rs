use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::analytics::{CategoryTotal, MonthReport};
use crate::models::TxnType;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, progress_bar, usage_color};

const BAR_WIDTH: usize = 20;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App, report: &MonthReport) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(3)])
        .split(area);

    let selected = app.selected_budget();
    let agg = &report.aggregate;

    let mut items: Vec<ListItem> = Vec::new();
    for kind in [TxnType::Expense, TxnType::Income] {
        items.push(ListItem::new(Line::from(Span::styled(
            match kind {
                TxnType::Expense => " Expenses (spent / budget)",
                TxnType::Income => " Income (received / target)",
            },
            theme::section_style(),
        ))));
        for total in agg.totals(kind) {
            items.push(budget_row(total, kind, Some(total.category) == selected));
        }
    }

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                format!(" Budgets for {} ", app.state.selected_month.long_name()),
                theme::title_style(),
            )),
    );
    f.render_widget(list, chunks[0]);

    render_totals(f, chunks[1], app);
}

fn budget_row(total: &CategoryTotal, kind: TxnType, is_selected: bool) -> ListItem<'static> {
    let ratio = total.ratio();
    let color = match kind {
        TxnType::Expense => usage_color(ratio),
        // Reaching an income target is good news
        TxnType::Income if ratio >= 1.0 => theme::GREEN,
        TxnType::Income => theme::ACCENT,
    };
    let name_style = if is_selected {
        theme::selected_style()
    } else {
        theme::normal_style()
    };

    ListItem::new(Line::from(vec![
        Span::styled(format!("  {:<16}", total.category.display_name()), name_style),
        Span::styled(
            format!(
                "{:>11} / {:<11} ",
                format_amount(total.total),
                format_amount(total.budget)
            ),
            Style::default().fg(color),
        ),
        Span::styled(progress_bar(ratio, BAR_WIDTH), Style::default().fg(color)),
        Span::styled(
            format!(" {:>4.0}%", ratio * 100.0),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
    ]))
}

fn render_totals(f: &mut Frame, area: Rect, app: &App) {
    let budgets = &app.state.budgets;
    let line = Line::from(vec![
        Span::styled(" Expense budget ", theme::dim_style()),
        Span::styled(
            format_amount(budgets.total_for(TxnType::Expense)),
            theme::expense_style(),
        ),
        Span::styled("   Income target ", theme::dim_style()),
        Span::styled(
            format_amount(budgets.total_for(TxnType::Income)),
            theme::income_style(),
        ),
        Span::styled("   +/- adjusts the selected row", theme::dim_style()),
    ]);
    let p = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY)),
    );
    f.render_widget(p, area);
}
