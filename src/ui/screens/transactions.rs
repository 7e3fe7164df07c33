use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let txns = app.month_transactions();
    let title = format!(
        " Transactions for {} ({}) ",
        app.state.selected_month.long_name(),
        txns.len()
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(title, theme::title_style()));

    if txns.is_empty() {
        let msg = vec![
            Line::from(""),
            Line::from(Span::styled("No transactions for this month", theme::dim_style())),
            Line::from(""),
            Line::from(Span::styled(
                "Add one with :add or import a CSV with :import <file>",
                theme::dim_style(),
            )),
        ];
        f.render_widget(Paragraph::new(msg).centered().block(block), area);
        return;
    }

    let header = Row::new(
        ["Date", "Item", "Category", "Amount"]
            .iter()
            .map(|h| Cell::from(*h).style(theme::header_style())),
    )
    .height(1);

    let rows: Vec<Row> = txns
        .iter()
        .enumerate()
        .skip(app.transaction_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, txn)| {
            let (amount_style, sign) = if txn.is_income() {
                (theme::income_style(), "+")
            } else {
                (theme::expense_style(), "-")
            };

            let style = if i == app.transaction_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };

            Row::new(vec![
                Cell::from(txn.entry_date.format("%Y-%m-%d").to_string()),
                Cell::from(truncate(&txn.item, 40)),
                Cell::from(txn.category.display_name()),
                Cell::from(Span::styled(
                    format!("{sign}{}", format_amount(txn.amount)),
                    amount_style,
                )),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Min(20),
        Constraint::Length(16),
        Constraint::Length(14),
    ];

    let table = Table::new(rows, widths).header(header).block(block);
    f.render_widget(table, area);
}
