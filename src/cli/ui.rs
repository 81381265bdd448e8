use crate::core::view::ViewState;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Result,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Result => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Renders the conversion form: amount and currency fields, the convert
/// button and the result line.
pub fn render_form(view: &ViewState) -> String {
    let mut table = new_styled_table();
    table.set_header(vec![
        header_cell("Amount"),
        header_cell("From"),
        header_cell(""),
        header_cell("To"),
    ]);
    table.add_row(vec![
        Cell::new(view.amount_display()).set_alignment(CellAlignment::Right),
        Cell::new(&view.source),
        Cell::new("\u{21c4}").fg(Color::DarkGrey),
        Cell::new(&view.target),
    ]);

    let mut lines = vec![
        table.to_string(),
        style_text(&format!("[ {} ]", view.button_label()), StyleType::Subtle),
    ];

    let result_line = view.result_line();
    match &view.result {
        Some(result) if view.request().is_convertible() => {
            lines.push(style_text(&result_line, StyleType::Result));
            let as_of = result
                .rate_updated_at
                .map(|ts| format!(" as of {}", ts.format("%Y-%m-%d %H:%M UTC")))
                .unwrap_or_default();
            lines.push(style_text(
                &format!(
                    "1 {} = {} {}{}",
                    result.request.source, result.rate, result.request.target, as_of
                ),
                StyleType::Subtle,
            ));
        }
        _ => lines.push(style_text(&result_line, StyleType::Error)),
    }

    lines.join("\n")
}

/// Creates a spinner shown while a rate is being fetched.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Prints a separator line matching the terminal width.
pub fn print_separator() {
    let term_width = console::Term::stdout()
        .size_checked()
        .map(|(_, w)| w as usize)
        .unwrap_or(80);
    println!("\n{}", "─".repeat(term_width));
}
