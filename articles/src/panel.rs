//! Markdown rendered into titled, bordered panels for line-based terminal output.

use colored::{ColoredString, Colorize};
use ratatui::buffer::{Buffer, Cell};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier};
use ratatui::widgets::{Paragraph, Widget, Wrap};
use unicode_width::UnicodeWidthStr;

const MAX_WIDTH: usize = 100;

/// Renders `markdown` inside a rounded box with `title` in the top border.
/// The box fits its content and is at most `MAX_WIDTH` columns wide; longer
/// lines are word wrapped.
pub fn panel(title: &str, markdown: &str, border: colored::Color) -> String {
    let text = tui_markdown::from_str(markdown);
    let title = format!(" {} ", title);
    let title_width = title.width();
    let inner = text.width().max(title_width + 1).clamp(1, MAX_WIDTH - 4);

    // two consecutive wrapped rows hold more than `inner` columns
    let max_rows = text
        .lines
        .iter()
        .map(|line| 2 * line.width().div_ceil(inner) + 1)
        .sum::<usize>()
        .min(u16::MAX as usize);

    let area = Rect::new(0, 0, inner as u16, max_rows as u16);
    let mut buffer = Buffer::empty(area);
    Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .render(area, &mut buffer);

    let rows: Vec<&[Cell]> = buffer.content.chunks(inner).collect();
    let used = rows
        .iter()
        .rposition(|row| row.iter().any(|cell| !cell.symbol().trim().is_empty()))
        .map_or(0, |last| last + 1);

    let mut out = Vec::with_capacity(used + 2);
    out.push(format!(
        "{}{}{}",
        "╭─".color(border),
        title.bold(),
        format!("{}╮", "─".repeat((inner + 1).saturating_sub(title_width))).color(border)
    ));
    for row in &rows[..used] {
        out.push(format!(
            "{} {} {}",
            "│".color(border),
            render_row(row),
            "│".color(border)
        ));
    }
    out.push(
        format!("╰{}╯", "─".repeat(inner + 2))
            .color(border)
            .to_string(),
    );
    out.join("\n")
}

fn render_row(cells: &[Cell]) -> String {
    let mut out = String::new();
    let mut run = String::new();
    let mut style = (Color::Reset, Modifier::empty());
    let mut hidden = 0;

    for cell in cells {
        // cells covered by a wide character
        if hidden > 0 {
            hidden -= 1;
            continue;
        }
        hidden = cell.symbol().width().saturating_sub(1);

        let cell_style = (cell.fg, cell.modifier);
        if cell_style != style {
            push_run(&mut out, &run, style);
            run.clear();
            style = cell_style;
        }
        run.push_str(cell.symbol());
    }
    push_run(&mut out, &run, style);
    out
}

fn push_run(out: &mut String, run: &str, (fg, modifier): (Color, Modifier)) {
    if run.is_empty() {
        return;
    }

    let mut styled = ColoredString::from(run);
    if let Some(color) = terminal_color(fg) {
        styled = styled.color(color);
    }
    if modifier.contains(Modifier::BOLD) {
        styled = styled.bold();
    }
    if modifier.contains(Modifier::DIM) {
        styled = styled.dimmed();
    }
    if modifier.contains(Modifier::ITALIC) {
        styled = styled.italic();
    }
    if modifier.contains(Modifier::UNDERLINED) {
        styled = styled.underline();
    }
    if modifier.contains(Modifier::CROSSED_OUT) {
        styled = styled.strikethrough();
    }
    out.push_str(&styled.to_string());
}

fn terminal_color(color: Color) -> Option<colored::Color> {
    use colored::Color as Term;

    Some(match color {
        Color::Black => Term::Black,
        Color::Red => Term::Red,
        Color::Green => Term::Green,
        Color::Yellow => Term::Yellow,
        Color::Blue => Term::Blue,
        Color::Magenta => Term::Magenta,
        Color::Cyan => Term::Cyan,
        Color::Gray => Term::White,
        Color::DarkGray => Term::BrightBlack,
        Color::LightRed => Term::BrightRed,
        Color::LightGreen => Term::BrightGreen,
        Color::LightYellow => Term::BrightYellow,
        Color::LightBlue => Term::BrightBlue,
        Color::LightMagenta => Term::BrightMagenta,
        Color::LightCyan => Term::BrightCyan,
        Color::White => Term::BrightWhite,
        Color::Rgb(r, g, b) => Term::TrueColor { r, g, b },
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widths(rendered: &str) -> Vec<usize> {
        rendered.lines().map(UnicodeWidthStr::width).collect()
    }

    #[test]
    fn test_panel_renders_markdown() {
        colored::control::set_override(false);
        let rendered = panel(
            "Information Details",
            "Sales **doubled** in _two_ years.",
            colored::Color::Blue,
        );

        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[0].starts_with("╭─ Information Details ─"), "{rendered}");
        assert!(lines[0].ends_with('╮'));
        assert!(lines[lines.len() - 1].starts_with('╰'));
        assert!(rendered.contains("│ Sales doubled in two years."), "{rendered}");
        assert!(!rendered.contains("**"));

        let widths = widths(&rendered);
        assert!(widths.iter().all(|w| *w == widths[0]), "{widths:?}");
    }

    #[test]
    fn test_long_text_wraps_inside_the_box() {
        colored::control::set_override(false);
        let rendered = panel("Article", &"electric ".repeat(40), colored::Color::Green);

        assert!(rendered.lines().count() > 3, "{rendered}");
        assert!(widths(&rendered).iter().all(|w| *w == MAX_WIDTH), "{rendered}");
        assert_eq!(rendered.matches("electric").count(), 40);
    }

    #[test]
    fn test_wide_characters_keep_the_border_aligned() {
        colored::control::set_override(false);
        let rendered = panel(
            "电动汽车",
            "电动汽车正在改变城市交通。\n\nEV",
            colored::Color::Blue,
        );

        assert!(rendered.contains("电动汽车正在改变城市交通。"), "{rendered}");
        let widths = widths(&rendered);
        assert!(widths.iter().all(|w| *w == widths[0]), "{widths:?}");
    }
}
