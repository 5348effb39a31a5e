use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::task::{Priority, short_id};
use crate::view::{BoardView, FilterButton};

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    /// Colour follows the `color` key, read the same way as every other
    /// boolean setting, and is only ever used on a terminal.
    pub fn new(cfg: &Config) -> Self {
        let wanted = cfg.get_bool("color").unwrap_or(true);
        Self {
            color: wanted && io::stdout().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, out, view), fields(rows = view.rows.len()))]
    pub fn write_board<W: Write>(&self, mut out: W, view: &BoardView) -> anyhow::Result<()> {
        if let Some(empty) = view.empty_state {
            writeln!(out, "{}", empty.message())?;
        } else {
            let headers = vec![
                "ID".to_string(),
                "Pri".to_string(),
                "Done".to_string(),
                "Text".to_string(),
            ];

            let rows = view
                .rows
                .iter()
                .map(|row| {
                    let done = if row.done { "[x]" } else { "[ ]" };
                    let text = if row.done {
                        self.paint(&row.text, "9")
                    } else {
                        row.text.clone()
                    };
                    vec![
                        self.paint(short_id(&row.id), "33"),
                        self.paint_priority(row.priority),
                        done.to_string(),
                        text,
                    ]
                })
                .collect();

            write_table(&mut out, headers, rows)?;
        }

        writeln!(out)?;
        writeln!(out, "{}", view.progress.label())?;
        Ok(())
    }

    pub fn write_filters<W: Write>(&self, mut out: W, view: &BoardView) -> anyhow::Result<()> {
        write_button_line(&mut out, "Status", &view.status_buttons, |text| {
            self.paint(text, "1")
        })?;
        write_button_line(&mut out, "Priorität", &view.priority_buttons, |text| {
            self.paint(text, "1")
        })?;
        Ok(())
    }

    fn paint_priority(&self, priority: Priority) -> String {
        let code = match priority {
            Priority::Low => "36",
            Priority::Medium => "0",
            Priority::High => "31",
        };
        self.paint(priority.as_str(), code)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_button_line<W: Write>(
    mut writer: W,
    title: &str,
    buttons: &[FilterButton],
    highlight: impl Fn(&str) -> String,
) -> anyhow::Result<()> {
    let parts: Vec<String> = buttons
        .iter()
        .map(|button| {
            let text = format!("{} ({})", button.label, button.count);
            if button.active {
                highlight(&format!("[{text}]"))
            } else {
                text
            }
        })
        .collect();
    writeln!(writer, "{title}: {}", parts.join("  "))?;
    Ok(())
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
