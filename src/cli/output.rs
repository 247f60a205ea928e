//! Terminal output for the `genesis` CLI
//!
//! Every helper has a plain rendering for `--no-color` and pipes; tests and
//! scripts match on the plain form (`=== Section ===`, `key: value`, `- item`).

use owo_colors::OwoColorize;

/// Printer honoring the `--no-color` flag
pub struct Output {
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Apply `paint` only when colors are on
    fn paint(&self, text: &str, paint: impl FnOnce(&str) -> String) -> String {
        if self.colored {
            paint(text)
        } else {
            text.to_string()
        }
    }

    pub fn banner(&self) {
        let version = format!("A2A orchestration v{}", env!("CARGO_PKG_VERSION"));
        println!(
            "\n   {}  {}\n",
            self.paint("GENESIS", |t| t.bright_cyan().bold().to_string()),
            self.paint(&version, |t| t.dimmed().to_string())
        );
    }

    pub fn success(&self, message: &str) {
        let mark = if self.colored { "✓" } else { "[OK]" };
        println!(
            "  {} {}",
            self.paint(mark, |t| t.green().bold().to_string()),
            message
        );
    }

    pub fn warning(&self, message: &str) {
        let mark = if self.colored { "!" } else { "[WARN]" };
        println!(
            "  {} {}",
            self.paint(mark, |t| t.yellow().bold().to_string()),
            self.paint(message, |t| t.yellow().to_string())
        );
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "›".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// Top-level section title
    pub fn section(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Nested section title
    pub fn subsection(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.cyan().bold());
        } else {
            println!("\n  --- {} ---", title);
        }
    }

    pub fn field(&self, key: &str, value: &str) {
        println!(
            "    {}: {}",
            self.paint(key, |t| t.dimmed().to_string()),
            value
        );
    }

    pub fn bullet(&self, item: &str) {
        let mark = if self.colored { "•" } else { "-" };
        println!("    {} {}", self.paint(mark, |t| t.blue().to_string()), item);
    }

    /// Multi-line text, indented under the current section
    pub fn block(&self, body: &str) {
        for line in body.lines() {
            println!("    {}", line);
        }
    }

    /// Left-aligned table; columns are as wide as their widest cell
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                rows.iter()
                    .filter_map(|r| r.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header = pad_row(headers.iter().copied(), &widths);
        let rule = "-".repeat(header.chars().count());
        println!("    {}", self.paint(&header, |t| t.bright_white().bold().to_string()));
        println!("    {}", self.paint(&rule, |t| t.dimmed().to_string()));
        for row in rows {
            println!("    {}", pad_row(row.iter().map(String::as_str), &widths));
        }
    }

    pub fn newline(&self) {
        println!();
    }
}

fn pad_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_modes() {
        assert!(Output::new().colored);
        assert!(Output::default().colored);
        assert!(!Output::no_color().colored);
    }

    #[test]
    fn test_paint_is_identity_without_color() {
        let output = Output::no_color();
        assert_eq!(output.paint("SAGE", |t| t.red().to_string()), "SAGE");

        let colored = Output::new();
        assert_ne!(colored.paint("SAGE", |t| t.red().to_string()), "SAGE");
    }

    #[test]
    fn test_printing_handles_ragged_input() {
        for output in [Output::new(), Output::no_color()] {
            output.banner();
            output.section("Agents");
            output.subsection("System prompt");
            output.field("model", "default");
            output.bullet("SAGE");
            output.block("line one\nline two");
            output.table(&[], &[]);
            output.table(
                &["Agent", "Topics"],
                &[
                    vec!["sage".to_string(), "nutrition, biohacking".to_string()],
                    vec!["nexus".to_string()],
                ],
            );
            output.success("done");
            output.warning("careful");
            output.hint("try --help");
            output.newline();
        }
    }
}
