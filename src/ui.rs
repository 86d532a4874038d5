//! Terminal UI utilities.
//!
//! Box-drawn tables (program listing, known directive commands) and the
//! status lines printed while building.
//!
//! ## Example
//!
//! ```rust
//! use nerdbuild::ui::Table;
//!
//! let mut table = Table::new(&["Program", "Modules"]);
//! table.add_row(vec!["app".to_string(), "net, util".to_string()]);
//! println!("{}", table.render());
//! ```

use colored::*;
use std::cmp;
use std::fmt::Write;

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }

    /// Render the table, shrinking the widest columns to fit the terminal.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.headers.is_empty() {
            return out;
        }

        let (_, term_width) = console::Term::stdout().size();
        let col_widths = self.column_widths(term_width as usize);

        let make_sep = |left: &str, mid: &str, right: &str| -> String {
            let mut s = String::from("  ");
            s.push_str(left);
            for (i, width) in col_widths.iter().enumerate() {
                s.push_str(&"─".repeat(width + 2));
                if i < col_widths.len() - 1 {
                    s.push_str(mid);
                }
            }
            s.push_str(right);
            s
        };

        let _ = writeln!(out, "{}", make_sep("┌", "┬", "┐"));

        out.push_str("  │");
        for (header, &width) in self.headers.iter().zip(&col_widths) {
            let truncated = console::truncate_str(header, width, "...");
            let padding = width.saturating_sub(console::measure_text_width(&truncated));
            let _ = write!(out, " {} {}│", truncated.bold(), " ".repeat(padding));
        }
        out.push('\n');

        let _ = writeln!(out, "{}", make_sep("├", "┼", "┤"));

        for row in &self.rows {
            out.push_str("  │");
            for (cell, &width) in row.iter().zip(&col_widths) {
                let clean = sanitize_content(cell);
                let truncated = console::truncate_str(&clean, width, "...");
                let padding = width.saturating_sub(console::measure_text_width(&truncated));
                let _ = write!(out, " {} {}│", truncated, " ".repeat(padding));
            }
            out.push('\n');
        }

        let _ = writeln!(out, "{}", make_sep("└", "┴", "┘"));
        out
    }

    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .headers
            .iter()
            .map(|h| console::measure_text_width(h))
            .collect();

        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = console::measure_text_width(&sanitize_content(cell));
                widths[i] = cmp::max(widths[i], len);
            }
        }

        let overhead = 3 + 3 * widths.len();
        let available = max_width.saturating_sub(overhead);
        let mut total: usize = widths.iter().sum();

        // Narrow the widest column one char at a time, never below 8.
        while total > available {
            let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
                break;
            };
            if widest <= 8 {
                break;
            }
            widths[idx] -= 1;
            total -= 1;
        }

        widths
    }
}

fn sanitize_content(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            _ => c,
        })
        .collect()
}

/// Opening banner: compiler, profile and the programs being built.
pub fn banner(compiler: &str, profile: &str, programs: &[String]) {
    let bar = "=".repeat(48);
    println!("{}", bar.cyan());
    println!(
        "{} {} :: {} :: {}",
        "🚀".blue(),
        "build".bold().cyan(),
        compiler,
        profile
    );
    let names = if programs.is_empty() {
        "(none)".to_string()
    } else {
        programs.join(", ")
    };
    println!("   {} {}", "programs ::".cyan(), names.bold());
    println!("{}", bar.cyan());
}
