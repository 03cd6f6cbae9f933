use std::io::IsTerminal;

use colored::Colorize;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::CliResult;

/// Renders command results either as aligned text or as pretty JSON.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool, color_enabled: bool) -> Self {
        let color = color_enabled
            && !json
            && std::io::stdout().is_terminal()
            && std::env::var_os("NO_COLOR").is_none();
        colored::control::set_override(color);
        Self { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> CliResult {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn header(&self, title: impl AsRef<str>) {
        println!("{}", title.as_ref().bold().cyan());
    }

    pub fn success(&self, message: impl AsRef<str>) {
        println!("{}", message.as_ref().green());
    }

    pub fn note(&self, message: impl AsRef<str>) {
        println!("{}", message.as_ref().dimmed());
    }

    pub fn pairs(&self, rows: &[(&str, String)]) {
        let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        for (label, value) in rows {
            println!("  {label:<width$} : {value}");
        }
    }

    /// Prints rows under a header, padding each column to its widest cell.
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        if rows.is_empty() {
            self.note("(none)");
            return;
        }
        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        for row in rows {
            for (idx, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(idx) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }

        let line = |cells: Vec<String>| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("  ")
        };
        let head = line(headers.iter().map(|h| h.to_string()).collect());
        println!("{}", head.trim_end().bold());
        for row in rows {
            println!("{}", line(row.clone()).trim_end());
        }
    }
}

pub fn money(amount: Decimal, currency: &str) -> String {
    format!("{:.2} {currency}", amount.round_dp(2))
}

/// Money with an explicit sign, green for inflows and red for outflows.
pub fn signed_money(amount: Decimal, currency: &str) -> String {
    let text = if amount.is_sign_negative() {
        money(amount, currency)
    } else {
        format!("+{}", money(amount, currency))
    };
    if amount.is_sign_negative() {
        text.red().to_string()
    } else {
        text.green().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn money_rounds_to_cents() {
        let amount = Decimal::from_str("1234.5").unwrap();
        assert_eq!(money(amount, "EUR"), "1234.50 EUR");
        assert_eq!(money(Decimal::from_str("-0.125").unwrap(), "USD"), "-0.12 USD");
    }

    #[test]
    fn signed_money_marks_inflows() {
        colored::control::set_override(false);
        assert_eq!(signed_money(Decimal::from(5), "USD"), "+5.00 USD");
        assert_eq!(signed_money(Decimal::from(-5), "USD"), "-5.00 USD");
    }
}
