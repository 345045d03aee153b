//! Quote rendering

use std::io;

use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    discounts::{DiscountWarning, Quote},
    fulfilment::FulfilmentMethod,
};

/// Errors that can occur when rendering a quote.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// IO error
    #[error("IO error")]
    IO,
}

impl Quote {
    /// Write the quote as a table of lines followed by the fee, discounts and total.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::IO`] if writing fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), SummaryError> {
        let mut builder = Builder::default();

        builder.push_record(["Item", "Qty", "Unit Price", "Total"]);

        for line in &self.lines {
            builder.push_record([
                line.name.clone(),
                line.quantity.to_string(),
                line.unit_price.to_string(),
                line.total.to_string(),
            ]);
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(
            1,
            HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
        );

        table.with(theme);
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(1..4), Alignment::right());

        writeln!(out, "\n{table}").map_err(|_err| SummaryError::IO)?;

        for (label, value) in self.summary_rows() {
            writeln!(out, " {label:<24}{value:>12}").map_err(|_err| SummaryError::IO)?;
        }

        for warning in &self.warnings {
            match warning {
                DiscountWarning::ExpiringSoon { code, expires_at } => {
                    writeln!(out, " ! Coupon {code} expires at {expires_at}")
                        .map_err(|_err| SummaryError::IO)?;
                }
            }
        }

        writeln!(out).map_err(|_err| SummaryError::IO)
    }

    fn summary_rows(&self) -> Vec<(String, String)> {
        let mut rows = vec![("Subtotal:".to_string(), self.subtotal.to_string())];

        let fee_label = match self.method {
            FulfilmentMethod::Delivery => "Delivery:",
            FulfilmentMethod::Collection => "Collection:",
        };

        if self.fee_waived {
            rows.push((fee_label.to_string(), "Free".to_string()));
        } else {
            rows.push((fee_label.to_string(), self.fee.to_string()));
        }

        if let Some(coupon) = &self.coupon {
            rows.push((
                format!("{} ({}):", coupon.description, coupon.code),
                format!("-{}", coupon.discount),
            ));
        }

        if let Some(redemption) = &self.gift_card {
            let amount = redemption.amount(self.total.currency()).map_or_else(
                |_err| redemption.amount_to_apply.to_string(),
                |amount| amount.to_string(),
            );

            rows.push((format!("Gift card ({}):", redemption.code), format!("-{amount}")));
        }

        rows.push(("Total:".to_string(), self.total.to_string()));

        if self.is_fully_covered() {
            rows.push(("Payment:".to_string(), "Not required".to_string()));
        }

        rows
    }
}
