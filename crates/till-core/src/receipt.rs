//! Render-only receipt and drawer-slip views.
//!
//! These consume committed core state and produce fixed-width text for a
//! thermal printer. No printing I/O happens here.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::shift::{Shift, ShiftSummary};
use crate::transaction::Transaction;
use crate::types::{RegisterSettings, TenderType, TransactionKind};

/// Default paper width in characters (58mm thermal roll).
pub const DEFAULT_PAPER_WIDTH: usize = 32;

/// A printable view of a committed transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub store_name: String,
    pub receipt_number: String,
    pub timestamp: String,
    pub kind: TransactionKind,
    pub lines: Vec<ReceiptLine>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub tender: TenderType,
    pub tendered_cents: i64,
    pub change_cents: i64,
    pub currency_symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl Receipt {
    /// Builds a receipt view from a committed transaction.
    pub fn from_transaction(transaction: &Transaction, settings: &RegisterSettings) -> Self {
        Receipt {
            store_name: settings.store_name.clone(),
            receipt_number: transaction.receipt_number.clone(),
            timestamp: transaction.created_at.to_rfc3339(),
            kind: transaction.kind,
            lines: transaction
                .lines
                .iter()
                .map(|l| ReceiptLine {
                    name: l.name.clone(),
                    quantity: l.quantity,
                    unit_price_cents: l.unit_price_cents,
                    line_total_cents: l.line_total_cents,
                })
                .collect(),
            subtotal_cents: transaction.subtotal_cents,
            discount_cents: transaction.discount_cents,
            tax_cents: transaction.tax_cents,
            total_cents: transaction.total_cents,
            tender: transaction.tender,
            tendered_cents: transaction.tendered_cents,
            change_cents: transaction.change_cents,
            currency_symbol: settings.currency_symbol.clone(),
        }
    }

    /// Renders the receipt as fixed-width text.
    pub fn render_text(&self, width: usize) -> String {
        let mut out = String::new();
        out.push_str(&center(&self.store_name, width));
        out.push('\n');
        if self.kind == TransactionKind::Return {
            out.push_str(&center("*** RETURN ***", width));
            out.push('\n');
        }
        out.push_str(&format!("No. {}\n", self.receipt_number));
        out.push_str(&format!("{}\n", self.timestamp));
        out.push_str(&rule(width));

        for line in &self.lines {
            out.push_str(&format!("{}\n", line.name));
            out.push_str(&two_col(
                &format!(
                    "  {} x {}",
                    line.quantity,
                    self.fmt(Money::from_cents(line.unit_price_cents))
                ),
                &self.fmt(Money::from_cents(line.line_total_cents)),
                width,
            ));
        }

        out.push_str(&rule(width));
        out.push_str(&two_col(
            "Subtotal",
            &self.fmt(Money::from_cents(self.subtotal_cents)),
            width,
        ));
        if self.discount_cents > 0 {
            out.push_str(&two_col(
                "Discount",
                &format!("-{}", self.fmt(Money::from_cents(self.discount_cents))),
                width,
            ));
        }
        out.push_str(&two_col(
            "Tax",
            &self.fmt(Money::from_cents(self.tax_cents)),
            width,
        ));
        out.push_str(&two_col(
            "TOTAL",
            &self.fmt(Money::from_cents(self.total_cents)),
            width,
        ));

        let tender_label = match self.tender {
            TenderType::Cash => "Cash",
            TenderType::Card => "Card",
            TenderType::Digital => "Digital",
        };
        out.push_str(&two_col(
            tender_label,
            &self.fmt(Money::from_cents(self.tendered_cents)),
            width,
        ));
        if self.change_cents > 0 {
            out.push_str(&two_col(
                "Change",
                &self.fmt(Money::from_cents(self.change_cents)),
                width,
            ));
        }

        out
    }

    fn fmt(&self, amount: Money) -> String {
        format!("{}{}", self.currency_symbol, amount)
    }
}

/// Renders a drawer slip for a closed shift.
pub fn render_shift_slip(
    shift: &Shift,
    summary: &ShiftSummary,
    settings: &RegisterSettings,
    width: usize,
) -> String {
    let sym = &settings.currency_symbol;
    let money = |cents: i64| format!("{}{}", sym, Money::from_cents(cents));

    let mut out = String::new();
    out.push_str(&center(&settings.store_name, width));
    out.push('\n');
    out.push_str(&center("SHIFT CLOSE", width));
    out.push('\n');
    out.push_str(&format!("Operator: {}\n", shift.operator_id));
    out.push_str(&format!("Opened:   {}\n", shift.opened_at.to_rfc3339()));
    if let Some(closed_at) = shift.closed_at {
        out.push_str(&format!("Closed:   {}\n", closed_at.to_rfc3339()));
    }
    out.push_str(&rule(width));
    out.push_str(&two_col("Starting float", &money(shift.starting_cash_cents), width));
    out.push_str(&two_col("Cash sales", &money(shift.cash_sales_cents), width));
    out.push_str(&two_col("Card sales", &money(shift.card_sales_cents), width));
    out.push_str(&two_col("Digital sales", &money(shift.digital_sales_cents), width));
    out.push_str(&two_col("Total sales", &money(summary.total_sales_cents), width));
    out.push_str(&rule(width));
    out.push_str(&two_col("Pay-in", &money(summary.pay_in_cents), width));
    out.push_str(&two_col("Pay-out", &money(summary.pay_out_cents), width));
    for movement in &shift.movements {
        let sign = match movement.kind {
            crate::shift::MovementKind::In => "+",
            crate::shift::MovementKind::Out => "-",
        };
        out.push_str(&two_col(
            &format!("  {}", movement.reason),
            &format!("{}{}", sign, money(movement.amount_cents)),
            width,
        ));
    }
    out.push_str(&rule(width));
    out.push_str(&two_col("Expected cash", &money(summary.expected_cash_cents), width));
    out.push_str(&two_col("Counted cash", &money(summary.counted_cash_cents), width));
    out.push_str(&two_col("Difference", &money(summary.difference_cents), width));

    out
}

fn rule(width: usize) -> String {
    format!("{}\n", "-".repeat(width))
}

fn center(text: &str, width: usize) -> String {
    if text.len() >= width {
        return text.to_string();
    }
    let pad = (width - text.len()) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

fn two_col(left: &str, right: &str, width: usize) -> String {
    let used = left.len() + right.len();
    let gap = if used >= width { 1 } else { width - used };
    format!("{}{}{}\n", left, " ".repeat(gap), right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Cart;
    use crate::money::TaxRate;
    use crate::shift::MovementKind;
    use crate::transaction::{build_sale, TenderedAmounts};
    use crate::types::Product;
    use chrono::Utc;

    fn settings() -> RegisterSettings {
        RegisterSettings {
            tax_rate: TaxRate::from_bps(1000),
            ..RegisterSettings::default()
        }
    }

    fn sample_transaction() -> Transaction {
        let now = Utc::now();
        let product = Product {
            id: "p1".to_string(),
            name: "Americano".to_string(),
            category: "Coffee".to_string(),
            barcode: None,
            price_cents: 350,
            cost_cents: 90,
            stock: 50,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let mut cart = Cart::new();
        cart.add_line(&product, 2).unwrap();
        build_sale(
            &cart,
            None,
            TenderType::Cash,
            TenderedAmounts::primary(1000),
            &settings(),
            None,
            "op-1",
        )
        .unwrap()
    }

    #[test]
    fn test_receipt_carries_transaction_amounts() {
        let tx = sample_transaction();
        let receipt = Receipt::from_transaction(&tx, &settings());

        assert_eq!(receipt.subtotal_cents, 700);
        assert_eq!(receipt.total_cents, tx.total_cents);
        assert_eq!(receipt.lines.len(), 1);
        assert_eq!(receipt.lines[0].quantity, 2);
    }

    #[test]
    fn test_render_text_contains_totals_and_change() {
        let tx = sample_transaction();
        let receipt = Receipt::from_transaction(&tx, &settings());
        let text = receipt.render_text(DEFAULT_PAPER_WIDTH);

        assert!(text.contains("Till POS"));
        assert!(text.contains("Americano"));
        assert!(text.contains("TOTAL"));
        assert!(text.contains("$7.70"));
        assert!(text.contains("Change"));
        assert!(text.contains("$2.30"));
    }

    #[test]
    fn test_shift_slip_renders_reconciliation() {
        let mut shift =
            crate::shift::Shift::open(None, "op-1", Money::from_cents(10_000)).unwrap();
        shift
            .record_sale(Money::from_cents(2750), TenderType::Cash)
            .unwrap();
        shift
            .record_movement(MovementKind::Out, Money::from_cents(2000), "supplier", "op-1")
            .unwrap();
        let summary = shift.close(Money::from_cents(10_750)).unwrap();

        let slip = render_shift_slip(&shift, &summary, &settings(), DEFAULT_PAPER_WIDTH);

        assert!(slip.contains("SHIFT CLOSE"));
        assert!(slip.contains("Expected cash"));
        assert!(slip.contains("$107.50"));
        assert!(slip.contains("Difference"));
        assert!(slip.contains("supplier"));
    }
}
