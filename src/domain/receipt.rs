use std::{fmt, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Sales tax applied to every order (IGV, 18%).
pub const TAX_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);

/// Largest amount a `numeric(10,2)` column can hold.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Digits used for the order id part of a receipt number.
const RECEIPT_NUMBER_DIGITS: usize = 8;

/// Fiscal document issued for an order. An invoice (`factura`) requires the
/// buyer's tax id (RUC); a simple receipt (`boleta`) does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptKind {
    Factura,
    Boleta,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Tipo de comprobante inválido: {0}")]
pub struct InvalidReceiptKind(pub String);

impl ReceiptKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Factura => "factura",
            Self::Boleta => "boleta",
        }
    }

    pub const fn prefix(self) -> char {
        match self {
            Self::Factura => 'F',
            Self::Boleta => 'B',
        }
    }

    pub const fn requires_tax_id(self) -> bool {
        matches!(self, Self::Factura)
    }

    /// `F00000042` / `B00000042`.
    pub fn receipt_number(self, order_id: i32) -> String {
        format!(
            "{}{:0width$}",
            self.prefix(),
            order_id,
            width = RECEIPT_NUMBER_DIGITS
        )
    }
}

impl fmt::Display for ReceiptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReceiptKind {
    type Err = InvalidReceiptKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "factura" | "invoice" => Ok(Self::Factura),
            "boleta" | "receipt" => Ok(Self::Boleta),
            _ => Err(InvalidReceiptKind(value.to_string())),
        }
    }
}

/// Peruvian RUC: exactly 11 ASCII digits.
pub fn is_valid_ruc(ruc: &str) -> bool {
    ruc.len() == 11 && ruc.bytes().all(|b| b.is_ascii_digit())
}

/// Rounds a money amount to cents, half away from zero. The result always
/// carries two decimal places.
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// `quantity × unit price`, `None` on overflow.
pub fn line_amount(quantity: i32, unit_price: Decimal) -> Option<Decimal> {
    Decimal::from(quantity).checked_mul(unit_price)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Totals for `(quantity, unit price)` pairs, `None` when the amounts
    /// overflow. Amounts are exact; use [`OrderTotals::rounded`] before
    /// persisting or responding.
    pub fn from_lines(lines: impl IntoIterator<Item = (i32, Decimal)>) -> Option<Self> {
        let subtotal = lines
            .into_iter()
            .try_fold(Decimal::ZERO, |acc, (quantity, unit_price)| {
                acc.checked_add(line_amount(quantity, unit_price)?)
            })?;
        let tax = subtotal.checked_mul(TAX_RATE)?;

        Some(Self {
            subtotal,
            tax,
            total: subtotal.checked_add(tax)?,
        })
    }

    pub fn rounded(self) -> Self {
        Self {
            subtotal: round_money(self.subtotal),
            tax: round_money(self.tax),
            total: round_money(self.total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn invoice_numbers_use_f_prefix() {
        assert_eq!(ReceiptKind::Factura.receipt_number(42), "F00000042");
    }

    #[test]
    fn receipt_numbers_use_b_prefix() {
        assert_eq!(ReceiptKind::Boleta.receipt_number(12345678), "B12345678");
    }

    #[test]
    fn receipt_numbers_have_eight_digits() {
        for id in [1, 7, 999, 1_000_000] {
            let number = ReceiptKind::Boleta.receipt_number(id);

            assert_eq!(number.len(), 9, "{number}");
            assert!(number[1..].bytes().all(|b| b.is_ascii_digit()), "{number}");
        }
    }

    #[test]
    fn only_invoices_require_tax_id() {
        assert!(ReceiptKind::Factura.requires_tax_id());
        assert!(!ReceiptKind::Boleta.requires_tax_id());
    }

    #[test]
    fn parses_receipt_kinds() {
        assert_eq!("factura".parse(), Ok(ReceiptKind::Factura));
        assert_eq!("Boleta".parse(), Ok(ReceiptKind::Boleta));
        assert_eq!("invoice".parse(), Ok(ReceiptKind::Factura));
        assert!("ticket".parse::<ReceiptKind>().is_err());
    }

    #[test]
    fn validates_ruc() {
        assert!(is_valid_ruc("20123456789"));
        assert!(!is_valid_ruc("2012345678"));
        assert!(!is_valid_ruc("2012345678a"));
    }

    #[test]
    fn totals_for_food_and_beverage_order() {
        let totals = OrderTotals::from_lines([(2, money(1500)), (1, money(800))])
            .unwrap()
            .rounded();

        assert_eq!(totals.subtotal, money(3800));
        assert_eq!(totals.tax, money(684));
        assert_eq!(totals.total, money(4484));
    }

    #[test]
    fn total_is_subtotal_times_one_eighteen() {
        let lines = [(3, money(1299)), (2, money(455)), (1, money(1))];
        let totals = OrderTotals::from_lines(lines).unwrap();

        let expected = round_money(totals.subtotal * Decimal::new(118, 2));

        assert_eq!(totals.rounded().total, expected);
        assert_eq!(totals.subtotal, money(3897 + 910 + 1));
    }

    #[test]
    fn whole_amounts_keep_two_decimals() {
        let totals = OrderTotals::from_lines([(2, Decimal::from(15))])
            .unwrap()
            .rounded();

        assert_eq!(totals.subtotal.to_string(), "30.00");
        assert_eq!(totals.tax.to_string(), "5.40");
        assert_eq!(totals.total.to_string(), "35.40");
        assert_eq!(serde_json::to_value(totals.subtotal).unwrap(), "30.00");
    }

    #[test]
    fn overflowing_lines_have_no_totals() {
        assert_eq!(OrderTotals::from_lines([(2, Decimal::MAX)]), None);
        assert_eq!(
            OrderTotals::from_lines([(1, Decimal::MAX), (1, Decimal::ONE)]),
            None
        );
    }

    #[test]
    fn max_amount_fits_numeric_10_2() {
        assert_eq!(MAX_AMOUNT.to_string(), "99999999.99");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_money(Decimal::new(10005, 4)), money(100));
        assert_eq!(round_money(Decimal::new(1005, 3)), money(101));
    }
}
