//! pt-BR presentation helpers.

use crate::models::InstallmentStatus;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// `R$ 1.234,56`; negative values get a leading `-`.
pub fn format_currency(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    let text = format!("{:.2}", rounded.abs());
    let (integer, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    format!("{}R$ {},{}", sign, grouped, fraction)
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn status_label(status: InstallmentStatus) -> &'static str {
    match status {
        InstallmentStatus::ToPay => "A Pagar",
        InstallmentStatus::Overdue => "Vencido",
        InstallmentStatus::Paid => "Pago",
        InstallmentStatus::Canceled => "Cancelado",
    }
}

/// Badge classes used by the payables table.
pub fn status_badge_class(status: InstallmentStatus) -> &'static str {
    match status {
        InstallmentStatus::ToPay => "bg-yellow-100 text-yellow-800 border-yellow-300",
        InstallmentStatus::Overdue => "bg-red-100 text-red-800 border-red-300",
        InstallmentStatus::Paid => "bg-green-100 text-green-800 border-green-300",
        InstallmentStatus::Canceled => "bg-gray-100 text-gray-800 border-gray-300",
    }
}
