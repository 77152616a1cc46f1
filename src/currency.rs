//! Whole-unit monetary amounts and the text conventions used at the counter.
//!
//! Amounts are typed by hand into form fields, so the same figure may arrive as
//! `2000`, `2.000`, `$ 2,000` or `2.000,50`. `.` and `,` are both accepted as
//! either thousands or decimal separators and are told apart by the length of
//! the digit group after the last separator. Fractions are always dropped.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// A non-negative amount of money in whole currency units.
///
/// Arithmetic saturates at `u64::MAX` rather than wrapping.
///
/// # Examples
///
/// ```
/// use order_ledger::Amount;
///
/// let price = Amount::new(12_345);
/// assert_eq!(price.to_string(), "$12.345");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Zero value.
    pub const ZERO: Self = Amount(0);

    pub const fn new(value: u64) -> Self {
        Amount(value)
    }

    /// Returns the raw number of currency units.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns `true` if this value is zero.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Multiplies by a quantity, saturating on overflow.
    pub fn times(self, quantity: u32) -> Self {
        Amount(self.0.saturating_mul(u64::from(quantity)))
    }

    /// Widens the amount into a signed decimal for balance arithmetic.
    pub fn to_decimal(self) -> Decimal {
        Decimal::from(self.0)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount(value)
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_currency(self.to_decimal()))
    }
}

fn is_separator(c: char) -> bool {
    c == '.' || c == ','
}

/// Parses free-text money input into whole currency units.
///
/// Never fails: anything that cannot be read as an amount yields
/// [`Amount::ZERO`]. A group of one or two digits after the last separator is
/// a decimal part and is discarded; a group of exactly three digits marks
/// thousands; anything longer is rejected.
///
/// ```
/// use order_ledger::currency::parse_currency;
///
/// assert_eq!(parse_currency("$ 2.000").value(), 2000);
/// assert_eq!(parse_currency("300,00").value(), 300);
/// assert_eq!(parse_currency("1.234,56").value(), 1234);
/// assert_eq!(parse_currency("20.021554555").value(), 0);
/// ```
pub fn parse_currency(input: &str) -> Amount {
    let cleaned: String = input
        .chars()
        .filter(|c| *c != '$' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Amount::ZERO;
    }
    if !cleaned
        .chars()
        .all(|c| c.is_ascii_digit() || is_separator(c))
    {
        return Amount::ZERO;
    }

    let value = match (cleaned.contains(','), cleaned.contains('.')) {
        (false, false) => parse_digits(&cleaned),
        (true, true) => parse_mixed_separators(&cleaned),
        (true, false) => parse_single_separator(&cleaned, ','),
        (false, true) => parse_single_separator(&cleaned, '.'),
    };

    value.map(Amount).unwrap_or(Amount::ZERO)
}

/// Both `.` and `,` present: the last one decides.
fn parse_mixed_separators(cleaned: &str) -> Option<u64> {
    let last = cleaned.rfind(is_separator)?;
    // separators are ASCII, so byte offsets line up with chars here
    let tail = &cleaned[last + 1..];

    match tail.len() {
        0..=2 => parse_digits(&strip_separators(&cleaned[..last])),
        3 => parse_digits(&strip_separators(cleaned)),
        _ => None,
    }
}

fn parse_single_separator(cleaned: &str, separator: char) -> Option<u64> {
    let parts: Vec<&str> = cleaned.split(separator).collect();
    let (last, leading) = parts.split_last()?;

    match last.len() {
        0..=2 => parse_digits(&leading.concat()),
        3 if parts[1..].iter().all(|part| part.len() == 3) => parse_digits(&parts.concat()),
        _ => None,
    }
}

fn strip_separators(s: &str) -> String {
    s.chars().filter(|c| !is_separator(*c)).collect()
}

/// Empty strings, stray characters and values past `u64::MAX` all give `None`.
fn parse_digits(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Formats an amount for display as `$1.234.567`.
///
/// The value is rounded to whole units (midpoint away from zero) and grouped
/// with `.` every three digits. Negative values keep their sign in front of the
/// currency symbol: `-$1.500`.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().trunc().to_string();

    let sign = if negative { "-" } else { "" };
    format!("{}${}", sign, group_thousands(&digits))
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

/// Outcome of checking a money field before it is used.
///
/// `parse_currency` folds bad input into zero; this keeps the difference
/// between a blank field and one the user filled in wrongly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountInput {
    /// Nothing was typed.
    Empty,

    /// Text was typed but does not read as a positive amount.
    Invalid,

    Valid(Amount),
}

/// Classifies raw form input as empty, invalid or a usable amount.
pub fn check_amount_input(input: &str) -> AmountInput {
    if input.trim().is_empty() {
        return AmountInput::Empty;
    }

    let amount = parse_currency(input);
    if amount.is_zero() {
        AmountInput::Invalid
    } else {
        AmountInput::Valid(amount)
    }
}
