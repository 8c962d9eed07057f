//! Field validation for gateway postbacks.
//!
//! Every function here is pure: it turns an untyped form value into a
//! checked domain value or reports which rule was broken.

use bigdecimal::BigDecimal;
use chrono::{Datelike, NaiveDate};
use std::str::FromStr;
use thiserror::Error;

use crate::domain::{PaymentStatus, TransactionDraft};

pub const FIELD_GATEWAY_TRANSACTION_ID: &str = "tpg_trans_id";
pub const FIELD_SESSION_IDENTIFIER: &str = "session_identifier";
pub const FIELD_PAYMENT_STATUS: &str = "pmt_status";
pub const FIELD_AMOUNT: &str = "pmt_amt";
pub const FIELD_PAYMENT_DATE: &str = "pmt_date";
pub const FIELD_NAME_ON_ACCOUNT: &str = "name_on_acct";

/// Required posting fields, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 6] = [
    FIELD_GATEWAY_TRANSACTION_ID,
    FIELD_SESSION_IDENTIFIER,
    FIELD_PAYMENT_STATUS,
    FIELD_AMOUNT,
    FIELD_PAYMENT_DATE,
    FIELD_NAME_ON_ACCOUNT,
];

pub const AMOUNT_INPUT_MAX_LEN: usize = 64;
pub const AMOUNT_MAX_FRACTION_DIGITS: i64 = 2;
pub const DATE_FORMAT: &str = "%m/%d/%Y";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingField(&'static str),

    #[error("Invalid character in parameter: {0}")]
    InvalidCharacter(&'static str),

    #[error("Invalid payment status. Must be 'success' or 'cancelled'")]
    InvalidStatus,

    #[error("Invalid payment amount. Must be a positive number less than or equal to 99,999.99")]
    InvalidAmount,

    #[error("Invalid payment date. Format must be mm/dd/yyyy")]
    InvalidDate,
}

impl ValidationError {
    /// Machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingField(_) => "missing_field",
            ValidationError::InvalidCharacter(_) => "invalid_character",
            ValidationError::InvalidStatus => "invalid_status",
            ValidationError::InvalidAmount => "invalid_amount",
            ValidationError::InvalidDate => "invalid_date",
        }
    }

    /// The form field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField(field) | ValidationError::InvalidCharacter(field) => {
                field
            }
            ValidationError::InvalidStatus => FIELD_PAYMENT_STATUS,
            ValidationError::InvalidAmount => FIELD_AMOUNT,
            ValidationError::InvalidDate => FIELD_PAYMENT_DATE,
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Fails when the value is absent or the empty string. Whitespace counts as
/// a value: nothing is trimmed. NUL characters are refused because Postgres
/// text columns cannot hold them.
pub fn validate_required<'a>(
    field: &'static str,
    raw: Option<&'a str>,
) -> ValidationResult<&'a str> {
    match raw {
        Some(value) if value.is_empty() => Err(ValidationError::MissingField(field)),
        Some(value) if value.contains('\0') => Err(ValidationError::InvalidCharacter(field)),
        Some(value) => Ok(value),
        None => Err(ValidationError::MissingField(field)),
    }
}

pub fn validate_status(raw: &str) -> ValidationResult<PaymentStatus> {
    PaymentStatus::from_str(raw).map_err(|_| ValidationError::InvalidStatus)
}

/// Parses a plain base-10 amount with exact decimal arithmetic.
///
/// Accepted amounts satisfy `0 < amount <= 99999.99` and carry at most two
/// significant fractional digits; they are returned with scale 2.
pub fn validate_amount(raw: &str) -> ValidationResult<BigDecimal> {
    if raw.is_empty() || raw.len() > AMOUNT_INPUT_MAX_LEN {
        return Err(ValidationError::InvalidAmount);
    }

    // Exponent notation is refused so the scale stays bounded by the input length.
    if raw.contains(['e', 'E']) {
        return Err(ValidationError::InvalidAmount);
    }

    let amount = BigDecimal::from_str(raw).map_err(|_| ValidationError::InvalidAmount)?;

    if amount <= BigDecimal::from(0) || amount > max_amount() {
        return Err(ValidationError::InvalidAmount);
    }

    if fraction_digits(&amount) > AMOUNT_MAX_FRACTION_DIGITS {
        return Err(ValidationError::InvalidAmount);
    }

    Ok(amount.with_scale(AMOUNT_MAX_FRACTION_DIGITS))
}

/// Parses a `mm/dd/yyyy` date. Month and day must be zero-padded and the
/// year must be 0001 or later.
pub fn validate_date(raw: &str) -> ValidationResult<NaiveDate> {
    let bytes = raw.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| if i == 2 || i == 5 { *b == b'/' } else { b.is_ascii_digit() });

    if !well_formed {
        return Err(ValidationError::InvalidDate);
    }

    let date =
        NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| ValidationError::InvalidDate)?;
    if date.year() < 1 {
        return Err(ValidationError::InvalidDate);
    }

    Ok(date)
}

/// Raw field values of one postback, borrowed from the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawFields<'a> {
    pub gateway_transaction_id: Option<&'a str>,
    pub session_identifier: Option<&'a str>,
    pub payment_status: Option<&'a str>,
    pub amount: Option<&'a str>,
    pub payment_date: Option<&'a str>,
    pub name_on_account: Option<&'a str>,
}

/// Runs every field check in order: presence of all required fields, then
/// status, amount and date. The first failure wins.
pub fn validate_fields(raw: &RawFields<'_>) -> ValidationResult<TransactionDraft> {
    let gateway_transaction_id =
        validate_required(FIELD_GATEWAY_TRANSACTION_ID, raw.gateway_transaction_id)?;
    let session_identifier = validate_required(FIELD_SESSION_IDENTIFIER, raw.session_identifier)?;
    let payment_status = validate_required(FIELD_PAYMENT_STATUS, raw.payment_status)?;
    let amount = validate_required(FIELD_AMOUNT, raw.amount)?;
    let payment_date = validate_required(FIELD_PAYMENT_DATE, raw.payment_date)?;
    let name_on_account = validate_required(FIELD_NAME_ON_ACCOUNT, raw.name_on_account)?;

    Ok(TransactionDraft {
        gateway_transaction_id: gateway_transaction_id.to_string(),
        session_identifier: session_identifier.to_string(),
        payment_status: validate_status(payment_status)?,
        amount: validate_amount(amount)?,
        payment_date: validate_date(payment_date)?,
        name_on_account: name_on_account.to_string(),
    })
}

fn max_amount() -> BigDecimal {
    BigDecimal::new(9_999_999.into(), AMOUNT_MAX_FRACTION_DIGITS)
}

fn fraction_digits(amount: &BigDecimal) -> i64 {
    let (_, scale) = amount.normalized().as_bigint_and_exponent();
    scale.max(0)
}
