//! Parsing and validation of transaction sentences
use crate::error::ChainError;
use crate::transaction::types::{Transaction, MAX_IDENTIFIER_LEN};
use std::str::FromStr;

/// Parse `"<sender> sends <amount> DA to <receiver>"`.
///
/// The words `sends`, `DA` and `to` match case-insensitively; names keep the
/// casing they were typed with. Exactly six whitespace-separated tokens are
/// accepted.
pub fn parse_transaction(input: &str) -> Result<Transaction, ChainError> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    let (sender, sends, amount, da, to, receiver) = match tokens.as_slice() {
        [sender, sends, amount, da, to, receiver] => (*sender, *sends, *amount, *da, *to, *receiver),
        _ => {
            return Err(ChainError::ParseRejected(format!(
                "Expected '<sender> sends <amount> DA to <receiver>', got '{}'",
                input.trim()
            )))
        }
    };

    for (word, expected) in [(sends, "sends"), (da, "da"), (to, "to")] {
        if !word.eq_ignore_ascii_case(expected) {
            return Err(ChainError::ParseRejected(format!(
                "Expected '{}' but found '{}'",
                expected, word
            )));
        }
    }

    let amount = parse_amount(amount)?;
    Transaction::new(sender, receiver, amount)
}

fn parse_amount(token: &str) -> Result<u64, ChainError> {
    if let Some(rest) = token.strip_prefix('-') {
        if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
            return Err(ChainError::ParseRejected(format!(
                "Amount must be positive, got {}",
                token
            )));
        }
    }
    let amount: u64 = token
        .parse()
        .map_err(|e| ChainError::ParseRejected(format!("Invalid amount '{}': {}", token, e)))?;
    if amount == 0 {
        return Err(ChainError::ParseRejected(
            "Amount must be positive, got 0".to_string(),
        ));
    }
    Ok(amount)
}

fn validate_identifier(role: &str, name: &str) -> Result<(), ChainError> {
    if name.is_empty() {
        return Err(ChainError::ParseRejected(format!("{} must not be empty", role)));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(ChainError::ParseRejected(format!(
            "{} '{}' must not contain whitespace",
            role, name
        )));
    }
    let len = name.chars().count();
    if len > MAX_IDENTIFIER_LEN {
        return Err(ChainError::ParseRejected(format!(
            "{} is {} characters long (max: {})",
            role, len, MAX_IDENTIFIER_LEN
        )));
    }
    Ok(())
}

impl Transaction {
    /// Check identifier bounds and amount positivity.
    pub fn validate(&self) -> Result<(), ChainError> {
        validate_identifier("Sender", &self.sender)?;
        validate_identifier("Receiver", &self.receiver)?;
        if self.amount == 0 {
            return Err(ChainError::ParseRejected(
                "Amount must be positive, got 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl FromStr for Transaction {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_transaction(s)
    }
}
