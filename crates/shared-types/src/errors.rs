//! # Error Types
//!
//! Defines error types shared by the request layer and the node façade.

use thiserror::Error;

/// Rejections for transaction requests before they reach the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// Sender identifier was empty or whitespace.
    #[error("Invalid transaction: sender must not be empty")]
    EmptySender,

    /// Recipient identifier was empty or whitespace.
    #[error("Invalid transaction: recipient must not be empty")]
    EmptyRecipient,
}

/// Check the caller-supplied parties of a transfer.
pub fn validate_parties(sender: &str, recipient: &str) -> Result<(), TransactionError> {
    if sender.trim().is_empty() {
        return Err(TransactionError::EmptySender);
    }
    if recipient.trim().is_empty() {
        return Err(TransactionError::EmptyRecipient);
    }
    Ok(())
}
