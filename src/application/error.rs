use thiserror::Error;

use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    /// A user tried to refer themselves. User-visible, not a server fault;
    /// the message text is part of the public contract.
    #[error("You cannot refer yourself")]
    SelfReferral,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}
