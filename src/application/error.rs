use thiserror::Error;

use crate::domain::AccountId;
use crate::storage::StorageFault;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error(transparent)]
    Storage(#[from] StorageFault),
}
