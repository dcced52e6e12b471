use serde::{Deserialize, Serialize};

pub type AccountId = i64;

/// A named place where money is kept (a bank account, a savings book, ...).
///
/// The id is assigned by the store on insert and stays `0` until then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
}

impl Account {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
        }
    }
}
