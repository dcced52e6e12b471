mod account;
mod balance_entry;
mod money;
mod monthly_report;

pub use account::*;
pub use balance_entry::*;
pub use money::*;
pub use monthly_report::*;
