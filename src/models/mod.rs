pub mod page;
pub mod transaction;

pub use page::Page;
pub use transaction::{Transaction, TransactionRequest, TransactionStatus};
