pub mod compile;
pub mod sql;
pub mod types;

pub use compile::compile;
pub use sql::where_sql;
pub use types::{Condition, FilterOp, FilterValue, LeadFilter};
