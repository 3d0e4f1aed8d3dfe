pub mod leads;
pub mod manager;
pub mod models;
pub mod users;

pub use leads::LeadStore;
pub use manager::{Database, StoreError};
pub use users::UserStore;
