pub mod lead;
pub mod user;

pub use lead::{Lead, LeadPatch, LeadResponse, LeadSource, LeadStatus, NewLead};
pub use user::{NewUser, User, UserResponse};
