//! Request validation and response shapes for each resource.

pub mod account;
pub mod polygon;

pub use account::{AccountCreatedView, AccountView};
pub use polygon::ServiceAreaView;
