pub mod pagination;

pub use pagination::{PageBody, PageParams};
