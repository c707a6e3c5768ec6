pub mod collection;
pub mod record;

// Re-export handler functions for use in routing
pub use collection::create as users_post;
pub use collection::list as users_get;

pub use record::delete as user_delete;
pub use record::get as user_get;
pub use record::update as user_update;
