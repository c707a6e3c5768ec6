pub mod collection;
pub mod record;
pub mod search;

// Re-export handler functions for use in routing
pub use collection::create as owner_polygons_post;
pub use collection::list as owner_polygons_get;

pub use record::delete as polygon_delete;
pub use record::get as polygon_get;
pub use record::update as polygon_update;

pub use search::by_location as polygons_by_location;
