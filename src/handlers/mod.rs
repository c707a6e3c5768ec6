// handlers/mod.rs - one module per resource, one file per route shape
//
// users     /users, /users/:id
// polygons  /users/:id/polygons, /users/:id/polygons/:polygon_id, /polygons
// system    /, /health and the router fallbacks

pub mod extract;
pub mod polygons;
pub mod system;
pub mod users;
