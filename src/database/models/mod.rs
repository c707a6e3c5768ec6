pub mod account;
pub mod polygon;

pub use account::{Account, AccountChanges, AuthToken, NewAccount, LANGUAGES};
pub use polygon::{NewServiceAreaPolygon, PolygonChanges, ServiceAreaPolygon, ServiceAreaWithOwner};
