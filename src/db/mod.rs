mod repository;
mod schema;

pub use repository::Repository;
pub(crate) use repository::parse_datetime;
