mod error;
mod queries;
mod repository;
mod rows;
mod schema;

pub use error::DbError;
pub use queries::{MessageFilter, SearchResults};
pub use repository::{MediaRecord, NewMessage, WrenDb};

pub type Result<T> = std::result::Result<T, DbError>;
