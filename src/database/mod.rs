pub mod entity;
pub mod manager;
pub mod models;
pub mod repository;
pub mod unit_of_work;

pub use entity::{BoundQuery, Entity, UuidKeyed};
pub use manager::{ConnectionInfo, DatabaseError, DatabaseManager};
pub use repository::Repository;
pub use unit_of_work::UnitOfWork;
