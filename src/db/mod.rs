pub mod migration;
pub mod pool;
pub mod queries;
mod store;

pub use pool::Db;
pub use store::DbStore;
