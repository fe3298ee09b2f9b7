pub mod image;
pub mod todo;
pub mod user;
