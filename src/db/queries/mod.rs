pub mod images;
pub mod todos;
pub mod users;
