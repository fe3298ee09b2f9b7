pub mod auth;
pub mod images;
pub mod oauth;
pub mod todos;
pub mod user;
