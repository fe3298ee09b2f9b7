pub mod jwt;
pub mod middleware;
pub mod oauth_state;
pub mod password;
pub mod providers;
