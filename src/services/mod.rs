pub mod identity;
pub mod todos;

pub use identity::{AuthOutcome, IdentityService};
pub use todos::{ImageUpload, TodoRequest, TodoService};
