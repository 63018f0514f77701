pub mod admin;
pub mod conversations;
