pub mod post;
pub mod session;
