pub mod proxy;
pub mod resolver;
