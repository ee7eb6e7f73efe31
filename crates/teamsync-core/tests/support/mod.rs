pub mod http;
pub mod teams;
