pub mod backend;
pub mod spans;
