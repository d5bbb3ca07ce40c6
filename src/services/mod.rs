pub mod import;
pub mod study;
