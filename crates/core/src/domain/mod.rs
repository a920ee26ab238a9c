pub mod context;
pub mod result;
pub mod rule;
pub mod service;
