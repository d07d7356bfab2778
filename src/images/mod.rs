pub mod services;
pub mod upload;
