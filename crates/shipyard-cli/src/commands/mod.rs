pub mod context;
pub mod deploy;
