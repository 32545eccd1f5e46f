pub mod common;
pub mod deploy;
pub mod destroy;
pub mod status;
