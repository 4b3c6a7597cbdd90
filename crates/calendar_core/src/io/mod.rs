pub mod frame;
pub mod setup;
