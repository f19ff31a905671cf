pub mod common;
pub mod run;
pub mod status;
