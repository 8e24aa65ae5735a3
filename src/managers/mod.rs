pub mod logging;
pub mod upload;

mod worker;
