#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod blob;
pub mod config;
pub mod error;
pub mod logging;
pub mod scalar;
pub mod traits;
pub mod types;
pub mod window;
