#[macro_use]
extern crate log;

pub mod config;
pub mod error;
pub mod grib;
pub mod pipeline;
pub mod record;
pub mod sink;
mod stamp;
