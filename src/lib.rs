#[cfg(test)]
mod test;

pub mod analysis;
pub mod climate;
pub mod report;
pub mod wepp;

pub mod formats;
pub mod layout;
pub mod observed;
pub mod parameters;
pub mod stats;

pub mod constants;
pub mod utils;
