//! Preparation, editing and execution of WEPP hillslope runs.

pub mod management;
pub mod prepare;
pub mod run;
