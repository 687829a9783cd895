//! Projection download, GDS conversion, GenStPar, calibration and CLIGEN.

pub mod calibrate;
pub mod cligen;
pub mod download;
pub mod ftp;
pub mod gds;
