//! Summary tables, SVG graphs and HTML report pages.

mod frame;
pub mod html;
pub mod line_graph;
pub mod scattergram;
pub mod tables;

pub use {line_graph::LineGraph, scattergram::Scattergram};
