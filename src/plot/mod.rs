mod curve_plot;
mod sample;

pub use curve_plot::CurvePlot;
pub use sample::{CurvePlotSample, FadeRamp};
