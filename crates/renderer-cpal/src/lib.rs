// Device audio output using cpal

mod cpal_output;
mod mixer;

pub use cpal_output::{CpalFactory, CpalOutput};
pub use mixer::Mixer;
