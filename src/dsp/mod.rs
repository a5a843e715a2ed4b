//! DSP building blocks.
//!
//! Each processor here is plain sample-level state with no knowledge of the
//! graph. The graph's node types wrap them and feed them automation values.

pub mod analyser;
pub mod compressor;
pub mod convolver;
pub mod delay;
pub mod envelope;
pub mod filter;
pub mod noise;
pub mod oscillator;
pub mod waveshaper;
