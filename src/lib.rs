//! DDV - a demuxer and decoder for the DDV full-motion-video container
//!
//! DDV is the interleaved video/audio container used by a family of
//! late-90s game FMVs. This crate turns a DDV byte stream into 32-bit RGB
//! frames and 16-bit PCM samples, bit-exact with the original playback
//! engine.
//!
//! # Architecture
//!
//! The crate is organized into two layers:
//!
//! - `format`: the container itself — header parsing and the pull-style
//!   [`format::ddv::DdvDemuxer`], which reads one frame payload per
//!   [`step`](format::ddv::DdvDemuxer::step) call and drives the codecs
//! - `codec`: the video codec (variable-length coefficient bitstream,
//!   run-length expansion with dequantization, integer inverse DCT,
//!   YCbCr→RGB tile blit) and the adaptive differential audio codec
//!
//! The decoder is single-threaded and synchronous: one `step()` call
//! produces one frame on each enabled branch, and all per-frame scratch is
//! allocated up front from the header maxima. Decoding state is per
//! instance; independent instances may run on separate threads.
//!
//! ```no_run
//! use std::fs::File;
//! use ddv_lib::format::ddv::DdvDemuxer;
//!
//! # fn main() -> ddv_lib::Result<()> {
//! let mut demuxer = DdvDemuxer::open(File::open("intro.ddv")?)?;
//! let (width, height) = demuxer.dimensions().unwrap();
//! let mut pixels = vec![0u32; (width * height) as usize];
//! while demuxer.step(Some(&mut pixels), None)? {
//!     // present `pixels`
//! }
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod format;

pub use error::{Error, Result};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
