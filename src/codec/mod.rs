//! Codec implementations

pub mod ddv;

pub use ddv::{DdvAudioDecoder, DdvVideoDecoder};
