//! Container format handling

pub mod ddv;

pub use ddv::DdvDemuxer;
