//! DDV container format
//!
//! A DDV stream is a fixed little-endian header block followed by a
//! per-frame size table and the concatenated frame payloads. Interleaved
//! streams carry a run of audio-only preroll blocks between the size
//! table and the first frame.

pub mod demuxer;

pub use demuxer::DdvDemuxer;

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};

/// Stream magic tag
pub const DDV_MAGIC: [u8; 4] = *b"DDV\0";

/// The only container version ever produced
pub const DDV_VERSION: u32 = 1;

/// `contains` bit: the stream carries video
pub const CONTAINS_VIDEO: u32 = 1;
/// `contains` bit: the stream carries audio
pub const CONTAINS_AUDIO: u32 = 2;

/// Audio `format` bit: two interleaved channels
pub const AUDIO_FORMAT_STEREO: u32 = 2;

pub(crate) fn read_u32<R: Read>(reader: &mut R, what: &str) -> Result<u32> {
    reader.read_u32::<LittleEndian>().map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::truncated(what.to_string())
        } else {
            Error::Io(e)
        }
    })
}

/// Top-level DDV file header.
#[derive(Debug, Clone)]
pub struct FileHeader {
    /// Branch bitmask, see [`CONTAINS_VIDEO`] and [`CONTAINS_AUDIO`]
    pub contains: u32,
    pub frame_rate: u32,
    pub num_frames: u32,
}

impl FileHeader {
    /// Read and validate the file header.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::truncated("file magic")
            } else {
                Error::Io(e)
            }
        })?;
        if magic != DDV_MAGIC {
            return Err(Error::InvalidMagic);
        }

        let version = read_u32(reader, "file version")?;
        if version != DDV_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        Ok(FileHeader {
            contains: read_u32(reader, "contains mask")?,
            frame_rate: read_u32(reader, "frame rate")?,
            num_frames: read_u32(reader, "frame count")?,
        })
    }

    pub fn has_video(&self) -> bool {
        self.contains & CONTAINS_VIDEO != 0
    }

    pub fn has_audio(&self) -> bool {
        self.contains & CONTAINS_AUDIO != 0
    }
}

/// Video sub-header, present when the `contains` mask has the video bit.
#[derive(Debug, Clone)]
pub struct VideoHeader {
    /// Opaque field the original tooling wrote; carried but unused
    pub reserved: u32,
    pub width: u32,
    pub height: u32,
    pub max_audio_frame_size: u32,
    pub max_video_frame_size: u32,
    /// Keyframe cadence metadata for the caller; the bitstream itself has
    /// no keyframe markers
    pub key_frame_rate: u32,
}

impl VideoHeader {
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(VideoHeader {
            reserved: read_u32(reader, "video header")?,
            width: read_u32(reader, "video width")?,
            height: read_u32(reader, "video height")?,
            max_audio_frame_size: read_u32(reader, "video max audio frame size")?,
            max_video_frame_size: read_u32(reader, "video max frame size")?,
            key_frame_rate: read_u32(reader, "key frame rate")?,
        })
    }
}

/// Audio sub-header, present when the `contains` mask has the audio bit.
#[derive(Debug, Clone)]
pub struct AudioHeader {
    pub format: u32,
    pub sample_rate: u32,
    pub max_audio_frame_size: u32,
    /// Samples per channel per frame
    pub single_frame_size: u32,
    /// Number of audio-only preroll blocks preceding the first frame
    pub num_interleave_frames: u32,
}

impl AudioHeader {
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(AudioHeader {
            format: read_u32(reader, "audio format")?,
            sample_rate: read_u32(reader, "audio sample rate")?,
            max_audio_frame_size: read_u32(reader, "audio max frame size")?,
            single_frame_size: read_u32(reader, "audio frame sample count")?,
            num_interleave_frames: read_u32(reader, "audio interleave count")?,
        })
    }

    pub fn is_stereo(&self) -> bool {
        self.format & AUDIO_FORMAT_STEREO != 0
    }
}
