//! Pull-style DDV demuxer.
//!
//! [`DdvDemuxer::open`] validates the headers, sizes every per-frame
//! buffer from the header maxima and positions the stream at the first
//! frame. Each [`DdvDemuxer::step`] call then reads exactly one frame
//! payload and decodes its enabled branches; the demuxer only ever
//! streams forward.
//!
//! Errors are fatal: after the first failed `step` the demuxer is closed
//! and every further call fails. Running past the last frame is not an
//! error — `step` keeps returning `Ok(false)` without touching the
//! stream.

use std::io::Read;

use crate::codec::ddv::{DdvAudioDecoder, DdvVideoDecoder};
use crate::error::{Error, Result};

use super::{read_u32, AudioHeader, FileHeader, VideoHeader};

/// Streaming DDV decoder.
#[derive(Debug)]
pub struct DdvDemuxer<R: Read> {
    reader: R,
    header: FileHeader,
    video_header: Option<VideoHeader>,
    audio_header: Option<AudioHeader>,
    frame_sizes: Vec<u32>,
    current_frame: u32,
    video: Option<DdvVideoDecoder>,
    audio: Option<DdvAudioDecoder>,
    video_buf: Vec<u8>,
    audio_buf: Vec<u8>,
    sample_buf: Vec<i16>,
    max_video_frame: usize,
    max_audio_frame: usize,
    poisoned: bool,
}

fn skip_bytes<R: Read>(reader: &mut R, count: u64, what: &str) -> Result<()> {
    let copied = std::io::copy(&mut reader.by_ref().take(count), &mut std::io::sink())?;
    if copied != count {
        return Err(Error::truncated(what.to_string()));
    }
    Ok(())
}

fn read_payload<R: Read>(reader: &mut R, buf: &mut Vec<u8>, size: usize) -> Result<()> {
    buf.resize(size, 0);
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::truncated("frame payload")
        } else {
            Error::Io(e)
        }
    })
}

impl<R: Read> DdvDemuxer<R> {
    /// Open a DDV stream: validate headers, allocate decode state and skip
    /// the audio preroll.
    pub fn open(mut reader: R) -> Result<Self> {
        let header = FileHeader::read(&mut reader)?;

        let video_header = if header.has_video() {
            Some(VideoHeader::read(&mut reader)?)
        } else {
            None
        };

        let mut interleave_sizes = Vec::new();
        let audio_header = if header.has_audio() {
            let audio = AudioHeader::read(&mut reader)?;
            for _ in 0..audio.num_interleave_frames {
                interleave_sizes.push(read_u32(&mut reader, "audio interleave size")?);
            }
            Some(audio)
        } else {
            None
        };

        let mut frame_sizes = Vec::new();
        for _ in 0..header.num_frames {
            frame_sizes.push(read_u32(&mut reader, "frame size table")?);
        }

        // The interleaved audio preroll sits between the size table and
        // the first frame; it belongs to layers above this one.
        for size in &interleave_sizes {
            skip_bytes(&mut reader, *size as u64, "audio preroll")?;
        }

        let video = video_header
            .as_ref()
            .map(|vh| DdvVideoDecoder::new(vh.width, vh.height));
        let audio = audio_header
            .as_ref()
            .map(|ah| DdvAudioDecoder::new(ah.single_frame_size, ah.is_stereo()));

        let max_video_frame = video_header
            .as_ref()
            .map(|vh| vh.max_video_frame_size as usize)
            .unwrap_or(0);
        let max_audio_frame = audio_header
            .as_ref()
            .map(|ah| ah.max_audio_frame_size as usize)
            .unwrap_or(0)
            .max(
                video_header
                    .as_ref()
                    .map(|vh| vh.max_audio_frame_size as usize)
                    .unwrap_or(0),
            );

        let sample_buf = vec![0i16; audio.as_ref().map(|a| a.output_len()).unwrap_or(0)];

        tracing::debug!(
            "opened DDV stream: {} frames at {} fps, video {}, audio {}",
            header.num_frames,
            header.frame_rate,
            video_header
                .as_ref()
                .map(|vh| format!("{}x{}", vh.width, vh.height))
                .unwrap_or_else(|| "none".into()),
            audio_header
                .as_ref()
                .map(|ah| format!("{} Hz", ah.sample_rate))
                .unwrap_or_else(|| "none".into()),
        );

        Ok(DdvDemuxer {
            reader,
            header,
            video_header,
            audio_header,
            frame_sizes,
            current_frame: 0,
            video,
            audio,
            video_buf: Vec::with_capacity(max_video_frame),
            audio_buf: Vec::with_capacity(max_audio_frame),
            sample_buf,
            max_video_frame,
            max_audio_frame,
            poisoned: false,
        })
    }

    /// Decode the next frame.
    ///
    /// `pixels` receives the video frame in row-major `width * height`
    /// order, `audio` receives `samples * channels` interleaved 16-bit
    /// little-endian samples. A `None` pixel buffer skips only the blit —
    /// the video branch still decodes to keep delta-frame state in sync.
    /// Buffers passed for branches the stream does not declare are
    /// ignored.
    ///
    /// Returns `Ok(false)` once all frames have been decoded.
    pub fn step(&mut self, pixels: Option<&mut [u32]>, audio: Option<&mut [u8]>) -> Result<bool> {
        if self.poisoned {
            return Err(Error::invalid_state("demuxer halted by an earlier error"));
        }
        if self.current_frame >= self.header.num_frames {
            return Ok(false);
        }
        match self.step_inner(pixels, audio) {
            Ok(()) => {
                self.current_frame += 1;
                Ok(true)
            }
            Err(e) => {
                self.poisoned = true;
                Err(e)
            }
        }
    }

    fn step_inner(&mut self, pixels: Option<&mut [u32]>, audio_out: Option<&mut [u8]>) -> Result<()> {
        // Validate caller buffers before consuming any input.
        if let (Some(video), Some(px)) = (&self.video, &pixels) {
            if px.len() < video.pixel_count() {
                return Err(Error::invalid_argument(format!(
                    "pixel buffer holds {} entries, frame needs {}",
                    px.len(),
                    video.pixel_count()
                )));
            }
        }
        if let (Some(audio), Some(buf)) = (&self.audio, &audio_out) {
            if buf.len() < audio.output_len() * 2 {
                return Err(Error::invalid_argument(format!(
                    "audio buffer holds {} bytes, frame needs {}",
                    buf.len(),
                    audio.output_len() * 2
                )));
            }
        }

        let frame_size = self.frame_sizes[self.current_frame as usize] as usize;
        let has_video = self.video.is_some();
        let has_audio = self.audio.is_some();

        let (video_size, audio_size) = if has_video && has_audio {
            // The first dword of an interleaved frame is the video share;
            // the rest of the payload is audio.
            let video_size = read_u32(&mut self.reader, "frame video size")? as usize;
            if video_size > frame_size {
                return Err(Error::corrupt("video share larger than its frame"));
            }
            (video_size, frame_size - video_size)
        } else if has_video {
            (frame_size, 0)
        } else {
            (0, frame_size)
        };

        if video_size > self.max_video_frame {
            return Err(Error::corrupt("video payload exceeds the declared maximum"));
        }
        if audio_size > self.max_audio_frame {
            return Err(Error::corrupt("audio payload exceeds the declared maximum"));
        }

        if has_video {
            read_payload(&mut self.reader, &mut self.video_buf, video_size)?;
        }
        if has_audio {
            read_payload(&mut self.reader, &mut self.audio_buf, audio_size)?;
        }

        tracing::trace!(
            "frame {}: {} video bytes, {} audio bytes",
            self.current_frame,
            video_size,
            audio_size
        );

        if let Some(video) = self.video.as_mut() {
            video.decode_frame(&self.video_buf, pixels)?;
        }
        if let (Some(audio), Some(out)) = (&self.audio, audio_out) {
            audio.decode_frame(&self.audio_buf, &mut self.sample_buf)?;
            for (chunk, &sample) in out.chunks_exact_mut(2).zip(self.sample_buf.iter()) {
                chunk.copy_from_slice(&sample.to_le_bytes());
            }
        }
        Ok(())
    }

    /// Frame dimensions of the video branch.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.video_header.as_ref().map(|vh| (vh.width, vh.height))
    }

    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    pub fn frame_rate(&self) -> u32 {
        self.header.frame_rate
    }

    pub fn num_frames(&self) -> u32 {
        self.header.num_frames
    }

    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    /// Audio sample rate, when the stream carries audio.
    pub fn sample_rate(&self) -> Option<u32> {
        self.audio_header.as_ref().map(|ah| ah.sample_rate)
    }

    /// Audio channel count, when the stream carries audio.
    pub fn audio_channels(&self) -> Option<usize> {
        self.audio.as_ref().map(|a| a.channels())
    }

    /// Bytes one audio output buffer must hold per frame.
    pub fn audio_frame_len(&self) -> Option<usize> {
        self.audio.as_ref().map(|a| a.output_len() * 2)
    }
}
