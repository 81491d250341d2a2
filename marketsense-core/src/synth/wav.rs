//! WAV export.
//!
//! Layout: `{dir}/{timbre}_{name}.wav`, canonical 44-byte RIFF/PCM header.
//! Writes go to a `.wav.tmp` file that is renamed into place.

use super::buffer::AudioBuffer;
use super::format::SampleSize;
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid sound name: {0:?}")]
    InvalidName(String),

    #[error("audio export failed: {0}")]
    Io(#[from] io::Error),
}

const HEADER_LEN: u32 = 36;

/// Serialize `buffer` as a WAV stream.
///
/// WAV stores 8-bit PCM unsigned, so 8-bit samples are offset by 128.
pub fn write_wav<W: Write>(buffer: &AudioBuffer, mut w: W) -> io::Result<()> {
    let format = buffer.format();
    let channels = format.channels.count();
    let rate = format.sample_rate.hz();
    let bits = format.sample_size.bits();
    let block_align = buffer.frame_size() as u16;
    let data_len = buffer.byte_len() as u32;

    w.write_all(b"RIFF")?;
    w.write_u32::<LittleEndian>(HEADER_LEN + data_len)?;
    w.write_all(b"WAVE")?;

    w.write_all(b"fmt ")?;
    w.write_u32::<LittleEndian>(16)?;
    w.write_u16::<LittleEndian>(1)?; // PCM
    w.write_u16::<LittleEndian>(channels)?;
    w.write_u32::<LittleEndian>(rate)?;
    w.write_u32::<LittleEndian>(rate * block_align as u32)?;
    w.write_u16::<LittleEndian>(block_align)?;
    w.write_u16::<LittleEndian>(bits)?;

    w.write_all(b"data")?;
    w.write_u32::<LittleEndian>(data_len)?;
    match format.sample_size {
        SampleSize::Sixteen => w.write_all(buffer.data())?,
        SampleSize::Eight => {
            for byte in buffer.data() {
                w.write_u8((*byte as i8 as i16 + 128) as u8)?;
            }
        }
    }
    w.flush()
}

/// File name for an exported sound.
pub fn wav_file_name(buffer: &AudioBuffer, name: &str) -> String {
    format!("{}_{}.wav", buffer.timbre().label(), name)
}

/// Save `buffer` under `dir`, creating the directory if needed.
pub fn save_wav(buffer: &AudioBuffer, dir: &Path, name: &str) -> Result<PathBuf, ExportError> {
    if name.is_empty() || name.contains(['/', '\\']) {
        return Err(ExportError::InvalidName(name.to_string()));
    }

    fs::create_dir_all(dir)?;
    let path = dir.join(wav_file_name(buffer, name));
    write_atomic(&path, |w| write_wav(buffer, w))?;

    debug!(path = %path.display(), bytes = buffer.byte_len(), "saved sound");
    Ok(path)
}

/// Write through `{path}.tmp` and rename into place. The temporary file is
/// removed on any failure.
fn write_atomic<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(BufWriter<fs::File>) -> io::Result<()>,
{
    let tmp_path = path.with_extension("wav.tmp");
    let result = fs::File::create(&tmp_path)
        .and_then(|file| write(BufWriter::new(file)))
        .and_then(|()| fs::rename(&tmp_path, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}
