//! FLAC/OGG probes via `lofty`, the one concession to an upstream tag
//! library the original scanner's comment anticipates ("abstract interface
//! for future codecs"). Frame/bitrate scanning stays hand-rolled only for
//! MP3 because that's the format the original source actually parses
//! byte-for-byte; FLAC and OGG never had bespoke C parsers to port.

use crate::config::Config;
use crate::error::{GlacieraError, Result};
use crate::format::Probe;
use crate::model::{TrackMetadata, TuneInfo};
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe as LoftyProbe;
use lofty::tag::Accessor;
use std::path::Path;

fn read_with_lofty(path: &Path) -> Result<(TuneInfo, TrackMetadata)> {
    let disk_meta = std::fs::metadata(path)?;
    let tagged = LoftyProbe::open(path)
        .map_err(|_| GlacieraError::FormatInvalid(path.to_path_buf()))?
        .read()
        .map_err(|_| GlacieraError::FormatInvalid(path.to_path_buf()))?;

    let properties = tagged.properties();
    let duration = properties.duration().as_secs().min(u16::MAX as u64) as u16;
    let bitrate = properties.audio_bitrate().unwrap_or(0).min(u16::MAX as u32) as u16;

    let tuneinfo = TuneInfo {
        filesize: disk_meta.len(),
        filedate: crate::scanner::mtime_epoch(&disk_meta),
        duration,
        bitrate,
        genre: 0xff,
        rating: 0,
    };

    let mut meta = TrackMetadata::default();
    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        meta.title = tag.title().map(|s| s.into_owned());
        meta.artist = tag.artist().map(|s| s.into_owned());
        meta.album = tag.album().map(|s| s.into_owned());
        meta.track_number = tag.track();
        meta.track = meta.track_number.map(|n| n.to_string());
    }
    Ok((tuneinfo, meta))
}

/// Probe for `.flac` files.
pub struct FlacProbe;

impl Probe for FlacProbe {
    fn matches_extension(&self, extension: &str) -> bool {
        extension == "flac"
    }

    fn read_info(&self, path: &Path) -> Result<TuneInfo> {
        read_with_lofty(path).map(|(info, _)| info)
    }

    fn read_metadata(&self, path: &Path) -> Result<TrackMetadata> {
        read_with_lofty(path).map(|(_, meta)| meta)
    }

    fn spawn_args(&self, config: &Config, path: &Path) -> Option<(String, Vec<String>)> {
        let player = &config.players.flac;
        if player.path.is_empty() {
            return None;
        }
        let mut args = player.flags.clone();
        args.push(path.to_string_lossy().into_owned());
        Some((player.path.clone(), args))
    }
}

/// Probe for `.ogg` files.
pub struct OggProbe;

impl Probe for OggProbe {
    fn matches_extension(&self, extension: &str) -> bool {
        extension == "ogg"
    }

    fn read_info(&self, path: &Path) -> Result<TuneInfo> {
        read_with_lofty(path).map(|(info, _)| info)
    }

    fn read_metadata(&self, path: &Path) -> Result<TrackMetadata> {
        read_with_lofty(path).map(|(_, meta)| meta)
    }

    fn spawn_args(&self, config: &Config, path: &Path) -> Option<(String, Vec<String>)> {
        let player = &config.players.ogg;
        if player.path.is_empty() {
            return None;
        }
        let mut args = player.flags.clone();
        args.push(path.to_string_lossy().into_owned());
        Some((player.path.clone(), args))
    }
}
