//! Décodage des blobs géométriques GeoPackage
//!
//! Format "GeoPackageBinary" : en-tête `GP`, version, flags, srs_id,
//! enveloppe optionnelle, puis WKB standard.

use geo::Geometry;
use geozero::wkb::{GpkgWkb, Wkb};
use geozero::ToGeo;

use crate::GeoLoadError;

/// Taille fixe de l'en-tête (magic + version + flags + srs_id)
const FIXED_HEADER_LEN: usize = 8;

/// En-tête d'un blob GeoPackage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpkgHeader {
    pub version: u8,
    pub little_endian: bool,
    pub empty: bool,
    pub srs_id: i32,
    /// Position du WKB dans le blob
    pub wkb_offset: usize,
}

impl GpkgHeader {
    /// Parse l'en-tête d'un blob
    pub fn parse(blob: &[u8]) -> Result<Self, GeoLoadError> {
        if blob.len() < FIXED_HEADER_LEN {
            return Err(GeoLoadError::geometry(format!(
                "GeoPackage blob too short ({} bytes)",
                blob.len()
            )));
        }
        if &blob[0..2] != b"GP" {
            return Err(GeoLoadError::geometry("missing GeoPackage magic 'GP'"));
        }

        let version = blob[2];
        let flags = blob[3];
        let little_endian = flags & 0x01 == 1;
        let empty = flags & 0x10 != 0;

        let envelope_len = match (flags >> 1) & 0x07 {
            0 => 0,
            1 => 32,
            2 | 3 => 48,
            4 => 64,
            other => {
                return Err(GeoLoadError::geometry(format!(
                    "invalid envelope indicator {}",
                    other
                )))
            }
        };

        let srs_bytes = [blob[4], blob[5], blob[6], blob[7]];
        let srs_id = if little_endian {
            i32::from_le_bytes(srs_bytes)
        } else {
            i32::from_be_bytes(srs_bytes)
        };

        let wkb_offset = FIXED_HEADER_LEN + envelope_len;
        if blob.len() < wkb_offset {
            return Err(GeoLoadError::geometry("GeoPackage blob truncated in envelope"));
        }

        Ok(Self {
            version,
            little_endian,
            empty,
            srs_id,
            wkb_offset,
        })
    }
}

/// Décode un blob via le lecteur GeoPackage de geozero
pub fn decode_with_geozero(blob: &[u8]) -> Result<Option<Geometry>, GeoLoadError> {
    if GpkgHeader::parse(blob)?.empty {
        return Ok(None);
    }
    Ok(Some(GpkgWkb(blob.to_vec()).to_geo()?))
}

/// Décode un blob en lisant l'en-tête à la main puis le WKB standard
pub fn decode_manual(blob: &[u8]) -> Result<Option<Geometry>, GeoLoadError> {
    let header = GpkgHeader::parse(blob)?;
    if header.empty {
        return Ok(None);
    }
    decode_wkb(&blob[header.wkb_offset..]).map(Some)
}

/// Décode un WKB standard (ISO ou OGC)
pub fn decode_wkb(wkb: &[u8]) -> Result<Geometry, GeoLoadError> {
    if wkb.is_empty() {
        return Err(GeoLoadError::geometry("empty WKB"));
    }
    Ok(Wkb(wkb.to_vec()).to_geo()?)
}

/// Décode un blob qui peut être du GeoPackageBinary ou du WKB brut
pub fn decode_any(blob: &[u8]) -> Result<Option<Geometry>, GeoLoadError> {
    if blob.starts_with(b"GP") {
        decode_manual(blob)
    } else {
        decode_wkb(blob).map(Some)
    }
}
