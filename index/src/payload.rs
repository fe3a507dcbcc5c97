//! Map-point payload encoding.
//!
//! Creation payloads are ASCII `ORINMAP1:<encoded_lat>:<encoded_lon>` with
//! signed decimal integers; transfer payloads are
//! `ORINMAPX:<64-hex origin txid>`. Coordinates are scaled by 10^6 and
//! rounded, giving micro-degree precision.

use orin_types::Hash256;
use thiserror::Error;

pub const MAP_POINT_PREFIX: &str = "ORINMAP1";
pub const MAP_POINT_TRANSFER_PREFIX: &str = "ORINMAPX";
pub const COORD_SCALE: f64 = 1_000_000.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MAX_LONGITUDE: f64 = 180.0;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("coordinate must be a finite number")]
    NotFinite,

    #[error("coordinate {value} out of range [-{max_abs}, {max_abs}]")]
    OutOfRange { value: String, max_abs: String },
}

fn encode_coordinate(value: f64, max_abs: f64) -> Result<i64, PayloadError> {
    if !value.is_finite() {
        return Err(PayloadError::NotFinite);
    }
    if value < -max_abs || value > max_abs {
        return Err(PayloadError::OutOfRange {
            value: format!("{value:.8}"),
            max_abs: format!("{max_abs:.0}"),
        });
    }
    Ok((value * COORD_SCALE).round() as i64)
}

/// Encode latitude and longitude into their scaled integer representation.
pub fn encode_coordinates(lat: f64, lon: f64) -> Result<(i64, i64), PayloadError> {
    let encoded_lat = encode_coordinate(lat, MAX_LATITUDE)?;
    let encoded_lon = encode_coordinate(lon, MAX_LONGITUDE)?;
    Ok((encoded_lat, encoded_lon))
}

/// Convert an encoded coordinate back to its floating point representation.
pub fn decode_coordinate(encoded: i64) -> f64 {
    encoded as f64 / COORD_SCALE
}

/// Build the data-carrier payload string from encoded coordinates.
pub fn build_payload(encoded_lat: i64, encoded_lon: i64) -> String {
    format!("{MAP_POINT_PREFIX}:{encoded_lat}:{encoded_lon}")
}

/// Parse a creation payload. Returns `None` for anything that is not a
/// well-formed, in-range map-point payload.
pub fn parse_payload(payload: &str) -> Option<(i64, i64)> {
    let mut parts = payload.split(':');
    if parts.next()? != MAP_POINT_PREFIX {
        return None;
    }
    let encoded_lat: i64 = parts.next()?.parse().ok()?;
    let encoded_lon: i64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    if encoded_lat.unsigned_abs() > (MAX_LATITUDE * COORD_SCALE) as u64 {
        return None;
    }
    if encoded_lon.unsigned_abs() > (MAX_LONGITUDE * COORD_SCALE) as u64 {
        return None;
    }
    Some((encoded_lat, encoded_lon))
}

/// Build the transfer payload string for an origin txid.
pub fn build_transfer_payload(origin: &Hash256) -> String {
    format!("{MAP_POINT_TRANSFER_PREFIX}:{origin}")
}

/// Parse a transfer payload into the origin txid it references.
pub fn parse_transfer_payload(payload: &str) -> Option<Hash256> {
    let mut parts = payload.split(':');
    if parts.next()? != MAP_POINT_TRANSFER_PREFIX {
        return None;
    }
    let hex = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Hash256::from_hex(hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_coordinates() {
        let (lat, lon) = encode_coordinates(55.751244, 37.618423).unwrap();
        assert_eq!(lat, 55_751_244);
        assert_eq!(lon, 37_618_423);
        assert_eq!(build_payload(lat, lon), "ORINMAP1:55751244:37618423");
    }

    #[test]
    fn out_of_range_rejected() {
        assert!(encode_coordinates(90.000001, 0.0).is_err());
        assert!(encode_coordinates(0.0, -180.000001).is_err());
        assert!(encode_coordinates(f64::NAN, 0.0).is_err());
        assert!(encode_coordinates(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn boundary_values_accepted() {
        assert_eq!(
            encode_coordinates(-90.0, 180.0).unwrap(),
            (-90_000_000, 180_000_000)
        );
    }

    #[test]
    fn payload_round_trip() {
        let (lat, lon) = encode_coordinates(-12.5, 99.000001).unwrap();
        let payload = build_payload(lat, lon);
        assert_eq!(parse_payload(&payload), Some((lat, lon)));
    }

    #[test]
    fn malformed_payloads_rejected() {
        assert!(parse_payload("ORINMAP1:1").is_none());
        assert!(parse_payload("ORINMAP2:1:2").is_none());
        assert!(parse_payload("ORINMAP1:1:2:3").is_none());
        assert!(parse_payload("ORINMAP1:x:2").is_none());
        assert!(parse_payload("ORINMAP1:90000001:0").is_none());
        assert!(parse_payload("ORINMAP1:0:180000001").is_none());
    }

    #[test]
    fn transfer_payload_round_trip() {
        let origin = Hash256::new([0xC4; 32]);
        let payload = build_transfer_payload(&origin);
        assert_eq!(parse_transfer_payload(&payload), Some(origin));
    }

    #[test]
    fn malformed_transfer_payloads_rejected() {
        assert!(parse_transfer_payload("ORINMAPX:abcd").is_none());
        assert!(parse_transfer_payload(&format!("ORINMAP1:{}", "a".repeat(64))).is_none());
        assert!(parse_transfer_payload(&format!("ORINMAPX:{}", "z".repeat(64))).is_none());
    }

    proptest! {
        /// Encoding then decoding preserves coordinates to micro-degree precision.
        #[test]
        fn encode_decode_round_trip(
            lat in -90.0f64..=90.0,
            lon in -180.0f64..=180.0,
        ) {
            let (enc_lat, enc_lon) = encode_coordinates(lat, lon).unwrap();
            prop_assert!((decode_coordinate(enc_lat) - lat).abs() <= 5e-7);
            prop_assert!((decode_coordinate(enc_lon) - lon).abs() <= 5e-7);
        }

        /// Every encoded pair survives the payload text format exactly.
        #[test]
        fn payload_text_round_trip(
            enc_lat in -90_000_000i64..=90_000_000,
            enc_lon in -180_000_000i64..=180_000_000,
        ) {
            let payload = build_payload(enc_lat, enc_lon);
            prop_assert_eq!(parse_payload(&payload), Some((enc_lat, enc_lon)));
        }
    }
}
