//! Encoded polyline decoding and encoding.
//!
//! Implements the Google polyline algorithm at precision 5 (1e-5 degrees,
//! roughly one metre). A string is a concatenation of variable-length
//! groups; each group encodes one signed delta using 5-bit chunks with a
//! continuation flag in bit 5 and a zig-zag sign in the low bit. Deltas
//! alternate latitude/longitude and accumulate from (0, 0).

use crate::error::DecodeError;
use crate::GpsPoint;

/// Coordinate precision: values are stored as integers scaled by 1e5.
const PRECISION: f64 = 1e-5;

/// Printable-character offset applied to every 5-bit chunk.
const CHAR_OFFSET: u8 = 63;

/// Decode an encoded polyline string into an ordered coordinate sequence.
///
/// Output order matches input order. The coordinate count is not known in
/// advance. Malformed input fails the whole string: the partially-built
/// sequence is dropped and only the error escapes.
///
/// # Example
/// ```
/// use activity_dashboard::polyline::decode;
///
/// let points = decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
/// assert_eq!(points.len(), 3);
/// assert!((points[0].latitude - 38.5).abs() < 1e-9);
/// assert!((points[0].longitude - -120.2).abs() < 1e-9);
/// ```
pub fn decode(encoded: &str) -> Result<Vec<GpsPoint>, DecodeError> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        let group_start = pos;
        let (delta_lat, after_lat) = decode_delta(bytes, pos)?;
        if after_lat >= bytes.len() {
            return Err(DecodeError::MissingLongitude {
                position: group_start,
            });
        }
        let (delta_lng, after_lng) = decode_delta(bytes, after_lat)?;

        lat += delta_lat;
        lng += delta_lng;
        points.push(GpsPoint::new(lat as f64 * PRECISION, lng as f64 * PRECISION));
        pos = after_lng;
    }

    Ok(points)
}

/// Decode one signed delta starting at `pos`. Returns the delta and the
/// position of the next unread byte.
fn decode_delta(bytes: &[u8], mut pos: usize) -> Result<(i64, usize), DecodeError> {
    let mut accumulator: i64 = 0;
    let mut shift = 0u32;

    loop {
        let byte = *bytes
            .get(pos)
            .ok_or(DecodeError::TruncatedChunk { position: pos })?;
        if byte < CHAR_OFFSET {
            return Err(DecodeError::InvalidCharacter { position: pos, byte });
        }
        // A chunk shifted past bit 59 would spill out of the i64
        // accumulator, so the group cannot encode a valid delta.
        if shift >= 60 {
            return Err(DecodeError::ChunkTooLong { position: pos });
        }
        let chunk = (byte - CHAR_OFFSET) as i64;
        accumulator |= (chunk & 0x1f) << shift;
        pos += 1;
        if chunk & 0x20 == 0 {
            break;
        }
        shift += 5;
    }

    // Zig-zag: the low bit carries the sign.
    let delta = if accumulator & 1 != 0 {
        !(accumulator >> 1)
    } else {
        accumulator >> 1
    };
    Ok((delta, pos))
}

/// Encode a coordinate sequence back into a polyline string at precision 5.
pub fn encode(points: &[GpsPoint]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for point in points {
        let lat = (point.latitude / PRECISION).round() as i64;
        let lng = (point.longitude / PRECISION).round() as i64;
        encode_delta(lat - prev_lat, &mut out);
        encode_delta(lng - prev_lng, &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

fn encode_delta(delta: i64, out: &mut String) {
    let mut value = if delta < 0 { !(delta << 1) } else { delta << 1 };
    while value >= 0x20 {
        out.push(((0x20 | (value & 0x1f)) as u8 + CHAR_OFFSET) as char);
        value >>= 5;
    }
    out.push((value as u8 + CHAR_OFFSET) as char);
}
