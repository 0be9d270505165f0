//! Score codec: sortable attributes → order-preserving byte keys
//!
//! Keys compare lexicographically, so the encodings below are chosen so
//! byte order equals value order:
//! - signed millisecond timestamps: sign bit flipped, 8 bytes big-endian
//! - unsigned counts/sizes: 8 bytes big-endian
//! - names: the full name, Unicode-lowercased, as raw UTF-8; ordering is
//!   byte-wise over the case-folded form, with no truncation and no
//!   precision loss
//!
//! Keys are always encoded ascending; `Descending` traversal reverses
//! rank/range queries at the store interface instead of negating keys.
//! The codec is total and deterministic for every valid summary.

use byteorder::{BigEndian, ByteOrder};
use chrono::{DateTime, Utc};
use mosaic_index_core::{CollectionSummary, ScoreKey, SortField};

/// Score key of `summary` under `field`.
pub fn score_key(summary: &CollectionSummary, field: SortField) -> ScoreKey {
    match field {
        SortField::UpdatedAt => encode_time(summary.updated_at),
        SortField::CreatedAt => encode_time(summary.created_at),
        SortField::Name => encode_name(&summary.name),
        SortField::ItemCount => encode_u64(summary.image_count),
        SortField::TotalSize => encode_u64(summary.total_size_bytes),
    }
}

/// Encode a timestamp at millisecond precision.
///
/// Flipping the sign bit maps the signed range onto the unsigned range
/// monotonically, so pre-1970 instants still order below later ones.
pub fn encode_time(t: DateTime<Utc>) -> ScoreKey {
    let millis = t.timestamp_millis();
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, (millis as u64) ^ (1 << 63));
    ScoreKey::from_bytes(buf)
}

/// Encode an unsigned count or size.
pub fn encode_u64(value: u64) -> ScoreKey {
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, value);
    ScoreKey::from_bytes(buf)
}

/// Encode a name: Unicode-lowercased, raw UTF-8 bytes.
pub fn encode_name(name: &str) -> ScoreKey {
    ScoreKey::from_bytes(name.to_lowercase().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_time_ordering_preserved() {
        let early = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert!(encode_time(early) < encode_time(late));
    }

    #[test]
    fn test_pre_epoch_orders_below_post_epoch() {
        let before = Utc.with_ymd_and_hms(1950, 1, 1, 0, 0, 0).unwrap();
        let epoch = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(1990, 1, 1, 0, 0, 0).unwrap();
        assert!(encode_time(before) < encode_time(epoch));
        assert!(encode_time(epoch) < encode_time(after));
    }

    #[test]
    fn test_count_ordering_preserved() {
        assert!(encode_u64(0) < encode_u64(1));
        assert!(encode_u64(255) < encode_u64(256));
        assert!(encode_u64(u64::MAX - 1) < encode_u64(u64::MAX));
    }

    #[test]
    fn test_name_case_folds() {
        assert_eq!(encode_name("Holiday"), encode_name("holiday"));
        assert!(encode_name("alpha") < encode_name("Beta"));
    }

    #[test]
    fn test_name_prefix_orders_before_extension() {
        // "ab" < "abc" byte-wise; no terminator tricks needed ascending
        assert!(encode_name("ab") < encode_name("abc"));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let t = Utc.with_ymd_and_hms(2024, 3, 3, 3, 3, 3).unwrap();
        assert_eq!(encode_time(t), encode_time(t));
        assert_eq!(encode_name("Ünïcode"), encode_name("Ünïcode"));
    }

    proptest! {
        #[test]
        fn prop_u64_order_preserving(a in any::<u64>(), b in any::<u64>()) {
            prop_assert_eq!(a.cmp(&b), encode_u64(a).cmp(&encode_u64(b)));
        }

        #[test]
        fn prop_time_order_preserving(a in -4_000_000_000_000i64..4_000_000_000_000i64,
                                      b in -4_000_000_000_000i64..4_000_000_000_000i64) {
            let ta = Utc.timestamp_millis_opt(a).unwrap();
            let tb = Utc.timestamp_millis_opt(b).unwrap();
            prop_assert_eq!(a.cmp(&b), encode_time(ta).cmp(&encode_time(tb)));
        }

        #[test]
        fn prop_name_order_preserving(a in "[a-z0-9 ]{0,32}", b in "[a-z0-9 ]{0,32}") {
            // Over already-lowercase inputs, byte order of the encoding
            // must equal string order exactly.
            prop_assert_eq!(a.cmp(&b), encode_name(&a).cmp(&encode_name(&b)));
        }
    }
}
