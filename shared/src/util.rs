/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random (4096 values per ms)
pub fn next_id() -> i64 {
    use rand::Rng;
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let now = now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
    (ts << 12) | rand_bits
}

/// Generate a human-readable, unique order number: `ORD-YYYYMMDD-XXXXXX`
///
/// The suffix is the low 24 bits of a snowflake ID in hex, so numbers
/// remain unique across concurrent checkouts on the same day.
pub fn order_number() -> String {
    let date = chrono::Utc::now().format("%Y%m%d");
    let suffix = (next_id() & 0xFF_FFFF) as u32;
    format!("ORD-{date}-{suffix:06X}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_number_format() {
        let n = order_number();
        assert!(n.starts_with("ORD-"));
        assert_eq!(n.len(), "ORD-20260101-ABCDEF".len());
    }

    #[test]
    fn test_next_id_monotone_in_time() {
        let a = next_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = next_id();
        assert!(b > a);
    }
}
