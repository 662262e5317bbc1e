//! Human readable formatting of BSQ amounts and block spans.

/// Satoshi per BSQ.
pub const SAT_PER_BSQ: u64 = 100;

/// Approximate base-chain block interval.
const SECS_PER_BLOCK: u64 = 600;

/// Format a satoshi amount as BSQ with two decimals.
pub fn format_bsq(sat: u64) -> String {
    format!("{}.{:02} BSQ", sat / SAT_PER_BSQ, sat % SAT_PER_BSQ)
}

/// Format a number of blocks as an approximate wall clock duration.
pub fn format_block_duration(blocks: u64) -> String {
    let secs = blocks * SECS_PER_BLOCK;
    if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bsq_amounts() {
        assert_eq!(format_bsq(0), "0.00 BSQ");
        assert_eq!(format_bsq(5), "0.05 BSQ");
        assert_eq!(format_bsq(250_000_000), "2500000.00 BSQ");
        assert_eq!(format_bsq(12_345), "123.45 BSQ");
    }

    #[test]
    fn block_durations() {
        assert_eq!(format_block_duration(3), "30m");
        assert_eq!(format_block_duration(9), "1h 30m");
        assert_eq!(format_block_duration(3_600), "25d 0h");
    }
}
