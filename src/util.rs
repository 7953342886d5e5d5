/// Format whole seconds as MM:SS for the session countdown.
pub fn format_mmss(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

/// Whole-second ceiling for the phase countdown digit, so a phase with
/// 0.2s left still reads "1", not "0".
pub fn ceil_secs(secs: f64) -> u64 {
    if secs <= 0.0 {
        0
    } else {
        secs.ceil() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mmss() {
        assert_eq!(format_mmss(0), "00:00");
        assert_eq!(format_mmss(59), "00:59");
        assert_eq!(format_mmss(60), "01:00");
        assert_eq!(format_mmss(600), "10:00");
        assert_eq!(format_mmss(3725), "62:05");
    }

    #[test]
    fn test_ceil_secs() {
        assert_eq!(ceil_secs(0.0), 0);
        assert_eq!(ceil_secs(-1.0), 0);
        assert_eq!(ceil_secs(0.2), 1);
        assert_eq!(ceil_secs(1.0), 1);
        assert_eq!(ceil_secs(3.01), 4);
    }
}
