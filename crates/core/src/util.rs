use chrono::{DateTime, NaiveTime, Utc};
use ulid::Ulid;

/// Wire format for wall-clock times such as a habit's target time.
pub const CLOCK_TIME_FORMAT: &str = "%H:%M:%S";

/// Returns the current UTC time.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Generates a new ULID.
pub fn new_ulid() -> Ulid {
    Ulid::new()
}

/// Parses an `HH:MM:SS` clock time.
pub fn parse_clock_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, CLOCK_TIME_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clock_time() {
        let t = parse_clock_time("09:00:00").unwrap();
        assert_eq!(t, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert!(parse_clock_time("9am").is_none());
    }

    #[test]
    fn ulids_are_distinct() {
        assert_ne!(new_ulid(), new_ulid());
    }
}
