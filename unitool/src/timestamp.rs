//! UTC date/time stamps encoded as reversed ASCII hex, for embedding in firmware build
//! variables (`2019` → `39313032`).

use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::Error;

/// Which part of the current time to stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampKind {
    /// Four-digit year.
    Year,
    /// `MMDD`.
    Date,
    /// 24-hour `HHMM`.
    Time,
}

impl FromStr for StampKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('-').to_ascii_lowercase().as_str() {
            "year" => Ok(StampKind::Year),
            "date" => Ok(StampKind::Date),
            "time" => Ok(StampKind::Time),
            other => Err(Error::invalid_config(format!(
                "unknown stamp `{other}`, expected year, date or time"
            ))),
        }
    }
}

/// Formats `kind` of `now`, reverses the digits and renders each as its ASCII code in hex.
pub fn utc_stamp(kind: StampKind, now: DateTime<Utc>) -> String {
    let digits = match kind {
        StampKind::Year => now.format("%Y"),
        StampKind::Date => now.format("%m%d"),
        StampKind::Time => now.format("%H%M"),
    }
    .to_string();

    digits
        .chars()
        .rev()
        .map(|c| format!("{:x}", u32::from(c)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_stamps() {
        let now = Utc.with_ymd_and_hms(2019, 8, 7, 4, 25, 0).unwrap();
        assert_eq!(utc_stamp(StampKind::Year, now), "39313032");
        assert_eq!(utc_stamp(StampKind::Date, now), "37303830");
        assert_eq!(utc_stamp(StampKind::Time, now), "35323430");
    }

    #[test]
    fn test_stamp_kind_from_str() {
        assert_eq!("--year".parse::<StampKind>().unwrap(), StampKind::Year);
        assert_eq!("DATE".parse::<StampKind>().unwrap(), StampKind::Date);
        assert!("week".parse::<StampKind>().is_err());
    }
}
