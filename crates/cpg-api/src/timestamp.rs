// Filter timestamps
//
// Date filters accept several spellings of a point in time; all of them
// travel as millisecond-precision epoch integers.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::Error;

/// `yyyy-MM-dd HH:MM:SS`, read as UTC.
pub const DATE_STR_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A point in time as supplied to a date filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Timestamp {
    EpochMillis(i64),
    EpochSeconds(f64),
    /// Must match [`DATE_STR_FORMAT`].
    Text(String),
    DateTime(DateTime<Utc>),
}

impl Timestamp {
    /// Normalize to milliseconds since the Unix epoch.
    pub fn to_epoch_millis(&self) -> Result<i64, Error> {
        match self {
            Self::EpochMillis(ms) => Ok(*ms),
            Self::EpochSeconds(secs) => seconds_to_millis(*secs),
            Self::Text(text) => text_to_millis(text),
            Self::DateTime(dt) => Ok(dt.timestamp_millis()),
        }
    }
}

fn seconds_to_millis(secs: f64) -> Result<i64, Error> {
    let millis = (secs * 1000.0).round();
    // i64::MAX as f64 rounds up, so compare against 2^63 exclusively.
    if !millis.is_finite() || millis >= 9.223_372_036_854_776e18 || millis < -9.223_372_036_854_776e18 {
        return Err(Error::InvalidArgument {
            argument: "timestamp".into(),
            reason: format!("{secs} is not a representable epoch time in seconds"),
        });
    }
    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    Ok(millis as i64)
}

fn text_to_millis(text: &str) -> Result<i64, Error> {
    NaiveDateTime::parse_from_str(text.trim(), DATE_STR_FORMAT)
        .map(|naive| naive.and_utc().timestamp_millis())
        .map_err(|e| Error::InvalidArgument {
            argument: "timestamp".into(),
            reason: format!("'{text}' does not match yyyy-MM-dd HH:MM:SS ({e})"),
        })
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value.and_utc())
    }
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Timestamp {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Normalize an optional filter bound.
pub(crate) fn optional_millis(value: Option<&Timestamp>) -> Result<Option<i64>, Error> {
    value.map(Timestamp::to_epoch_millis).transpose()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn every_variant_lands_on_the_same_millisecond() {
        let expected = 1_585_150_144_465_i64; // 2020-03-25T15:29:04.465Z
        let dt = Utc.timestamp_millis_opt(expected).single().expect("valid");

        assert_eq!(Timestamp::EpochMillis(expected).to_epoch_millis().ok(), Some(expected));
        assert_eq!(
            Timestamp::EpochSeconds(1_585_150_144.465).to_epoch_millis().ok(),
            Some(expected)
        );
        assert_eq!(Timestamp::from(dt).to_epoch_millis().ok(), Some(expected));
        assert_eq!(
            Timestamp::from(dt.naive_utc()).to_epoch_millis().ok(),
            Some(expected)
        );
    }

    #[test]
    fn text_is_utc_with_second_precision() {
        let ts = Timestamp::from("2020-03-25 15:29:04");
        assert_eq!(ts.to_epoch_millis().ok(), Some(1_585_150_144_000));
    }

    #[test]
    fn malformed_text_is_rejected() {
        for bad in ["2020-03-25", "25/03/2020 15:29:04", "", "2020-03-25T15:29:04Z"] {
            let err = Timestamp::from(bad).to_epoch_millis();
            assert!(
                matches!(err, Err(Error::InvalidArgument { ref argument, .. }) if argument == "timestamp"),
                "{bad:?} -> {err:?}"
            );
        }
    }

    #[test]
    fn non_finite_seconds_are_rejected() {
        assert!(Timestamp::EpochSeconds(f64::NAN).to_epoch_millis().is_err());
        assert!(Timestamp::EpochSeconds(f64::INFINITY).to_epoch_millis().is_err());
        assert!(Timestamp::EpochSeconds(1e300).to_epoch_millis().is_err());
    }

    #[test]
    fn optional_bound() {
        assert_eq!(optional_millis(None).ok(), Some(None));
        assert_eq!(
            optional_millis(Some(&Timestamp::EpochMillis(5))).ok(),
            Some(Some(5))
        );
    }
}
