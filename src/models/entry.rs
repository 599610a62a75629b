// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Col ascent entry model for storage and API.

use crate::error::AppError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// A recorded col ascent, as held in the entry cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Store-assigned document ID (never empty once cached)
    pub id: String,
    #[serde(flatten)]
    pub data: EntryData,
}

/// Entry payload as persisted in the `cols` collection.
///
/// Field names are camelCase so documents stay readable by the web client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryData {
    /// Col name (non-empty)
    pub name: String,
    /// Elapsed time as `HH:MM:SS`
    #[serde(default)]
    pub time: Option<String>,
    /// Climb distance in kilometers
    #[serde(default)]
    pub distance: Option<f64>,
    /// Elevation gain in meters
    #[serde(default)]
    pub elevation: Option<u32>,
    /// Day of the ascent
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub lat: f64,
    pub lng: f64,
    /// Submission time, assigned by the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl EntryData {
    /// Average gradient in percent, rounded to one decimal place.
    pub fn avg_gradient_pct(&self) -> Option<f64> {
        match (self.elevation, self.distance) {
            (Some(elevation), Some(distance)) if elevation > 0 && distance > 0.0 => {
                let pct = f64::from(elevation) / (distance * 1000.0) * 100.0;
                Some((pct * 10.0).round() / 10.0)
            }
            _ => None,
        }
    }
}

impl Entry {
    pub fn name(&self) -> &str {
        &self.data.name
    }
}

/// Elapsed climbing time in `HH:MM:SS` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ElapsedTime {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl ElapsedTime {
    pub fn total_seconds(&self) -> u32 {
        u32::from(self.hours) * 3600 + u32::from(self.minutes) * 60 + u32::from(self.seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("time must be HH:MM:SS (hours 0-99, minutes and seconds 0-59): {0:?}")]
pub struct ElapsedTimeError(String);

impl FromStr for ElapsedTime {
    type Err = ElapsedTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ElapsedTimeError(s.to_string());

        let mut fields = [0u8; 3];
        let mut parts = s.split(':');
        for field in fields.iter_mut() {
            let part = parts.next().ok_or_else(err)?;
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(err());
            }
            *field = part.parse().map_err(|_| err())?;
        }
        if parts.next().is_some() {
            return Err(err());
        }

        let [hours, minutes, seconds] = fields;
        if minutes > 59 || seconds > 59 {
            return Err(err());
        }

        Ok(Self {
            hours,
            minutes,
            seconds,
        })
    }
}

impl fmt::Display for ElapsedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}

/// Submitted add/edit form.
#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EntryForm {
    #[validate(length(min = 1, max = 100, message = "name is required (max 100 chars)"))]
    pub name: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, message = "distance must be positive"))]
    pub distance: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 1, message = "elevation must be positive"))]
    pub elevation: Option<u32>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "latitude out of range"))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "longitude out of range"))]
    pub lng: f64,
}

impl EntryForm {
    /// Normalize and validate the form into storable entry data.
    ///
    /// `today` bounds the ascent date; `now` becomes `created_at`.
    pub fn into_data(
        mut self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<EntryData, AppError> {
        self.name = self.name.trim().to_string();
        self.validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let time = match non_blank(self.time) {
            Some(raw) => {
                let parsed: ElapsedTime = raw
                    .parse()
                    .map_err(|e: ElapsedTimeError| AppError::BadRequest(e.to_string()))?;
                Some(parsed.to_string())
            }
            None => None,
        };

        let date = match non_blank(self.date) {
            Some(raw) => {
                let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                    AppError::BadRequest(format!("date must be YYYY-MM-DD: {raw:?}"))
                })?;
                if date > today {
                    return Err(AppError::BadRequest(
                        "date cannot be in the future".to_string(),
                    ));
                }
                Some(date)
            }
            None => None,
        };

        Ok(EntryData {
            name: self.name,
            time,
            distance: self.distance,
            elevation: self.elevation,
            date,
            lat: self.lat,
            lng: self.lng,
            created_at: Some(now),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn form() -> EntryForm {
        EntryForm {
            name: "  Col du Tourmalet ".to_string(),
            time: Some("01:32:10".to_string()),
            distance: Some(18.6),
            elevation: Some(1404),
            date: Some("2024-07-14".to_string()),
            lat: 42.9083,
            lng: 0.1214,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 20).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 20, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_elapsed_time_parsing() {
        let t: ElapsedTime = "99:59:59".parse().unwrap();
        assert_eq!(t.total_seconds(), 99 * 3600 + 59 * 60 + 59);
        assert_eq!(t.to_string(), "99:59:59");

        for bad in ["1:00:00", "00:60:00", "00:00:60", "00:00", "00:00:00:00", "aa:bb:cc", ""] {
            assert!(bad.parse::<ElapsedTime>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_form_into_data_normalizes() {
        let data = form().into_data(today(), now()).unwrap();
        assert_eq!(data.name, "Col du Tourmalet");
        assert_eq!(data.time.as_deref(), Some("01:32:10"));
        assert_eq!(data.date, NaiveDate::from_ymd_opt(2024, 7, 14));
        assert_eq!(data.created_at, Some(now()));
    }

    #[test]
    fn test_form_blank_optionals_become_absent() {
        let mut f = form();
        f.time = Some("   ".to_string());
        f.date = Some(String::new());
        let data = f.into_data(today(), now()).unwrap();
        assert!(data.time.is_none());
        assert!(data.date.is_none());
    }

    #[test]
    fn test_form_rejects_invalid_fields() {
        let mut f = form();
        f.name = "   ".to_string();
        assert!(matches!(f.into_data(today(), now()), Err(AppError::BadRequest(_))));

        let mut f = form();
        f.distance = Some(0.0);
        assert!(f.into_data(today(), now()).is_err());

        let mut f = form();
        f.elevation = Some(0);
        assert!(f.into_data(today(), now()).is_err());

        let mut f = form();
        f.lat = 91.0;
        assert!(f.into_data(today(), now()).is_err());

        let mut f = form();
        f.time = Some("1:5:3".to_string());
        assert!(f.into_data(today(), now()).is_err());
    }

    #[test]
    fn test_form_date_not_after_today() {
        let mut f = form();
        f.date = Some("2024-07-20".to_string());
        assert!(f.clone().into_data(today(), now()).is_ok());

        f.date = Some("2024-07-21".to_string());
        assert!(f.into_data(today(), now()).is_err());
    }

    #[test]
    fn test_avg_gradient() {
        let data = form().into_data(today(), now()).unwrap();
        assert_eq!(data.avg_gradient_pct(), Some(7.5));

        let flat = EntryData {
            distance: None,
            ..data
        };
        assert_eq!(flat.avg_gradient_pct(), None);
    }

    #[test]
    fn test_entry_json_uses_camel_case() {
        let entry = Entry {
            id: "abc".to_string(),
            data: form().into_data(today(), now()).unwrap(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], "abc");
        assert_eq!(json["name"], "Col du Tourmalet");
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["date"], "2024-07-14");
    }
}
