// SPDX-License-Identifier: MPL-2.0

use std::{collections::HashSet, fmt, str::FromStr};

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use clap::ValueEnum;

use crate::error::ConfigError;

/// Inclusive range of calendar days.  A range whose start is after its end
/// is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let to = self.to;
        self.from.iter_days().take_while(move |day| *day <= to)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.from, self.to)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Monday to Sunday of the current week
    Weekly,
    /// first to last day of the current month
    Monthly,
}

impl Preset {
    pub fn range(self, today: NaiveDate) -> DateRange {
        match self {
            Preset::Weekly => {
                let monday =
                    today - Days::new(today.weekday().num_days_from_monday().into());
                DateRange::new(monday, monday + Days::new(6))
            }
            Preset::Monthly => {
                let first = today - Days::new((today.day() - 1).into());
                let last = first + Months::new(1) - Days::new(1);
                DateRange::new(first, last)
            }
        }
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(Preset::Weekly),
            "monthly" => Ok(Preset::Monthly),
            _ => Err(ConfigError::UnknownPreset(s.to_owned())),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::Weekly => f.write_str("weekly"),
            Preset::Monthly => f.write_str("monthly"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Weekend,
    Holiday,
    Leave,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Weekend => f.write_str("weekend"),
            SkipReason::Holiday => f.write_str("holiday"),
            SkipReason::Leave => f.write_str("leave"),
        }
    }
}

/// Decides which days get no timelog.  Holidays and leave days are kept as
/// `YYYY-MM-DD` strings and matched exactly.
#[derive(Debug, Default, Clone)]
pub struct SkipPolicy {
    holidays: HashSet<String>,
    leaves: HashSet<String>,
}

impl SkipPolicy {
    pub fn new(
        holidays: impl IntoIterator<Item = String>,
        leaves: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
            leaves: leaves.into_iter().collect(),
        }
    }

    /// Weekends win over holidays, and holidays over leave.
    pub fn skip_reason(&self, date: NaiveDate) -> Option<SkipReason> {
        if is_weekend(date) {
            return Some(SkipReason::Weekend);
        }
        let key = date.format("%Y-%m-%d").to_string();
        if self.holidays.contains(&key) {
            Some(SkipReason::Holiday)
        } else if self.leaves.contains(&key) {
            Some(SkipReason::Leave)
        } else {
            None
        }
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
