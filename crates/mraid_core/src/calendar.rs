//! Calendar event translation and recurrence rules
//!
//! The payload describes events as a flat string map. This module validates
//! that map into a [`CalendarEvent`] and derives an RRULE from its
//! repetition fields.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use mraid_platform::{Availability, CalendarEvent};
use thiserror::Error;

const MAX_DAYS_IN_MONTH: i32 = 31;
const WEEKDAYS: [&str; 7] = ["SU", "MO", "TU", "WE", "TH", "FR", "SA"];

/// Reasons a calendar request is rejected
///
/// The display strings are reported to the payload verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("missing start and description fields")]
    MissingFields,

    #[error("Invalid date format. Date format expecting (yyyy-MM-DDTHH:MM:SS-xx:xx) i.e. 2013-08-14T09:00:00-08:00")]
    InvalidDate,

    #[error("invalid interval {0}")]
    InvalidInterval(String),

    #[error("frequency is only supported for daily, weekly, and monthly.")]
    UnsupportedFrequency(String),

    #[error("invalid day of week {0}")]
    InvalidDayOfWeek(String),

    #[error("invalid day of month {0}")]
    InvalidDayOfMonth(String),

    #[error("must have at least 1 day of the week if specifying repeating weekly")]
    NoDaysOfWeek,

    #[error("must have at least 1 day of the month if specifying repeating monthly")]
    NoDaysOfMonth,
}

pub type Result<T> = std::result::Result<T, CalendarError>;

/// Repetition frequency
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(CalendarError::UnsupportedFrequency(other.to_string())),
        }
    }

    fn rule_name(self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
        }
    }
}

/// Raw repetition fields of a calendar request
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecurrenceRequest {
    pub frequency: Option<String>,
    pub interval: Option<String>,
    pub days_in_week: Option<String>,
    pub days_in_month: Option<String>,
}

impl RecurrenceRequest {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self {
            frequency: params.get("frequency").cloned(),
            interval: params.get("interval").cloned(),
            days_in_week: params.get("daysInWeek").cloned(),
            days_in_month: params.get("daysInMonth").cloned(),
        }
    }

    /// Build the RRULE string
    ///
    /// No frequency yields an empty rule. Day lists only apply to their own
    /// frequency: `daysInWeek` is ignored for a monthly rule and vice versa.
    pub fn to_rule(&self) -> Result<String> {
        let Some(frequency) = self.frequency.as_deref() else {
            return Ok(String::new());
        };
        let frequency = Frequency::parse(frequency)?;
        let interval = self.interval.as_deref().map(parse_interval).transpose()?;

        let mut rule = format!("FREQ={};", frequency.rule_name());
        if let Some(interval) = interval {
            rule.push_str(&format!("INTERVAL={interval};"));
        }

        match frequency {
            Frequency::Daily => {}
            Frequency::Weekly => {
                if let Some(days) = self.days_in_week.as_deref() {
                    rule.push_str(&format!("BYDAY={};", week_days(days)?));
                }
            }
            Frequency::Monthly => {
                if let Some(days) = self.days_in_month.as_deref() {
                    rule.push_str(&format!("BYMONTHDAY={};", month_days(days)?));
                }
            }
        }

        Ok(rule)
    }
}

/// Build an RRULE straight from a request map
pub fn build_recurrence_rule(params: &HashMap<String, String>) -> Result<String> {
    RecurrenceRequest::from_params(params).to_rule()
}

/// Validate a payload calendar request
///
/// `description` becomes the event title and `summary` its description.
pub fn translate_calendar_request(params: &HashMap<String, String>) -> Result<CalendarEvent> {
    let (Some(title), Some(start)) = (params.get("description"), params.get("start")) else {
        return Err(CalendarError::MissingFields);
    };

    let begin = parse_date(start)?;
    let end = params.get("end").map(|end| parse_date(end)).transpose()?;

    let availability = params.get("transparency").map(|value| {
        if value == "transparent" {
            Availability::Free
        } else {
            Availability::Busy
        }
    });

    Ok(CalendarEvent {
        title: title.clone(),
        begin,
        end,
        location: params.get("location").cloned(),
        description: params.get("summary").cloned(),
        availability,
        recurrence_rule: build_recurrence_rule(params)?,
    })
}

fn parse_date(value: &str) -> Result<DateTime<FixedOffset>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .map_err(|_| CalendarError::InvalidDate)
}

fn parse_interval(value: &str) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(interval) if interval > 0 => Ok(interval),
        _ => Err(CalendarError::InvalidInterval(value.to_string())),
    }
}

/// Tokens of a day list; a blank list has none
///
/// Empty tokens inside a list (`1,,3`) are kept so they fail to parse.
fn split_days(expression: &str) -> Vec<&str> {
    if expression.trim().is_empty() {
        return Vec::new();
    }
    expression.split(',').map(str::trim).collect()
}

fn week_days(expression: &str) -> Result<String> {
    let mut seen = [false; 7];
    let mut days = Vec::new();

    for token in split_days(expression) {
        let day = match token.parse::<usize>() {
            Ok(7) => 0,
            Ok(day) if day < 7 => day,
            _ => return Err(CalendarError::InvalidDayOfWeek(token.to_string())),
        };
        if !seen[day] {
            seen[day] = true;
            days.push(WEEKDAYS[day]);
        }
    }

    if days.is_empty() {
        return Err(CalendarError::NoDaysOfWeek);
    }
    Ok(days.join(","))
}

fn month_days(expression: &str) -> Result<String> {
    let mut days: Vec<i32> = Vec::new();

    for token in split_days(expression) {
        let day = match token.parse::<i32>() {
            Ok(day) if day != 0 && (-MAX_DAYS_IN_MONTH..=MAX_DAYS_IN_MONTH).contains(&day) => day,
            _ => return Err(CalendarError::InvalidDayOfMonth(token.to_string())),
        };
        if !days.contains(&day) {
            days.push(day);
        }
    }

    if days.is_empty() {
        return Err(CalendarError::NoDaysOfMonth);
    }
    Ok(days
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(","))
}
