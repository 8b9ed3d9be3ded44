use serde::Serializer;
use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime, Time, UtcOffset};

/// Source of the kiosk's wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

#[cfg(test)]
pub(crate) struct FixedClock(pub OffsetDateTime);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

const HMS: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second]");
const HM: &[FormatItem<'static>] = format_description!("[hour]:[minute]");
const YMD: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Accepts `HH:MM:SS` and the `HH:MM` that browser time inputs send.
pub fn parse_time(raw: &str) -> Option<Time> {
    let raw = raw.trim();
    Time::parse(raw, HMS).or_else(|_| Time::parse(raw, HM)).ok()
}

pub fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), YMD).ok()
}

pub fn serialize_time<S: Serializer>(t: &Time, s: S) -> Result<S::Ok, S::Error> {
    let out = t.format(HMS).map_err(serde::ser::Error::custom)?;
    s.serialize_str(&out)
}

pub fn serialize_date<S: Serializer>(d: &Date, s: S) -> Result<S::Ok, S::Error> {
    let out = d.format(YMD).map_err(serde::ser::Error::custom)?;
    s.serialize_str(&out)
}
