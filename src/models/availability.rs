use std::collections::HashSet;

use serde::Serialize;

/// One bookable hour at a venue on a given date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub time: String,
    pub available: bool,
}

/// Parses an "HH:MM" time of day into `(hour, minute)`.
pub fn parse_time_of_day(s: &str) -> Result<(u32, u32), String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(format!("invalid time format: {s}"));
    }
    let hour: u32 = parts[0]
        .parse()
        .map_err(|_| format!("invalid hour in: {s}"))?;
    let minute: u32 = parts[1]
        .parse()
        .map_err(|_| format!("invalid minute in: {s}"))?;
    if hour > 23 || minute > 59 {
        return Err(format!("time out of range: {s}"));
    }
    Ok((hour, minute))
}

pub fn slot_label(hour: u32) -> String {
    format!("{hour:02}:00")
}

/// Hour-granular slot labels from the opening hour (inclusive) to the closing
/// hour (exclusive). Minutes are ignored; no overnight spans.
pub fn hourly_slots(open_time: &str, close_time: &str) -> Result<Vec<String>, String> {
    let (open_hour, _) = parse_time_of_day(open_time)?;
    let (close_hour, _) = parse_time_of_day(close_time)?;
    Ok((open_hour..close_hour).map(slot_label).collect())
}

/// Tags every slot of the day as available unless one of `booked` (the time
/// slots of the venue's active bookings on that date) claims it.
pub fn compute_availability<'a, I>(
    open_time: &str,
    close_time: &str,
    booked: I,
) -> Result<Vec<Slot>, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: HashSet<&str> = booked.into_iter().collect();
    let slots = hourly_slots(open_time, close_time)?
        .into_iter()
        .map(|time| {
            let available = !taken.contains(time.as_str());
            Slot { time, available }
        })
        .collect();
    Ok(slots)
}
