use chrono::{Datelike, Local, Offset, TimeZone, Timelike};

/// Datetime device: read-only bytes following the C `struct tm` conventions
/// (zero-based month and day-of-year, Sunday-first weekday).
pub fn byte(port: u8) -> u8 {
    let now = Local::now();
    match port {
        0x0 => (now.year() >> 8) as u8,
        0x1 => now.year() as u8,
        0x2 => now.month0() as u8,
        0x3 => now.day() as u8,
        0x4 => now.hour() as u8,
        0x5 => now.minute() as u8,
        0x6 => now.second() as u8,
        0x7 => now.weekday().num_days_from_sunday() as u8,
        0x8 => (now.ordinal0() >> 8) as u8,
        0x9 => now.ordinal0() as u8,
        0xa => is_dst(),
        _ => 0,
    }
}

// The local offset exceeds the smaller of the January/July offsets exactly
// when daylight saving is in effect, in either hemisphere.
fn is_dst() -> u8 {
    let now = Local::now();
    let year = now.year();
    let base = [(1, 1), (7, 1)]
        .iter()
        .filter_map(|&(m, d)| Local.with_ymd_and_hms(year, m, d, 12, 0, 0).single())
        .map(|t| t.offset().fix().local_minus_utc())
        .min();
    match base {
        Some(base) => (now.offset().fix().local_minus_utc() > base) as u8,
        None => 0,
    }
}
