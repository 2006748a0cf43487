//! Date rendering in the en-US convention the page templates use:
//! `"Mar 15, 2024"`. Unparseable input degrades to the `"Invalid Date"`
//! sentinel instead of failing, so callers can format untrusted values
//! straight into the page.

const MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const MONTHS_LONG: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const INVALID_DATE: &str = "Invalid Date";

/// Formats a date string as `<abbreviated month> <day>, <year>`.
///
/// Accepted inputs: ISO `YYYY-MM-DD` (an optional time suffix is ignored),
/// US numeric `MM/DD/YYYY`, and en-US month names (`Mar 15, 2024` or
/// `March 15, 2024`, case-insensitive). Formatting is idempotent: feeding the
/// output back in reproduces it.
pub fn format_date(input: &str) -> String {
    match parse_date(input) {
        Some(date) => render(date),
        None => INVALID_DATE.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CalendarDate {
    year: u32,
    month: u32,
    day: u32,
}

fn render(date: CalendarDate) -> String {
    format!(
        "{} {}, {}",
        MONTHS_SHORT[(date.month - 1) as usize],
        date.day,
        date.year
    )
}

fn parse_date(input: &str) -> Option<CalendarDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    parse_iso(input)
        .or_else(|| parse_us_numeric(input))
        .or_else(|| parse_month_name(input))
}

/// `YYYY-MM-DD`, optionally followed by a time part after `T` or whitespace.
fn parse_iso(input: &str) -> Option<CalendarDate> {
    let date_part = input
        .split(|ch: char| ch == 'T' || ch.is_whitespace())
        .next()?;
    let mut parts = date_part.split('-');
    let year = parse_digits(parts.next()?, 1, 6)?;
    let month = parse_digits(parts.next()?, 1, 2)?;
    let day = parse_digits(parts.next()?, 1, 2)?;
    if parts.next().is_some() {
        return None;
    }
    checked_date(year, month, day)
}

/// `MM/DD/YYYY`.
fn parse_us_numeric(input: &str) -> Option<CalendarDate> {
    let mut parts = input.split('/');
    let month = parse_digits(parts.next()?, 1, 2)?;
    let day = parse_digits(parts.next()?, 1, 2)?;
    let year = parse_digits(parts.next()?, 1, 6)?;
    if parts.next().is_some() {
        return None;
    }
    checked_date(year, month, day)
}

/// `Mar 15, 2024` or `March 15 2024`, month name case-insensitive.
fn parse_month_name(input: &str) -> Option<CalendarDate> {
    let cleaned = input.replace(',', " ");
    let mut parts = cleaned.split_whitespace();
    let month_token = parts.next()?;
    let day = parse_digits(parts.next()?, 1, 2)?;
    let year = parse_digits(parts.next()?, 1, 6)?;
    if parts.next().is_some() {
        return None;
    }
    let month = month_number(month_token)?;
    checked_date(year, month, day)
}

fn month_number(token: &str) -> Option<u32> {
    let index = MONTHS_SHORT
        .iter()
        .position(|name| name.eq_ignore_ascii_case(token))
        .or_else(|| {
            MONTHS_LONG
                .iter()
                .position(|name| name.eq_ignore_ascii_case(token))
        })?;
    Some(index as u32 + 1)
}

fn parse_digits(token: &str, min_len: usize, max_len: usize) -> Option<u32> {
    if token.len() < min_len || token.len() > max_len {
        return None;
    }
    if !token.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn checked_date(year: u32, month: u32, day: u32) -> Option<CalendarDate> {
    if !(1..=12).contains(&month) {
        return None;
    }
    if day < 1 || day > days_in_month(year, month) {
        return None;
    }
    Some(CalendarDate { year, month, day })
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
