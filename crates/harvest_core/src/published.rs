//! Publish-date parsing for the Ukrainian-locale listing pages.
//!
//! Accepted shapes (case-insensitive, surrounding whitespace ignored):
//! - `12.01.2021`, optionally followed by `14:30` or `14:30:15`
//! - `12 січня 2021`, `12 січня 2021 р.`, `12 січня 2021, 14:30`, `12 січня 2021 року о 14:30`
//! - `2021-01-12`, `2021-01-12T14:30:00`, `2021-01-12 14:30`
//!
//! Month names may be genitive (`січня`) or nominative (`січень`).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised publish date {text:?}: {reason}")]
pub struct DateParseError {
    pub text: String,
    pub reason: &'static str,
}

const MONTHS: [(&str, &str); 12] = [
    ("січня", "січень"),
    ("лютого", "лютий"),
    ("березня", "березень"),
    ("квітня", "квітень"),
    ("травня", "травень"),
    ("червня", "червень"),
    ("липня", "липень"),
    ("серпня", "серпень"),
    ("вересня", "вересень"),
    ("жовтня", "жовтень"),
    ("листопада", "листопад"),
    ("грудня", "грудень"),
];

pub fn parse_published(text: &str) -> Result<NaiveDateTime, DateParseError> {
    let fail = |reason| DateParseError {
        text: text.trim().to_string(),
        reason,
    };

    let normalized = text.trim().to_lowercase().replace(',', " ");
    let tokens: Vec<&str> = normalized
        .split_whitespace()
        .filter(|token| !is_filler(token))
        .collect();

    let (date, time_tokens): (NaiveDate, Vec<&str>) = match tokens.as_slice() {
        [] => return Err(fail("empty")),
        [first, rest @ ..] if first.contains('-') => {
            let (date_part, time_part) = match first.split_once('t') {
                Some((date_part, time_part)) => (date_part, Some(time_part)),
                None => (*first, None),
            };
            let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                .map_err(|_| fail("bad yyyy-MM-dd date"))?;
            let mut time_tokens: Vec<&str> = time_part.into_iter().collect();
            time_tokens.extend_from_slice(rest);
            (date, time_tokens)
        }
        [first, rest @ ..] if first.matches('.').count() >= 2 => {
            let date = NaiveDate::parse_from_str(strip_year_suffix(first), "%d.%m.%Y")
                .map_err(|_| fail("bad dd.MM.yyyy date"))?;
            (date, rest.to_vec())
        }
        [day, month, year, rest @ ..] => {
            let date = textual_date(day, month, year).ok_or_else(|| fail("bad textual date"))?;
            (date, rest.to_vec())
        }
        _ => return Err(fail("missing year")),
    };

    let time = match time_tokens.as_slice() {
        [] => NaiveTime::default(),
        [token] => parse_time(token).ok_or_else(|| fail("bad time of day"))?,
        _ => return Err(fail("unexpected trailing text")),
    };

    Ok(date.and_time(time))
}

fn is_filler(token: &str) -> bool {
    matches!(token, "р." | "р" | "року" | "о" | "об")
}

fn strip_year_suffix(token: &str) -> &str {
    token
        .strip_suffix("р.")
        .or_else(|| token.strip_suffix('р'))
        .unwrap_or(token)
}

fn textual_date(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    let day: u32 = day.trim_end_matches('.').parse().ok()?;
    let month = MONTHS
        .iter()
        .position(|(genitive, nominative)| month == *genitive || month == *nominative)?;
    let year: i32 = strip_year_suffix(year).parse().ok()?;
    NaiveDate::from_ymd_opt(year, month as u32 + 1, day)
}

fn parse_time(token: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(token, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(token, "%H:%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::parse_published;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn numeric_short_date() {
        assert_eq!(parse_published(" 12.01.2021 ").unwrap(), at(2021, 1, 12, 0, 0));
        assert_eq!(parse_published("3.2.2021").unwrap(), at(2021, 2, 3, 0, 0));
    }

    #[test]
    fn numeric_date_with_time() {
        assert_eq!(
            parse_published("12.01.2021 14:30").unwrap(),
            at(2021, 1, 12, 14, 30)
        );
    }

    #[test]
    fn genitive_month_names() {
        assert_eq!(parse_published("12 січня 2021").unwrap(), at(2021, 1, 12, 0, 0));
        assert_eq!(parse_published("12. січня 2021").unwrap(), at(2021, 1, 12, 0, 0));
        assert_eq!(
            parse_published("1 Листопада 2020 р.").unwrap(),
            at(2020, 11, 1, 0, 0)
        );
        assert_eq!(
            parse_published("28 лютого 2021 року о 09:05").unwrap(),
            at(2021, 2, 28, 9, 5)
        );
    }

    #[test]
    fn nominative_month_and_comma_time() {
        assert_eq!(
            parse_published("5 грудень 2022, 18:00").unwrap(),
            at(2022, 12, 5, 18, 0)
        );
    }

    #[test]
    fn iso_dates() {
        assert_eq!(parse_published("2023-01-03").unwrap(), at(2023, 1, 3, 0, 0));
        assert_eq!(
            parse_published("2023-01-03T10:15:00").unwrap(),
            at(2023, 1, 3, 10, 15)
        );
        assert_eq!(
            parse_published("2023-01-03 10:15").unwrap(),
            at(2023, 1, 3, 10, 15)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_published("").is_err());
        assert!(parse_published("вчора").is_err());
        assert!(parse_published("12 січня").is_err());
        assert!(parse_published("31.02.2021").is_err());
        assert!(parse_published("12 smarch 2021").is_err());
        assert!(parse_published("12.01.2021 14:30 extra").is_err());
    }
}
