use std::str::FromStr;

use time::macros::format_description;
use time::{Date, Month};

use crate::error::ValueError;

/// Locale used when rendering a compact `YYYYMMDD` birthday as a long date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateLocale {
    #[default]
    EnUs,
    EnGb,
    De,
    Fr,
    Es,
}

const MONTHS_DE: [&str; 12] = [
    "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August", "September",
    "Oktober", "November", "Dezember",
];

const MONTHS_FR: [&str; 12] = [
    "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre",
    "octobre", "novembre", "décembre",
];

const MONTHS_ES: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto", "septiembre",
    "octubre", "noviembre", "diciembre",
];

impl FromStr for DateLocale {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', "-").to_ascii_lowercase();
        match normalized.as_str() {
            "en" | "en-us" => Ok(DateLocale::EnUs),
            "en-gb" => Ok(DateLocale::EnGb),
            "de" | "de-de" | "de-at" | "de-ch" => Ok(DateLocale::De),
            "fr" | "fr-fr" | "fr-be" | "fr-ch" => Ok(DateLocale::Fr),
            "es" | "es-es" | "es-mx" => Ok(DateLocale::Es),
            _ => Err(ValueError::Locale(s.to_string())),
        }
    }
}

impl DateLocale {
    pub fn format_long(self, date: Date) -> Option<String> {
        let month_index = u8::from(date.month()) as usize - 1;
        match self {
            DateLocale::EnUs => date
                .format(format_description!("[month repr:long] [day padding:none], [year]"))
                .ok(),
            DateLocale::EnGb => date
                .format(format_description!("[day padding:none] [month repr:long] [year]"))
                .ok(),
            DateLocale::De => Some(format!(
                "{}. {} {}",
                date.day(),
                MONTHS_DE[month_index],
                date.year()
            )),
            DateLocale::Fr => Some(format!(
                "{} {} {}",
                date.day(),
                MONTHS_FR[month_index],
                date.year()
            )),
            DateLocale::Es => Some(format!(
                "{} de {} de {}",
                date.day(),
                MONTHS_ES[month_index],
                date.year()
            )),
        }
    }
}

/// Render an 8-digit `YYYYMMDD` value (dashes ignored) as a long date.
/// Anything else, including impossible dates, comes back trimmed but otherwise unchanged.
pub fn normalize_birthday(raw: &str, locale: DateLocale) -> String {
    let trimmed = raw.trim();
    let digits: String = trimmed.chars().filter(|c| *c != '-').collect();
    if digits.len() == 8 && digits.bytes().all(|b| b.is_ascii_digit()) {
        if let Some(formatted) = parse_compact(&digits).and_then(|date| locale.format_long(date)) {
            return formatted;
        }
    }
    trimmed.to_string()
}

fn parse_compact(digits: &str) -> Option<Date> {
    let year: i32 = digits[0..4].parse().ok()?;
    let month: u8 = digits[4..6].parse().ok()?;
    let day: u8 = digits[6..8].parse().ok()?;
    Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_birthday_renders_long_form() {
        assert_eq!(
            normalize_birthday("19900715", DateLocale::EnUs),
            "July 15, 1990"
        );
        assert_eq!(
            normalize_birthday("1990-07-15", DateLocale::EnGb),
            "15 July 1990"
        );
        assert_eq!(normalize_birthday("19900715", DateLocale::De), "15. Juli 1990");
        assert_eq!(
            normalize_birthday("19900715", DateLocale::Fr),
            "15 juillet 1990"
        );
        assert_eq!(
            normalize_birthday("19900715", DateLocale::Es),
            "15 de julio de 1990"
        );
    }

    #[test]
    fn other_values_pass_through() {
        assert_eq!(normalize_birthday("circa 1990", DateLocale::EnUs), "circa 1990");
        assert_eq!(normalize_birthday("--0715", DateLocale::EnUs), "--0715");
        assert_eq!(normalize_birthday("19901345", DateLocale::EnUs), "19901345");
        assert_eq!(
            normalize_birthday("1990-07-15T00:00:00Z", DateLocale::EnUs),
            "1990-07-15T00:00:00Z"
        );
    }

    #[test]
    fn locale_parsing() {
        assert_eq!("en_GB".parse::<DateLocale>(), Ok(DateLocale::EnGb));
        assert_eq!("DE".parse::<DateLocale>(), Ok(DateLocale::De));
        assert!("tlh".parse::<DateLocale>().is_err());
    }
}
