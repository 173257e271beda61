use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How month-precision dates are displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateStyle {
    /// `Jan 2022`
    #[default]
    Short,
    /// `January 2022`
    Long,
    /// `2022`
    YearOnly,
    /// `01/2022`
    #[serde(alias = "medium")]
    Numeric,
}

impl DateStyle {
    /// Lenient lookup used by template filters; unknown names fall back to `Short`.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "long" => DateStyle::Long,
            "year_only" | "year" => DateStyle::YearOnly,
            "numeric" | "medium" => DateStyle::Numeric,
            _ => DateStyle::Short,
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            DateStyle::Short => "%b %Y",
            DateStyle::Long => "%B %Y",
            DateStyle::YearOnly => "%Y",
            DateStyle::Numeric => "%m/%Y",
        }
    }
}

/// Formats `YYYY-MM`, `YYYY-MM-DD` or `YYYY`. Anything else is returned unchanged.
pub fn format_date(raw: &str, style: DateStyle) -> String {
    let trimmed = raw.trim();
    match parse_date(trimmed) {
        Some((date, true)) => date.format(style.pattern()).to_string(),
        Some((date, false)) => date.format("%Y").to_string(),
        None => raw.to_string(),
    }
}

/// `Jan 2020 - Present`, `Jan 2020 - Mar 2021`, or just the start when no end is known.
pub fn date_range(start: &str, end: &str, current: bool, style: DateStyle) -> String {
    let start = format_date(start, style);
    let end = if current {
        "Present".to_string()
    } else {
        format_date(end, style)
    };

    match (start.is_empty(), end.is_empty()) {
        (true, true) => String::new(),
        (false, true) => start,
        (true, false) => end,
        (false, false) => format!("{start} - {end}"),
    }
}

/// Returns the date and whether it carried month precision.
fn parse_date(raw: &str) -> Option<(NaiveDate, bool)> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some((date, true));
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d") {
        return Some((date, true));
    }
    if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
        let year = raw.parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1).map(|d| (d, false));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_and_year_only() {
        assert_eq!(format_date("2022-01", DateStyle::Short), "Jan 2022");
        assert_eq!(format_date("2022-01", DateStyle::YearOnly), "2022");
        assert_eq!(format_date("2019-11-03", DateStyle::Long), "November 2019");
        assert_eq!(format_date("2019-11", DateStyle::Numeric), "11/2019");
    }

    #[test]
    fn test_unparsable_is_unchanged() {
        assert_eq!(format_date("Summer 2020", DateStyle::Short), "Summer 2020");
        assert_eq!(format_date("", DateStyle::Short), "");
        assert_eq!(format_date("2022-13", DateStyle::Short), "2022-13");
    }

    #[test]
    fn test_bare_year_stays_a_year() {
        assert_eq!(format_date("2018", DateStyle::Short), "2018");
    }

    #[test]
    fn test_date_range() {
        assert_eq!(date_range("2022-01", "", true, DateStyle::Short), "Jan 2022 - Present");
        assert_eq!(date_range("2020-03", "2021-06", false, DateStyle::YearOnly), "2020 - 2021");
        assert_eq!(date_range("2020-03", "", false, DateStyle::Short), "Mar 2020");
        assert_eq!(date_range("", "", false, DateStyle::Short), "");
    }

    #[test]
    fn test_style_from_name() {
        assert_eq!(DateStyle::from_name("year_only"), DateStyle::YearOnly);
        assert_eq!(DateStyle::from_name("nonsense"), DateStyle::Short);
    }
}
