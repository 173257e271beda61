//! Per-session style overrides layered on top of a template's design tokens.
//!
//! Options change presentation only. The document is never touched, so the same
//! data renders identically once the overrides are reset.

use serde::{Deserialize, Serialize};

use crate::models::document::SectionType;
use crate::render::catalog::TemplateConfig;
use crate::render::format::DateStyle;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderCase {
    #[default]
    Uppercase,
    Capitalize,
    Lowercase,
}

impl HeaderCase {
    fn css(self) -> &'static str {
        match self {
            HeaderCase::Uppercase => "uppercase",
            HeaderCase::Capitalize => "capitalize",
            HeaderCase::Lowercase => "lowercase",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulletStyle {
    #[default]
    #[serde(alias = "•")]
    Disc,
    #[serde(alias = "◦")]
    Circle,
    #[serde(alias = "▪")]
    Square,
    #[serde(alias = "–")]
    Dash,
    #[serde(alias = "▸")]
    Arrow,
    None,
}

impl BulletStyle {
    pub fn glyph(self) -> &'static str {
        match self {
            BulletStyle::Disc => "•",
            BulletStyle::Circle => "◦",
            BulletStyle::Square => "▪",
            BulletStyle::Dash => "–",
            BulletStyle::Arrow => "▸",
            BulletStyle::None => "",
        }
    }
}

/// Border under section headings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DividerStyle {
    Line,
    Dotted,
    Double,
    Thin,
    None,
}

impl DividerStyle {
    fn border(self, accent_color: &str) -> String {
        match self {
            DividerStyle::Line => format!("1px solid {accent_color}"),
            DividerStyle::Dotted => format!("1px dotted {accent_color}"),
            DividerStyle::Double => format!("3px double {accent_color}"),
            DividerStyle::Thin => format!("0.5px solid {accent_color}"),
            DividerStyle::None => "none".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontScale {
    Compact,
    #[default]
    Normal,
    Large,
}

impl FontScale {
    pub fn multiplier(self) -> f64 {
        match self {
            FontScale::Compact => 0.9,
            FontScale::Normal => 1.0,
            FontScale::Large => 1.15,
        }
    }
}

/// Style overrides held by an edit session. Missing fields take their defaults,
/// so `{}` resets everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleOptions {
    pub header_case: HeaderCase,
    pub bullet_style: BulletStyle,
    /// `None` keeps the template's own heading decoration.
    pub divider_style: Option<DividerStyle>,
    pub font_size_scale: FontScale,
    /// `None` keeps the template's date style.
    pub date_format: Option<DateStyle>,
    pub show_photo: bool,
    pub show_summary: bool,
    pub show_experience: bool,
    pub show_education: bool,
    pub show_skills: bool,
    /// Dynamic sections as a whole.
    pub show_sections: bool,
}

impl Default for StyleOptions {
    fn default() -> Self {
        StyleOptions {
            header_case: HeaderCase::default(),
            bullet_style: BulletStyle::default(),
            divider_style: None,
            font_size_scale: FontScale::default(),
            date_format: None,
            show_photo: true,
            show_summary: true,
            show_experience: true,
            show_education: true,
            show_skills: true,
            show_sections: true,
        }
    }
}

/// The resolved values templates read under `style`.
#[derive(Debug, Clone, Serialize)]
pub struct StyleTokens {
    pub header_case: &'static str,
    pub bullet: &'static str,
    pub divider: Option<String>,
    pub show_photo: bool,
    pub show_summary: bool,
}

impl StyleOptions {
    /// The template's tokens with font sizes scaled and the date format applied.
    pub fn apply(&self, config: &TemplateConfig) -> TemplateConfig {
        let mut config = config.clone();
        let factor = self.font_size_scale.multiplier();
        let typography = &mut config.typography;
        for size in [
            &mut typography.name_size,
            &mut typography.heading_size,
            &mut typography.item_size,
            &mut typography.body_size,
            &mut typography.small_size,
        ] {
            *size = scale_font_size(size, factor);
        }
        if let Some(date_style) = self.date_format {
            config.date_style = date_style;
        }
        config
    }

    /// Whether a template layout slot of `section` is shown.
    pub fn shows(&self, section: SectionType) -> bool {
        match section {
            SectionType::Summary => self.show_summary,
            SectionType::Experience => self.show_experience,
            SectionType::Education => self.show_education,
            SectionType::Skills => self.show_skills,
            _ => true,
        }
    }

    pub fn tokens(&self, accent_color: &str) -> StyleTokens {
        StyleTokens {
            header_case: self.header_case.css(),
            bullet: self.bullet_style.glyph(),
            divider: self.divider_style.map(|d| d.border(accent_color)),
            show_photo: self.show_photo,
            show_summary: self.show_summary,
        }
    }
}

/// Scales `14px`, `1.2em`, `11pt` and similar by `factor`, to one decimal.
/// Values without a leading number (`inherit`) are returned unchanged.
pub fn scale_font_size(size: &str, factor: f64) -> String {
    let size = size.trim();
    let split = size
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(size.len());
    let (number, unit) = size.split_at(split);
    match number.parse::<f64>() {
        Ok(value) => {
            let scaled = (value * factor * 10.0).round() / 10.0;
            let unit = if unit.is_empty() { "px" } else { unit };
            format!("{scaled}{unit}")
        }
        Err(_) => size.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_font_size() {
        assert_eq!(scale_font_size("14px", 0.9), "12.6px");
        assert_eq!(scale_font_size("12px", 1.0), "12px");
        assert_eq!(scale_font_size("1.2em", 1.15), "1.4em");
        assert_eq!(scale_font_size("10", 1.15), "11.5px");
        assert_eq!(scale_font_size("inherit", 0.9), "inherit");
    }

    #[test]
    fn test_apply_scales_and_overrides_dates() {
        let base = TemplateConfig::default();
        let options = StyleOptions {
            font_size_scale: FontScale::Compact,
            date_format: Some(DateStyle::Numeric),
            ..Default::default()
        };
        let styled = options.apply(&base);
        assert_eq!(styled.typography.heading_size, "12.6px");
        assert_eq!(styled.date_style, DateStyle::Numeric);

        let untouched = StyleOptions::default().apply(&base);
        assert_eq!(untouched.typography.name_size, base.typography.name_size);
        assert_eq!(untouched.date_style, base.date_style);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options: StyleOptions =
            serde_json::from_value(serde_json::json!({
                "bullet_style": "▸",
                "date_format": "medium",
                "show_skills": false
            }))
            .unwrap();
        assert_eq!(options.bullet_style, BulletStyle::Arrow);
        assert_eq!(options.date_format, Some(DateStyle::Numeric));
        assert!(!options.shows(SectionType::Skills));
        assert!(options.shows(SectionType::Experience));
        assert_eq!(options.header_case, HeaderCase::Uppercase);
    }

    #[test]
    fn test_tokens() {
        let options = StyleOptions {
            divider_style: Some(DividerStyle::Dotted),
            bullet_style: BulletStyle::None,
            header_case: HeaderCase::Capitalize,
            ..Default::default()
        };
        let tokens = options.tokens("#112233");
        assert_eq!(tokens.divider.as_deref(), Some("1px dotted #112233"));
        assert_eq!(tokens.bullet, "");
        assert_eq!(tokens.header_case, "capitalize");
        assert_eq!(StyleOptions::default().tokens("#000").divider, None);
    }
}
