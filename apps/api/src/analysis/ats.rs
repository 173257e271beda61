//! ATS readiness scoring.
//!
//! Seven weighted checks (contact, summary, experience, education, skills,
//! keywords, formatting) each score out of ten. The report score is their mean
//! ratio scaled to 0-10. Keyword pools are picked by template family.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::document::{ExperienceItem, ResumeData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AtsGrade {
    Excellent,
    Strong,
    Ok,
    Weak,
}

impl AtsGrade {
    fn from_ratio(ratio: f64) -> Self {
        if ratio >= 0.85 {
            AtsGrade::Excellent
        } else if ratio >= 0.7 {
            AtsGrade::Strong
        } else if ratio >= 0.55 {
            AtsGrade::Ok
        } else {
            AtsGrade::Weak
        }
    }

    fn summary(self) -> &'static str {
        match self {
            AtsGrade::Excellent => "Ready for ATS, only fine-tuning keywords.",
            AtsGrade::Strong => "Strong ATS footing, add a bit more specificity.",
            AtsGrade::Ok => "Decent foundation, tighten structure and keywords.",
            AtsGrade::Weak => "High risk of mis-parsing, shore up critical sections.",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AtsMetric {
    pub id: &'static str,
    pub label: &'static str,
    pub score: f64,
    pub max_score: f64,
    pub detail: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    pub ratio: f64,
}

impl AtsMetric {
    fn new(
        id: &'static str,
        label: &'static str,
        score: f64,
        max_score: f64,
        detail: String,
        recommendation: Option<String>,
    ) -> Self {
        Self {
            id,
            label,
            score,
            max_score,
            detail,
            passed: score >= max_score * 0.8,
            recommendation,
            ratio: if max_score > 0.0 { score / max_score } else { 0.0 },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AtsReport {
    /// 0.0 to 10.0, one decimal.
    pub score: f64,
    pub max_score: f64,
    pub grade: AtsGrade,
    pub summary: &'static str,
    pub metrics: Vec<AtsMetric>,
    pub keyword_hits: Vec<&'static str>,
    pub missing_keywords: Vec<&'static str>,
}

/// Keyword pools keyed by the first dash-separated token of a template id.
const KEYWORD_POOLS: &[(&str, &[&str])] = &[
    (
        "backend",
        &[
            "distributed", "microservice", "event", "kafka", "slo", "latency", "scalable",
            "api", "observability", "monitoring", "postgres", "aws", "queue", "resilience",
        ],
    ),
    (
        "frontend",
        &["react", "typescript", "design system", "performance", "accessibility", "component"],
    ),
    ("fullstack", &["graphql", "node", "full stack", "integration"]),
    ("executive", &["strategy", "leadership", "roadmap"]),
    (
        "software",
        &["design system", "observability", "performance", "leadership", "analytics", "mentored"],
    ),
];

const FALLBACK_POOL: &str = "software";

const ACTION_VERBS: &[&str] = &[
    "built", "led", "designed", "implemented", "architected", "reduced", "improved",
    "launched", "optimized", "delivered", "directed", "mentored", "orchestrated",
];

fn keyword_pool(template_id: &str) -> &'static [&'static str] {
    let prefix = template_id.split('-').next().unwrap_or_default();
    let lookup = |key: &str| KEYWORD_POOLS.iter().find(|(k, _)| *k == key).map(|(_, p)| *p);
    lookup(prefix).or_else(|| lookup(FALLBACK_POOL)).unwrap_or_default()
}

/// Bullet lines of a role: its highlights plus each line of its description.
fn experience_lines(item: &ExperienceItem) -> impl Iterator<Item = &str> {
    item.highlights
        .iter()
        .map(String::as_str)
        .chain(item.description.as_deref().unwrap_or_default().lines())
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

fn is_bulleted(item: &ExperienceItem) -> bool {
    !item.highlights.is_empty() || item.description.as_deref().is_some_and(|d| d.contains('\n'))
}

fn has_body(item: &ExperienceItem) -> bool {
    experience_lines(item).next().is_some()
}

/// Scores how well a resume will survive applicant-tracking parsers.
pub fn analyze(resume: &ResumeData, template_id: &str) -> AtsReport {
    let pool = keyword_pool(template_id);
    let info = &resume.personal_info;

    let mut metrics = vec![
        contact_metric(resume),
        summary_metric(info.summary.trim(), pool),
        experience_metric(&resume.experience),
        education_metric(resume),
        skills_metric(resume),
    ];
    let (keywords, keyword_hits, missing_keywords) = keywords_metric(resume, pool);
    metrics.push(keywords);
    metrics.push(formatting_metric(&resume.experience));

    let average = metrics.iter().map(|m| m.ratio).sum::<f64>() / metrics.len() as f64;
    let grade = AtsGrade::from_ratio(average);

    AtsReport {
        score: (average * 100.0).round() / 10.0,
        max_score: 10.0,
        grade,
        summary: grade.summary(),
        metrics,
        keyword_hits,
        missing_keywords,
    }
}

fn contact_metric(resume: &ResumeData) -> AtsMetric {
    let info = &resume.personal_info;
    let present = |s: &str| !s.trim().is_empty();
    let has_location = present(&info.location);
    let missing: Vec<&str> = [
        ("name", present(&info.full_name)),
        ("email", present(&info.email)),
        ("phone", present(&info.phone)),
    ]
    .into_iter()
    .filter_map(|(field, ok)| (!ok).then_some(field))
    .collect();

    let score = (3 - missing.len()) as f64 * 3.0 + if has_location { 1.0 } else { 0.0 };
    let (detail, recommendation) = if !missing.is_empty() {
        (
            format!("Missing {}.", missing.join(", ")),
            Some(format!(
                "Add {} so ATS can extract contact details.",
                missing.join(" and ")
            )),
        )
    } else if has_location {
        ("Contact information is complete.".to_string(), None)
    } else {
        (
            "Contact information is complete; add location for geographic filters.".to_string(),
            Some("Include a location to appear in location-based searches.".to_string()),
        )
    };

    AtsMetric::new("contact", "Contact details", score, 10.0, detail, recommendation)
}

fn summary_metric(summary: &str, pool: &[&str]) -> AtsMetric {
    if summary.is_empty() {
        return AtsMetric::new(
            "summary",
            "Professional summary",
            0.0,
            10.0,
            "Summary missing.".to_string(),
            Some("Add a short keyword-rich summary to aid ranking.".to_string()),
        );
    }

    let sentences = summary.split('.').filter(|s| !s.is_empty()).count();
    let lowered = summary.to_lowercase();
    let has_keyword = pool.iter().any(|k| lowered.contains(k));
    let score = (6.0_f64
        + if sentences > 1 { 2.0 } else { 0.0 }
        + if has_keyword { 2.0 } else { 0.0 })
    .min(10.0);

    let shown = sentences.max(1);
    let detail = format!(
        "Summary present with {shown} sentence{}.",
        if sentences == 1 { "" } else { "s" }
    );
    let recommendation = if score >= 9.0 {
        None
    } else if has_keyword {
        Some("Add impact (metrics, outcomes) to make the summary punchier.".to_string())
    } else {
        Some("Include role-specific keywords and measurable outcomes in the summary.".to_string())
    };

    AtsMetric::new("summary", "Professional summary", score, 10.0, detail, recommendation)
}

fn experience_metric(experience: &[ExperienceItem]) -> AtsMetric {
    let count = experience.len();
    let bulleted = experience.iter().filter(|e| is_bulleted(e)).count();
    let verb_hits = experience
        .iter()
        .flat_map(experience_lines)
        .filter(|line| {
            let line = line.to_lowercase();
            ACTION_VERBS.iter().any(|verb| line.contains(verb))
        })
        .count();

    let score = (count as f64 * 1.5).min(4.0)
        + if bulleted > 0 { 3.0 } else { 1.0 }
        + (verb_hits as f64).min(3.0);

    let mut suggestions = Vec::new();
    if count == 0 {
        suggestions.push("Add at least one recent role with bullet accomplishments.");
    } else {
        if count < 3 {
            suggestions.push("Add additional roles if relevant to show progression.");
        }
        if bulleted < count {
            suggestions.push("Use bullet formatting for every role.");
        }
        if verb_hits < count * 2 {
            suggestions.push("Strengthen bullets with action verbs and measurable impact.");
        }
    }

    let detail = if count > 0 {
        format!("{count} roles listed; {bulleted}/{count} use bullet formatting.")
    } else {
        "No experience entries found.".to_string()
    };
    let recommendation = (!suggestions.is_empty()).then(|| suggestions.join(" "));

    AtsMetric::new("experience", "Experience depth", score, 10.0, detail, recommendation)
}

fn education_metric(resume: &ResumeData) -> AtsMetric {
    if resume.education.is_empty() {
        AtsMetric::new(
            "education",
            "Education section",
            0.0,
            10.0,
            "Education missing.".to_string(),
            Some("Include highest degree and institution.".to_string()),
        )
    } else {
        AtsMetric::new(
            "education",
            "Education section",
            10.0,
            10.0,
            "Education listed.".to_string(),
            None,
        )
    }
}

fn skills_metric(resume: &ResumeData) -> AtsMetric {
    let unique: HashSet<String> = resume
        .skills
        .iter()
        .map(|s| s.name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .collect();
    let n = unique.len();

    let recommendation = if n >= 12 {
        None
    } else if n >= 8 {
        Some("Expand the toolbox with niche tools or methodologies to reach ~12 skills.".to_string())
    } else {
        Some("List at least 8 role-relevant skills.".to_string())
    };

    AtsMetric::new(
        "skills",
        "Skills coverage",
        (n as f64 * 1.25).min(10.0),
        10.0,
        format!("{n} skills detected across core/toolbox sections."),
        recommendation,
    )
}

fn keywords_metric(
    resume: &ResumeData,
    pool: &'static [&'static str],
) -> (AtsMetric, Vec<&'static str>, Vec<&'static str>) {
    let mut corpus = vec![resume.personal_info.summary.clone()];
    corpus.extend(resume.experience.iter().map(|e| {
        let body: Vec<&str> = experience_lines(e).collect();
        format!("{} {}", e.position, body.join(" "))
    }));
    corpus.push(
        resume
            .skills
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(" "),
    );
    let text = corpus.join(" ").to_lowercase();

    let (hits, missing): (Vec<&'static str>, Vec<&'static str>) =
        pool.iter().copied().partition(|k| text.contains(k));

    if pool.is_empty() {
        let metric = AtsMetric::new(
            "keywords",
            "Role keywords",
            8.0,
            8.0,
            "No template-specific keywords required.".to_string(),
            None,
        );
        return (metric, hits, missing);
    }

    let recommendation = (!missing.is_empty()).then(|| {
        let sample: Vec<&str> = missing.iter().take(3).copied().collect();
        format!("Add keywords such as {}.", sample.join(", "))
    });
    let metric = AtsMetric::new(
        "keywords",
        "Role keywords",
        hits.len() as f64 / pool.len() as f64 * 10.0,
        10.0,
        format!("{}/{} recommended keywords present.", hits.len(), pool.len()),
        recommendation,
    );
    (metric, hits, missing)
}

fn formatting_metric(experience: &[ExperienceItem]) -> AtsMetric {
    let structured = experience.iter().all(has_body);
    if structured {
        AtsMetric::new(
            "formatting",
            "Structure & formatting",
            10.0,
            10.0,
            "Consistent bullet descriptions.".to_string(),
            None,
        )
    } else {
        AtsMetric::new(
            "formatting",
            "Structure & formatting",
            4.0,
            10.0,
            "Some experience entries need structured bullets.".to_string(),
            Some("Ensure every role has bullet descriptions separated by new lines.".to_string()),
        )
    }
}
