use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn code(self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(RiskLevel::Low),
            "MEDIUM" => Some(RiskLevel::Medium),
            "HIGH" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RiskFilter {
    #[default]
    All,
    Only(RiskLevel),
}

impl RiskFilter {
    pub fn parse(raw: &str) -> Self {
        RiskLevel::parse(raw).map_or(RiskFilter::All, RiskFilter::Only)
    }

    pub fn level(self) -> Option<RiskLevel> {
        match self {
            RiskFilter::All => None,
            RiskFilter::Only(level) => Some(level),
        }
    }

    pub fn accepts(self, tip: &Tip) -> bool {
        self.level().is_none_or(|level| tip.risk == level)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tip {
    pub id: i64,
    pub risk: RiskLevel,
    pub league: String,
    pub match_label: String,
    pub market: String,
    pub odds: f64,
    /// Local `HH:MM`, empty when the backend sent no kickoff.
    pub kickoff: String,
    /// 0-100.
    pub confidence: u8,
    pub home_logo: Option<String>,
    pub away_logo: Option<String>,
    pub league_logo: Option<String>,
    pub season: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackendTip {
    id: i64,
    #[serde(default)]
    league: String,
    home_team: String,
    away_team: String,
    #[serde(default)]
    home_logo: Option<String>,
    #[serde(default)]
    away_logo: Option<String>,
    #[serde(default)]
    league_logo: Option<String>,
    #[serde(default)]
    season: Option<String>,
    label: String,
    odds: f64,
    risk: RiskLevel,
    #[serde(default)]
    confidence_pct: Option<f64>,
    #[serde(default)]
    kickoff_at: Option<String>,
}

impl From<BackendTip> for Tip {
    fn from(t: BackendTip) -> Self {
        Tip {
            id: t.id,
            risk: t.risk,
            league: t.league,
            match_label: format!("{} vs. {}", t.home_team, t.away_team),
            market: t.label,
            odds: t.odds,
            kickoff: t.kickoff_at.as_deref().map(kickoff_hhmm).unwrap_or_default(),
            confidence: t
                .confidence_pct
                .filter(|c| c.is_finite())
                .map(|c| c.clamp(0.0, 100.0).round() as u8)
                .unwrap_or(0),
            home_logo: t.home_logo,
            away_logo: t.away_logo,
            league_logo: t.league_logo,
            season: t.season,
        }
    }
}

pub fn parse_tips_json(raw: &str) -> Result<Vec<Tip>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let rows: Vec<BackendTip> = serde_json::from_str(trimmed).context("invalid tips json")?;
    Ok(rows.into_iter().map(Tip::from).collect())
}

/// Kickoff in local wall-clock time. Offset-less timestamps are taken as local.
pub fn kickoff_hhmm(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local).format("%H:%M").to_string();
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return naive.format("%H:%M").to_string();
        }
    }
    String::new()
}

pub fn filter_tips(tips: &[Tip], filter: RiskFilter) -> Vec<&Tip> {
    tips.iter().filter(|t| filter.accepts(t)).collect()
}
