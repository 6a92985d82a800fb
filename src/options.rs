use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const MATCH_LABEL_SEP: &str = " – ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SportType {
    #[default]
    Football,
    Basketball,
}

impl SportType {
    /// Lowercase id the competitions endpoints expect.
    pub fn sport_id(self) -> &'static str {
        match self {
            SportType::Football => "football",
            SportType::Basketball => "basketball",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            SportType::Football => "FOOTBALL",
            SportType::Basketball => "BASKETBALL",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "football" | "nogomet" => Some(SportType::Football),
            "basketball" | "kosarka" | "košarka" => Some(SportType::Basketball),
            _ => None,
        }
    }
}

impl fmt::Display for SportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryOption {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub flag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueOption {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub latest_season: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOption {
    pub id: String,
    pub label: String,
    pub timestamp: i64,
    pub league_id: String,
    pub league_name: String,
    #[serde(default)]
    pub league_logo: Option<String>,
    #[serde(default)]
    pub home_logo: Option<String>,
    #[serde(default)]
    pub away_logo: Option<String>,
    #[serde(default)]
    pub home_id: Option<String>,
    #[serde(default)]
    pub away_id: Option<String>,
    #[serde(default)]
    pub home_name: Option<String>,
    #[serde(default)]
    pub away_name: Option<String>,
    #[serde(default)]
    pub season_id: Option<String>,
}

impl MatchOption {
    /// Team names, falling back to the two halves of the label.
    pub fn team_names(&self) -> (String, String) {
        let mut halves = self.label.splitn(2, MATCH_LABEL_SEP);
        let label_home = halves.next().filter(|s| !s.is_empty());
        let label_away = halves.next().filter(|s| !s.is_empty());
        let home = self
            .home_name
            .clone()
            .or_else(|| label_home.map(str::to_string))
            .unwrap_or_else(|| "Domaćin".to_string());
        let away = self
            .away_name
            .clone()
            .or_else(|| label_away.map(str::to_string))
            .unwrap_or_else(|| "Gost".to_string());
        (home, away)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOption {
    pub code: String,
    pub odds: f64,
}

/// The option list behind each fetched node, as one closed type.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionList {
    Countries(Vec<CountryOption>),
    Leagues(Vec<LeagueOption>),
    Matches(Vec<MatchOption>),
    Markets(Vec<MarketOption>),
}

impl OptionList {
    pub fn len(&self) -> usize {
        match self {
            OptionList::Countries(v) => v.len(),
            OptionList::Leagues(v) => v.len(),
            OptionList::Matches(v) => v.len(),
            OptionList::Markets(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackendMatch {
    #[serde(deserialize_with = "id_string")]
    match_id: String,
    #[serde(default, deserialize_with = "opt_id_string")]
    domacin_id: Option<String>,
    domacin_ime: String,
    #[serde(default, deserialize_with = "opt_id_string")]
    gost_id: Option<String>,
    gost_ime: String,
    #[serde(default)]
    domacin_logo: Option<String>,
    #[serde(default)]
    gost_logo: Option<String>,
    #[serde(default)]
    timestamp: i64,
    #[serde(deserialize_with = "id_string")]
    league_id: String,
    #[serde(default)]
    league_ime: String,
    #[serde(default)]
    league_logo: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    season_id: Option<String>,
}

impl From<BackendMatch> for MatchOption {
    fn from(m: BackendMatch) -> Self {
        MatchOption {
            id: m.match_id,
            label: format!("{}{MATCH_LABEL_SEP}{}", m.domacin_ime, m.gost_ime),
            timestamp: m.timestamp,
            league_id: m.league_id,
            league_name: m.league_ime,
            league_logo: m.league_logo,
            home_logo: m.domacin_logo,
            away_logo: m.gost_logo,
            home_id: m.domacin_id,
            away_id: m.gost_id,
            home_name: Some(m.domacin_ime),
            away_name: Some(m.gost_ime),
            season_id: m.season_id,
        }
    }
}

pub fn parse_countries_json(raw: &str) -> Result<Vec<CountryOption>> {
    let Some(body) = non_null_body(raw) else {
        return Ok(Vec::new());
    };
    serde_json::from_str(body).context("invalid countries json")
}

pub fn parse_leagues_json(raw: &str) -> Result<Vec<LeagueOption>> {
    let Some(body) = non_null_body(raw) else {
        return Ok(Vec::new());
    };
    serde_json::from_str(body).context("invalid leagues json")
}

pub fn parse_matches_json(raw: &str) -> Result<Vec<MatchOption>> {
    let Some(body) = non_null_body(raw) else {
        return Ok(Vec::new());
    };
    let rows: Vec<BackendMatch> = serde_json::from_str(body).context("invalid matches json")?;
    Ok(rows.into_iter().map(MatchOption::from).collect())
}

/// Bet types arrive as an object of market code to odds, in backend order.
/// Entries whose odds are not numeric are skipped.
pub fn parse_markets_json(raw: &str) -> Result<Vec<MarketOption>> {
    let Some(body) = non_null_body(raw) else {
        return Ok(Vec::new());
    };
    let root: Value = serde_json::from_str(body).context("invalid bet types json")?;
    let Value::Object(map) = root else {
        return Err(anyhow::anyhow!("bet types json is not an object"));
    };
    Ok(map
        .into_iter()
        .filter_map(|(code, odds)| {
            let odds = match odds {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
                _ => None,
            }?;
            odds.is_finite().then_some(MarketOption { code, odds })
        })
        .collect())
}

fn non_null_body(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        None
    } else {
        Some(trimmed)
    }
}

fn id_string<'de, D>(de: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    value_to_id(&value).ok_or_else(|| serde::de::Error::custom("expected string or number id"))
}

fn opt_id_string<'de, D>(de: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(value.as_ref().and_then(value_to_id))
}

fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
