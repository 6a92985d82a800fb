use anyhow::{Context, Result};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::backend::PlannerApi;
use crate::options::{LeagueOption, SportType};
use crate::selection::format_day;

pub const PLAN_DAYS: u32 = 7;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendLeague {
    #[serde(default)]
    pub sport: String,
    pub league_id: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub league_name: Option<String>,
    #[serde(default)]
    pub league_logo: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendDayPlan {
    pub date: String,
    #[serde(default)]
    pub leagues: Vec<BackendLeague>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerLeague {
    pub sport: SportType,
    pub league_id: String,
    pub country_code: String,
    pub league_name: String,
    pub league_logo: Option<String>,
    pub season: Option<String>,
}

/// Body of `POST /api/league-planner/league`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedLeagueInsert {
    pub date: String,
    pub sport: SportType,
    pub league_id: String,
    pub country_code: String,
    pub league_name: String,
    pub league_logo: Option<String>,
    pub season: Option<String>,
}

impl PlannedLeagueInsert {
    pub fn as_planner_league(&self) -> PlannerLeague {
        PlannerLeague {
            sport: self.sport,
            league_id: self.league_id.clone(),
            country_code: self.country_code.clone(),
            league_name: self.league_name.clone(),
            league_logo: self.league_logo.clone(),
            season: self.season.clone(),
        }
    }
}

/// One planner day: the leagues planned for it and a country → league picker.
#[derive(Debug, Clone, PartialEq)]
pub struct DayPlan {
    pub date: String,
    pub leagues: Vec<PlannerLeague>,
    pub country_code: Option<String>,
    pub league_id: Option<String>,
}

impl DayPlan {
    pub fn empty(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            leagues: Vec::new(),
            country_code: None,
            league_id: None,
        }
    }

    pub fn set_country(&mut self, code: &str) {
        let code = code.trim();
        self.country_code = (!code.is_empty()).then(|| code.to_string());
        self.league_id = None;
    }

    pub fn set_league(&mut self, league_id: &str) {
        let id = league_id.trim();
        self.league_id = (!id.is_empty()).then(|| id.to_string());
    }

    /// Insert request for the picked league, using `leagues` for name, logo and season.
    pub fn insert_for(&self, sport: SportType, leagues: &[LeagueOption]) -> Option<PlannedLeagueInsert> {
        let country_code = self.country_code.clone()?;
        let league_id = self.league_id.clone()?;
        let picked = leagues.iter().find(|l| l.id == league_id);

        Some(PlannedLeagueInsert {
            date: self.date.clone(),
            sport,
            league_name: picked
                .map(|l| l.name.clone())
                .unwrap_or_else(|| league_id.clone()),
            league_logo: picked
                .and_then(|l| l.logo.clone())
                .filter(|logo| logo.starts_with("http://") || logo.starts_with("https://")),
            season: picked.and_then(|l| l.latest_season.clone()),
            league_id,
            country_code,
        })
    }

    /// Adds the league, or refreshes name/logo/season when it is already planned.
    pub fn upsert_league(&mut self, league: PlannerLeague) {
        let existing = self.leagues.iter_mut().find(|l| {
            l.sport == league.sport
                && l.league_id == league.league_id
                && l.country_code == league.country_code
        });
        match existing {
            Some(row) => {
                row.league_name = league.league_name;
                row.league_logo = league.league_logo;
                row.season = league.season;
            }
            None => self.leagues.push(league),
        }
        self.league_id = None;
    }

    pub fn remove_league(&mut self, index: usize) -> Option<PlannerLeague> {
        (index < self.leagues.len()).then(|| self.leagues.remove(index))
    }

    /// Saves the picked league through `api`, then upserts it locally.
    /// `Ok(None)` when the picker is incomplete. The plan is untouched on error.
    pub fn add_picked<A: PlannerApi + ?Sized>(
        &mut self,
        sport: SportType,
        leagues: &[LeagueOption],
        api: &A,
    ) -> Result<Option<PlannerLeague>> {
        let Some(insert) = self.insert_for(sport, leagues) else {
            return Ok(None);
        };
        api.add_league(&insert)?;
        let league = insert.as_planner_league();
        self.upsert_league(league.clone());
        Ok(Some(league))
    }

    /// Deletes the league at `index` on the backend, then locally.
    pub fn remove_at<A: PlannerApi + ?Sized>(
        &mut self,
        index: usize,
        api: &A,
    ) -> Result<Option<PlannerLeague>> {
        let Some(league) = self.leagues.get(index) else {
            return Ok(None);
        };
        api.remove_league(&self.date, league)?;
        Ok(self.remove_league(index))
    }
}

/// `days` consecutive local dates starting today, stopping at the calendar's end.
pub fn date_range(today: NaiveDate, days: u32) -> Vec<String> {
    (0..days)
        .map_while(|i| today.checked_add_days(Days::new(u64::from(i))))
        .map(format_day)
        .collect()
}

/// Lays backend plans onto the date grid; days the backend skipped stay empty.
pub fn build_day_plans(dates: &[String], backend: Vec<BackendDayPlan>) -> Vec<DayPlan> {
    dates
        .iter()
        .map(|date| {
            let mut plan = DayPlan::empty(date.clone());
            if let Some(day) = backend.iter().find(|d| d.date == *date) {
                plan.leagues = day.leagues.iter().map(planner_league).collect();
            }
            plan
        })
        .collect()
}

fn planner_league(l: &BackendLeague) -> PlannerLeague {
    PlannerLeague {
        sport: SportType::parse(&l.sport).unwrap_or_default(),
        league_id: l.league_id.clone(),
        country_code: l.country_code.to_ascii_uppercase(),
        league_name: l
            .league_name
            .clone()
            .unwrap_or_else(|| l.league_id.clone()),
        league_logo: l.league_logo.clone(),
        season: l.season.clone(),
    }
}

pub fn parse_day_plans_json(raw: &str) -> Result<Vec<BackendDayPlan>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed).context("invalid league planner json")
}

/// `"Danas • 08.12. (ponedjeljak)"` for the first day, `"09.12. (utorak)"` after.
pub fn date_label(date: &str, index: usize) -> String {
    let Ok(d) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
        return date.to_string();
    };
    let base = format!(
        "{:02}.{:02}. ({})",
        d.day(),
        d.month(),
        croatian_weekday(d.weekday())
    );
    if index == 0 {
        format!("Danas • {base}")
    } else {
        base
    }
}

fn croatian_weekday(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "ponedjeljak",
        Weekday::Tue => "utorak",
        Weekday::Wed => "srijeda",
        Weekday::Thu => "četvrtak",
        Weekday::Fri => "petak",
        Weekday::Sat => "subota",
        Weekday::Sun => "nedjelja",
    }
}
