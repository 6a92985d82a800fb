use anyhow::{Context, Result, anyhow};
use reqwest::blocking::{Client, RequestBuilder};

use crate::config::Config;
use crate::http_client::http_client;
use crate::options::{
    OptionList, parse_countries_json, parse_leagues_json, parse_markets_json, parse_matches_json,
};
use crate::planner::{BackendDayPlan, PlannedLeagueInsert, PlannerLeague, parse_day_plans_json};
use crate::selection::FetchParams;
use crate::session::{LoginRequest, LoginResponse};
use crate::ticket::{Ticket, TicketScanResponse};
use crate::tips::{RiskFilter, Tip, parse_tips_json};

/// Source of option lists for the selection chain.
pub trait OptionsFetcher: Send + Sync {
    fn fetch(&self, params: &FetchParams) -> Result<OptionList>;
}

/// Backend half of the league planner's add and remove actions.
pub trait PlannerApi {
    fn add_league(&self, insert: &PlannedLeagueInsert) -> Result<()>;
    fn remove_league(&self, date: &str, league: &PlannerLeague) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct Backend {
    config: Config,
}

impl Backend {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn client(&self) -> Result<&'static Client> {
        http_client(self.config.request_timeout_secs)
    }

    fn get(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self.client()?.get(self.config.endpoint(path)))
    }

    pub fn submit_ticket(&self, ticket: &Ticket) -> Result<TicketScanResponse> {
        let req = self
            .client()?
            .post(self.config.endpoint("/api/natjecanja/tickets"))
            .json(&ticket.submission());
        let body = send_text(req).context("ticket submission failed")?;
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(TicketScanResponse::default());
        }
        serde_json::from_str(trimmed).context("invalid ticket scan json")
    }

    pub fn fetch_tips(&self, dates: &[String], risk: RiskFilter) -> Result<Vec<Tip>> {
        let mut query: Vec<(&str, String)> =
            dates.iter().map(|d| ("dates", d.clone())).collect();
        if let Some(level) = risk.level() {
            query.push(("risk", level.code().to_string()));
        }
        query.push(("sport", "nogomet".to_string()));

        let body = send_text(self.get("/api/tipovi")?.query(&query)).context("tips request failed")?;
        parse_tips_json(&body)
    }

    pub fn fetch_day_plans(&self, from: &str, to: &str) -> Result<Vec<BackendDayPlan>> {
        let req = self.get("/api/league-planner")?.query(&[("from", from), ("to", to)]);
        let body = send_text(req).context("league planner request failed")?;
        parse_day_plans_json(&body)
    }

    pub fn login(&self, username_or_email: &str, password: &str) -> Result<LoginResponse> {
        let req = self
            .client()?
            .post(self.config.endpoint("/api/auth/login"))
            .json(&LoginRequest {
                username_or_email,
                password,
            });
        let body = send_text(req).context("login failed")?;
        serde_json::from_str(body.trim()).context("invalid login json")
    }
}

impl PlannerApi for Backend {
    fn add_league(&self, insert: &PlannedLeagueInsert) -> Result<()> {
        let req = self
            .client()?
            .post(self.config.endpoint("/api/league-planner/league"))
            .json(insert);
        send_text(req).context("adding planned league failed")?;
        Ok(())
    }

    fn remove_league(&self, date: &str, league: &PlannerLeague) -> Result<()> {
        let req = self
            .client()?
            .delete(self.config.endpoint("/api/league-planner/league"))
            .query(&[
                ("date", date),
                ("sport", league.sport.code()),
                ("leagueId", league.league_id.as_str()),
                ("countryCode", league.country_code.as_str()),
            ]);
        send_text(req).context("removing planned league failed")?;
        Ok(())
    }
}

impl OptionsFetcher for Backend {
    fn fetch(&self, params: &FetchParams) -> Result<OptionList> {
        match params {
            FetchParams::Countries => {
                let body = send_text(self.get("/api/natjecanja/countries")?)
                    .context("countries request failed")?;
                Ok(OptionList::Countries(parse_countries_json(&body)?))
            }
            FetchParams::Leagues { sport, country } => {
                let req = self.get("/api/natjecanja/leagues")?.query(&[
                    ("countryCode", country.as_str()),
                    ("sportId", sport.sport_id()),
                ]);
                let body = send_text(req).context("leagues request failed")?;
                Ok(OptionList::Leagues(parse_leagues_json(&body)?))
            }
            FetchParams::Matches {
                sport,
                league_id,
                season,
                date_from,
                date_to,
            } => {
                let req = self.get("/api/natjecanja/natjecanja")?.query(&[
                    ("sport", sport.sport_id()),
                    ("leagueId", league_id.as_str()),
                    ("season", season.as_str()),
                    ("dateFrom", date_from.as_str()),
                    ("dateTo", date_to.as_str()),
                ]);
                let body = send_text(req).context("matches request failed")?;
                Ok(OptionList::Matches(parse_matches_json(&body)?))
            }
            FetchParams::Markets { sport, match_id } => {
                let req = self
                    .get("/api/natjecanja/bet-types")?
                    .query(&[("matchId", match_id.as_str()), ("sport", sport.code())]);
                let body = send_text(req).context("bet types request failed")?;
                Ok(OptionList::Markets(parse_markets_json(&body)?))
            }
        }
    }
}

fn send_text(req: RequestBuilder) -> Result<String> {
    let resp = req.send().context("request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow!("http {}: {}", status, body));
    }
    Ok(body)
}
