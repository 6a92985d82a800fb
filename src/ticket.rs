use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::options::{LeagueOption, MarketOption, MatchOption, SportType};
use crate::selection::SelectionState;

/// One match + market + odds entry on a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketLeg {
    pub id: String,
    pub sport: SportType,

    pub match_id: String,
    pub match_label: String,
    pub market_code: String,
    pub market_label: String,
    pub odds: f64,

    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub league_id: Option<String>,
    #[serde(default)]
    pub league_name: Option<String>,
    #[serde(default)]
    pub league_logo: Option<String>,
    #[serde(default)]
    pub home_logo: Option<String>,
    #[serde(default)]
    pub away_logo: Option<String>,
    #[serde(default)]
    pub home_name: Option<String>,
    #[serde(default)]
    pub away_name: Option<String>,
    #[serde(default)]
    pub home_id: Option<String>,
    #[serde(default)]
    pub away_id: Option<String>,
    #[serde(default)]
    pub season: Option<String>,

    // Filled in by the guillotine scan.
    #[serde(default)]
    pub new_market_label: Option<String>,
    #[serde(default)]
    pub new_odds: Option<f64>,
    #[serde(default)]
    pub explanation_of_change: Option<String>,
}

impl TicketLeg {
    pub fn from_selection(
        state: &SelectionState,
        league: Option<&LeagueOption>,
        fixture: &MatchOption,
        market: &MarketOption,
    ) -> Self {
        let (home_name, away_name) = fixture.team_names();
        let league_name = if fixture.league_name.is_empty() {
            league.map(|l| l.name.clone())
        } else {
            Some(fixture.league_name.clone())
        };

        TicketLeg {
            id: generate_leg_id(),
            sport: state.sport,
            match_id: fixture.id.clone(),
            match_label: fixture.label.clone(),
            // Market codes double as display labels.
            market_code: market.code.clone(),
            market_label: market.code.clone(),
            odds: state.odds.unwrap_or(market.odds),
            timestamp: Some(fixture.timestamp),
            league_id: state.league_id.clone().or_else(|| league.map(|l| l.id.clone())),
            league_name,
            league_logo: fixture
                .league_logo
                .clone()
                .or_else(|| league.and_then(|l| l.logo.clone())),
            home_logo: fixture.home_logo.clone(),
            away_logo: fixture.away_logo.clone(),
            home_name: Some(home_name),
            away_name: Some(away_name),
            home_id: fixture.home_id.clone(),
            away_id: fixture.away_id.clone(),
            season: fixture
                .season_id
                .clone()
                .or_else(|| league.and_then(|l| l.latest_season.clone())),
            new_market_label: None,
            new_odds: None,
            explanation_of_change: None,
        }
    }

    pub fn label_changed(&self) -> bool {
        self.new_market_label
            .as_deref()
            .is_some_and(|l| !l.trim().is_empty() && l != self.market_label)
    }

    pub fn odds_changed(&self) -> bool {
        self.new_odds
            .is_some_and(|o| o.is_finite() && o != self.odds)
    }

    pub fn final_label(&self) -> &str {
        self.new_market_label.as_deref().unwrap_or(&self.market_label)
    }

    pub fn final_odds(&self) -> f64 {
        self.new_odds.unwrap_or(self.odds)
    }
}

/// Time-prefixed random id, unique enough for a client-side ticket.
pub fn generate_leg_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let salt: u64 = rand::thread_rng().r#gen();
    format!("{millis}-{salt:016x}")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub legs: Vec<TicketLeg>,
}

impl Ticket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, leg: TicketLeg) {
        self.legs.push(leg);
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.legs.len();
        self.legs.retain(|l| l.id != id);
        self.legs.len() != before
    }

    pub fn clear(&mut self) {
        self.legs.clear();
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn total_odds(&self) -> f64 {
        self.legs.iter().map(|l| l.odds).product()
    }

    pub fn submission(&self) -> TicketSubmission {
        TicketSubmission {
            pairs: self.legs.iter().map(SubmittedLeg::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketSubmission {
    pub pairs: Vec<SubmittedLeg>,
}

/// Wire shape of a leg sent for analysis; optional fields go out as `null`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedLeg {
    pub sport: SportType,
    pub match_id: String,
    pub match_label: String,
    pub market_code: String,
    pub market_label: String,
    pub odds: f64,
    pub timestamp: Option<i64>,
    pub league_id: Option<String>,
    pub league_name: Option<String>,
    pub league_logo: Option<String>,
    pub home_logo: Option<String>,
    pub away_logo: Option<String>,
    pub home_name: Option<String>,
    pub away_name: Option<String>,
    pub home_id: Option<String>,
    pub away_id: Option<String>,
    pub season: Option<String>,
}

impl From<&TicketLeg> for SubmittedLeg {
    fn from(l: &TicketLeg) -> Self {
        SubmittedLeg {
            sport: l.sport,
            match_id: l.match_id.clone(),
            match_label: l.match_label.clone(),
            market_code: l.market_code.clone(),
            market_label: l.market_label.clone(),
            odds: l.odds,
            timestamp: l.timestamp,
            league_id: l.league_id.clone(),
            league_name: l.league_name.clone(),
            league_logo: l.league_logo.clone(),
            home_logo: l.home_logo.clone(),
            away_logo: l.away_logo.clone(),
            home_name: l.home_name.clone(),
            away_name: l.away_name.clone(),
            home_id: l.home_id.clone(),
            away_id: l.away_id.clone(),
            season: l.season.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketScanResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub original_total_odds: Option<f64>,
    #[serde(default)]
    pub adjusted_total_odds: Option<f64>,
    #[serde(default)]
    pub pairs: Option<Vec<TicketLeg>>,
}

/// Guillotine analysis result as kept on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub scanned_pairs: Vec<TicketLeg>,
    pub original_total_odds: Option<f64>,
    pub adjusted_total_odds: Option<f64>,
}

impl ScanResult {
    /// `None` when the backend returned no legs (plain acknowledgement).
    pub fn from_response(resp: TicketScanResponse, local_total: f64) -> Option<Self> {
        let original = resp.original_total_odds.unwrap_or(local_total);
        let adjusted = resp
            .adjusted_total_odds
            .or(resp.original_total_odds)
            .unwrap_or(local_total);
        let scanned = resp.pairs.filter(|p| !p.is_empty())?;
        Some(ScanResult {
            scanned_pairs: scanned,
            original_total_odds: Some(original),
            adjusted_total_odds: Some(adjusted),
        })
    }

    /// A scan describes one ticket; adding or removing legs invalidates it.
    pub fn is_stale_for(&self, ticket: &Ticket) -> bool {
        self.scanned_pairs.len() != ticket.len()
    }

    pub fn changed_legs(&self) -> impl Iterator<Item = &TicketLeg> {
        self.scanned_pairs
            .iter()
            .filter(|l| l.label_changed() || l.odds_changed())
    }
}
