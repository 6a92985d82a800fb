use std::collections::{HashMap, VecDeque};

use chrono::{Days, Local, NaiveDate};

use crate::options::{
    CountryOption, LeagueOption, MarketOption, MatchOption, OptionList, SportType,
};
use crate::ticket::TicketLeg;

const COUNTRIES_KEY: &str = "countries";
const MAX_LOGS: usize = 200;

/// Nodes whose options come from the fetch collaborator, root to leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    Country,
    League,
    Match,
    Market,
}

impl Node {
    pub const ALL: [Node; 4] = [Node::Country, Node::League, Node::Match, Node::Market];

    pub fn label(self) -> &'static str {
        match self {
            Node::Country => "countries",
            Node::League => "leagues",
            Node::Match => "matches",
            Node::Market => "markets",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchParams {
    Countries,
    Leagues {
        sport: SportType,
        /// Country code, or the country name for sports whose backend keys leagues by name.
        country: String,
    },
    Matches {
        sport: SportType,
        league_id: String,
        season: String,
        date_from: String,
        date_to: String,
    },
    Markets {
        sport: SportType,
        match_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub node: Node,
    pub key: String,
    pub generation: u64,
    pub params: FetchParams,
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub node: Node,
    pub key: String,
    pub generation: u64,
    pub result: Result<OptionList, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyResult {
    Accepted,
    Failed,
    /// A newer request for the same key was issued after this one.
    Superseded,
    /// The selection moved away from this key while the request was in flight.
    Stale,
}

/// Option lists by composite key. Entries live for the whole session.
#[derive(Debug, Clone, Default)]
pub struct OptionCache {
    entries: HashMap<String, OptionList>,
}

impl OptionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&OptionList> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, list: OptionList) {
        self.entries.insert(key.into(), list);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub sport: SportType,
    pub country_code: Option<String>,
    pub league_id: Option<String>,
    pub day_offset: u32,
    pub match_id: Option<String>,
    pub market_code: Option<String>,
    pub odds: Option<f64>,
}

pub fn format_day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Local calendar date `offset` days from `today`, as `YYYY-MM-DD`.
/// `None` past the end of the representable calendar.
pub fn day_from_offset(today: NaiveDate, offset: u32) -> Option<String> {
    today
        .checked_add_days(Days::new(u64::from(offset)))
        .map(format_day)
}

/// Basketball leagues are looked up by country name when the name is known.
pub fn league_country_param(sport: SportType, code: &str, countries: &[CountryOption]) -> String {
    if sport != SportType::Basketball {
        return code.to_string();
    }
    countries
        .iter()
        .find(|c| c.code == code)
        .map(|c| c.name.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| code.to_string())
}

pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub struct SelectionController {
    state: SelectionState,
    today: NaiveDate,
    cache: OptionCache,
    in_flight: HashMap<String, u64>,
    failed: HashMap<Node, (String, String)>,
    next_generation: u64,
    outbox: Vec<FetchRequest>,
    pub logs: VecDeque<String>,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionController {
    pub fn new() -> Self {
        Self::with_today(local_today())
    }

    pub fn with_today(today: NaiveDate) -> Self {
        let mut controller = Self {
            state: SelectionState::default(),
            today,
            cache: OptionCache::new(),
            in_flight: HashMap::new(),
            failed: HashMap::new(),
            next_generation: 0,
            outbox: Vec::new(),
            logs: VecDeque::new(),
        };
        controller.sync();
        controller
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn cache(&self) -> &OptionCache {
        &self.cache
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Requests issued since the last call; the caller forwards them to the fetcher.
    pub fn take_requests(&mut self) -> Vec<FetchRequest> {
        std::mem::take(&mut self.outbox)
    }

    pub fn set_sport(&mut self, sport: SportType) {
        self.state.sport = sport;
        self.clear_below_sport();
        self.sync();
    }

    pub fn set_country(&mut self, code: &str) {
        self.state.country_code = non_empty(code);
        self.clear_below(Node::Country);
        self.sync();
    }

    pub fn set_league(&mut self, league_id: &str) {
        self.state.league_id = non_empty(league_id);
        self.clear_below(Node::League);
        self.sync();
    }

    pub fn set_day_offset(&mut self, offset: u32) {
        self.state.day_offset = offset;
        self.clear_below_day();
        self.sync();
    }

    /// Moves "today" (e.g. after midnight); the match day shifts with it.
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
        self.clear_below_day();
        self.sync();
    }

    pub fn set_match(&mut self, match_id: &str) {
        self.state.match_id = non_empty(match_id);
        self.clear_below(Node::Match);
        self.sync();
    }

    pub fn set_market(&mut self, code: &str) {
        self.state.market_code = non_empty(code);
        self.state.odds = self.market_odds();
    }

    /// Back to a blank form. Cached option lists are kept.
    pub fn reset(&mut self) {
        self.state = SelectionState::default();
        self.failed.clear();
        self.sync();
    }

    /// Clears a recorded failure on `node` so its live key is fetched again.
    pub fn retry(&mut self, node: Node) {
        self.failed.remove(&node);
        self.sync();
    }

    fn clear_below_sport(&mut self) {
        self.state.country_code = None;
        self.state.league_id = None;
        self.state.match_id = None;
        self.state.market_code = None;
        self.state.odds = None;
        self.failed.clear();
    }

    fn clear_below(&mut self, node: Node) {
        if node < Node::League {
            self.state.league_id = None;
        }
        if node < Node::Match {
            self.state.match_id = None;
        }
        if node < Node::Market {
            self.state.market_code = None;
            self.state.odds = None;
        }
        self.failed.retain(|n, _| *n <= node);
    }

    fn clear_below_day(&mut self) {
        self.state.match_id = None;
        self.state.market_code = None;
        self.state.odds = None;
        self.failed.retain(|n, _| *n < Node::Match);
    }

    pub fn date_from(&self) -> Option<String> {
        day_from_offset(self.today, self.state.day_offset)
    }

    pub fn date_to(&self) -> Option<String> {
        self.date_from()
    }

    /// Cache key for `node` under the current selection, if fully determined.
    pub fn live_key(&self, node: Node) -> Option<String> {
        let sport = self.state.sport.sport_id();
        match node {
            Node::Country => Some(COUNTRIES_KEY.to_string()),
            Node::League => {
                let country = self.state.country_code.as_deref()?;
                Some(format!("{sport}_{country}"))
            }
            Node::Match => {
                let league = self.state.league_id.as_deref()?;
                let season = self.selected_season()?;
                let from = self.date_from()?;
                let to = self.date_to()?;
                Some(format!("{sport}_{league}_{season}_{from}_{to}"))
            }
            Node::Market => {
                let match_id = self.state.match_id.as_deref()?;
                Some(format!("{sport}_{match_id}"))
            }
        }
    }

    fn params_for(&self, node: Node) -> Option<FetchParams> {
        let sport = self.state.sport;
        match node {
            Node::Country => Some(FetchParams::Countries),
            Node::League => {
                let code = self.state.country_code.clone()?;
                Some(FetchParams::Leagues {
                    sport,
                    country: league_country_param(sport, &code, self.countries()),
                })
            }
            Node::Match => Some(FetchParams::Matches {
                sport,
                league_id: self.state.league_id.clone()?,
                season: self.selected_season()?,
                date_from: self.date_from()?,
                date_to: self.date_to()?,
            }),
            Node::Market => Some(FetchParams::Markets {
                sport,
                match_id: self.state.match_id.clone()?,
            }),
        }
    }


    fn selected_season(&self) -> Option<String> {
        self.selected_league()?
            .latest_season
            .as_deref()
            .and_then(non_empty)
    }

    fn sync(&mut self) {
        for node in Node::ALL {
            let Some(key) = self.live_key(node) else {
                continue;
            };
            if self.cache.contains(&key) || self.in_flight.contains_key(&key) {
                continue;
            }
            if self
                .failed
                .get(&node)
                .is_some_and(|(failed_key, _)| *failed_key == key)
            {
                continue;
            }
            let Some(params) = self.params_for(node) else {
                continue;
            };
            self.next_generation += 1;
            let generation = self.next_generation;
            self.in_flight.insert(key.clone(), generation);
            self.outbox.push(FetchRequest {
                node,
                key,
                generation,
                params,
            });
        }
    }

    pub fn apply_outcome(&mut self, outcome: FetchOutcome) -> ApplyResult {
        let FetchOutcome {
            node,
            key,
            generation,
            result,
        } = outcome;

        if self.in_flight.get(&key) != Some(&generation) {
            return ApplyResult::Superseded;
        }
        self.in_flight.remove(&key);

        if self.live_key(node).as_deref() != Some(key.as_str()) {
            self.push_log(format!("[INFO] Dropped stale {} for {key}", node.label()));
            self.sync();
            return ApplyResult::Stale;
        }

        let applied = match result {
            Ok(list) if list_matches_node(&list, node) => {
                self.push_log(format!(
                    "[INFO] Loaded {} {} for {key}",
                    list.len(),
                    node.label()
                ));
                self.cache.insert(key, list);
                self.failed.remove(&node);
                if node == Node::Market && self.state.odds.is_none() {
                    self.state.odds = self.market_odds();
                }
                ApplyResult::Accepted
            }
            Ok(_) => {
                let msg = format!("unexpected option list for {}", node.label());
                self.push_log(format!("[WARN] {msg}"));
                self.failed.insert(node, (key, msg));
                ApplyResult::Failed
            }
            Err(msg) => {
                self.push_log(format!("[WARN] Fetch {} failed: {msg}", node.label()));
                self.failed.insert(node, (key, msg));
                ApplyResult::Failed
            }
        };
        self.sync();
        applied
    }

    pub fn is_loading(&self, node: Node) -> bool {
        self.live_key(node)
            .is_some_and(|key| self.in_flight.contains_key(&key))
    }

    pub fn error(&self, node: Node) -> Option<&str> {
        let key = self.live_key(node)?;
        self.failed
            .get(&node)
            .filter(|(failed_key, _)| *failed_key == key)
            .map(|(_, msg)| msg.as_str())
    }

    fn live_list(&self, node: Node) -> Option<&OptionList> {
        self.live_key(node).and_then(|key| self.cache.get(&key))
    }

    pub fn countries(&self) -> &[CountryOption] {
        match self.cache.get(COUNTRIES_KEY) {
            Some(OptionList::Countries(v)) => v,
            _ => &[],
        }
    }

    pub fn leagues(&self) -> &[LeagueOption] {
        match self.live_list(Node::League) {
            Some(OptionList::Leagues(v)) => v,
            _ => &[],
        }
    }

    pub fn matches(&self) -> &[MatchOption] {
        match self.live_list(Node::Match) {
            Some(OptionList::Matches(v)) => v,
            _ => &[],
        }
    }

    pub fn markets(&self) -> &[MarketOption] {
        match self.live_list(Node::Market) {
            Some(OptionList::Markets(v)) => v,
            _ => &[],
        }
    }

    pub fn selected_league(&self) -> Option<&LeagueOption> {
        let id = self.state.league_id.as_deref()?;
        self.leagues().iter().find(|l| l.id == id)
    }

    pub fn selected_match(&self) -> Option<&MatchOption> {
        let id = self.state.match_id.as_deref()?;
        self.matches().iter().find(|m| m.id == id)
    }

    pub fn selected_market(&self) -> Option<&MarketOption> {
        let code = self.state.market_code.as_deref()?;
        self.markets().iter().find(|m| m.code == code)
    }

    fn market_odds(&self) -> Option<f64> {
        self.selected_market().map(|m| m.odds)
    }

    pub fn can_submit(&self) -> bool {
        let s = &self.state;
        s.country_code.is_some()
            && s.league_id.is_some()
            && s.match_id.is_some()
            && s.market_code.is_some()
            && s.odds.is_some()
    }

    /// The ticket leg the current selection describes, once it can be submitted.
    pub fn resolve_leg(&self) -> Option<TicketLeg> {
        if !self.can_submit() {
            return None;
        }
        let fixture = self.selected_match()?;
        let market = self.selected_market()?;
        Some(TicketLeg::from_selection(
            &self.state,
            self.selected_league(),
            fixture,
            market,
        ))
    }
}

fn list_matches_node(list: &OptionList, node: Node) -> bool {
    matches!(
        (list, node),
        (OptionList::Countries(_), Node::Country)
            | (OptionList::Leagues(_), Node::League)
            | (OptionList::Matches(_), Node::Match)
            | (OptionList::Markets(_), Node::Market)
    )
}
