use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use jack_tips::backend::{Backend, OptionsFetcher};
use jack_tips::config::Config;
use jack_tips::feed::Feed;
use jack_tips::options::{LeagueOption, OptionList, SportType};
use jack_tips::planner::{DayPlan, PLAN_DAYS, build_day_plans, date_label, date_range};
use jack_tips::selection::{FetchParams, Node, SelectionController, league_country_param};
use jack_tips::session::AuthSession;
use jack_tips::storage::{KvStore, PreferredHome};
use jack_tips::ticket::{ScanResult, Ticket};
use jack_tips::tips::{RiskFilter, filter_tips};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(15);
const LIST_LIMIT: usize = 12;

struct App {
    backend: Backend,
    store: KvStore,
    feed: Feed,
    selection: SelectionController,
    ticket: Ticket,
    scan: Option<ScanResult>,
    session: AuthSession,
    should_quit: bool,
}

impl App {
    fn new(config: Config) -> Result<Self> {
        let store = match config.storage_path() {
            Some(path) => KvStore::open(&path)?,
            None => KvStore::open_in_memory()?,
        };
        let backend = Backend::new(config);
        let feed = Feed::start(Arc::new(backend.clone()));
        let ticket = store.load_ticket();
        let scan = store.load_scan().filter(|scan| !scan.is_stale_for(&ticket));
        let session = AuthSession::restore(&store)?;
        Ok(Self {
            backend,
            store,
            feed,
            selection: SelectionController::new(),
            ticket,
            scan,
            session,
            should_quit: false,
        })
    }

    fn on_line(&mut self, line: &str) -> Result<()> {
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else {
            return Ok(());
        };
        let arg = parts.collect::<Vec<_>>().join(" ");

        match cmd {
            "q" | "quit" | "exit" => self.should_quit = true,
            "sport" => match SportType::parse(&arg) {
                Some(sport) => self.selection.set_sport(sport),
                None => println!("unknown sport: {arg}"),
            },
            "country" => self.selection.set_country(&arg),
            "league" => self.selection.set_league(&arg),
            "day" => match arg.parse::<u32>() {
                Ok(offset) => self.selection.set_day_offset(offset),
                Err(_) => println!("day expects an offset such as 0, 1 or 2"),
            },
            "match" => self.selection.set_match(&arg),
            "market" => self.selection.set_market(&arg),
            "retry" => {
                for node in Node::ALL {
                    if self.selection.error(node).is_some() {
                        self.selection.retry(node);
                    }
                }
            }
            "show" => {}
            "add" => self.add_leg()?,
            "remove" => {
                if self.ticket.remove(&arg) {
                    self.ticket_changed()?;
                } else {
                    println!("no leg with id {arg}");
                }
            }
            "ticket" => {
                print_ticket(&self.ticket, self.scan.as_ref());
                return Ok(());
            }
            "clear" => {
                self.ticket.clear();
                self.ticket_changed()?;
            }
            "clearscan" => {
                self.scan = None;
                self.store.clear_scan()?;
                println!("analysis cleared");
                return Ok(());
            }
            "submit" => {
                self.submit()?;
                return Ok(());
            }
            "tips" => {
                self.show_tips(&arg)?;
                return Ok(());
            }
            "plan" => {
                self.on_plan(&arg)?;
                return Ok(());
            }
            "login" => {
                self.login(&arg)?;
                return Ok(());
            }
            "home" => {
                match arg.as_str() {
                    "tips" => self.store.set_preferred_home(PreferredHome::Tips)?,
                    "lotto" | "loto" => self.store.set_preferred_home(PreferredHome::Lotto)?,
                    _ => {}
                }
                println!("home: {}", self.store.preferred_home().path());
                return Ok(());
            }
            "whoami" => {
                match &self.session.user {
                    Some(user) if self.session.is_authenticated() => println!(
                        "{} ({} {}){}",
                        user.username,
                        user.first_name,
                        user.last_name,
                        if self.session.is_admin() { " admin" } else { "" }
                    ),
                    _ => println!("not logged in"),
                }
                return Ok(());
            }
            "logout" => {
                self.session.logout(&self.store)?;
                println!("logged out");
                return Ok(());
            }
            "logs" => {
                for line in &self.selection.logs {
                    println!("{line}");
                }
                return Ok(());
            }
            _ => {
                print_help();
                return Ok(());
            }
        }

        self.feed.settle(&mut self.selection, SETTLE_TIMEOUT);
        if !self.should_quit {
            print_selection(&self.selection);
        }
        Ok(())
    }

    fn add_leg(&mut self) -> Result<()> {
        if self.scan.is_some() {
            println!("clear the analysed ticket before adding legs");
            return Ok(());
        }
        let Some(leg) = self.selection.resolve_leg() else {
            println!("selection is incomplete");
            return Ok(());
        };
        println!("added {} {} @ {:.2}", leg.match_label, leg.market_label, leg.odds);
        self.ticket.add(leg);
        self.selection.reset();
        self.ticket_changed()
    }

    fn ticket_changed(&mut self) -> Result<()> {
        self.store.save_ticket(&self.ticket)?;
        if self.scan.take().is_some() {
            self.store.clear_scan()?;
        }
        Ok(())
    }

    fn submit(&mut self) -> Result<()> {
        if self.ticket.is_empty() {
            println!("ticket is empty");
            return Ok(());
        }
        let resp = match self.backend.submit_ticket(&self.ticket) {
            Ok(resp) => resp,
            Err(err) => {
                eprintln!("[WARN] {err:#}");
                return Ok(());
            }
        };
        self.scan = ScanResult::from_response(resp, self.ticket.total_odds());
        match &self.scan {
            Some(scan) => self.store.save_scan(scan)?,
            None => {
                self.store.clear_scan()?;
                println!("ticket accepted without changes");
            }
        }
        print_ticket(&self.ticket, self.scan.as_ref());
        Ok(())
    }

    fn load_day_plans(&self) -> Result<Vec<DayPlan>> {
        let dates = date_range(self.selection.today(), PLAN_DAYS);
        let (Some(from), Some(to)) = (dates.first(), dates.last()) else {
            return Ok(Vec::new());
        };
        let backend = self.backend.fetch_day_plans(from, to)?;
        Ok(build_day_plans(&dates, backend))
    }

    fn on_plan(&self, arg: &str) -> Result<()> {
        let parts: Vec<&str> = arg.split_whitespace().collect();
        let mut plans = match self.load_day_plans() {
            Ok(plans) => plans,
            Err(err) => {
                eprintln!("[WARN] {err:#}");
                return Ok(());
            }
        };

        match parts.as_slice() {
            [] => {}
            ["add", day, country, league] => {
                let Some(plan) = day.parse::<usize>().ok().and_then(|i| plans.get_mut(i)) else {
                    println!("no planner day {day}");
                    return Ok(());
                };
                let sport = self.selection.state().sport;
                plan.set_country(country);
                plan.set_league(league);
                let leagues = self.planner_leagues(sport, country);
                match plan.add_picked(sport, &leagues, &self.backend) {
                    Ok(Some(added)) => println!("planned {} on {}", added.league_name, plan.date),
                    Ok(None) => println!("pick a country and a league"),
                    Err(err) => eprintln!("[WARN] {err:#}"),
                }
            }
            ["rm", day, index] => {
                let Some(plan) = day.parse::<usize>().ok().and_then(|i| plans.get_mut(i)) else {
                    println!("no planner day {day}");
                    return Ok(());
                };
                let Ok(index) = index.parse::<usize>() else {
                    println!("rm expects a league index");
                    return Ok(());
                };
                match plan.remove_at(index, &self.backend) {
                    Ok(Some(removed)) => println!("removed {} from {}", removed.league_name, plan.date),
                    Ok(None) => println!("no league {index} on {}", plan.date),
                    Err(err) => eprintln!("[WARN] {err:#}"),
                }
            }
            _ => {
                println!("plan [add <day> <country> <league> | rm <day> <index>]");
                return Ok(());
            }
        }

        print_plans(&plans);
        Ok(())
    }

    /// League options for the planner picker; empty when the lookup fails.
    fn planner_leagues(&self, sport: SportType, country: &str) -> Vec<LeagueOption> {
        let params = FetchParams::Leagues {
            sport,
            country: league_country_param(sport, country, self.selection.countries()),
        };
        match self.backend.fetch(&params) {
            Ok(OptionList::Leagues(leagues)) => leagues,
            Ok(_) => Vec::new(),
            Err(err) => {
                eprintln!("[WARN] {err:#}");
                Vec::new()
            }
        }
    }

    fn login(&mut self, arg: &str) -> Result<()> {
        let mut creds = arg.split_whitespace();
        let (Some(user), Some(password)) = (creds.next(), creds.next()) else {
            println!("login expects <username|email> <password>");
            return Ok(());
        };
        match self.backend.login(user, password) {
            Ok(resp) => {
                println!("logged in as {}", resp.user.username);
                self.session.login(&self.store, resp.user, resp.token)?;
            }
            Err(err) => eprintln!("[WARN] {err:#}"),
        }
        Ok(())
    }

    fn show_tips(&self, arg: &str) -> Result<()> {
        let filter = RiskFilter::parse(arg);
        let Some(day) = self.selection.date_from() else {
            println!("day offset is out of range");
            return Ok(());
        };
        match self.backend.fetch_tips(&[day], filter) {
            Ok(tips) => {
                for tip in filter_tips(&tips, filter) {
                    println!(
                        "[{}] {} {} | {} | {} @ {:.2} ({}%)",
                        tip.risk.code(),
                        tip.kickoff,
                        tip.league,
                        tip.match_label,
                        tip.market,
                        tip.odds,
                        tip.confidence
                    );
                }
            }
            Err(err) => eprintln!("[WARN] {err:#}"),
        }
        Ok(())
    }
}

fn print_selection(sel: &SelectionController) {
    let s = sel.state();
    println!(
        "sport={} country={} league={} day={} ({}) match={} market={} odds={}",
        s.sport,
        s.country_code.as_deref().unwrap_or("-"),
        s.league_id.as_deref().unwrap_or("-"),
        s.day_offset,
        sel.date_from().as_deref().unwrap_or("-"),
        s.match_id.as_deref().unwrap_or("-"),
        s.market_code.as_deref().unwrap_or("-"),
        s.odds.map(|o| format!("{o:.2}")).unwrap_or_else(|| "-".to_string()),
    );

    for node in Node::ALL {
        if let Some(err) = sel.error(node) {
            println!("  {}: error: {err}", node.label());
        } else if sel.is_loading(node) {
            println!("  {}: loading...", node.label());
        }
    }

    if s.country_code.is_none() {
        for c in sel.countries().iter().take(LIST_LIMIT) {
            println!("  {} {}", c.code, c.name);
        }
    } else if s.league_id.is_none() {
        for l in sel.leagues().iter().take(LIST_LIMIT) {
            println!("  {} {}", l.id, l.name);
        }
    } else if s.match_id.is_none() {
        for m in sel.matches().iter().take(LIST_LIMIT) {
            println!("  {} {}", m.id, m.label);
        }
    } else if s.market_code.is_none() {
        for m in sel.markets().iter().take(LIST_LIMIT) {
            println!("  {} @ {:.2}", m.code, m.odds);
        }
    }
    if sel.can_submit() {
        println!("  ready: type `add`");
    }
}

fn print_ticket(ticket: &Ticket, scan: Option<&ScanResult>) {
    for leg in &ticket.legs {
        println!("{} | {} | {} @ {:.2}", leg.id, leg.match_label, leg.market_label, leg.odds);
    }
    println!("total odds: {:.2}", ticket.total_odds());

    let Some(scan) = scan else {
        return;
    };
    println!(
        "guillotine: original {} -> adjusted {}",
        fmt_odds(scan.original_total_odds),
        fmt_odds(scan.adjusted_total_odds)
    );
    for leg in scan.changed_legs() {
        println!(
            "  {}: {} @ {:.2} -> {} @ {:.2}",
            leg.match_label,
            leg.market_label,
            leg.odds,
            leg.final_label(),
            leg.final_odds()
        );
        if let Some(why) = leg.explanation_of_change.as_deref() {
            println!("    {why}");
        }
    }
}

fn print_plans(plans: &[DayPlan]) {
    for (i, day) in plans.iter().enumerate() {
        println!("{i}: {}", date_label(&day.date, i));
        for (j, league) in day.leagues.iter().enumerate() {
            println!(
                "  [{j}] {} {} {} ({})",
                league.sport, league.country_code, league.league_name, league.league_id
            );
        }
    }
}

fn fmt_odds(odds: Option<f64>) -> String {
    odds.map(|o| format!("{o:.2}")).unwrap_or_else(|| "-".to_string())
}

fn print_help() {
    println!("commands: sport|country|league|day|match|market <value>, show, add, remove <id>,");
    println!("          ticket, clear, clearscan, submit, tips [LOW|MEDIUM|HIGH], retry, logs,");
    println!("          plan [add <day> <country> <league> | rm <day> <index>],");
    println!("          home [tips|lotto], login <user> <password>, whoami, logout, quit");
}

fn main() -> Result<()> {
    let config = Config::load();
    let mut app = App::new(config)?;

    app.feed.settle(&mut app.selection, SETTLE_TIMEOUT);
    print_help();
    print_selection(&app.selection);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        if let Err(err) = app.on_line(line?.trim()) {
            eprintln!("error: {err:#}");
        }
        if app.should_quit {
            break;
        }
    }
    Ok(())
}
