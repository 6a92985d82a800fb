use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use jack_tips::options::{
    SportType, parse_countries_json, parse_leagues_json, parse_markets_json, parse_matches_json,
};
use jack_tips::planner::{build_day_plans, date_label, date_range, parse_day_plans_json};
use jack_tips::tips::{RiskFilter, RiskLevel, filter_tips, kickoff_hhmm, parse_tips_json};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_countries_fixture() {
    let rows = parse_countries_json(&read_fixture("countries.json")).expect("fixture should parse");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].code, "HR");
    assert_eq!(rows[0].name, "Croatia");
    assert!(rows[0].flag.is_some());
    assert!(rows[1].flag.is_none());
}

#[test]
fn parses_leagues_with_numeric_ids() {
    let rows = parse_leagues_json(&read_fixture("leagues.json")).expect("fixture should parse");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, "210");
    assert_eq!(rows[0].kind.as_deref(), Some("League"));
    assert_eq!(rows[0].latest_season.as_deref(), Some("2026"));
    assert_eq!(rows[1].id, "211");
    assert!(rows[1].logo.is_none());
    assert!(rows[1].latest_season.is_none());
}

#[test]
fn parses_matches_into_labelled_options() {
    let rows = parse_matches_json(&read_fixture("matches.json")).expect("fixture should parse");
    assert_eq!(rows.len(), 1);
    let m = &rows[0];
    assert_eq!(m.id, "990001");
    assert_eq!(m.label, "Dinamo Zagreb – Hajduk Split");
    assert_eq!(m.league_id, "210");
    assert_eq!(m.home_id.as_deref(), Some("620"));
    assert_eq!(m.away_id.as_deref(), Some("561"));
    assert_eq!(m.season_id.as_deref(), Some("2026"));
    assert!(m.away_logo.is_none());
    assert_eq!(
        m.team_names(),
        ("Dinamo Zagreb".to_string(), "Hajduk Split".to_string())
    );
}

#[test]
fn parses_bet_types_in_backend_order() {
    let rows = parse_markets_json(&read_fixture("bet_types.json")).expect("fixture should parse");
    let codes: Vec<&str> = rows.iter().map(|m| m.code.as_str()).collect();
    assert_eq!(codes, vec!["1", "X", "2", "OVER_2_5"]);
    assert_eq!(rows[1].odds, 3.4);
    assert_eq!(rows[3].odds, 1.85);
}

#[test]
fn bet_types_must_be_an_object() {
    assert!(parse_markets_json("[1, 2]").is_err());
    assert!(parse_markets_json("null").expect("null should parse").is_empty());
}

#[test]
fn null_and_empty_bodies_are_empty_lists() {
    assert!(parse_countries_json("null").expect("null should parse").is_empty());
    assert!(parse_leagues_json("").expect("empty should parse").is_empty());
    assert!(parse_matches_json("  null ").expect("null should parse").is_empty());
    assert!(parse_tips_json("null").expect("null should parse").is_empty());
    assert!(parse_day_plans_json("").expect("empty should parse").is_empty());
}

#[test]
fn malformed_bodies_are_errors() {
    assert!(parse_countries_json("{").is_err());
    assert!(parse_matches_json(r#"[{"matchId": true}]"#).is_err());
}

#[test]
fn parses_tips_fixture() {
    let tips = parse_tips_json(&read_fixture("tips.json")).expect("fixture should parse");
    assert_eq!(tips.len(), 2);
    assert_eq!(tips[0].match_label, "Dinamo Zagreb vs. Hajduk Split");
    assert_eq!(tips[0].risk, RiskLevel::Low);
    assert_eq!(tips[0].kickoff, "18:30");
    assert_eq!(tips[0].confidence, 72);
    assert_eq!(tips[1].confidence, 100);
    assert_eq!(tips[1].kickoff, "");
    assert_eq!(tips[1].season.as_deref(), Some("2026"));

    let high = filter_tips(&tips, RiskFilter::parse("high"));
    assert_eq!(high.len(), 1);
    assert_eq!(high[0].id, 2);
    assert_eq!(filter_tips(&tips, RiskFilter::parse("")).len(), 2);
}

#[test]
fn kickoff_without_offset_is_wall_clock() {
    assert_eq!(kickoff_hhmm("2026-10-19T07:05"), "07:05");
    assert_eq!(kickoff_hhmm("2026-10-19 21:00:00"), "21:00");
    assert_eq!(kickoff_hhmm("soon"), "");
}

#[test]
fn day_plans_fill_the_date_grid() {
    let today = NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date");
    let dates = date_range(today, 3);
    assert_eq!(dates, vec!["2026-10-19", "2026-10-20", "2026-10-21"]);

    let backend =
        parse_day_plans_json(&read_fixture("league_planner.json")).expect("fixture should parse");
    let plans = build_day_plans(&dates, backend);
    assert_eq!(plans.len(), 3);
    assert!(plans[0].leagues.is_empty());
    assert!(plans[2].leagues.is_empty());

    let day = &plans[1];
    assert_eq!(day.leagues.len(), 2);
    assert_eq!(day.leagues[0].country_code, "HR");
    assert_eq!(day.leagues[0].sport, SportType::Football);
    assert_eq!(day.leagues[1].sport, SportType::Football);
    assert_eq!(day.leagues[1].league_name, "39");
}

#[test]
fn date_labels_are_croatian() {
    assert_eq!(date_label("2026-10-19", 0), "Danas • 19.10. (ponedjeljak)");
    assert_eq!(date_label("2026-10-22", 3), "22.10. (četvrtak)");
    assert_eq!(date_label("garbage", 1), "garbage");
}
