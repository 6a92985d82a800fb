use jack_tips::options::SportType;
use jack_tips::session::{AppUser, AuthSession, UserRole};
use jack_tips::storage::{KvStore, PreferredHome, SCAN_KEY, TICKET_KEY, USER_KEY};
use jack_tips::ticket::{ScanResult, Ticket, TicketLeg};

fn store() -> KvStore {
    KvStore::open_in_memory().expect("in-memory store opens")
}

fn leg(id: &str) -> TicketLeg {
    TicketLeg {
        id: id.to_string(),
        sport: SportType::Basketball,
        match_id: "77".to_string(),
        match_label: "Cedevita – Cibona".to_string(),
        market_code: "2".to_string(),
        market_label: "2".to_string(),
        odds: 1.7,
        timestamp: Some(1_792_425_600),
        league_id: Some("ABA".to_string()),
        league_name: None,
        league_logo: None,
        home_logo: None,
        away_logo: None,
        home_name: Some("Cedevita".to_string()),
        away_name: Some("Cibona".to_string()),
        home_id: None,
        away_id: None,
        season: None,
        new_market_label: None,
        new_odds: None,
        explanation_of_change: None,
    }
}

fn user(role: UserRole) -> AppUser {
    AppUser {
        id: 5,
        username: "jack".to_string(),
        email: "jack@example.com".to_string(),
        first_name: "Jack".to_string(),
        last_name: "Tipster".to_string(),
        role,
    }
}

#[test]
fn raw_values_upsert_and_remove() {
    let s = store();
    assert!(s.get_raw("k").expect("read works").is_none());
    s.set_raw("k", "one").expect("write works");
    s.set_raw("k", "two").expect("write works");
    assert_eq!(s.get_raw("k").expect("read works").as_deref(), Some("two"));
    s.remove("k").expect("remove works");
    assert!(s.get_raw("k").expect("read works").is_none());
}

#[test]
fn ticket_survives_reload() {
    let s = store();
    let mut ticket = Ticket::new();
    ticket.add(leg("a"));
    s.save_ticket(&ticket).expect("ticket saves");
    assert_eq!(s.load_ticket(), ticket);
}

#[test]
fn corrupt_ticket_loads_empty() {
    let s = store();
    s.set_raw(TICKET_KEY, "{not json").expect("write works");
    assert!(s.load_ticket().is_empty());
}

#[test]
fn scan_roundtrip_and_clear() {
    let s = store();
    let scan = ScanResult {
        scanned_pairs: vec![leg("a")],
        original_total_odds: Some(1.7),
        adjusted_total_odds: Some(1.5),
    };
    s.save_scan(&scan).expect("scan saves");
    assert_eq!(s.load_scan(), Some(scan));
    s.clear_scan().expect("scan clears");
    assert!(s.load_scan().is_none());
}

#[test]
fn clearing_scan_keeps_ticket() {
    let s = store();
    let mut ticket = Ticket::new();
    ticket.add(leg("a"));
    s.save_ticket(&ticket).expect("ticket saves");
    s.save_scan(&ScanResult {
        scanned_pairs: vec![leg("a")],
        original_total_odds: Some(1.7),
        adjusted_total_odds: Some(1.7),
    })
    .expect("scan saves");

    s.clear_scan().expect("scan clears");
    assert!(s.load_scan().is_none());
    assert_eq!(s.load_ticket(), ticket);
}

#[test]
fn empty_stored_scan_is_ignored() {
    let s = store();
    s.set_raw(
        SCAN_KEY,
        r#"{"scannedPairs":[],"originalTotalOdds":null,"adjustedTotalOdds":null}"#,
    )
    .expect("write works");
    assert!(s.load_scan().is_none());
}

#[test]
fn preferred_home_defaults_to_tips() {
    let s = store();
    assert_eq!(s.preferred_home(), PreferredHome::Tips);
    s.set_preferred_home(PreferredHome::Lotto).expect("write works");
    assert_eq!(s.preferred_home(), PreferredHome::Lotto);
    assert!(s.preferred_home().is_lotto_theme());
}

#[test]
fn session_login_restore_logout() {
    let s = store();
    let mut session = AuthSession::restore(&s).expect("restore works");
    assert!(!session.is_authenticated());

    session
        .login(&s, user(UserRole::Admin), "tok123".to_string())
        .expect("login persists");
    assert!(session.is_admin());
    assert_eq!(session.token.as_deref(), Some("tok123"));

    let restored = AuthSession::restore(&s).expect("restore works");
    assert_eq!(restored, session);

    session.logout(&s).expect("logout clears");
    assert!(!session.is_authenticated());
    assert!(!AuthSession::restore(&s).expect("restore works").is_authenticated());
}

#[test]
fn corrupt_user_is_dropped_on_restore() {
    let s = store();
    s.set_raw(USER_KEY, "{oops").expect("write works");
    s.set_raw("jtt_token", "tok").expect("write works");
    let session = AuthSession::restore(&s).expect("restore works");
    assert!(session.user.is_none());
    assert!(!session.is_authenticated());
    assert!(s.get_raw(USER_KEY).expect("read works").is_none());
}
