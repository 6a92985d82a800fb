use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;

use jack_tips::backend::OptionsFetcher;
use jack_tips::feed::Feed;
use jack_tips::options::{CountryOption, LeagueOption, OptionList};
use jack_tips::selection::{FetchParams, Node, SelectionController};

/// Serves countries, fails league lookups for "XX", and counts calls.
#[derive(Default)]
struct StaticFetcher {
    calls: AtomicUsize,
}

impl OptionsFetcher for StaticFetcher {
    fn fetch(&self, params: &FetchParams) -> Result<OptionList> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match params {
            FetchParams::Countries => Ok(OptionList::Countries(vec![CountryOption {
                code: "HR".to_string(),
                name: "Croatia".to_string(),
                flag: None,
            }])),
            FetchParams::Leagues { country, .. } if country == "XX" => {
                Err(anyhow!("http 404: unknown country"))
            }
            FetchParams::Leagues { .. } => Ok(OptionList::Leagues(vec![LeagueOption {
                id: "210".to_string(),
                name: "HNL".to_string(),
                kind: None,
                logo: None,
                latest_season: None,
            }])),
            other => Err(anyhow!("unexpected request {other:?}")),
        }
    }
}

fn controller() -> SelectionController {
    SelectionController::with_today(NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date"))
}

#[test]
fn settle_applies_fetched_options() {
    let fetcher = Arc::new(StaticFetcher::default());
    let feed = Feed::start(fetcher.clone());
    let mut c = controller();

    feed.settle(&mut c, Duration::from_secs(5));
    assert_eq!(c.countries().len(), 1);
    assert!(!c.is_loading(Node::Country));

    c.set_country("HR");
    feed.settle(&mut c, Duration::from_secs(5));
    assert_eq!(c.leagues().len(), 1);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);

    // Cached, so no further calls.
    c.set_country("HR");
    feed.settle(&mut c, Duration::from_secs(5));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn fetch_errors_surface_on_their_node() {
    let feed = Feed::start(Arc::new(StaticFetcher::default()));
    let mut c = controller();
    feed.settle(&mut c, Duration::from_secs(5));

    c.set_country("XX");
    feed.settle(&mut c, Duration::from_secs(5));
    assert_eq!(c.error(Node::League), Some("http 404: unknown country"));
    assert!(c.error(Node::Country).is_none());
    assert!(c.leagues().is_empty());
    assert!(c.logs.iter().any(|l| l.starts_with("[WARN]")));
}
