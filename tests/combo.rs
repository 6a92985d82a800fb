use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use jack_tips::combo::{
    Combination, HitMark, LotteryGame, NumberSet, PredictionRow, best_of, grid_rows,
    intersection_count, parse_number_list, score_combination,
};

fn set(nums: &[i64]) -> NumberSet {
    nums.iter().copied().collect()
}

#[derive(Deserialize)]
struct Report {
    game: LotteryGame,
    rows: Vec<PredictionRow>,
}

fn read_report() -> Report {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("draw_report.json");
    let raw = fs::read_to_string(path).expect("fixture file should be readable");
    serde_json::from_str(&raw).expect("fixture should parse")
}

#[test]
fn parses_mixed_number_list() {
    let nums = parse_number_list(Some(r#"[3, "7", 12.9, " 4 ", null, true, "x", 7]"#));
    assert_eq!(nums, set(&[3, 4, 7, 12]));
}

#[test]
fn malformed_or_missing_list_is_empty() {
    assert!(parse_number_list(None).is_empty());
    assert!(parse_number_list(Some("")).is_empty());
    assert!(parse_number_list(Some("not json")).is_empty());
    assert!(parse_number_list(Some(r#"{"a": 1}"#)).is_empty());
    assert!(parse_number_list(Some("42")).is_empty());
    assert!(parse_number_list(Some("[]")).is_empty());
}

#[test]
fn duplicates_collapse() {
    assert_eq!(parse_number_list(Some("[1,2,2,3]")).len(), 3);
}

#[test]
fn intersection_ignores_order_and_size() {
    assert_eq!(intersection_count(&set(&[1, 2, 3]), &set(&[3, 4, 5, 1])), 2);
    assert_eq!(intersection_count(&set(&[]), &set(&[1])), 0);
}

#[test]
fn intersection_is_symmetric_and_self_is_size() {
    let sets = [
        set(&[]),
        set(&[7]),
        set(&[1, 2, 3]),
        set(&[3, 4, 5, 1]),
        set(&[2, 4, 6, 8, 10, 12, 14]),
        set(&[-1, 0, 35, 36]),
    ];
    for a in &sets {
        assert_eq!(intersection_count(a, a), a.len());
        assert_eq!(intersection_count(a, &NumberSet::new()), 0);
        assert_eq!(intersection_count(&NumberSet::new(), a), 0);
        for b in &sets {
            assert_eq!(
                intersection_count(a, b),
                intersection_count(b, a),
                "{a:?} vs {b:?}"
            );
        }
    }
    assert_eq!(intersection_count(&sets[2], &sets[4]), 1);
    assert_eq!(intersection_count(&sets[4], &sets[2]), 1);
}

#[test]
fn score_uses_draw_size_when_configured() {
    let picked = set(&[1, 2, 3, 4, 5, 6]);
    let actual = set(&[1, 2, 3, 10, 11, 12, 13]);
    let score = score_combination(&picked, Some(&actual), Some(7)).expect("draw is known");
    assert_eq!(score.hits, 3);
    assert_eq!(score.denominator, 7);
    assert!((score.percentage - 3.0 / 7.0).abs() < 1e-9);
}

#[test]
fn score_falls_back_to_draw_length() {
    let picked = set(&[1, 2]);
    let actual = set(&[1, 2, 3, 4, 5]);
    for draw_size in [None, Some(0), Some(-1)] {
        let score = score_combination(&picked, Some(&actual), draw_size).expect("draw is known");
        assert_eq!(score.denominator, 5);
        assert_eq!(score.hits, 2);
    }
}

#[test]
fn no_draw_means_no_score() {
    assert!(score_combination(&set(&[1, 2, 3]), None, Some(6)).is_none());
    assert!(best_of(&[Combination::new("K1", set(&[1]))], None, Some(6)).is_none());
}

#[test]
fn empty_draw_without_size_has_no_score() {
    let empty = NumberSet::new();
    assert!(score_combination(&set(&[1, 2]), Some(&empty), None).is_none());
}

#[test]
fn best_picks_highest_hits() {
    let actual = set(&[1, 2, 3, 4, 5, 6]);
    let combos = vec![
        Combination::new("K1", set(&[1, 9, 10])),
        Combination::new("K2", set(&[1, 2, 3, 20])),
        Combination::new("K3", set(&[1, 2, 30])),
    ];
    let best = best_of(&combos, Some(&actual), Some(6)).expect("candidates exist");
    assert_eq!(best.label, "K2");
    assert_eq!(best.best_hits, 3);
    assert_eq!(best.denominator, 6);
    assert!((best.percentage - 0.5).abs() < 1e-9);
}

#[test]
fn best_tie_keeps_first_combination() {
    let actual = set(&[1, 2, 3]);
    let combos = vec![
        Combination::new("A", set(&[1, 7])),
        Combination::new("B", set(&[2, 8])),
    ];
    let best = best_of(&combos, Some(&actual), None).expect("candidates exist");
    assert_eq!(best.label, "A");
    assert_eq!(best.best_hits, 1);
    assert_eq!(best.denominator, 3);
}

#[test]
fn best_skips_empty_combinations() {
    let actual = set(&[1, 2, 3]);
    let combos = vec![
        Combination::new("empty", NumberSet::new()),
        Combination::new("miss", set(&[9])),
    ];
    let best = best_of(&combos, Some(&actual), None).expect("one candidate");
    assert_eq!(best.label, "miss");
    assert_eq!(best.best_hits, 0);

    let only_empty = vec![Combination::new("empty", NumberSet::new())];
    assert!(best_of(&only_empty, Some(&actual), None).is_none());
    assert!(best_of(&[], Some(&actual), None).is_none());
}

#[test]
fn grid_marks_hits_drawn_and_picked() {
    let picked = set(&[1, 2, 11]);
    let actual = set(&[2, 3]);
    let rows = grid_rows(12, &picked, Some(&actual));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].len(), 10);
    assert_eq!(rows[1].len(), 2);
    assert_eq!(rows[0][0], (1, HitMark::Picked));
    assert_eq!(rows[0][1], (2, HitMark::Hit));
    assert_eq!(rows[0][2], (3, HitMark::Drawn));
    assert_eq!(rows[0][3], (4, HitMark::Idle));
    assert_eq!(rows[1][0], (11, HitMark::Picked));

    let undrawn = grid_rows(3, &picked, None);
    assert_eq!(undrawn[0][1], (2, HitMark::Picked));
    assert!(grid_rows(0, &picked, None).is_empty());
}

#[test]
fn game_range_filters_numbers() {
    let report = read_report();
    let kept = report.game.within_range(&set(&[0, 1, 35, 36, -4]));
    assert_eq!(kept, set(&[1, 35]));
    assert_eq!(report.game.draw_size(), Some(7));
    assert_eq!(report.game.title(), "Loto 7");
}

#[test]
fn scores_fixture_rows() {
    let report = read_report();
    let drawn = &report.rows[0];
    let score = drawn.score(Some(&report.game));

    assert_eq!(score.per_combination.len(), 3);
    let k1 = score.per_combination[0].1.expect("draw is known");
    assert_eq!(k1.hits, 3);
    assert_eq!(k1.denominator, 7);
    let k2 = score.per_combination[1].1.expect("draw is known");
    assert_eq!(k2.hits, 5);
    // Unparseable numbers still score, as zero hits.
    let k3 = score.per_combination[2].1.expect("draw is known");
    assert_eq!(k3.hits, 0);

    let best = score.best.expect("row has candidates");
    assert_eq!(best.label, "K2");
    assert_eq!(best.best_hits, 5);
    assert_eq!(best.denominator, 7);

    let pending = &report.rows[1];
    assert!(pending.actual_numbers(Some(&report.game)).is_none());
    let score = pending.score(Some(&report.game));
    assert!(score.best.is_none());
    assert!(score.per_combination.iter().all(|(_, s)| s.is_none()));
}
