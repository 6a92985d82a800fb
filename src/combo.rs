use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Distinct lottery numbers, kept ordered so grids and labels render stably.
pub type NumberSet = BTreeSet<i64>;

const GRID_ROW_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combination {
    pub label: String,
    pub numbers: NumberSet,
}

impl Combination {
    pub fn new(label: impl Into<String>, numbers: NumberSet) -> Self {
        Self {
            label: label.into(),
            numbers,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSummary {
    pub hits: usize,
    pub denominator: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BestScore {
    pub label: String,
    pub best_hits: usize,
    pub denominator: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitMark {
    Hit,
    Drawn,
    Picked,
    Idle,
}

/// Lenient parse of a serialized number list such as `"[3, \"7\", 12.9]"`.
///
/// Anything that is not a JSON array yields an empty set. Entries that are not
/// finite numbers (or numeric strings) are dropped, the rest are truncated.
pub fn parse_number_list(raw: Option<&str>) -> NumberSet {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return NumberSet::new();
    };
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) else {
        return NumberSet::new();
    };
    items.iter().filter_map(numeric_entry).collect()
}

fn numeric_entry(value: &Value) -> Option<i64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    Some(n.trunc() as i64)
}

pub fn intersection_count(picked: &NumberSet, actual: &NumberSet) -> usize {
    let (small, large) = if picked.len() <= actual.len() {
        (picked, actual)
    } else {
        (actual, picked)
    };
    small.iter().filter(|n| large.contains(n)).count()
}

/// Draw size when configured, else the size of the draw itself, else the pick.
///
/// The chain mixes game config with whatever data is on hand, so percentages
/// from different fallback paths are not strictly comparable.
fn resolve_denominator(
    draw_size: Option<i64>,
    actual: Option<&NumberSet>,
    picked: &NumberSet,
) -> i64 {
    if let Some(size) = draw_size.filter(|s| *s > 0) {
        return size;
    }
    match actual {
        Some(actual) => actual.len() as i64,
        None => picked.len() as i64,
    }
}

pub fn score_combination(
    picked: &NumberSet,
    actual: Option<&NumberSet>,
    draw_size: Option<i64>,
) -> Option<ScoreSummary> {
    let actual_set = actual?;
    let denominator = resolve_denominator(draw_size, actual, picked);
    if denominator <= 0 {
        return None;
    }
    let hits = intersection_count(picked, actual_set);
    Some(ScoreSummary {
        hits,
        denominator: denominator as usize,
        percentage: hits as f64 / denominator as f64,
    })
}

/// Best hit count across a row's combinations.
///
/// The denominator is fixed per row (draw size, else draw length) so that
/// combinations of different lengths compare on the same scale. Empty
/// combinations are not candidates; a row with no candidates has no score.
/// Ties keep the earliest combination.
pub fn best_of(
    combinations: &[Combination],
    actual: Option<&NumberSet>,
    draw_size: Option<i64>,
) -> Option<BestScore> {
    let actual = actual?;
    let denominator = draw_size
        .filter(|s| *s > 0)
        .unwrap_or(actual.len() as i64);
    if denominator <= 0 {
        return None;
    }

    let mut best: Option<(&Combination, usize)> = None;
    for combo in combinations.iter().filter(|c| !c.numbers.is_empty()) {
        let hits = intersection_count(&combo.numbers, actual);
        if best.is_none_or(|(_, top)| hits > top) {
            best = Some((combo, hits));
        }
    }

    let (combo, best_hits) = best?;
    Some(BestScore {
        label: combo.label.clone(),
        best_hits,
        denominator: denominator as usize,
        percentage: best_hits as f64 / denominator as f64,
    })
}

pub fn hit_mark(n: i64, picked: &NumberSet, actual: Option<&NumberSet>) -> HitMark {
    let is_picked = picked.contains(&n);
    let is_drawn = actual.is_some_and(|a| a.contains(&n));
    match (is_picked, is_drawn) {
        (true, true) => HitMark::Hit,
        (false, true) => HitMark::Drawn,
        (true, false) => HitMark::Picked,
        (false, false) => HitMark::Idle,
    }
}

/// Rows of `1..=max` with their marks, ten numbers per row.
pub fn grid_rows(
    max: i64,
    picked: &NumberSet,
    actual: Option<&NumberSet>,
) -> Vec<Vec<(i64, HitMark)>> {
    let cells: Vec<(i64, HitMark)> = (1..=max.max(0))
        .map(|n| (n, hit_mark(n, picked, actual)))
        .collect();
    cells.chunks(GRID_ROW_LEN).map(<[_]>::to_vec).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotteryGame {
    pub id: i64,
    pub provider: String,
    pub game_code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub main_min: Option<i64>,
    #[serde(default)]
    pub main_max: Option<i64>,
    #[serde(default)]
    pub main_drawn: Option<i64>,
    #[serde(default)]
    pub bonus_max: Option<i64>,
    #[serde(default)]
    pub bonus_drawn: Option<i64>,
    #[serde(default)]
    pub option_desc: Option<String>,
}

impl LotteryGame {
    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.game_code)
    }

    pub fn draw_size(&self) -> Option<i64> {
        self.main_drawn.filter(|n| *n > 0)
    }

    /// Keeps only numbers inside `[main_min (default 1), main_max]`.
    pub fn within_range(&self, numbers: &NumberSet) -> NumberSet {
        let lo = self.main_min.unwrap_or(1).max(1);
        let hi = self.main_max.unwrap_or(i64::MAX);
        if lo > hi {
            return NumberSet::new();
        }
        numbers.range(lo..=hi).copied().collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCombination {
    pub label: String,
    #[serde(default)]
    pub numbers: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRow {
    pub id: i64,
    #[serde(default)]
    pub game_id: Option<i64>,
    pub draw_date: String,
    #[serde(default)]
    pub combinations: Vec<RawCombination>,
    #[serde(default)]
    pub actual: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowScore {
    pub per_combination: Vec<(String, Option<ScoreSummary>)>,
    pub best: Option<BestScore>,
}

impl PredictionRow {
    /// Drawn numbers, or `None` while the draw has not happened.
    /// An unparseable or empty draw list counts as not drawn.
    pub fn actual_numbers(&self, game: Option<&LotteryGame>) -> Option<NumberSet> {
        let parsed = parse_number_list(self.actual.as_deref());
        let parsed = match game {
            Some(game) => game.within_range(&parsed),
            None => parsed,
        };
        (!parsed.is_empty()).then_some(parsed)
    }

    pub fn parsed_combinations(&self, game: Option<&LotteryGame>) -> Vec<Combination> {
        self.combinations
            .iter()
            .map(|raw| {
                let numbers = parse_number_list(raw.numbers.as_deref());
                let numbers = match game {
                    Some(game) => game.within_range(&numbers),
                    None => numbers,
                };
                Combination::new(raw.label.clone(), numbers)
            })
            .collect()
    }

    pub fn score(&self, game: Option<&LotteryGame>) -> RowScore {
        let draw_size = game.and_then(LotteryGame::draw_size);
        let actual = self.actual_numbers(game);
        let combos = self.parsed_combinations(game);

        let per_combination = combos
            .iter()
            .map(|c| {
                (
                    c.label.clone(),
                    score_combination(&c.numbers, actual.as_ref(), draw_size),
                )
            })
            .collect();
        let best = best_of(&combos, actual.as_ref(), draw_size);

        RowScore {
            per_combination,
            best,
        }
    }
}
