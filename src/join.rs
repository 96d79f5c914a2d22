use std::collections::HashMap;

use crate::models::{SourceBundle, StatKey, TableRow};
use crate::schedule_match::{self, derive_opponent, find_game};
use crate::teams::LeagueTeams;

/// Strips a trailing `-<stat>` suffix from a record identifier, recovering
/// the base identity shared by every per-market record for one player in
/// one game. Identifiers without a recognized suffix are already
/// base-keyed and pass through unchanged.
pub fn base_id(id: &str) -> &str {
    match split_stat_suffix(id) {
        Some((base, _)) => base,
        None => id,
    }
}

/// The market suffix carried by `id`, if any.
pub fn suffix_stat(id: &str) -> Option<StatKey> {
    split_stat_suffix(id).map(|(_, stat)| stat)
}

fn split_stat_suffix(id: &str) -> Option<(&str, StatKey)> {
    let dash = id.rfind('-')?;
    let stat = StatKey::from_wire(&id[dash + 1..])?;
    Some((&id[..dash], stat))
}

/// Indexes records by base identity. Collisions are last-write-wins in the
/// source's own order; upstream sources are expected to be pre-deduplicated,
/// so this stays a deliberate simplification rather than a merge.
pub fn index_by_base<'a, T>(
    records: &'a [T],
    id_of: impl Fn(&T) -> &str,
) -> HashMap<&'a str, &'a T> {
    let mut map = HashMap::with_capacity(records.len());
    for record in records {
        map.insert(base_id(id_of(record)), record);
    }
    map
}

/// Joins the six sources into one display row per qualifying lines record
/// for the requested market. Uniqueness of (base id, stat) holds by
/// construction: each lines record contributes at most one row and is
/// itself keyed by that pair.
pub fn build_rows(stat: StatKey, sources: &SourceBundle, teams: &LeagueTeams) -> Vec<TableRow> {
    let proj_by_base = index_by_base(&sources.projections, |p| p.id.as_str());
    let trend_by_base = index_by_base(&sources.trends, |t| t.id.as_str());
    let inj_by_base = index_by_base(&sources.injuries, |i| i.id.as_str());

    let alt_keys: std::collections::HashSet<(String, &str)> = sources
        .alt_lines
        .iter()
        .map(|a| (base_id(&a.id).to_string(), a.prop.as_str()))
        .collect();

    let mut rows = Vec::new();
    for line in &sources.lines {
        // A suffixed id pins the record to one market; a record carrying a
        // different market's suffix can never emit a row here.
        if let Some(suffix) = suffix_stat(&line.id) {
            if suffix != stat {
                continue;
            }
        }
        // No summary, no row: a lines record with no price data for this
        // market is omitted, not reported.
        let Some(summary) = line.summaries.get(&stat) else {
            continue;
        };

        let base = base_id(&line.id);
        let projection = proj_by_base.get(base).copied();
        let trend = trend_by_base.get(base).copied();
        let bucket = trend.and_then(|t| t.bucket(stat));
        let injury = inj_by_base.get(base).copied();

        let team_code = teams.normalize(Some(&line.team));
        let game = find_game(line, &sources.schedule, teams);
        let opponent = match (&team_code, game) {
            (Some(code), Some(game)) => derive_opponent(code, game, teams)
                .or_else(|| schedule_match::degenerate_opponent(line, teams)),
            _ => schedule_match::degenerate_opponent(line, teams),
        };

        let proj_val = projection.and_then(|p| p.projections.get(&stat).copied());
        let line_val = summary
            .manual_ou
            .or_else(|| projection.and_then(|p| p.lines.get(&stat).copied()));
        let diff = match (proj_val, line_val) {
            (Some(p), Some(l)) => Some(round1(p - l)),
            _ => None,
        };

        let position = pick_str([
            Some(line.position.as_str()),
            projection.and_then(|p| p.position.as_deref()),
            trend.map(|t| t.position.as_str()),
        ]);

        let game_time = game
            .and_then(|g| schedule_match::kickoff_label(&g.time))
            .or_else(|| schedule_match::kickoff_label(&line.game_start));

        rows.push(TableRow {
            id: base.to_string(),
            stat,
            player: line.name.clone(),
            team: team_code.unwrap_or_else(|| line.team.clone()),
            position,
            opponent,
            line: line_val,
            over: summary.over_price,
            under: summary.under_price,
            stk: bucket.and_then(|b| b.streak).unwrap_or(0.0) as i32,
            pct_season: bucket.and_then(|b| b.current_season.or(b.all)),
            pct_h2h: bucket.and_then(|b| b.vs_opp),
            pct_l5: bucket.and_then(|b| b.l5_rate),
            pct_l10: bucket.and_then(|b| b.l10_rate),
            pct_l20: bucket.and_then(|b| b.l20_rate),
            pct_prev: bucket.and_then(|b| b.last_season),
            proj: proj_val,
            diff,
            dvp: None,
            inj: injury.map(|i| i.status.clone()),
            has_alt: alt_keys.contains(&(base.to_string(), stat.wire_key())),
            game_time,
        });
    }

    rows
}

/// Half-up rounding to one decimal place; symmetric, so negating both
/// inputs negates the result.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn pick_str<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> String {
    for candidate in candidates.into_iter().flatten() {
        let trimmed = candidate.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::{base_id, index_by_base, round1, suffix_stat};
    use crate::models::{InjuryRow, StatKey};

    #[test]
    fn base_id_strips_any_known_market_suffix() {
        assert_eq!(base_id("abc123-points"), "abc123");
        assert_eq!(base_id("abc123-REBOUNDS"), "abc123");
        assert_eq!(base_id("abc123-fg3PtMade"), "abc123");
        assert_eq!(base_id("abc123"), "abc123");
        // An unrecognized tail is part of the identity, not a suffix.
        assert_eq!(base_id("abc123-steals"), "abc123-steals");
    }

    #[test]
    fn suffix_stat_is_case_insensitive() {
        assert_eq!(suffix_stat("x-Points"), Some(StatKey::Points));
        assert_eq!(suffix_stat("x-assists"), Some(StatKey::Assists));
        assert_eq!(suffix_stat("x"), None);
    }

    #[test]
    fn index_by_base_is_last_write_wins() {
        let rows = vec![
            InjuryRow {
                id: "p1-points".to_string(),
                name: "first".to_string(),
                team: "NYL".to_string(),
                position: String::new(),
                status: "GTD".to_string(),
                is_out: false,
            },
            InjuryRow {
                id: "p1-assists".to_string(),
                name: "second".to_string(),
                team: "NYL".to_string(),
                position: String::new(),
                status: "OUT".to_string(),
                is_out: true,
            },
        ];
        let map = index_by_base(&rows, |r| r.id.as_str());
        assert_eq!(map.len(), 1);
        assert_eq!(map["p1"].status, "OUT");
    }

    #[test]
    fn round1_is_half_up_and_symmetric() {
        assert_eq!(round1(1.45), 1.5);
        assert_eq!(round1(-1.45), -1.5);
        assert_eq!(round1(1.44), 1.4);
    }
}
