use std::collections::HashMap;
use std::env;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::http_cache::fetch_json_cached;
use crate::http_client::http_client;
use crate::models::{
    AltLineRow, InjuryRow, LineRow, ProjectionRow, PropSummary, ScheduleGame, SourceBundle,
    StatKey, TrendBucket, TrendRow,
};
use crate::quality::is_placeholder;

const DEFAULT_API_BASE: &str = "https://api.props.cash";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base: String,
    bearer: Option<String>,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let base = env::var("PROPS_API_BASE")
            .ok()
            .map(|raw| normalize_base(&raw))
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let bearer = env::var("PROPS_API_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(|t| format!("Bearer {t}"));
        Self { base, bearer }
    }

    pub fn auth_headers(&self) -> Vec<(&'static str, &str)> {
        self.bearer
            .iter()
            .map(|b| ("Authorization", b.as_str()))
            .collect()
    }
}

/// Strips an accidental trailing sport segment from a configured base URL,
/// e.g. `https://api.props.cash/wnba` -> `https://api.props.cash`.
fn normalize_base(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    let lower = trimmed.to_lowercase();
    for sport in ["wnba", "nba", "mlb", "csgo"] {
        let suffix = format!("/{sport}");
        if lower.ends_with(&suffix) {
            return trimmed[..trimmed.len() - suffix.len()].to_string();
        }
    }
    trimmed.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Lines,
    Projections,
    Trends,
    Injuries,
    Schedule,
    AltLines,
}

impl SourceKind {
    pub const ALL: [SourceKind; 6] = [
        SourceKind::Lines,
        SourceKind::Projections,
        SourceKind::Trends,
        SourceKind::Injuries,
        SourceKind::Schedule,
        SourceKind::AltLines,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Lines => "lines",
            SourceKind::Projections => "projections",
            SourceKind::Trends => "trends",
            SourceKind::Injuries => "injuries",
            SourceKind::Schedule => "schedule",
            SourceKind::AltLines => "alt-lines",
        }
    }

    fn path(self) -> &'static str {
        match self {
            SourceKind::Lines => "/wnba/lines",
            SourceKind::Projections => "/wnba/projections",
            SourceKind::Trends => "/wnba/prop-trends",
            SourceKind::Injuries => "/injuries",
            SourceKind::Schedule => "/schedule",
            SourceKind::AltLines => "/alt-lines",
        }
    }
}

enum SourcePayload {
    Lines(Vec<LineRow>),
    Projections(Vec<ProjectionRow>),
    Trends(Vec<TrendRow>),
    Injuries(Vec<InjuryRow>),
    Schedule(Vec<ScheduleGame>),
    AltLines(Vec<AltLineRow>),
}

/// Fetches all six sources concurrently on the ambient rayon pool. A
/// failed source degrades to its empty collection; the error text comes
/// back alongside so the caller can log it.
pub fn fetch_bundle(cfg: &ApiConfig) -> (SourceBundle, Vec<String>) {
    let results: Vec<(SourceKind, Result<SourcePayload>)> = SourceKind::ALL
        .par_iter()
        .map(|kind| (*kind, fetch_source(cfg, *kind)))
        .collect();

    let mut bundle = SourceBundle::default();
    let mut errors = Vec::new();
    for (kind, result) in results {
        match result {
            Ok(SourcePayload::Lines(rows)) => bundle.lines = rows,
            Ok(SourcePayload::Projections(rows)) => bundle.projections = rows,
            Ok(SourcePayload::Trends(rows)) => bundle.trends = rows,
            Ok(SourcePayload::Injuries(rows)) => bundle.injuries = rows,
            Ok(SourcePayload::Schedule(rows)) => bundle.schedule = rows,
            Ok(SourcePayload::AltLines(rows)) => bundle.alt_lines = rows,
            Err(err) => errors.push(format!("{} fetch failed: {err}", kind.label())),
        }
    }
    (bundle, errors)
}

fn fetch_source(cfg: &ApiConfig, kind: SourceKind) -> Result<SourcePayload> {
    let client = http_client()?;
    let url = format!("{}{}", cfg.base, kind.path());
    let body = fetch_json_cached(client, &url, &cfg.auth_headers())
        .with_context(|| format!("{} request failed", kind.label()))?;
    match kind {
        SourceKind::Lines => parse_lines_json(&body).map(SourcePayload::Lines),
        SourceKind::Projections => parse_projections_json(&body).map(SourcePayload::Projections),
        SourceKind::Trends => parse_trends_json(&body).map(SourcePayload::Trends),
        SourceKind::Injuries => parse_injuries_json(&body).map(SourcePayload::Injuries),
        SourceKind::Schedule => parse_schedule_json(&body).map(SourcePayload::Schedule),
        SourceKind::AltLines => parse_alt_lines_json(&body).map(SourcePayload::AltLines),
    }
}

// -- Lines --

#[derive(Debug, Deserialize)]
struct LineWire {
    id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    position: String,
    #[serde(default)]
    team: String,
    #[serde(rename = "gameId", default)]
    game_id: Option<Value>,
    #[serde(rename = "homeTeam")]
    home_team: Option<String>,
    #[serde(rename = "awayTeam")]
    away_team: Option<String>,
    #[serde(rename = "gameStart", default)]
    game_start: String,
    // Null in some snapshots, not just missing.
    projection: Option<HashMap<String, Value>>,
}

pub fn parse_lines_json(raw: &str) -> Result<Vec<LineRow>> {
    let Some(trimmed) = non_null(raw) else {
        return Ok(Vec::new());
    };
    let wires: Vec<LineWire> = serde_json::from_str(trimmed).context("invalid lines json")?;
    Ok(wires
        .into_iter()
        .map(|wire| {
            let projection = wire.projection.unwrap_or_default();
            let mut summaries = HashMap::new();
            for stat in StatKey::ALL {
                let Some(prop) = projection.get(stat.wire_key()) else {
                    continue;
                };
                let Some(summary) = prop.get("summary").filter(|s| s.is_object()) else {
                    continue;
                };
                summaries.insert(
                    stat,
                    PropSummary {
                        manual_ou: num_field(summary, "manualOU"),
                        over_price: num_field(summary, "overPrice"),
                        under_price: num_field(summary, "underPrice"),
                    },
                );
            }
            LineRow {
                id: wire.id.unwrap_or_default(),
                name: wire.name,
                position: wire.position,
                team: wire.team,
                game_id: id_string(wire.game_id),
                home_team: wire.home_team.filter(|t| !t.trim().is_empty()),
                away_team: wire.away_team.filter(|t| !t.trim().is_empty()),
                game_start: wire.game_start,
                summaries,
            }
        })
        .collect())
}

// -- Projections --

pub fn parse_projections_json(raw: &str) -> Result<Vec<ProjectionRow>> {
    let Some(trimmed) = non_null(raw) else {
        return Ok(Vec::new());
    };
    let values: Vec<Value> = serde_json::from_str(trimmed).context("invalid projections json")?;
    Ok(values
        .into_iter()
        .map(|v| ProjectionRow {
            id: string_field(&v, "id"),
            name: string_field(&v, "name"),
            team: string_field(&v, "team"),
            game_id: string_field(&v, "gameId"),
            position: v
                .get("position")
                .and_then(Value::as_str)
                .map(str::to_string),
            lines: stat_number_map(v.get("lines")),
            // Some snapshots nest the values under "projection" instead.
            projections: {
                let primary = stat_number_map(v.get("projections"));
                if primary.is_empty() {
                    stat_number_map(v.get("projection"))
                } else {
                    primary
                }
            },
        })
        .collect())
}

fn stat_number_map(value: Option<&Value>) -> HashMap<StatKey, f64> {
    let mut out = HashMap::new();
    let Some(obj) = value.and_then(Value::as_object) else {
        return out;
    };
    for (key, v) in obj {
        let Some(stat) = StatKey::from_wire(key) else {
            continue;
        };
        if let Some(num) = value_to_f64(v) {
            out.insert(stat, num);
        }
    }
    out
}

// -- Trends --

#[derive(Debug, Deserialize, Default)]
struct TrendBucketWire {
    #[serde(default, deserialize_with = "float_or_none")]
    line: Option<f64>,
    #[serde(rename = "currentSeason", default, deserialize_with = "float_or_none")]
    current_season: Option<f64>,
    #[serde(rename = "lastSeason", default, deserialize_with = "float_or_none")]
    last_season: Option<f64>,
    #[serde(default, deserialize_with = "float_or_none")]
    all: Option<f64>,
    #[serde(rename = "vsOpp", default, deserialize_with = "float_or_none")]
    vs_opp: Option<f64>,
    #[serde(rename = "l5Rate", default, deserialize_with = "float_or_none")]
    l5_rate: Option<f64>,
    #[serde(rename = "l10Rate", default, deserialize_with = "float_or_none")]
    l10_rate: Option<f64>,
    #[serde(rename = "l20Rate", default, deserialize_with = "float_or_none")]
    l20_rate: Option<f64>,
    #[serde(default, deserialize_with = "float_or_none")]
    streak: Option<f64>,
    #[serde(rename = "oppDef", default, deserialize_with = "float_or_none")]
    opp_def: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TrendWire {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    team: String,
    #[serde(default)]
    position: String,
    #[serde(rename = "gameId", default)]
    game_id: String,
    #[serde(default)]
    points: Option<TrendBucketWire>,
    #[serde(default)]
    rebounds: Option<TrendBucketWire>,
    #[serde(default)]
    assists: Option<TrendBucketWire>,
    #[serde(rename = "fg3PtMade", default)]
    fg3_pt_made: Option<TrendBucketWire>,
    #[serde(rename = "pointsReboundsAssists", default)]
    points_rebounds_assists: Option<TrendBucketWire>,
    #[serde(rename = "pointsRebounds", default)]
    points_rebounds: Option<TrendBucketWire>,
    #[serde(rename = "pointsAssists", default)]
    points_assists: Option<TrendBucketWire>,
    #[serde(rename = "reboundsAssists", default)]
    rebounds_assists: Option<TrendBucketWire>,
    #[serde(rename = "fantasyPts", default)]
    fantasy_pts: Option<TrendBucketWire>,
}

impl TrendWire {
    fn take_bucket(&mut self, stat: StatKey) -> Option<TrendBucketWire> {
        match stat {
            StatKey::Points => self.points.take(),
            StatKey::Rebounds => self.rebounds.take(),
            StatKey::Assists => self.assists.take(),
            StatKey::Fg3PtMade => self.fg3_pt_made.take(),
            StatKey::PointsReboundsAssists => self.points_rebounds_assists.take(),
            StatKey::PointsRebounds => self.points_rebounds.take(),
            StatKey::PointsAssists => self.points_assists.take(),
            StatKey::ReboundsAssists => self.rebounds_assists.take(),
            StatKey::FantasyPts => self.fantasy_pts.take(),
        }
    }
}

pub fn parse_trends_json(raw: &str) -> Result<Vec<TrendRow>> {
    let Some(trimmed) = non_null(raw) else {
        return Ok(Vec::new());
    };
    let wires: Vec<TrendWire> = serde_json::from_str(trimmed).context("invalid trends json")?;
    Ok(wires
        .into_iter()
        .map(|mut wire| {
            let mut buckets = HashMap::new();
            for stat in StatKey::ALL {
                if let Some(b) = wire.take_bucket(stat) {
                    buckets.insert(
                        stat,
                        TrendBucket {
                            line: b.line,
                            current_season: b.current_season,
                            last_season: b.last_season,
                            all: b.all,
                            vs_opp: b.vs_opp,
                            l5_rate: b.l5_rate,
                            l10_rate: b.l10_rate,
                            l20_rate: b.l20_rate,
                            streak: b.streak,
                            opp_def: b.opp_def,
                        },
                    );
                }
            }
            TrendRow {
                id: wire.id,
                name: wire.name,
                team: wire.team,
                position: wire.position,
                game_id: wire.game_id,
                buckets,
            }
        })
        .collect())
}

// -- Injuries / schedule / alt-lines --

pub fn parse_injuries_json(raw: &str) -> Result<Vec<InjuryRow>> {
    let Some(trimmed) = non_null(raw) else {
        return Ok(Vec::new());
    };
    serde_json::from_str(trimmed).context("invalid injuries json")
}

pub fn parse_schedule_json(raw: &str) -> Result<Vec<ScheduleGame>> {
    let Some(trimmed) = non_null(raw) else {
        return Ok(Vec::new());
    };
    serde_json::from_str(trimmed).context("invalid schedule json")
}

pub fn parse_alt_lines_json(raw: &str) -> Result<Vec<AltLineRow>> {
    let Some(trimmed) = non_null(raw) else {
        return Ok(Vec::new());
    };
    serde_json::from_str(trimmed).context("invalid alt-lines json")
}

// -- Value helpers --

fn non_null(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        None
    } else {
        Some(trimmed)
    }
}

fn id_string(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn string_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn num_field(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(value_to_f64)
}

/// Numbers arrive as numbers, quoted numbers, or placeholder text; only
/// the first two carry data.
fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || is_placeholder(trimmed) {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}

fn float_or_none<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value))
}

#[cfg(test)]
mod tests {
    use super::{normalize_base, parse_lines_json, value_to_f64};
    use crate::models::StatKey;
    use serde_json::json;

    #[test]
    fn base_url_loses_a_trailing_sport_segment() {
        assert_eq!(
            normalize_base("https://api.props.cash/WNBA/"),
            "https://api.props.cash"
        );
        assert_eq!(
            normalize_base("https://api.props.cash"),
            "https://api.props.cash"
        );
    }

    #[test]
    fn string_prices_and_placeholders_normalize_at_the_boundary() {
        assert_eq!(value_to_f64(&json!("-110")), Some(-110.0));
        assert_eq!(value_to_f64(&json!(12.5)), Some(12.5));
        assert_eq!(value_to_f64(&json!("\u{2014}")), None);
        assert_eq!(value_to_f64(&json!("---")), None);
        assert_eq!(value_to_f64(&json!(null)), None);
    }

    #[test]
    fn lines_keep_only_markets_with_a_summary_object() {
        let raw = r#"[{
            "id": "p9-points",
            "name": "Test Player",
            "position": "G",
            "team": "NYL",
            "gameId": "g1",
            "gameStart": "2025-07-04T23:00:00Z",
            "projection": {
                "points": { "summary": { "manualOU": 18.5, "overPrice": "-115", "underPrice": -105 } },
                "rebounds": { "summary": null },
                "assists": {}
            }
        }]"#;
        let rows = parse_lines_json(raw).expect("parse");
        assert_eq!(rows.len(), 1);
        let summaries = &rows[0].summaries;
        assert_eq!(summaries.len(), 1);
        let points = &summaries[&StatKey::Points];
        assert_eq!(points.manual_ou, Some(18.5));
        assert_eq!(points.over_price, Some(-115.0));
        assert_eq!(points.under_price, Some(-105.0));
    }

    #[test]
    fn null_bodies_are_empty_collections() {
        assert!(parse_lines_json("null").expect("parse").is_empty());
        assert!(parse_lines_json("  ").expect("parse").is_empty());
    }
}
