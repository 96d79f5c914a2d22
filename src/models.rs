use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Every prop market the upstream API can key records by. Only the first
/// three are selectable in the table; the rest still matter for identifier
/// suffix stripping and trend payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKey {
    #[serde(rename = "points")]
    Points,
    #[serde(rename = "rebounds")]
    Rebounds,
    #[serde(rename = "assists")]
    Assists,
    #[serde(rename = "fg3PtMade")]
    Fg3PtMade,
    #[serde(rename = "pointsReboundsAssists")]
    PointsReboundsAssists,
    #[serde(rename = "pointsRebounds")]
    PointsRebounds,
    #[serde(rename = "pointsAssists")]
    PointsAssists,
    #[serde(rename = "reboundsAssists")]
    ReboundsAssists,
    #[serde(rename = "fantasyPts")]
    FantasyPts,
}

impl StatKey {
    pub const ALL: [StatKey; 9] = [
        StatKey::Points,
        StatKey::Rebounds,
        StatKey::Assists,
        StatKey::Fg3PtMade,
        StatKey::PointsReboundsAssists,
        StatKey::PointsRebounds,
        StatKey::PointsAssists,
        StatKey::ReboundsAssists,
        StatKey::FantasyPts,
    ];

    /// Markets the table can display and the rank source covers.
    pub const DISPLAY: [StatKey; 3] = [StatKey::Points, StatKey::Rebounds, StatKey::Assists];

    pub fn wire_key(self) -> &'static str {
        match self {
            StatKey::Points => "points",
            StatKey::Rebounds => "rebounds",
            StatKey::Assists => "assists",
            StatKey::Fg3PtMade => "fg3PtMade",
            StatKey::PointsReboundsAssists => "pointsReboundsAssists",
            StatKey::PointsRebounds => "pointsRebounds",
            StatKey::PointsAssists => "pointsAssists",
            StatKey::ReboundsAssists => "reboundsAssists",
            StatKey::FantasyPts => "fantasyPts",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatKey::Points => "Points",
            StatKey::Rebounds => "Rebounds",
            StatKey::Assists => "Assists",
            StatKey::Fg3PtMade => "3PT Made",
            StatKey::PointsReboundsAssists => "Pts+Reb+Ast",
            StatKey::PointsRebounds => "Pts+Reb",
            StatKey::PointsAssists => "Pts+Ast",
            StatKey::ReboundsAssists => "Reb+Ast",
            StatKey::FantasyPts => "Fantasy",
        }
    }

    /// Rank-source column labels to try, canonical first. The rebounds
    /// column appears under two spellings upstream.
    pub fn rank_keys(self) -> &'static [&'static str] {
        match self {
            StatKey::Points => &["PTS"],
            StatKey::Rebounds => &["TRB", "REB"],
            StatKey::Assists => &["AST"],
            _ => &[],
        }
    }

    pub fn from_wire(raw: &str) -> Option<StatKey> {
        StatKey::ALL
            .into_iter()
            .find(|s| s.wire_key().eq_ignore_ascii_case(raw))
    }
}

/// Over/under summary for one (player, market) pair as the lines source
/// delivers it. Prices arrive as numbers or strings upstream; the fetch
/// boundary normalizes both into `Option<f64>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropSummary {
    pub manual_ou: Option<f64>,
    pub over_price: Option<f64>,
    pub under_price: Option<f64>,
}

/// One player's betting-lines record for one game. `id` may carry a
/// `-<stat>` suffix; `summaries` holds one entry per market that actually
/// has a summary object upstream.
#[derive(Debug, Clone, Default)]
pub struct LineRow {
    pub id: String,
    pub name: String,
    pub position: String,
    pub team: String,
    pub game_id: String,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub game_start: String,
    pub summaries: HashMap<StatKey, PropSummary>,
}

/// Model projections, one record per player per game with every market
/// nested inside.
#[derive(Debug, Clone, Default)]
pub struct ProjectionRow {
    pub id: String,
    pub name: String,
    pub team: String,
    pub game_id: String,
    pub position: Option<String>,
    pub lines: HashMap<StatKey, f64>,
    pub projections: HashMap<StatKey, f64>,
}

/// Historical hit-rate snapshot for one market.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendBucket {
    pub line: Option<f64>,
    pub current_season: Option<f64>,
    pub last_season: Option<f64>,
    pub all: Option<f64>,
    pub vs_opp: Option<f64>,
    pub l5_rate: Option<f64>,
    pub l10_rate: Option<f64>,
    pub l20_rate: Option<f64>,
    pub streak: Option<f64>,
    pub opp_def: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct TrendRow {
    pub id: String,
    pub name: String,
    pub team: String,
    pub position: String,
    pub game_id: String,
    pub buckets: HashMap<StatKey, TrendBucket>,
}

impl TrendRow {
    pub fn bucket(&self, stat: StatKey) -> Option<&TrendBucket> {
        self.buckets.get(&stat)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InjuryRow {
    pub id: String,
    pub name: String,
    pub team: String,
    #[serde(default)]
    pub position: String,
    pub status: String,
    #[serde(rename = "isOut", default)]
    pub is_out: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleGame {
    pub id: String,
    pub date: String,
    pub time: String,
    pub home: String,
    pub away: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AltLineRow {
    pub prop: String,
    pub player: String,
    pub team: String,
    pub opponent: String,
    pub id: String,
    #[serde(rename = "gameId")]
    pub game_id: String,
    #[serde(default)]
    pub markets: Vec<(f64, f64)>,
}

/// The six per-source collections one refresh cycle hands the pipeline.
/// A source that failed or has not arrived yet is simply its empty default;
/// every join step is defined over empty collections.
#[derive(Debug, Clone, Default)]
pub struct SourceBundle {
    pub lines: Vec<LineRow>,
    pub projections: Vec<ProjectionRow>,
    pub trends: Vec<TrendRow>,
    pub injuries: Vec<InjuryRow>,
    pub schedule: Vec<ScheduleGame>,
    pub alt_lines: Vec<AltLineRow>,
}

/// One fully-derived display row. Owns only copied scalars; rebuilt from
/// scratch on every stat change or source refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub id: String,
    pub stat: StatKey,
    pub player: String,
    pub team: String,
    pub position: String,
    pub opponent: Option<String>,
    pub line: Option<f64>,
    pub over: Option<f64>,
    pub under: Option<f64>,
    pub stk: i32,
    pub pct_season: Option<f64>,
    pub pct_h2h: Option<f64>,
    pub pct_l5: Option<f64>,
    pub pct_l10: Option<f64>,
    pub pct_l20: Option<f64>,
    pub pct_prev: Option<f64>,
    pub proj: Option<f64>,
    pub diff: Option<f64>,
    pub dvp: Option<u32>,
    pub inj: Option<String>,
    pub has_alt: bool,
    pub game_time: Option<String>,
}

impl TableRow {
    /// Unique key within one built set: base id plus market.
    pub fn key(&self) -> String {
        format!("{}-{}", self.id, self.stat.wire_key())
    }
}
