use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::time::SystemTime;

use crate::dvp::DvpRankMap;
use crate::join;
use crate::models::{SourceBundle, StatKey, TableRow};
use crate::positions::normalize_position;
use crate::quality;
use crate::teams::LeagueTeams;

/// Sortable table columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Player,
    Line,
    Over,
    Under,
    Streak,
    Season,
    H2h,
    L5,
    L10,
    L20,
    Prev,
    Proj,
    Diff,
    Dvp,
    Time,
}

impl SortKey {
    pub const ALL: [SortKey; 15] = [
        SortKey::Player,
        SortKey::Line,
        SortKey::Over,
        SortKey::Under,
        SortKey::Streak,
        SortKey::Season,
        SortKey::H2h,
        SortKey::L5,
        SortKey::L10,
        SortKey::L20,
        SortKey::Prev,
        SortKey::Proj,
        SortKey::Diff,
        SortKey::Dvp,
        SortKey::Time,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Player => "PLAYER",
            SortKey::Line => "L",
            SortKey::Over => "O",
            SortKey::Under => "U",
            SortKey::Streak => "STK",
            SortKey::Season => "SZN",
            SortKey::H2h => "H2H",
            SortKey::L5 => "L5",
            SortKey::L10 => "L10",
            SortKey::L20 => "L20",
            SortKey::Prev => "PREV",
            SortKey::Proj => "PROJ",
            SortKey::Diff => "DIFF",
            SortKey::Dvp => "DVP",
            SortKey::Time => "TIME",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn flip(self) -> SortDir {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }
}

/// One sortable cell value. Absent values order after everything else
/// regardless of direction, so sparse rows sink instead of leading a
/// descending sort.
enum SortValue {
    Num(f64),
    Text(String),
    Nil,
}

impl SortValue {
    fn from_opt(value: Option<f64>) -> SortValue {
        match value {
            Some(v) => SortValue::Num(v),
            None => SortValue::Nil,
        }
    }

    fn from_text(value: Option<&str>) -> SortValue {
        match value {
            Some(v) if !v.is_empty() => SortValue::Text(v.to_lowercase()),
            _ => SortValue::Nil,
        }
    }

    fn cmp_with(&self, other: &SortValue, dir: SortDir) -> Ordering {
        match (self, other) {
            (SortValue::Nil, SortValue::Nil) => Ordering::Equal,
            (SortValue::Nil, _) => Ordering::Greater,
            (_, SortValue::Nil) => Ordering::Less,
            (SortValue::Num(a), SortValue::Num(b)) => {
                directed(a.partial_cmp(b).unwrap_or(Ordering::Equal), dir)
            }
            (SortValue::Text(a), SortValue::Text(b)) => directed(a.cmp(b), dir),
            (SortValue::Num(_), SortValue::Text(_)) => Ordering::Less,
            (SortValue::Text(_), SortValue::Num(_)) => Ordering::Greater,
        }
    }
}

fn directed(ord: Ordering, dir: SortDir) -> Ordering {
    match dir {
        SortDir::Asc => ord,
        SortDir::Desc => ord.reverse(),
    }
}

fn sort_value(row: &TableRow, key: SortKey) -> SortValue {
    match key {
        SortKey::Player => SortValue::from_text(Some(row.player.as_str())),
        SortKey::Line => SortValue::from_opt(row.line),
        SortKey::Over => SortValue::from_opt(row.over),
        SortKey::Under => SortValue::from_opt(row.under),
        SortKey::Streak => SortValue::Num(row.stk as f64),
        SortKey::Season => SortValue::from_opt(row.pct_season),
        SortKey::H2h => SortValue::from_opt(row.pct_h2h),
        SortKey::L5 => SortValue::from_opt(row.pct_l5),
        SortKey::L10 => SortValue::from_opt(row.pct_l10),
        SortKey::L20 => SortValue::from_opt(row.pct_l20),
        SortKey::Prev => SortValue::from_opt(row.pct_prev),
        SortKey::Proj => SortValue::from_opt(row.proj),
        SortKey::Diff => SortValue::from_opt(row.diff),
        SortKey::Dvp => SortValue::from_opt(row.dvp.map(f64::from)),
        SortKey::Time => SortValue::from_text(row.game_time.as_deref()),
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetSources(SourceBundle),
    SetDvpRanks(Vec<DvpRankMap>),
    ExportFinished { path: String, rows: usize },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchSources,
    FetchDvp { teams: Vec<String> },
    Export { path: String, rows: Vec<TableRow> },
}

pub struct AppState {
    pub teams: LeagueTeams,
    pub stat: StatKey,
    pub sources: SourceBundle,
    pub rows: Vec<TableRow>,
    pub dvp: HashMap<String, DvpRankMap>,
    pub sort_key: SortKey,
    pub sort_dir: SortDir,
    pub selected: usize,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub sources_loading: bool,
    pub sources_fetched_at: Option<SystemTime>,
    pub export_status: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            teams: LeagueTeams::wnba(),
            stat: StatKey::Points,
            sources: SourceBundle::default(),
            rows: Vec::new(),
            dvp: HashMap::new(),
            sort_key: SortKey::L5,
            sort_dir: SortDir::Desc,
            selected: 0,
            logs: VecDeque::new(),
            help_overlay: false,
            sources_loading: false,
            sources_fetched_at: None,
            export_status: None,
        }
    }

    pub fn set_stat(&mut self, stat: StatKey) {
        if self.stat != stat {
            self.stat = stat;
            self.rebuild_rows();
        }
    }

    pub fn cycle_stat(&mut self) {
        let idx = StatKey::DISPLAY
            .iter()
            .position(|s| *s == self.stat)
            .unwrap_or(0);
        let next = StatKey::DISPLAY[(idx + 1) % StatKey::DISPLAY.len()];
        self.set_stat(next);
    }

    /// Rebuilds the full row set from the cached sources. Rows are never
    /// patched in place; every run derives them from scratch.
    pub fn rebuild_rows(&mut self) {
        self.rows = join::build_rows(self.stat, &self.sources, &self.teams);
        self.clamp_selection();
    }

    /// Rank for one row's matchup, if everything resolves: opponent code,
    /// legacy-code remap, position bucket, and a rank in the map.
    pub fn rank_for_row(&self, row: &TableRow) -> Option<u32> {
        let opponent = self.teams.normalize(row.opponent.as_deref())?;
        let lookup = self.teams.rank_lookup_code(&opponent);
        let ranks = self.dvp.get(&lookup)?;
        let pos = normalize_position(Some(&row.position))?;
        ranks.rank_for(pos, self.stat)
    }

    /// Distinct rank-source team codes the current row set needs.
    pub fn needed_rank_teams(&self) -> Vec<String> {
        let mut codes: Vec<String> = self
            .rows
            .iter()
            .filter_map(|row| self.teams.normalize(row.opponent.as_deref()))
            .map(|code| self.teams.rank_lookup_code(&code))
            .collect();
        codes.sort();
        codes.dedup();
        codes
    }

    /// The rows as the table shows them: ranks filled in, quality gate
    /// applied (with its blackout fallback), current sort order.
    pub fn visible_rows(&self) -> Vec<TableRow> {
        let mut rows: Vec<TableRow> = self
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row.dvp = self.rank_for_row(&row);
                row
            })
            .collect();
        rows = quality::apply_gate(rows);

        let key = self.sort_key;
        let dir = self.sort_dir;
        let mut indexed: Vec<(usize, TableRow)> = rows.into_iter().enumerate().collect();
        indexed.sort_by(|(ai, a), (bi, b)| {
            sort_value(a, key)
                .cmp_with(&sort_value(b, key), dir)
                .then(ai.cmp(bi))
        });
        indexed.into_iter().map(|(_, row)| row).collect()
    }

    pub fn sort_by(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.sort_dir = self.sort_dir.flip();
        } else {
            self.sort_key = key;
            self.sort_dir = SortDir::Asc;
        }
    }

    pub fn cycle_sort_next(&mut self) {
        let idx = SortKey::ALL
            .iter()
            .position(|k| *k == self.sort_key)
            .unwrap_or(0);
        self.sort_key = SortKey::ALL[(idx + 1) % SortKey::ALL.len()];
    }

    pub fn cycle_sort_prev(&mut self) {
        let idx = SortKey::ALL
            .iter()
            .position(|k| *k == self.sort_key)
            .unwrap_or(0);
        self.sort_key = SortKey::ALL[(idx + SortKey::ALL.len() - 1) % SortKey::ALL.len()];
    }

    pub fn select_next(&mut self) {
        let len = self.visible_rows().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn clamp_selection(&mut self) {
        let len = self.visible_rows().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetSources(bundle) => {
            state.sources = bundle;
            state.sources_loading = false;
            state.sources_fetched_at = Some(SystemTime::now());
            state.rebuild_rows();
        }
        Delta::SetDvpRanks(maps) => {
            for map in maps {
                state.dvp.insert(map.team.clone(), map);
            }
        }
        Delta::ExportFinished { path, rows } => {
            state.export_status = Some(format!("exported {rows} rows to {path}"));
            state.push_log(format!("[INFO] Export finished: {path} ({rows} rows)"));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
