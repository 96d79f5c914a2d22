use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::dvp::DvpRankMap;
use crate::export;
use crate::models::{
    InjuryRow, LineRow, ProjectionRow, PropSummary, ScheduleGame, SourceBundle, StatKey,
    TrendBucket, TrendRow,
};
use crate::positions::PosBucket;
use crate::state::{Delta, ProviderCommand};

/// Offline provider for demos and UI work: same command surface as the
/// live one, data invented locally. No network, no caches.
pub fn spawn_fake_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let _ = tx.send(Delta::Log("[INFO] Demo feed active".to_string()));
        let _ = tx.send(Delta::SetSources(seed_bundle()));

        loop {
            while let Ok(cmd) = cmd_rx.try_recv() {
                match cmd {
                    ProviderCommand::FetchSources => {
                        let _ = tx.send(Delta::SetSources(seed_bundle()));
                        let _ = tx.send(Delta::Log("[INFO] Demo sources regenerated".to_string()));
                    }
                    ProviderCommand::FetchDvp { teams } => {
                        let mut rng = rand::thread_rng();
                        let maps = teams
                            .iter()
                            .map(|team| seed_rank_map(team, &mut rng))
                            .collect();
                        let _ = tx.send(Delta::SetDvpRanks(maps));
                    }
                    ProviderCommand::Export { path, rows } => {
                        match export::export_table(path.as_ref(), &rows) {
                            Ok(report) => {
                                let _ = tx.send(Delta::ExportFinished {
                                    path,
                                    rows: report.rows,
                                });
                            }
                            Err(err) => {
                                let _ = tx.send(Delta::Log(format!("[WARN] Export failed: {err}")));
                            }
                        }
                    }
                }
            }
            thread::sleep(Duration::from_millis(200));
        }
    });
}

const DEMO_MATCHUPS: &[(&str, &str)] = &[
    ("NYL", "SEA"),
    ("LVA", "MIN"),
    ("CHI", "IND"),
    ("PHX", "DAL"),
    ("ATL", "WAS"),
    ("GSV", "CON"),
];

const DEMO_PLAYERS: &[(&str, &str, &str)] = &[
    ("Maya Reeves", "NYL", "PG"),
    ("Jordan Hale", "NYL", "C"),
    ("Tess Calloway", "SEA", "SF"),
    ("Ari Donovan", "SEA", "G"),
    ("Noa Whitfield", "LVA", "F"),
    ("Sage Okafor", "LVA", "C"),
    ("Remy Vasquez", "MIN", "SG"),
    ("Kai Mercer", "CHI", "PF"),
    ("Lena Brooks", "IND", "PG"),
    ("Dre Soriano", "PHX", "SF/PF"),
    ("Billie Navarro", "DAL", "C"),
    ("Quinn Abara", "ATL", "G-F"),
    ("Sloane Pierce", "WAS", "SG"),
    ("Ember Lucas", "GSV", "PF"),
    ("Rory Jensen", "CON", "PG"),
];

fn seed_bundle() -> SourceBundle {
    let mut rng = rand::thread_rng();
    let today = Utc::now();

    let schedule: Vec<ScheduleGame> = DEMO_MATCHUPS
        .iter()
        .enumerate()
        .map(|(idx, (home, away))| {
            let tip = today + ChronoDuration::hours(3 + (idx as i64 % 3));
            ScheduleGame {
                id: format!("demo-g{}", idx + 1),
                date: tip.format("%Y-%m-%d").to_string(),
                time: tip.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
                home: home.to_string(),
                away: away.to_string(),
            }
        })
        .collect();

    let game_for_team = |team: &str| {
        schedule
            .iter()
            .find(|g| g.home == team || g.away == team)
            .cloned()
    };

    let mut lines = Vec::new();
    let mut projections = Vec::new();
    let mut trends = Vec::new();
    let mut injuries = Vec::new();

    for (idx, (name, team, pos)) in DEMO_PLAYERS.iter().enumerate() {
        let base = format!("demo-p{}", idx + 1);
        let game = game_for_team(team);
        let (game_id, game_start, home, away) = match &game {
            Some(g) => (
                g.id.clone(),
                g.time.clone(),
                Some(g.home.clone()),
                Some(g.away.clone()),
            ),
            None => (String::new(), String::new(), None, None),
        };

        let mut proj_vals = HashMap::new();
        let mut line_vals = HashMap::new();
        let mut summaries = HashMap::new();
        let mut buckets = HashMap::new();
        for stat in StatKey::DISPLAY {
            let center: f64 = match stat {
                StatKey::Points => rng.gen_range(8.0..24.0),
                StatKey::Rebounds => rng.gen_range(3.0..11.0),
                _ => rng.gen_range(2.0..8.0),
            };
            let line = (center * 2.0).round() / 2.0;
            proj_vals.insert(stat, (center + rng.gen_range(-2.0..2.0) * 0.6).max(0.5));
            line_vals.insert(stat, line);
            summaries.insert(
                stat,
                PropSummary {
                    manual_ou: Some(line),
                    over_price: Some(*[-125.0, -115.0, -110.0, -105.0, 100.0]
                        .choose(&mut rng)
                        .unwrap_or(&-110.0)),
                    under_price: Some(*[-120.0, -110.0, -105.0, 100.0, 105.0]
                        .choose(&mut rng)
                        .unwrap_or(&-110.0)),
                },
            );
            buckets.insert(
                stat,
                TrendBucket {
                    line: Some(line),
                    current_season: Some(rng.gen_range(25.0..75.0_f64).round()),
                    last_season: Some(rng.gen_range(25.0..75.0_f64).round()),
                    all: None,
                    vs_opp: if rng.gen_bool(0.7) {
                        Some(rng.gen_range(0.0..100.0_f64).round())
                    } else {
                        None
                    },
                    l5_rate: Some(rng.gen_range(0.0..100.0_f64).round()),
                    l10_rate: Some(rng.gen_range(20.0..80.0_f64).round()),
                    l20_rate: Some(rng.gen_range(30.0..70.0_f64).round()),
                    streak: Some(rng.gen_range(-4.0..5.0_f64).trunc()),
                    opp_def: None,
                },
            );
        }

        // Line records are delivered per market, suffix included.
        for stat in StatKey::DISPLAY {
            lines.push(LineRow {
                id: format!("{base}-{}", stat.wire_key()),
                name: name.to_string(),
                position: pos.to_string(),
                team: team.to_string(),
                game_id: game_id.clone(),
                home_team: home.clone(),
                away_team: away.clone(),
                game_start: game_start.clone(),
                summaries: summaries.clone(),
            });
        }

        projections.push(ProjectionRow {
            id: base.clone(),
            name: name.to_string(),
            team: team.to_string(),
            game_id: game_id.clone(),
            position: Some(pos.to_string()),
            lines: line_vals,
            projections: proj_vals,
        });

        trends.push(TrendRow {
            id: base.clone(),
            name: name.to_string(),
            team: team.to_string(),
            position: pos.to_string(),
            game_id: game_id.clone(),
            buckets,
        });

        if rng.gen_bool(0.2) {
            let status = *["OUT", "GTD", "OFS"].choose(&mut rng).unwrap_or(&"GTD");
            injuries.push(InjuryRow {
                id: base.clone(),
                name: name.to_string(),
                team: team.to_string(),
                position: pos.to_string(),
                status: status.to_string(),
                is_out: status == "OUT",
            });
        }
    }

    SourceBundle {
        lines,
        projections,
        trends,
        injuries,
        schedule,
        alt_lines: Vec::new(),
    }
}

fn seed_rank_map(team: &str, rng: &mut impl Rng) -> DvpRankMap {
    let mut ranks: HashMap<String, HashMap<String, u32>> = HashMap::new();
    for pos in [
        PosBucket::PG,
        PosBucket::SG,
        PosBucket::SF,
        PosBucket::PF,
        PosBucket::C,
    ] {
        let mut by_stat = HashMap::new();
        for stat in ["PTS", "TRB", "AST"] {
            by_stat.insert(stat.to_string(), rng.gen_range(1..=13));
        }
        ranks.insert(pos.as_str().to_string(), by_stat);
    }
    DvpRankMap {
        team: team.to_string(),
        ranks,
    }
}
