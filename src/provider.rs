use std::collections::HashSet;
use std::env;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::dvp::{self, DvpCache};
use crate::export;
use crate::persist;
use crate::source_fetch::{ApiConfig, fetch_bundle};
use crate::state::{Delta, ProviderCommand};

/// Spawns the live data provider. It owns all network I/O: source bundles
/// refresh on an interval or on command, rank lookups run as a separate
/// phase once the UI reports which opponents the built rows need.
pub fn spawn_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let cfg = ApiConfig::from_env();
        let dvp_cache = Arc::new(DvpCache::from_env());
        persist::load_dvp_cache(&dvp_cache);

        let pool = build_fetch_pool();
        let inflight_dvp: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));

        let sources_interval = Duration::from_secs(
            env::var("SOURCES_POLL_SECS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(60)
                .max(15),
        );
        // Forced refreshes still respect a small floor so a held-down key
        // cannot hammer the API.
        let min_refresh = Duration::from_secs(5);
        let mut last_sources: Option<Instant> = None;

        loop {
            let refresh_due = match last_sources {
                None => true,
                Some(at) => at.elapsed() >= sources_interval,
            };
            if refresh_due {
                refresh_sources(&cfg, &pool, &tx);
                last_sources = Some(Instant::now());
            }

            while let Ok(cmd) = cmd_rx.try_recv() {
                match cmd {
                    ProviderCommand::FetchSources => {
                        if last_sources.is_some_and(|at| at.elapsed() < min_refresh) {
                            let _ = tx.send(Delta::Log("[INFO] Refresh throttled".to_string()));
                            continue;
                        }
                        refresh_sources(&cfg, &pool, &tx);
                        last_sources = Some(Instant::now());
                    }
                    ProviderCommand::FetchDvp { teams } => {
                        spawn_dvp_job(teams, &cfg, &dvp_cache, &inflight_dvp, &tx);
                    }
                    ProviderCommand::Export { path, rows } => {
                        let tx = tx.clone();
                        thread::spawn(move || {
                            match export::export_table(path.as_ref(), &rows) {
                                Ok(report) => {
                                    let _ = tx.send(Delta::ExportFinished {
                                        path,
                                        rows: report.rows,
                                    });
                                }
                                Err(err) => {
                                    let _ =
                                        tx.send(Delta::Log(format!("[WARN] Export failed: {err}")));
                                }
                            }
                        });
                    }
                }
            }

            thread::sleep(Duration::from_millis(200));
        }
    });
}

fn refresh_sources(cfg: &ApiConfig, pool: &Option<rayon::ThreadPool>, tx: &Sender<Delta>) {
    let (bundle, errors) = with_fetch_pool(pool, || fetch_bundle(cfg));
    for err in errors {
        let _ = tx.send(Delta::Log(format!("[WARN] {err}")));
    }
    let _ = tx.send(Delta::SetSources(bundle));
}

/// Phase-two rank fetch: one lookup per distinct opponent not already
/// in flight. Runs off-thread so a slow rank source never delays the next
/// source refresh; whatever completes is cached and shipped even if the
/// view has moved on by then.
fn spawn_dvp_job(
    teams: Vec<String>,
    cfg: &ApiConfig,
    cache: &Arc<DvpCache>,
    inflight: &Arc<Mutex<HashSet<String>>>,
    tx: &Sender<Delta>,
) {
    let teams: Vec<String> = {
        let mut guard = inflight.lock().expect("dvp inflight lock poisoned");
        teams
            .into_iter()
            .filter(|team| guard.insert(team.clone()))
            .collect()
    };
    if teams.is_empty() {
        return;
    }

    let cfg = cfg.clone();
    let cache = cache.clone();
    let inflight = inflight.clone();
    let tx = tx.clone();
    thread::spawn(move || {
        let pool = build_fetch_pool();
        let (resolved, errors) = with_fetch_pool(&pool, || {
            cache.resolve_batch(&teams, |team| dvp::fetch_dvp_ranks(&cfg, team))
        });
        for err in errors {
            let _ = tx.send(Delta::Log(format!("[WARN] DVP fetch: {err}")));
        }
        if !resolved.is_empty() {
            persist::save_dvp_cache(&cache);
            let _ = tx.send(Delta::SetDvpRanks(resolved.into_values().collect()));
        }

        let mut guard = inflight.lock().expect("dvp inflight lock poisoned");
        for team in &teams {
            guard.remove(team);
        }
    });
}

fn build_fetch_pool() -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(fetch_parallelism())
        .build()
        .ok()
}

fn with_fetch_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}

fn fetch_parallelism() -> usize {
    env::var("FETCH_PARALLELISM")
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(6)
        .clamp(2, 32)
}
