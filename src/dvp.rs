use std::collections::{BTreeSet, HashMap};
use std::env;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http_cache::fetch_json_cached;
use crate::http_client::http_client;
use crate::models::StatKey;
use crate::positions::{PosBucket, bucket_from_rank_label};
use crate::source_fetch::ApiConfig;

const DEFAULT_TTL_SECS: u64 = 60 * 60;

/// Defense-vs-position ranks for one team: rank per (position bucket,
/// stat column). 1 = the most favorable matchup to attack. Absent entries
/// mean the source had no sufficient sample.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DvpRankMap {
    pub team: String,
    pub ranks: HashMap<String, HashMap<String, u32>>,
}

impl DvpRankMap {
    /// Rank for a bucket and market, trying the canonical stat column
    /// first and then its synonym.
    pub fn rank_for(&self, pos: PosBucket, stat: StatKey) -> Option<u32> {
        let by_stat = self.ranks.get(pos.as_str())?;
        stat.rank_keys()
            .iter()
            .find_map(|key| by_stat.get(*key).copied())
    }
}

/// Parses the rank endpoint's payload. The shape is
/// `positional.<STAT>.<POS>.currentSeason = [value, rank]`; anything that
/// does not fit is skipped rather than failed, since partial rank tables
/// are normal early in a season.
pub fn parse_dvp_json(team: &str, raw: &str) -> Result<DvpRankMap> {
    let mut out = DvpRankMap {
        team: team.to_string(),
        ranks: HashMap::new(),
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(out);
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid def-vs-pos json")?;
    let Some(positional) = root.get("positional").and_then(|v| v.as_object()) else {
        return Ok(out);
    };

    for (stat_label, by_pos) in positional {
        let stat_label = stat_label.trim().to_uppercase();
        if !matches!(stat_label.as_str(), "PTS" | "TRB" | "REB" | "AST") {
            continue;
        }
        let Some(by_pos) = by_pos.as_object() else {
            continue;
        };
        for (pos_label, entry) in by_pos {
            let Some(bucket) = bucket_from_rank_label(pos_label) else {
                continue;
            };
            let Some(rank) = entry
                .get("currentSeason")
                .and_then(|v| v.as_array())
                .filter(|arr| arr.len() >= 2)
                .and_then(|arr| arr[1].as_u64())
            else {
                continue;
            };
            out.ranks
                .entry(bucket.as_str().to_string())
                .or_default()
                .insert(stat_label.clone(), rank as u32);
        }
    }

    Ok(out)
}

pub fn fetch_dvp_ranks(cfg: &ApiConfig, team: &str) -> Result<DvpRankMap> {
    let client = http_client()?;
    let url = format!("{}/wnba/def-vs-pos?team={team}", cfg.base);
    let body = fetch_json_cached(client, &url, &cfg.auth_headers()).context("dvp request failed")?;
    parse_dvp_json(team, &body)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedRanks {
    pub fetched_at_unix: u64,
    pub ranks: DvpRankMap,
}

/// Rank cache keyed by canonical team code with a freshness window.
/// Completed fetches are always stored, even when the view that wanted
/// them has moved on; a later stat or roster change reuses them for free.
pub struct DvpCache {
    ttl: Duration,
    slots: Mutex<HashMap<String, CachedRanks>>,
}

impl DvpCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_env() -> Self {
        let secs = env::var("DVP_CACHE_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TTL_SECS)
            .clamp(60, 24 * 60 * 60);
        Self::new(Duration::from_secs(secs))
    }

    pub fn get_fresh(&self, team: &str) -> Option<DvpRankMap> {
        let slots = self.slots.lock().expect("dvp cache lock poisoned");
        let slot = slots.get(team)?;
        if self.is_fresh(slot.fetched_at_unix) {
            Some(slot.ranks.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, team: &str, ranks: DvpRankMap) {
        let mut slots = self.slots.lock().expect("dvp cache lock poisoned");
        slots.insert(
            team.to_string(),
            CachedRanks {
                fetched_at_unix: now_unix(),
                ranks,
            },
        );
    }

    /// Restores slots persisted by an earlier run; stale entries are kept
    /// and simply fail the freshness check later.
    pub fn preload(&self, slots: HashMap<String, CachedRanks>) {
        let mut guard = self.slots.lock().expect("dvp cache lock poisoned");
        for (team, slot) in slots {
            guard.entry(team).or_insert(slot);
        }
    }

    pub fn snapshot(&self) -> HashMap<String, CachedRanks> {
        self.slots.lock().expect("dvp cache lock poisoned").clone()
    }

    /// Resolves ranks for every distinct team in `teams`, one underlying
    /// lookup per team not already fresh in the cache. Lookups run
    /// concurrently; each writes its own slot. Returns the resolved maps
    /// plus one message per failed lookup.
    pub fn resolve_batch<F>(
        &self,
        teams: &[String],
        fetch: F,
    ) -> (HashMap<String, DvpRankMap>, Vec<String>)
    where
        F: Fn(&str) -> Result<DvpRankMap> + Sync,
    {
        let distinct: BTreeSet<&str> = teams.iter().map(String::as_str).collect();

        let mut resolved = HashMap::new();
        let mut to_fetch = Vec::new();
        for team in distinct {
            match self.get_fresh(team) {
                Some(ranks) => {
                    resolved.insert(team.to_string(), ranks);
                }
                None => to_fetch.push(team),
            }
        }

        let fetched: Vec<(String, Result<DvpRankMap>)> = to_fetch
            .par_iter()
            .map(|team| (team.to_string(), fetch(team)))
            .collect();

        let mut errors = Vec::new();
        for (team, result) in fetched {
            match result {
                Ok(ranks) => {
                    self.insert(&team, ranks.clone());
                    resolved.insert(team, ranks);
                }
                Err(err) => errors.push(format!("{team}: {err}")),
            }
        }

        (resolved, errors)
    }

    fn is_fresh(&self, fetched_at_unix: u64) -> bool {
        now_unix().saturating_sub(fetched_at_unix) <= self.ttl.as_secs()
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::{DvpCache, DvpRankMap, parse_dvp_json};
    use crate::models::StatKey;
    use crate::positions::PosBucket;

    const PAYLOAD: &str = r#"{
        "positional": {
            "PTS": {
                "PG": { "currentSeason": [21.4, 3] },
                "Center": { "currentSeason": [14.2, 11] }
            },
            "REB": {
                "PG": { "currentSeason": [5.1, 7] }
            },
            "AST": {
                "PG": { "currentSeason": [6.0, null] }
            }
        }
    }"#;

    #[test]
    fn parses_ranks_and_spelled_out_buckets() {
        let map = parse_dvp_json("SEA", PAYLOAD).expect("parse");
        assert_eq!(map.rank_for(PosBucket::PG, StatKey::Points), Some(3));
        assert_eq!(map.rank_for(PosBucket::C, StatKey::Points), Some(11));
        // Null rank entries are skipped entirely.
        assert_eq!(map.rank_for(PosBucket::PG, StatKey::Assists), None);
        assert_eq!(map.rank_for(PosBucket::SG, StatKey::Points), None);
    }

    #[test]
    fn rebounds_fall_back_to_the_synonym_column() {
        let map = parse_dvp_json("SEA", PAYLOAD).expect("parse");
        assert_eq!(map.rank_for(PosBucket::PG, StatKey::Rebounds), Some(7));
    }

    #[test]
    fn null_body_is_an_empty_map() {
        let map = parse_dvp_json("SEA", "null").expect("parse");
        assert!(map.ranks.is_empty());
        assert_eq!(map.rank_for(PosBucket::PG, StatKey::Points), None);
    }

    #[test]
    fn duplicate_teams_issue_one_lookup() {
        let cache = DvpCache::new(Duration::from_secs(3600));
        let calls = AtomicUsize::new(0);
        let teams = vec!["LVA".to_string(), "LVA".to_string(), "SEA".to_string()];
        let (resolved, errors) = cache.resolve_batch(&teams, |team| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(DvpRankMap {
                team: team.to_string(),
                ranks: Default::default(),
            })
        });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolved.len(), 2);
        assert!(errors.is_empty());
    }

    #[test]
    fn fresh_entries_skip_the_lookup_entirely() {
        let cache = DvpCache::new(Duration::from_secs(3600));
        cache.insert(
            "SEA",
            DvpRankMap {
                team: "SEA".to_string(),
                ranks: Default::default(),
            },
        );
        let calls = AtomicUsize::new(0);
        let (resolved, _) = cache.resolve_batch(&["SEA".to_string()], |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(DvpRankMap::default())
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(resolved.contains_key("SEA"));
    }

    #[test]
    fn failed_lookups_surface_as_messages_not_panics() {
        let cache = DvpCache::new(Duration::from_secs(3600));
        let (resolved, errors) = cache.resolve_batch(&["MIN".to_string()], |_| {
            Err(anyhow::anyhow!("boom"))
        });
        assert!(resolved.is_empty());
        assert_eq!(errors.len(), 1);
    }
}
