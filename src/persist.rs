use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dvp::{CachedRanks, DvpCache};
use crate::http_cache::app_cache_dir;

const CACHE_FILE: &str = "dvp_cache.json";
const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct DvpCacheFile {
    version: u32,
    teams: HashMap<String, CachedRanks>,
}

/// Restores rank slots saved by an earlier run. Entries past the freshness
/// window load anyway and simply miss the fresh check until refetched.
pub fn load_dvp_cache(cache: &DvpCache) {
    let Some(path) = cache_path() else {
        return;
    };
    let Ok(raw) = fs::read_to_string(&path) else {
        return;
    };
    let Ok(file) = serde_json::from_str::<DvpCacheFile>(&raw) else {
        return;
    };
    if file.version != CACHE_VERSION {
        return;
    }
    cache.preload(file.teams);
}

pub fn save_dvp_cache(cache: &DvpCache) {
    let Some(path) = cache_path() else {
        return;
    };
    let Some(dir) = path.parent() else {
        return;
    };
    let _ = fs::create_dir_all(dir);

    let file = DvpCacheFile {
        version: CACHE_VERSION,
        teams: cache.snapshot(),
    };
    if let Ok(json) = serde_json::to_string(&file) {
        let tmp = path.with_extension("json.tmp");
        if fs::write(&tmp, json).is_ok() {
            let _ = fs::rename(&tmp, &path);
        }
    }
}

fn cache_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(CACHE_FILE))
}
