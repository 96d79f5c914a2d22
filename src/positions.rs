use serde::{Deserialize, Serialize};

/// The five positional roles the rank source is bucketed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PosBucket {
    PG,
    SG,
    SF,
    PF,
    C,
}

impl PosBucket {
    pub fn as_str(self) -> &'static str {
        match self {
            PosBucket::PG => "PG",
            PosBucket::SG => "SG",
            PosBucket::SF => "SF",
            PosBucket::PF => "PF",
            PosBucket::C => "C",
        }
    }

    fn from_token(token: &str) -> Option<PosBucket> {
        match token {
            "PG" => Some(PosBucket::PG),
            "SG" => Some(PosBucket::SG),
            "SF" => Some(PosBucket::SF),
            "PF" => Some(PosBucket::PF),
            "C" => Some(PosBucket::C),
            _ => None,
        }
    }
}

/// Buckets a roster position string ("PG", "G-F", "SF/PF", ...) by its
/// first token. Generic tokens collapse to a representative bucket
/// (G -> PG, F -> SF); a known lossy approximation, since a guard may
/// really be an SG and a forward a PF.
pub fn normalize_position(raw: Option<&str>) -> Option<PosBucket> {
    let first = raw?
        .split(['-', '/', ' '])
        .next()
        .unwrap_or("")
        .trim()
        .to_uppercase();
    if let Some(bucket) = PosBucket::from_token(&first) {
        return Some(bucket);
    }
    match first.as_str() {
        "G" => Some(PosBucket::PG),
        "F" => Some(PosBucket::SF),
        _ => None,
    }
}

/// Buckets a rank-payload position label. The rank source spells buckets
/// out ("GUARD", "CENTER") and sometimes ships combined buckets
/// ("PG/SG"); those land in their leading slot.
pub fn bucket_from_rank_label(raw: &str) -> Option<PosBucket> {
    let token = raw.trim().to_uppercase();
    if let Some(bucket) = PosBucket::from_token(&token) {
        return Some(bucket);
    }
    match token.as_str() {
        "G" | "GUARD" => Some(PosBucket::PG),
        "F" | "FORWARD" => Some(PosBucket::SF),
        "CENTER" => Some(PosBucket::C),
        "PG/SG" => Some(PosBucket::PG),
        "SF/PF" => Some(PosBucket::SF),
        "PF/C" | "C/PF" => Some(PosBucket::C),
        _ => None,
    }
}
