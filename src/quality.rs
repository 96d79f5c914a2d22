use crate::models::TableRow;

/// Rows may miss at most this many core fields before they are dropped.
pub const MAX_ALLOWED_MISSING: usize = 2;

/// Placeholder tokens some sources ship instead of null. The fetch
/// boundary folds these into `None`, so typed rows never carry them, but
/// raw cell text is still checked through the same predicate.
pub fn is_placeholder(raw: &str) -> bool {
    matches!(raw.trim(), "\u{2014}" | "---")
}

/// Number of core display fields this row has no value for. The core set
/// is fixed: prices, the four headline rates, the projection, and the edge.
pub fn missing_core_fields(row: &TableRow) -> usize {
    [
        row.over,
        row.under,
        row.pct_season,
        row.pct_l5,
        row.pct_l10,
        row.pct_l20,
        row.proj,
        row.diff,
    ]
    .iter()
    .filter(|v| v.is_none())
    .count()
}

/// Drops rows too sparse to be worth displaying. If the gate would remove
/// every row, the snapshot itself is suspect and the unfiltered set comes
/// back instead of an empty table.
pub fn apply_gate(rows: Vec<TableRow>) -> Vec<TableRow> {
    let kept: Vec<TableRow> = rows
        .iter()
        .filter(|r| missing_core_fields(r) <= MAX_ALLOWED_MISSING)
        .cloned()
        .collect();
    if kept.is_empty() { rows } else { kept }
}
