use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::models::TableRow;

pub struct ExportReport {
    pub rows: usize,
}

/// Writes the displayed table to a workbook, one row per table row, in
/// the table's current order.
pub fn export_table(path: &Path, rows: &[TableRow]) -> Result<ExportReport> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("props").context("name worksheet")?;

    let mut grid = vec![header_row()];
    grid.extend(rows.iter().map(table_row));
    write_rows(sheet, &grid)?;

    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;
    Ok(ExportReport { rows: rows.len() })
}

fn header_row() -> Vec<String> {
    [
        "Player", "Team", "Pos", "Opp", "Stat", "Line", "Over", "Under", "Streak", "Season%",
        "H2H%", "L5%", "L10%", "L20%", "Prev%", "Proj", "Diff", "DVP", "Injury", "Alt", "Time",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn table_row(row: &TableRow) -> Vec<String> {
    vec![
        row.player.clone(),
        row.team.clone(),
        row.position.clone(),
        row.opponent.clone().unwrap_or_default(),
        row.stat.label().to_string(),
        opt_num(row.line),
        opt_num(row.over),
        opt_num(row.under),
        row.stk.to_string(),
        opt_num(row.pct_season),
        opt_num(row.pct_h2h),
        opt_num(row.pct_l5),
        opt_num(row.pct_l10),
        opt_num(row.pct_l20),
        opt_num(row.pct_prev),
        opt_num(row.proj),
        opt_num(row.diff),
        row.dvp.map(|r| r.to_string()).unwrap_or_default(),
        row.inj.clone().unwrap_or_default(),
        if row.has_alt { "yes" } else { "" }.to_string(),
        row.game_time.clone().unwrap_or_default(),
    ]
}

fn opt_num(value: Option<f64>) -> String {
    value.map(|v| format!("{v}")).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
