use std::fs;
use std::path::PathBuf;

use props_terminal::dvp::parse_dvp_json;
use props_terminal::models::StatKey;
use props_terminal::positions::PosBucket;
use props_terminal::source_fetch::{
    parse_alt_lines_json, parse_injuries_json, parse_lines_json, parse_projections_json,
    parse_schedule_json, parse_trends_json,
};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_lines_fixture() {
    let raw = read_fixture("lines.json");
    let rows = parse_lines_json(&raw).expect("fixture should parse");
    assert_eq!(rows.len(), 3);

    let maya = &rows[0];
    assert_eq!(maya.id, "w123-points");
    assert_eq!(maya.game_id, "g100");
    assert_eq!(maya.home_team.as_deref(), Some("NYL"));
    let points = maya.summaries.get(&StatKey::Points).expect("points summary");
    assert_eq!(points.manual_ou, Some(18.5));
    assert_eq!(points.over_price, Some(-115.0));
    assert_eq!(points.under_price, Some(-105.0));
    // A null summary object means the market carries no prices at all.
    assert!(!maya.summaries.contains_key(&StatKey::Rebounds));
    // Placeholder text prices fold to None but the summary itself exists.
    let assists = maya
        .summaries
        .get(&StatKey::Assists)
        .expect("assists summary");
    assert_eq!(assists.over_price, None);
    assert_eq!(assists.under_price, None);

    let tess = &rows[1];
    assert_eq!(tess.home_team, None);
    assert_eq!(tess.away_team, None);
}

#[test]
fn parses_projections_fixture_with_nested_key_variant() {
    let raw = read_fixture("projections.json");
    let rows = parse_projections_json(&raw).expect("fixture should parse");
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].projections.get(&StatKey::Points), Some(&20.0));
    assert_eq!(rows[0].lines.get(&StatKey::Points), Some(&18.0));

    // The second record nests values under "projection" and has no lines.
    assert_eq!(rows[1].projections.get(&StatKey::Points), Some(&11.5));
    assert!(rows[1].lines.is_empty());
}

#[test]
fn parses_trends_fixture() {
    let raw = read_fixture("trends.json");
    let rows = parse_trends_json(&raw).expect("fixture should parse");
    assert_eq!(rows.len(), 2);

    let maya = rows[0].bucket(StatKey::Points).expect("points bucket");
    assert_eq!(maya.l5_rate, Some(80.0));
    // Quoted rates parse like numeric ones.
    assert_eq!(maya.l20_rate, Some(65.0));
    assert_eq!(maya.streak, Some(3.0));
    assert!(rows[0].bucket(StatKey::Rebounds).is_none());

    let tess = rows[1].bucket(StatKey::Points).expect("points bucket");
    assert_eq!(tess.current_season, None);
    assert_eq!(tess.all, Some(45.0));
    assert_eq!(tess.streak, Some(-2.0));
}

#[test]
fn parses_injuries_schedule_and_alt_lines() {
    let injuries = parse_injuries_json(&read_fixture("injuries.json")).expect("injuries");
    assert_eq!(injuries.len(), 1);
    assert_eq!(injuries[0].status, "GTD");
    assert!(!injuries[0].is_out);

    let schedule = parse_schedule_json(&read_fixture("schedule.json")).expect("schedule");
    assert_eq!(schedule.len(), 2);
    assert_eq!(schedule[0].home, "NYL");

    let alt = parse_alt_lines_json(&read_fixture("alt_lines.json")).expect("alt lines");
    assert_eq!(alt.len(), 1);
    assert_eq!(alt[0].prop, "points");
    assert_eq!(alt[0].markets.len(), 2);
}

#[test]
fn parses_def_vs_pos_fixture() {
    let raw = read_fixture("def_vs_pos.json");
    let map = parse_dvp_json("SEA", &raw).expect("fixture should parse");
    assert_eq!(map.team, "SEA");
    assert_eq!(map.rank_for(PosBucket::PG, StatKey::Points), Some(3));
    assert_eq!(map.rank_for(PosBucket::C, StatKey::Points), Some(11));
    assert_eq!(map.rank_for(PosBucket::PG, StatKey::Rebounds), Some(7));
    assert_eq!(map.rank_for(PosBucket::SF, StatKey::Assists), Some(13));
    // Null rank entries and unknown stat sections never land in the map.
    assert_eq!(map.rank_for(PosBucket::PG, StatKey::Assists), None);
}

#[test]
fn null_bodies_parse_to_empty_collections() {
    assert!(parse_lines_json("null").expect("null").is_empty());
    assert!(parse_projections_json("null").expect("null").is_empty());
    assert!(parse_trends_json("").expect("empty").is_empty());
    assert!(parse_injuries_json("null").expect("null").is_empty());
    assert!(parse_schedule_json("null").expect("null").is_empty());
    assert!(parse_alt_lines_json("null").expect("null").is_empty());
}
