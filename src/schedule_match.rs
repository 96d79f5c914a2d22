use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::models::{LineRow, ScheduleGame};
use crate::teams::LeagueTeams;

/// Kickoff drift tolerated when matching a line to a scheduled game by
/// start time alone.
const KICKOFF_TOLERANCE_SECS: i64 = 6 * 60 * 60;

/// Finds the scheduled game a lines record belongs to. Strategies run in
/// order and the first hit wins; each later tier only exists because some
/// upstream snapshots ship partial data.
pub fn find_game<'a>(
    line: &LineRow,
    schedule: &'a [ScheduleGame],
    teams: &LeagueTeams,
) -> Option<&'a ScheduleGame> {
    if schedule.is_empty() {
        return None;
    }
    by_game_id(line, schedule)
        .or_else(|| by_team_pair(line, schedule, teams))
        .or_else(|| by_single_side(line, schedule, teams))
        .or_else(|| by_kickoff_window(line, schedule, teams))
}

/// The other team in `game`, from `team_code`'s point of view.
pub fn derive_opponent(
    team_code: &str,
    game: &ScheduleGame,
    teams: &LeagueTeams,
) -> Option<String> {
    let home = teams.normalize(Some(&game.home))?;
    let away = teams.normalize(Some(&game.away))?;
    if team_code == home {
        Some(away)
    } else if team_code == away {
        Some(home)
    } else {
        None
    }
}

/// Last resort when no schedule entry matched: read the opponent off the
/// line record's own home/away fields.
pub fn degenerate_opponent(line: &LineRow, teams: &LeagueTeams) -> Option<String> {
    let team = teams.normalize(Some(&line.team))?;
    let home = teams.normalize(line.home_team.as_deref());
    let away = teams.normalize(line.away_team.as_deref());
    match (home, away) {
        (Some(home), Some(away)) => {
            if team == home {
                Some(away)
            } else {
                Some(home)
            }
        }
        (Some(home), None) if home != team => Some(home),
        (None, Some(away)) if away != team => Some(away),
        _ => None,
    }
}

fn by_game_id<'a>(line: &LineRow, schedule: &'a [ScheduleGame]) -> Option<&'a ScheduleGame> {
    if line.game_id.is_empty() {
        return None;
    }
    schedule.iter().find(|g| g.id == line.game_id)
}

fn by_team_pair<'a>(
    line: &LineRow,
    schedule: &'a [ScheduleGame],
    teams: &LeagueTeams,
) -> Option<&'a ScheduleGame> {
    let (first, second) = line_pair(line, teams)?;
    schedule.iter().find(|g| {
        let Some(home) = teams.normalize(Some(&g.home)) else {
            return false;
        };
        let Some(away) = teams.normalize(Some(&g.away)) else {
            return false;
        };
        (home == first && away == second) || (home == second && away == first)
    })
}

fn by_single_side<'a>(
    line: &LineRow,
    schedule: &'a [ScheduleGame],
    teams: &LeagueTeams,
) -> Option<&'a ScheduleGame> {
    // Only for records with no pair data at all; a record that names both
    // teams but matched nothing falls through to the kickoff window, where
    // a stale pair cannot glue the row to the wrong game.
    if line_pair(line, teams).is_some() {
        return None;
    }
    let wanted = line_codes(line, teams);
    if wanted.is_empty() {
        return None;
    }
    schedule.iter().find(|g| game_involves(g, &wanted, teams))
}

fn by_kickoff_window<'a>(
    line: &LineRow,
    schedule: &'a [ScheduleGame],
    teams: &LeagueTeams,
) -> Option<&'a ScheduleGame> {
    let start = parse_timestamp(&line.game_start)?;
    let wanted = line_codes(line, teams);
    if wanted.is_empty() {
        return None;
    }
    schedule.iter().find(|g| {
        let Some(kickoff) = game_timestamp(g) else {
            return false;
        };
        (kickoff - start).abs() <= KICKOFF_TOLERANCE_SECS && game_involves(g, &wanted, teams)
    })
}

/// Both teams of the line's game, from its explicit home/away fields or
/// failing that the team plus the opponent implied by those fields.
fn line_pair(line: &LineRow, teams: &LeagueTeams) -> Option<(String, String)> {
    let home = teams.normalize(line.home_team.as_deref());
    let away = teams.normalize(line.away_team.as_deref());
    if let (Some(home), Some(away)) = (home, away) {
        return Some((home, away));
    }
    let team = teams.normalize(Some(&line.team))?;
    let opp = degenerate_opponent(line, teams)?;
    Some((team, opp))
}

fn line_codes(line: &LineRow, teams: &LeagueTeams) -> Vec<String> {
    let mut codes = Vec::new();
    if let Some(team) = teams.normalize(Some(&line.team)) {
        codes.push(team);
    }
    if let Some(opp) = degenerate_opponent(line, teams) {
        if !codes.contains(&opp) {
            codes.push(opp);
        }
    }
    codes
}

fn game_involves(game: &ScheduleGame, wanted: &[String], teams: &LeagueTeams) -> bool {
    let home = teams.normalize(Some(&game.home));
    let away = teams.normalize(Some(&game.away));
    wanted
        .iter()
        .any(|code| home.as_deref() == Some(code) || away.as_deref() == Some(code))
}

fn game_timestamp(game: &ScheduleGame) -> Option<i64> {
    parse_timestamp(&game.time).or_else(|| parse_timestamp(&game.date))
}

pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.timestamp());
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(Utc.from_utc_datetime(&naive).timestamp());
        }
    }
    None
}

/// Short kickoff label for the table's TIME column.
pub fn kickoff_label(raw: &str) -> Option<String> {
    let ts = parse_timestamp(raw)?;
    let dt = DateTime::<Utc>::from_timestamp(ts, 0)?;
    Some(dt.format("%m/%d %H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineRow;

    fn game(id: &str, time: &str, home: &str, away: &str) -> ScheduleGame {
        ScheduleGame {
            id: id.to_string(),
            date: time.split('T').next().unwrap_or_default().to_string(),
            time: time.to_string(),
            home: home.to_string(),
            away: away.to_string(),
        }
    }

    fn line(game_id: &str, team: &str, home: Option<&str>, away: Option<&str>) -> LineRow {
        LineRow {
            id: "p1-points".to_string(),
            name: "Player One".to_string(),
            team: team.to_string(),
            game_id: game_id.to_string(),
            home_team: home.map(str::to_string),
            away_team: away.map(str::to_string),
            game_start: "2025-07-04T23:00:00Z".to_string(),
            ..LineRow::default()
        }
    }

    #[test]
    fn game_id_match_beats_conflicting_team_fields() {
        let teams = LeagueTeams::wnba();
        let schedule = vec![
            game("g1", "2025-07-04T23:00:00Z", "NYL", "SEA"),
            game("g2", "2025-07-04T23:00:00Z", "MIN", "PHX"),
        ];
        // Home/away fields claim a different pairing; the declared id wins.
        let l = line("g1", "NYL", Some("MIN"), Some("PHX"));
        let found = find_game(&l, &schedule, &teams).expect("game");
        assert_eq!(found.id, "g1");
        assert_eq!(
            derive_opponent("NYL", found, &teams).as_deref(),
            Some("SEA")
        );
    }

    #[test]
    fn unordered_pair_match_ignores_side() {
        let teams = LeagueTeams::wnba();
        let schedule = vec![game("g9", "2025-07-04T23:00:00Z", "SEA", "NYL")];
        let l = line("", "NYL", Some("New York Liberty"), Some("Seattle Storm"));
        let found = find_game(&l, &schedule, &teams).expect("game");
        assert_eq!(found.id, "g9");
    }

    #[test]
    fn single_side_match_handles_partial_data() {
        let teams = LeagueTeams::wnba();
        let schedule = vec![game("g3", "2025-07-04T23:00:00Z", "CHI", "IND")];
        let l = line("", "IND", None, None);
        let found = find_game(&l, &schedule, &teams).expect("game");
        assert_eq!(found.id, "g3");
        assert_eq!(
            derive_opponent("IND", found, &teams).as_deref(),
            Some("CHI")
        );
    }

    #[test]
    fn kickoff_window_rescues_a_stale_team_pair() {
        let teams = LeagueTeams::wnba();
        // The line names a pairing that matches no scheduled game, so the
        // pair tier fails; the kickoff window picks the WAS game within
        // six hours and rejects the one two days out.
        let schedule = vec![
            game("far", "2025-07-06T23:00:00Z", "DAL", "WAS"),
            game("near", "2025-07-05T01:30:00Z", "WAS", "ATL"),
        ];
        let mut l = line("", "WAS", Some("WAS"), Some("LVA"));
        l.game_start = "2025-07-04T23:00:00Z".to_string();
        let found = find_game(&l, &schedule, &teams).expect("game");
        assert_eq!(found.id, "near");
    }

    #[test]
    fn no_match_yields_none_and_degenerate_opponent_still_works() {
        let teams = LeagueTeams::wnba();
        let l = line("", "LVA", Some("LVA"), Some("PHX"));
        assert!(find_game(&l, &[], &teams).is_none());
        assert_eq!(degenerate_opponent(&l, &teams).as_deref(), Some("PHX"));

        let bare = line("", "LVA", None, None);
        assert_eq!(degenerate_opponent(&bare, &teams), None);
    }

    #[test]
    fn kickoff_label_is_month_day_time() {
        assert_eq!(
            kickoff_label("2025-07-04T23:00:00Z").as_deref(),
            Some("07/04 23:00")
        );
        assert_eq!(kickoff_label("not a time"), None);
    }
}
