//! Record store queries

use super::{models::*, schema::SyncDatabase};
use crate::cli::types::{AthleteApiId, Sport, TeamApiId};
use crate::Result;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const TEAM_COLUMNS: &str =
    "t.id, t.api_id, t.sport, t.name, t.key, t.location, t.primary_color, t.secondary_color";

const ATHLETE_COLUMNS: &str = "a.id, a.api_id, a.team_id, a.first_name, a.last_name, a.position,
     a.salary, a.jersey, a.is_active, a.is_injured, a.nft_image, a.nft_animation";

const STAT_COLUMNS: &str = "s.fantasy_score, s.completion, s.carries, s.passing_yards,
     s.rushing_yards, s.receiving_yards, s.interceptions, s.passing_touchdowns,
     s.rushing_touchdowns, s.receiving_touchdowns, s.targets, s.receptions";

impl SyncDatabase {
    // --- Teams ---

    pub fn count_teams(&self, sport: Sport) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM teams WHERE sport = ?",
            params![sport],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Insert a team unless (sport, api_id) already exists. Returns true if inserted.
    pub fn insert_team_if_absent(&mut self, team: &NewTeam) -> Result<bool> {
        insert_team(&self.conn, team)
    }

    /// Insert every team in one transaction, one outcome per input row.
    ///
    /// A row-scoped failure (a constraint violation) is reported in its slot
    /// and the rest still go in. Any other failure rolls the whole batch back
    /// and is returned, so the table never holds part of a feed.
    pub fn insert_teams_if_absent(&mut self, teams: &[NewTeam]) -> Result<Vec<Result<bool>>> {
        let tx = self.conn.transaction()?;
        let mut outcomes = Vec::with_capacity(teams.len());
        for team in teams {
            match insert_team(&tx, team) {
                Err(e) if !e.is_row_scoped() => return Err(e),
                outcome => outcomes.push(outcome),
            }
        }
        tx.commit()?;
        Ok(outcomes)
    }

    pub fn team_by_api_id(&self, sport: Sport, api_id: TeamApiId) -> Result<Option<Team>> {
        let sql = format!("SELECT {TEAM_COLUMNS} FROM teams t WHERE t.sport = ? AND t.api_id = ?");
        let team = self
            .conn
            .query_row(&sql, params![sport, api_id.as_u64()], |row| {
                Self::row_to_team(row, 0)
            })
            .optional()?;
        Ok(team)
    }

    pub fn teams_for_sport(&self, sport: Sport) -> Result<Vec<Team>> {
        let sql = format!("SELECT {TEAM_COLUMNS} FROM teams t WHERE t.sport = ? ORDER BY t.id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![sport], |row| Self::row_to_team(row, 0))?;

        let mut teams = Vec::new();
        for row in rows {
            teams.push(row?);
        }
        Ok(teams)
    }

    // --- Athletes ---

    pub fn count_athletes(&self, sport: Sport) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM athletes a JOIN teams t ON t.id = a.team_id
             WHERE t.sport = ?",
            params![sport],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Insert an athlete unless its external id is already stored.
    /// Returns true if inserted.
    pub fn insert_athlete_if_absent(&mut self, athlete: &NewAthlete) -> Result<bool> {
        let rows = self.conn.execute(
            "INSERT OR IGNORE INTO athletes
             (api_id, team_id, first_name, last_name, position, salary, jersey,
              is_active, is_injured, nft_image, nft_animation)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                athlete.api_id.as_u64(),
                athlete.team_id,
                athlete.first_name,
                athlete.last_name,
                athlete.position,
                athlete.salary,
                athlete.jersey,
                athlete.is_active,
                athlete.is_injured,
                athlete.nft_image,
                athlete.nft_animation
            ],
        )?;
        Ok(rows > 0)
    }

    pub fn athlete_by_api_id(&self, api_id: AthleteApiId) -> Result<Option<Athlete>> {
        let sql = format!("SELECT {ATHLETE_COLUMNS} FROM athletes a WHERE a.api_id = ?");
        let athlete = self
            .conn
            .query_row(&sql, params![api_id.as_u64()], |row| {
                Self::row_to_athlete(row, 0)
            })
            .optional()?;
        Ok(athlete)
    }

    /// Every stored athlete of `sport` with its team, ordered by id.
    pub fn athletes_with_teams(&self, sport: Sport) -> Result<Vec<(Athlete, Team)>> {
        let sql = format!(
            "SELECT {ATHLETE_COLUMNS}, {TEAM_COLUMNS}
             FROM athletes a JOIN teams t ON t.id = a.team_id
             WHERE t.sport = ?
             ORDER BY a.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![sport], |row| {
            Ok((Self::row_to_athlete(row, 0)?, Self::row_to_team(row, 12)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Athletes with the given external ids and their teams, ordered by id.
    /// Unknown ids are skipped.
    pub fn athletes_with_teams_by_api_ids(
        &self,
        api_ids: &[AthleteApiId],
    ) -> Result<Vec<(Athlete, Team)>> {
        if api_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; api_ids.len()].join(", ");
        let sql = format!(
            "SELECT {ATHLETE_COLUMNS}, {TEAM_COLUMNS}
             FROM athletes a JOIN teams t ON t.id = a.team_id
             WHERE a.api_id IN ({placeholders})
             ORDER BY a.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(api_ids.iter().map(|id| id.as_u64())), |row| {
            Ok((Self::row_to_athlete(row, 0)?, Self::row_to_team(row, 12)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Replace both asset locators in one statement.
    pub fn update_athlete_assets(
        &mut self,
        athlete_id: i64,
        nft_image: &str,
        nft_animation: &str,
    ) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE athletes SET nft_image = ?, nft_animation = ? WHERE id = ?",
            params![nft_image, nft_animation, athlete_id],
        )?;
        Ok(rows > 0)
    }

    // --- Stats ---

    /// Stat row for (athlete external id, season), if one exists.
    pub fn stat_for(&self, api_id: AthleteApiId, season: &str) -> Result<Option<AthleteStat>> {
        let sql = format!(
            "SELECT s.id, s.athlete_id, s.season, s.position, {STAT_COLUMNS}
             FROM athlete_stats s JOIN athletes a ON a.id = s.athlete_id
             WHERE a.api_id = ? AND s.season = ?"
        );
        let stat = self
            .conn
            .query_row(&sql, params![api_id.as_u64(), season], |row| {
                Ok(AthleteStat {
                    id: Some(row.get(0)?),
                    athlete_id: row.get(1)?,
                    season: row.get(2)?,
                    position: row.get(3)?,
                    line: Self::row_to_stat_line(row, 4)?,
                })
            })
            .optional()?;
        Ok(stat)
    }

    /// Persist staged creates and updates, one transaction per batch.
    /// Returns the number of rows written.
    pub fn save_stats(&mut self, stats: &[AthleteStat], batch_size: usize) -> Result<usize> {
        let mut written = 0;
        for batch in stats.chunks(batch_size.max(1)) {
            let tx = self.conn.transaction()?;
            for stat in batch {
                let l = &stat.line;
                written += match stat.id {
                    Some(id) => tx.execute(
                        "UPDATE athlete_stats SET
                            position = COALESCE(?, position),
                            fantasy_score = ?, completion = ?, carries = ?,
                            passing_yards = ?, rushing_yards = ?, receiving_yards = ?,
                            interceptions = ?, passing_touchdowns = ?,
                            rushing_touchdowns = ?, receiving_touchdowns = ?,
                            targets = ?, receptions = ?
                         WHERE id = ?",
                        params![
                            stat.position,
                            l.fantasy_score,
                            l.completion,
                            l.carries,
                            l.passing_yards,
                            l.rushing_yards,
                            l.receiving_yards,
                            l.interceptions,
                            l.passing_touchdowns,
                            l.rushing_touchdowns,
                            l.receiving_touchdowns,
                            l.targets,
                            l.receptions,
                            id
                        ],
                    )?,
                    None => tx.execute(
                        "INSERT INTO athlete_stats
                         (athlete_id, season, position, fantasy_score, completion, carries,
                          passing_yards, rushing_yards, receiving_yards, interceptions,
                          passing_touchdowns, rushing_touchdowns, receiving_touchdowns,
                          targets, receptions)
                         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                         ON CONFLICT (athlete_id, season) DO UPDATE SET
                            position = COALESCE(excluded.position, position),
                            fantasy_score = excluded.fantasy_score,
                            completion = excluded.completion,
                            carries = excluded.carries,
                            passing_yards = excluded.passing_yards,
                            rushing_yards = excluded.rushing_yards,
                            receiving_yards = excluded.receiving_yards,
                            interceptions = excluded.interceptions,
                            passing_touchdowns = excluded.passing_touchdowns,
                            rushing_touchdowns = excluded.rushing_touchdowns,
                            receiving_touchdowns = excluded.receiving_touchdowns,
                            targets = excluded.targets,
                            receptions = excluded.receptions",
                        params![
                            stat.athlete_id,
                            stat.season,
                            stat.position,
                            l.fantasy_score,
                            l.completion,
                            l.carries,
                            l.passing_yards,
                            l.rushing_yards,
                            l.receiving_yards,
                            l.interceptions,
                            l.passing_touchdowns,
                            l.rushing_touchdowns,
                            l.receiving_touchdowns,
                            l.targets,
                            l.receptions
                        ],
                    )?,
                };
            }
            tx.commit()?;
        }
        Ok(written)
    }

    pub fn count_stats(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM athlete_stats", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // --- Games ---

    pub fn insert_game(&mut self, game: &NewGame) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO games
             (game_id, name, description, sport, start_time, end_time, prize, image)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                game.game_id,
                game.name,
                game.description,
                game.sport,
                game.start_time,
                game.end_time,
                game.prize,
                game.image
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_game_team(&mut self, game_id: i64, name: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO game_teams (game_id, name) VALUES (?, ?)",
            params![game_id, name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn add_game_team_athlete(&mut self, game_team_id: i64, athlete_id: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO game_team_athletes (game_team_id, athlete_id) VALUES (?, ?)",
            params![game_team_id, athlete_id],
        )?;
        Ok(())
    }

    pub fn game_team(&self, id: i64) -> Result<Option<GameTeam>> {
        let team = self
            .conn
            .query_row(
                "SELECT id, game_id, name, fantasy_score FROM game_teams WHERE id = ?",
                params![id],
                Self::row_to_game_team,
            )
            .optional()?;
        Ok(team)
    }

    /// Games of `sport` whose window contains `now`, with team rosters loaded.
    pub fn active_games(&self, sport: Sport, now: i64) -> Result<Vec<ActiveGame>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, game_id, name, description, sport, start_time, end_time, prize, image
             FROM games
             WHERE sport = ? AND start_time <= ? AND end_time >= ?
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![sport, now, now], |row| {
            Ok(Game {
                id: row.get(0)?,
                game_id: row.get(1)?,
                name: row.get(2)?,
                description: row.get(3)?,
                sport: row.get(4)?,
                start_time: row.get(5)?,
                end_time: row.get(6)?,
                prize: row.get(7)?,
                image: row.get(8)?,
            })
        })?;
        let mut games = Vec::new();
        for row in rows {
            games.push(row?);
        }

        let mut team_stmt = self.conn.prepare(
            "SELECT id, game_id, name, fantasy_score FROM game_teams
             WHERE game_id = ? ORDER BY id",
        )?;
        let mut roster_stmt = self.conn.prepare(
            "SELECT a.api_id FROM game_team_athletes gta
             JOIN athletes a ON a.id = gta.athlete_id
             WHERE gta.game_team_id = ?
             ORDER BY a.id",
        )?;

        let mut active = Vec::with_capacity(games.len());
        for game in games {
            let mut teams = Vec::new();
            let team_rows = team_stmt.query_map(params![game.id], Self::row_to_game_team)?;
            for team in team_rows {
                let team = team?;
                let athletes = roster_stmt
                    .query_map(params![team.id], |row| {
                        Ok(AthleteApiId::new(row.get::<_, u64>(0)?))
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                teams.push(GameTeamRoster { team, athletes });
            }
            active.push(ActiveGame { game, teams });
        }
        Ok(active)
    }

    /// Overwrite aggregate scores, one transaction per batch.
    pub fn save_game_team_scores(
        &mut self,
        scores: &[GameTeamScore],
        batch_size: usize,
    ) -> Result<usize> {
        let mut written = 0;
        for batch in scores.chunks(batch_size.max(1)) {
            let tx = self.conn.transaction()?;
            {
                let mut stmt = tx.prepare("UPDATE game_teams SET fantasy_score = ? WHERE id = ?")?;
                for score in batch {
                    written += stmt.execute(params![score.fantasy_score, score.game_team_id])?;
                }
            }
            tx.commit()?;
        }
        Ok(written)
    }

    // --- Listing ---

    /// Athletes joined to their stat rows with a non-negative fantasy score.
    pub fn list_athletes(&self, query: &AthleteQuery) -> Result<Vec<AthleteListing>> {
        let mut sql = format!(
            "SELECT {ATHLETE_COLUMNS}, t.key, t.sport, s.season, {STAT_COLUMNS}
             FROM athletes a
             JOIN teams t ON t.id = a.team_id
             JOIN athlete_stats s ON s.athlete_id = a.id
             WHERE s.fantasy_score >= 0"
        );
        let mut args: Vec<String> = Vec::new();

        if let Some(sport) = query.sport {
            sql.push_str(" AND t.sport = ?");
            args.push(sport.tag().to_string());
        }
        if let Some(season) = &query.season {
            sql.push_str(" AND s.season = ?");
            args.push(season.clone());
        }

        sql.push_str(match query.sort {
            AthleteSort::Id => " ORDER BY a.id ASC, s.season ASC",
            AthleteSort::Score => " ORDER BY s.fantasy_score DESC, a.id ASC",
        });

        match (query.limit, query.offset) {
            (Some(limit), offset) => {
                sql.push_str(&format!(" LIMIT {limit} OFFSET {}", offset.unwrap_or(0)))
            }
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
            Ok(AthleteListing {
                athlete: Self::row_to_athlete(row, 0)?,
                team_key: row.get(12)?,
                sport: row.get(13)?,
                season: row.get(14)?,
                stats: Self::row_to_stat_line(row, 15)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    // --- Row mapping ---

    fn row_to_team(row: &Row, at: usize) -> rusqlite::Result<Team> {
        Ok(Team {
            id: row.get(at)?,
            api_id: TeamApiId::new(row.get(at + 1)?),
            sport: row.get(at + 2)?,
            name: row.get(at + 3)?,
            key: row.get(at + 4)?,
            location: row.get(at + 5)?,
            primary_color: row.get(at + 6)?,
            secondary_color: row.get(at + 7)?,
        })
    }

    fn row_to_athlete(row: &Row, at: usize) -> rusqlite::Result<Athlete> {
        Ok(Athlete {
            id: row.get(at)?,
            api_id: AthleteApiId::new(row.get(at + 1)?),
            team_id: row.get(at + 2)?,
            first_name: row.get(at + 3)?,
            last_name: row.get(at + 4)?,
            position: row.get(at + 5)?,
            salary: row.get(at + 6)?,
            jersey: row.get(at + 7)?,
            is_active: row.get(at + 8)?,
            is_injured: row.get(at + 9)?,
            nft_image: row.get(at + 10)?,
            nft_animation: row.get(at + 11)?,
        })
    }

    fn row_to_stat_line(row: &Row, at: usize) -> rusqlite::Result<StatLine> {
        Ok(StatLine {
            fantasy_score: row.get(at)?,
            completion: row.get(at + 1)?,
            carries: row.get(at + 2)?,
            passing_yards: row.get(at + 3)?,
            rushing_yards: row.get(at + 4)?,
            receiving_yards: row.get(at + 5)?,
            interceptions: row.get(at + 6)?,
            passing_touchdowns: row.get(at + 7)?,
            rushing_touchdowns: row.get(at + 8)?,
            receiving_touchdowns: row.get(at + 9)?,
            targets: row.get(at + 10)?,
            receptions: row.get(at + 11)?,
        })
    }

    fn row_to_game_team(row: &Row) -> rusqlite::Result<GameTeam> {
        Ok(GameTeam {
            id: row.get(0)?,
            game_id: row.get(1)?,
            name: row.get(2)?,
            fantasy_score: row.get(3)?,
        })
    }
}

fn insert_team(conn: &Connection, team: &NewTeam) -> Result<bool> {
    let rows = conn.execute(
        "INSERT INTO teams
         (api_id, sport, name, key, location, primary_color, secondary_color)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (sport, api_id) DO NOTHING",
        params![
            team.api_id.as_u64(),
            team.sport,
            team.name,
            team.key,
            team.location,
            team.primary_color,
            team.secondary_color
        ],
    )?;
    Ok(rows > 0)
}
