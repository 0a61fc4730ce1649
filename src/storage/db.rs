use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

use super::records::{RunRecord, StoredRun, UserIdentity, UserRecord};
use crate::analysis::summary::RangeSummary;
use crate::analysis::voice_type::Gender;
use crate::analysis::walker::{Attempt, Direction};

/// Open (or create) the SQLite database at the configured path.
pub fn open_db() -> Result<Connection> {
    let path = crate::paths::db_path();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let conn = Connection::open(&path)
        .with_context(|| format!("Failed to open database: {}", path.display()))?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("Failed to set database pragmas")?;

    init_schema(&conn)?;
    Ok(conn)
}

/// Create tables if they don't exist. Idempotent.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            gender TEXT NOT NULL CHECK (gender IN ('male', 'female')),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(first_name, last_name, gender)
        );

        CREATE TABLE IF NOT EXISTS test_results (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            start_note TEXT NOT NULL,
            min_hz REAL NOT NULL,
            max_hz REAL NOT NULL,
            range_width_hz REAL NOT NULL,
            octave_width REAL NOT NULL,
            note_count INTEGER NOT NULL,
            lowest_note TEXT,
            highest_note TEXT,
            voice_type TEXT,
            match_percent REAL NOT NULL,
            possible_groups TEXT NOT NULL,
            confirmed TEXT NOT NULL,
            down_stop TEXT NOT NULL,
            up_stop TEXT NOT NULL,
            tested_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS attempts (
            id INTEGER PRIMARY KEY,
            test_result_id INTEGER NOT NULL REFERENCES test_results(id) ON DELETE CASCADE,
            seq INTEGER NOT NULL,
            note_name TEXT NOT NULL,
            target_hz REAL NOT NULL,
            detected_hz REAL NOT NULL,
            score REAL NOT NULL,
            signal_power REAL NOT NULL,
            attempt_number INTEGER NOT NULL,
            is_success INTEGER NOT NULL,
            direction TEXT NOT NULL CHECK (direction IN ('down', 'up')),
            UNIQUE(test_result_id, seq)
        );",
    )
    .context("Failed to initialize database schema")?;

    Ok(())
}

/// Find or create the user, returning their id.
pub fn upsert_user(conn: &Connection, user: &UserIdentity) -> Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO users (first_name, last_name, gender) VALUES (?1, ?2, ?3)",
        rusqlite::params![user.first_name, user.last_name, user.gender.as_str()],
    )
    .context("Failed to insert user")?;

    conn.query_row(
        "SELECT id FROM users WHERE first_name = ?1 AND last_name = ?2 AND gender = ?3",
        rusqlite::params![user.first_name, user.last_name, user.gender.as_str()],
        |row| row.get(0),
    )
    .context("Failed to get user id")
}

/// Look a user up by name. With both genders on file the most recently
/// created one wins.
pub fn find_user(conn: &Connection, first_name: &str, last_name: &str) -> Result<Option<UserRecord>> {
    let probe = UserIdentity::new(first_name, last_name, Gender::Male);

    let row = conn
        .query_row(
            "SELECT id, first_name, last_name, gender FROM users
             WHERE first_name = ?1 AND last_name = ?2
             ORDER BY created_at DESC, id DESC LIMIT 1",
            rusqlite::params![probe.first_name, probe.last_name],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()
        .context("Failed to query user")?;

    row.map(|(id, first_name, last_name, gender)| -> Result<UserRecord> {
        Ok(UserRecord {
            id,
            first_name,
            last_name,
            gender: parse_gender(&gender)?,
        })
    })
    .transpose()
}

/// Save a finished range test and its attempt history in one transaction.
/// Every run is kept; readers pick the latest per user.
pub fn save_run(
    conn: &mut Connection,
    user: &UserIdentity,
    run: &RunRecord,
    history: &[Attempt],
) -> Result<i64> {
    let tx = conn.transaction().context("Failed to begin transaction")?;

    let user_id = upsert_user(&tx, user)?;

    let confirmed = serde_json::to_string(&run.confirmed).context("Failed to serialize notes")?;
    let down_stop = serde_json::to_string(&run.down_stop).context("Failed to serialize stop")?;
    let up_stop = serde_json::to_string(&run.up_stop).context("Failed to serialize stop")?;

    tx.execute(
        "INSERT INTO test_results (
            user_id, start_note, min_hz, max_hz, range_width_hz, octave_width,
            note_count, lowest_note, highest_note, voice_type, match_percent,
            possible_groups, confirmed, down_stop, up_stop
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        rusqlite::params![
            user_id,
            run.start_note,
            run.range.min_hz,
            run.range.max_hz,
            run.range.width_hz(),
            run.range.octaves(),
            run.range.note_count,
            run.range.lowest_note,
            run.range.highest_note,
            run.voice_type,
            run.match_percent,
            run.possible_groups.join(","),
            confirmed,
            down_stop,
            up_stop,
        ],
    )
    .context("Failed to insert test result")?;
    let run_id = tx.last_insert_rowid();

    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO attempts (
                    test_result_id, seq, note_name, target_hz, detected_hz, score,
                    signal_power, attempt_number, is_success, direction
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )
            .context("Failed to prepare attempt insert")?;

        for (seq, a) in history.iter().enumerate() {
            stmt.execute(rusqlite::params![
                run_id,
                seq as i64,
                a.note_name,
                a.target_hz,
                a.detected_hz,
                a.score,
                a.signal_power,
                a.attempt_number,
                a.is_success,
                a.direction.as_str(),
            ])
            .with_context(|| format!("Failed to insert attempt {seq}"))?;
        }
    }

    tx.commit().context("Failed to commit test result")?;
    log::debug!("saved run {run_id} with {} attempts", history.len());
    Ok(run_id)
}

const RUN_COLUMNS: &str = "tr.id, tr.tested_at, u.id, u.first_name, u.last_name, u.gender,
     tr.start_note, tr.min_hz, tr.max_hz, tr.note_count, tr.lowest_note, tr.highest_note,
     tr.voice_type, tr.match_percent, tr.possible_groups, tr.confirmed, tr.down_stop, tr.up_stop";

/// Raw row before JSON decoding, so decode errors surface as anyhow errors
/// with context instead of rusqlite conversion errors.
struct RunRow {
    id: i64,
    tested_at: String,
    user_id: i64,
    first_name: String,
    last_name: String,
    gender: String,
    start_note: String,
    min_hz: f32,
    max_hz: f32,
    note_count: u32,
    lowest_note: Option<String>,
    highest_note: Option<String>,
    voice_type: Option<String>,
    match_percent: f32,
    possible_groups: String,
    confirmed: String,
    down_stop: String,
    up_stop: String,
}

fn read_run_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRow> {
    Ok(RunRow {
        id: row.get(0)?,
        tested_at: row.get(1)?,
        user_id: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        gender: row.get(5)?,
        start_note: row.get(6)?,
        min_hz: row.get(7)?,
        max_hz: row.get(8)?,
        note_count: row.get(9)?,
        lowest_note: row.get(10)?,
        highest_note: row.get(11)?,
        voice_type: row.get(12)?,
        match_percent: row.get(13)?,
        possible_groups: row.get(14)?,
        confirmed: row.get(15)?,
        down_stop: row.get(16)?,
        up_stop: row.get(17)?,
    })
}

impl RunRow {
    fn decode(self) -> Result<StoredRun> {
        let run_id = self.id;
        let json_err = || format!("Corrupt JSON in test result {run_id}");

        Ok(StoredRun {
            id: self.id,
            tested_at: self.tested_at,
            user: UserRecord {
                id: self.user_id,
                first_name: self.first_name,
                last_name: self.last_name,
                gender: parse_gender(&self.gender)?,
            },
            run: RunRecord {
                start_note: self.start_note,
                range: RangeSummary {
                    min_hz: self.min_hz,
                    max_hz: self.max_hz,
                    lowest_note: self.lowest_note,
                    highest_note: self.highest_note,
                    note_count: self.note_count,
                },
                voice_type: self.voice_type,
                match_percent: self.match_percent,
                possible_groups: self
                    .possible_groups
                    .split(',')
                    .filter(|g| !g.is_empty())
                    .map(str::to_string)
                    .collect(),
                confirmed: serde_json::from_str(&self.confirmed).with_context(json_err)?,
                down_stop: serde_json::from_str(&self.down_stop).with_context(json_err)?,
                up_stop: serde_json::from_str(&self.up_stop).with_context(json_err)?,
            },
        })
    }
}

/// Latest run of every user, in user-creation order. This is the input the
/// leaderboard ranks; no ordering by score happens in SQL.
pub fn load_summaries(conn: &Connection) -> Result<Vec<StoredRun>> {
    let sql = format!(
        "SELECT {RUN_COLUMNS}
         FROM test_results tr
         JOIN users u ON tr.user_id = u.id
         WHERE tr.id = (SELECT MAX(id) FROM test_results WHERE user_id = u.id)
         ORDER BY u.id"
    );

    let mut stmt = conn.prepare(&sql).context("Failed to prepare summary query")?;
    let rows = stmt
        .query_map([], read_run_row)
        .context("Failed to query summaries")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read summary row")?;

    rows.into_iter().map(RunRow::decode).collect()
}

/// The user's most recent run.
pub fn load_latest_run(conn: &Connection, user_id: i64) -> Result<Option<StoredRun>> {
    let sql = format!(
        "SELECT {RUN_COLUMNS}
         FROM test_results tr
         JOIN users u ON tr.user_id = u.id
         WHERE tr.user_id = ?1
         ORDER BY tr.id DESC LIMIT 1"
    );

    let row = conn
        .query_row(&sql, [user_id], read_run_row)
        .optional()
        .context("Failed to query latest run")?;

    row.map(RunRow::decode).transpose()
}

/// Number of runs the user has saved.
pub fn count_runs(conn: &Connection, user_id: i64) -> Result<u32> {
    conn.query_row(
        "SELECT COUNT(*) FROM test_results WHERE user_id = ?1",
        [user_id],
        |row| row.get(0),
    )
    .context("Failed to count runs")
}

/// A run's attempt history in the order the attempts happened.
pub fn load_attempts(conn: &Connection, run_id: i64) -> Result<Vec<Attempt>> {
    let mut stmt = conn
        .prepare(
            "SELECT note_name, target_hz, attempt_number, detected_hz, score,
                    signal_power, is_success, direction
             FROM attempts WHERE test_result_id = ?1 ORDER BY seq",
        )
        .context("Failed to prepare attempts query")?;

    let rows = stmt
        .query_map([run_id], |row| {
            Ok((
                Attempt {
                    note_name: row.get(0)?,
                    target_hz: row.get(1)?,
                    attempt_number: row.get(2)?,
                    detected_hz: row.get(3)?,
                    score: row.get(4)?,
                    signal_power: row.get(5)?,
                    is_success: row.get(6)?,
                    direction: Direction::Down,
                },
                row.get::<_, String>(7)?,
            ))
        })
        .context("Failed to query attempts")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read attempt row")?;

    rows.into_iter()
        .map(|(mut attempt, dir)| -> Result<Attempt> {
            attempt.direction = Direction::parse(&dir)
                .with_context(|| format!("Invalid direction '{dir}' in run {run_id}"))?;
            Ok(attempt)
        })
        .collect()
}

/// Delete every user, run and attempt.
pub fn reset(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "DELETE FROM attempts;
         DELETE FROM test_results;
         DELETE FROM users;",
    )
    .context("Failed to clear database")
}

fn parse_gender(s: &str) -> Result<Gender> {
    Gender::parse(s).with_context(|| format!("Invalid gender '{s}' in database"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::walker::{ConfirmedNote, StopReason};
    use crate::notes::CATALOGUE;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn note(name: &str, hz: f32) -> ConfirmedNote {
        ConfirmedNote {
            note_name: name.into(),
            target_hz: hz,
            detected_hz: hz,
            score: 97.5,
            voice_range: "Tenor".into(),
        }
    }

    fn run(notes: Vec<ConfirmedNote>) -> RunRecord {
        RunRecord {
            start_note: "C3".into(),
            range: RangeSummary::from_notes(&notes),
            voice_type: Some("Baritone".into()),
            match_percent: 88.0,
            possible_groups: vec!["Bass".into(), "Baritone".into()],
            confirmed: notes,
            down_stop: StopReason::LowVolume { note: "F2".into() },
            up_stop: StopReason::BelowThreshold { note: "A3".into() },
        }
    }

    fn history() -> Vec<Attempt> {
        vec![
            Attempt::new(&CATALOGUE[7], 1, 130.9, 99.0, 0.2, true, Direction::Down),
            Attempt::new(&CATALOGUE[6], 1, 0.0, 0.0, 0.001, false, Direction::Down),
            Attempt::new(&CATALOGUE[8], 2, 180.0, 12.0, 0.3, false, Direction::Up),
        ]
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = test_db();
        init_schema(&conn).unwrap();
    }

    #[test]
    fn save_and_load_latest_run() {
        let mut conn = test_db();
        let user = UserIdentity::new("ada", "lovelace", Gender::Female);
        let r = run(vec![note("C3", 130.81), note("D3", 146.83)]);

        let run_id = save_run(&mut conn, &user, &r, &history()).unwrap();

        let found = find_user(&conn, "Ada", "Lovelace").unwrap().unwrap();
        assert_eq!(found.full_name(), "Ada Lovelace");
        assert_eq!(found.gender, Gender::Female);

        let stored = load_latest_run(&conn, found.id).unwrap().unwrap();
        assert_eq!(stored.id, run_id);
        assert_eq!(stored.run, r);
        assert!(!stored.tested_at.is_empty());
    }

    #[test]
    fn attempts_roundtrip_in_order() {
        let mut conn = test_db();
        let user = UserIdentity::new("Ada", "Lovelace", Gender::Female);
        let h = history();
        let run_id = save_run(&mut conn, &user, &run(vec![note("C3", 130.81)]), &h).unwrap();

        let loaded = load_attempts(&conn, run_id).unwrap();
        assert_eq!(loaded, h);
        assert_eq!(loaded[2].direction, Direction::Up);
    }

    #[test]
    fn summaries_use_latest_run_per_user() {
        let mut conn = test_db();
        let ada = UserIdentity::new("Ada", "Lovelace", Gender::Female);
        let alan = UserIdentity::new("Alan", "Turing", Gender::Male);

        save_run(&mut conn, &ada, &run(vec![note("C3", 130.81)]), &[]).unwrap();
        save_run(&mut conn, &alan, &run(vec![note("A2", 110.0), note("A3", 220.0)]), &[]).unwrap();
        save_run(
            &mut conn,
            &ada,
            &run(vec![note("C4", 261.63), note("C5", 523.25)]),
            &[],
        )
        .unwrap();

        let summaries = load_summaries(&conn).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].user.first_name, "Ada");
        assert!((summaries[0].run.range.octaves() - 1.0).abs() < 0.01);
        assert_eq!(summaries[1].user.first_name, "Alan");

        let ada_id = find_user(&conn, "ada", "lovelace").unwrap().unwrap().id;
        assert_eq!(count_runs(&conn, ada_id).unwrap(), 2);
    }

    #[test]
    fn empty_run_is_storable() {
        let mut conn = test_db();
        let user = UserIdentity::new("Quiet", "Singer", Gender::Male);
        let mut r = run(vec![]);
        r.voice_type = None;
        r.possible_groups.clear();
        save_run(&mut conn, &user, &r, &[]).unwrap();

        let stored = &load_summaries(&conn).unwrap()[0];
        assert!(stored.run.range.is_empty());
        assert!(stored.run.possible_groups.is_empty());
        assert_eq!(stored.run.score_summary().composite_score(), 0.0);
    }

    #[test]
    fn unknown_user_is_none() {
        let conn = test_db();
        assert!(find_user(&conn, "Nobody", "Here").unwrap().is_none());
        assert!(load_latest_run(&conn, 42).unwrap().is_none());
    }

    #[test]
    fn same_user_is_not_duplicated() {
        let conn = test_db();
        let u = UserIdentity::new("Ada", "Lovelace", Gender::Female);
        let a = upsert_user(&conn, &u).unwrap();
        let b = upsert_user(&conn, &UserIdentity::new("ADA", "lovelace", Gender::Female)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn reset_clears_everything() {
        let mut conn = test_db();
        let user = UserIdentity::new("Ada", "Lovelace", Gender::Female);
        let run_id = save_run(&mut conn, &user, &run(vec![note("C3", 130.81)]), &history()).unwrap();

        reset(&conn).unwrap();
        assert!(load_summaries(&conn).unwrap().is_empty());
        assert!(load_attempts(&conn, run_id).unwrap().is_empty());
        assert!(find_user(&conn, "Ada", "Lovelace").unwrap().is_none());
    }
}
