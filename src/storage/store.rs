use anyhow::Result;

use super::db;
use super::records::{RunRecord, StoredRun, UserIdentity, UserRecord};
use crate::analysis::walker::Attempt;

// Convenience wrappers that open the default database for each call.

pub fn save_run(user: &UserIdentity, run: &RunRecord, history: &[Attempt]) -> Result<i64> {
    let mut conn = db::open_db()?;
    db::save_run(&mut conn, user, run, history)
}

/// Latest run of every user.
pub fn load_summaries() -> Result<Vec<StoredRun>> {
    let conn = db::open_db()?;
    db::load_summaries(&conn)
}

pub fn find_user(first_name: &str, last_name: &str) -> Result<Option<UserRecord>> {
    let conn = db::open_db()?;
    db::find_user(&conn, first_name, last_name)
}

/// Look up a user, failing with a helpful message if they have no runs.
pub fn require_user(first_name: &str, last_name: &str) -> Result<UserRecord> {
    find_user(first_name, last_name)?.ok_or_else(|| {
        anyhow::anyhow!(
            "No results for {first_name} {last_name}. Run `voxrange test --name {first_name} {last_name}` first."
        )
    })
}

pub fn load_latest_run(user_id: i64) -> Result<Option<StoredRun>> {
    let conn = db::open_db()?;
    db::load_latest_run(&conn, user_id)
}

pub fn count_runs(user_id: i64) -> Result<u32> {
    let conn = db::open_db()?;
    db::count_runs(&conn, user_id)
}

pub fn load_attempts(run_id: i64) -> Result<Vec<Attempt>> {
    let conn = db::open_db()?;
    db::load_attempts(&conn, run_id)
}

pub fn reset() -> Result<()> {
    let conn = db::open_db()?;
    db::reset(&conn)
}
