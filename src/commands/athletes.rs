//! Athlete listing.

use crate::storage::{lock_db, AthleteListing, AthleteQuery, SharedDatabase};
use crate::Result;

/// Stored athletes with a non-negative fantasy score, filtered and paged.
pub fn list_athletes(db: &SharedDatabase, query: &AthleteQuery) -> Result<Vec<AthleteListing>> {
    lock_db(db)?.list_athletes(query)
}

/// Print the listing as pretty JSON or one line per row.
pub fn handle_athletes(db: &SharedDatabase, query: &AthleteQuery, as_json: bool) -> Result<()> {
    let rows = list_athletes(db, query)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for row in &rows {
        let athlete = &row.athlete;
        let status = match (athlete.is_active, athlete.is_injured) {
            (_, true) => "[Injured]",
            (true, false) => "[Active]",
            (false, false) => "[Inactive]",
        };
        println!(
            "{} {} {} ({}) {} [{}] {} {:.2}",
            athlete.api_id,
            athlete.first_name,
            athlete.last_name,
            athlete.position.as_deref().unwrap_or("-"),
            row.team_key,
            row.season,
            status,
            row.stats.fantasy_score.unwrap_or_default(),
        );
    }
    Ok(())
}
