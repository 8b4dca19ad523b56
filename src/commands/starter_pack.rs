//! Starter pack batches for the pack contract.
//!
//! The contract client itself lives elsewhere; this module builds the
//! `execute_add_athletes` payloads and hands them to a [`PackSink`].

use async_trait::async_trait;
use serde::Serialize;
use std::io::Write;
use tracing::info;

use crate::cli::types::{AthleteApiId, Sport};
use crate::core::chunkify;
use crate::storage::{lock_db, Athlete, SharedDatabase, Team};
use crate::Result;

pub const STARTER_PACK_TYPE: &str = "starter";
/// Number of contract calls the tokens are spread over.
pub const STARTER_PACK_CALLS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AthleteToken {
    pub athlete_id: String,
    pub token_uri: String,
    pub symbol: String,
    pub name: String,
    pub team: String,
    pub position: Option<String>,
}

impl AthleteToken {
    pub fn new(athlete: &Athlete, team: &Team) -> Self {
        Self {
            athlete_id: athlete.id.to_string(),
            token_uri: athlete.nft_image.clone(),
            symbol: athlete.api_id.to_string(),
            name: format!("{} {}", athlete.first_name, athlete.last_name),
            team: team.key.clone(),
            position: athlete.position.clone(),
        }
    }
}

/// Arguments of one `execute_add_athletes` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddAthletesArgs {
    pub pack_type: String,
    pub athlete_tokens: Vec<AthleteToken>,
}

#[async_trait]
pub trait PackSink: Send {
    async fn execute_add_athletes(&mut self, args: &AddAthletesArgs) -> Result<()>;
}

/// Writes each call as one JSON line: `{"method": ..., "args": ...}`.
pub struct JsonLinesSink<W> {
    out: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[derive(Serialize)]
struct CallLine<'a> {
    method: &'static str,
    args: &'a AddAthletesArgs,
}

#[async_trait]
impl<W: Write + Send> PackSink for JsonLinesSink<W> {
    async fn execute_add_athletes(&mut self, args: &AddAthletesArgs) -> Result<()> {
        let line = serde_json::to_string(&CallLine {
            method: "execute_add_athletes",
            args,
        })?;
        writeln!(self.out, "{line}")?;
        Ok(())
    }
}

/// Load the pack's athletes (given ids, or every athlete of `sport`),
/// ordered by id, and submit them in [`STARTER_PACK_CALLS`] unbalanced
/// batches. Returns the number of tokens submitted.
pub async fn starter_pack(
    db: &SharedDatabase,
    sport: Sport,
    ids: Option<&[AthleteApiId]>,
    sink: &mut dyn PackSink,
) -> Result<usize> {
    let athletes = {
        let db = lock_db(db)?;
        match ids {
            Some(ids) => db.athletes_with_teams_by_api_ids(ids)?,
            None => db.athletes_with_teams(sport)?,
        }
    };

    let tokens: Vec<AthleteToken> = athletes
        .iter()
        .map(|(athlete, team)| AthleteToken::new(athlete, team))
        .collect();

    let batches = chunkify(&tokens, STARTER_PACK_CALLS, false);
    info!(%sport, tokens = tokens.len(), calls = batches.len(), "submitting starter pack");
    for batch in batches {
        sink.execute_add_athletes(&AddAthletesArgs {
            pack_type: STARTER_PACK_TYPE.to_string(),
            athlete_tokens: batch,
        })
        .await?;
    }
    Ok(tokens.len())
}
