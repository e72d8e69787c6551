//! `PostgreSQL`-backed implementation of the repository traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use moot_core::model::{
    Action, ActionStatus, Argument, AuditEvent, Game, GamePhase, Narration, Persona, Player,
    ResolutionOutcome, Round, Vote,
};
use moot_core::store::{ActionRepo, AuditRepo, GameRepo, RosterRepo, StoreError};

use crate::codec;
use crate::schema;

/// PostgreSQL store. One value implements all four repository traits;
/// hand out `Arc<PgStore>` clones per trait.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a store over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the schema. Idempotent.
    ///
    /// # Errors
    ///
    /// `StoreError::Backend` when the DDL fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(schema::CREATE_TABLES)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}

/// Maps a sqlx error into the store taxonomy, keeping the uniqueness
/// signal distinct.
fn map_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err
        && db.code().as_deref() == Some("23505")
    {
        return StoreError::UniqueViolation(db.constraint().unwrap_or("unique").to_owned());
    }
    StoreError::Backend(err.to_string())
}

fn col<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Backend(format!("column {name}: {e}")))
}

fn game_from_row(row: &PgRow) -> Result<Game, StoreError> {
    let status: String = col(row, "status")?;
    let phase: String = col(row, "current_phase")?;
    let settings: serde_json::Value = col(row, "settings")?;
    Ok(Game {
        id: col(row, "id")?,
        name: col(row, "name")?,
        status: codec::game_status(&status)?,
        current_phase: codec::phase(&phase)?,
        phase_started_at: col(row, "phase_started_at")?,
        current_round_id: col(row, "current_round_id")?,
        current_action_id: col(row, "current_action_id")?,
        settings: serde_json::from_value(settings)
            .map_err(|e| StoreError::Backend(format!("settings: {e}")))?,
        npc_momentum: col(row, "npc_momentum")?,
        is_deleted: col(row, "is_deleted")?,
        created_at: col(row, "created_at")?,
    })
}

fn round_from_row(row: &PgRow) -> Result<Round, StoreError> {
    let status: String = col(row, "status")?;
    Ok(Round {
        id: col(row, "id")?,
        game_id: col(row, "game_id")?,
        round_number: col(row, "round_number")?,
        status: codec::round_status(&status)?,
        actions_completed: col(row, "actions_completed")?,
        total_actions_required: col(row, "total_actions_required")?,
    })
}

fn player_from_row(row: &PgRow) -> Result<Player, StoreError> {
    Ok(Player {
        id: col(row, "id")?,
        game_id: col(row, "game_id")?,
        user_id: col(row, "user_id")?,
        persona_id: col(row, "persona_id")?,
        is_persona_lead: col(row, "is_persona_lead")?,
        is_host: col(row, "is_host")?,
        is_arbiter: col(row, "is_arbiter")?,
        is_npc: col(row, "is_npc")?,
        is_active: col(row, "is_active")?,
        joined_at: col(row, "joined_at")?,
    })
}

fn persona_from_row(row: &PgRow) -> Result<Persona, StoreError> {
    Ok(Persona {
        id: col(row, "id")?,
        game_id: col(row, "game_id")?,
        name: col(row, "name")?,
        is_npc: col(row, "is_npc")?,
        scripted_action: col(row, "scripted_action")?,
        scripted_outcome: col(row, "scripted_outcome")?,
    })
}

fn action_from_row(row: &PgRow) -> Result<Action, StoreError> {
    let status: String = col(row, "status")?;
    let result: Option<serde_json::Value> = col(row, "resolution_result")?;
    let resolution_result = result
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| StoreError::Backend(format!("resolution_result: {e}")))?;
    Ok(Action {
        id: col(row, "id")?,
        game_id: col(row, "game_id")?,
        round_id: col(row, "round_id")?,
        initiator_id: col(row, "initiator_id")?,
        unit_key: col(row, "unit_key")?,
        sequence_number: col(row, "sequence_number")?,
        description: col(row, "description")?,
        desired_outcome: col(row, "desired_outcome")?,
        status: codec::action_status(&status)?,
        argumentation_started_at: col(row, "argumentation_started_at")?,
        voting_started_at: col(row, "voting_started_at")?,
        resolved_at: col(row, "resolved_at")?,
        resolution_method: col(row, "resolution_method")?,
        resolution_result,
        resolution_data: col(row, "resolution_data")?,
        argumentation_skipped: col(row, "argumentation_skipped")?,
        voting_skipped: col(row, "voting_skipped")?,
    })
}

fn argument_from_row(row: &PgRow) -> Result<Argument, StoreError> {
    let kind: String = col(row, "kind")?;
    Ok(Argument {
        id: col(row, "id")?,
        action_id: col(row, "action_id")?,
        player_id: col(row, "player_id")?,
        kind: codec::argument_kind(&kind)?,
        content: col(row, "content")?,
        sequence: col(row, "sequence")?,
        is_strong: col(row, "is_strong")?,
        is_placeholder: col(row, "is_placeholder")?,
        created_at: col(row, "created_at")?,
    })
}

fn vote_from_row(row: &PgRow) -> Result<Vote, StoreError> {
    let kind: String = col(row, "kind")?;
    Ok(Vote {
        id: col(row, "id")?,
        action_id: col(row, "action_id")?,
        player_id: col(row, "player_id")?,
        kind: codec::vote_kind(&kind)?,
        success_tokens: col(row, "success_tokens")?,
        failure_tokens: col(row, "failure_tokens")?,
        was_skipped: col(row, "was_skipped")?,
        created_at: col(row, "created_at")?,
    })
}

fn narration_from_row(row: &PgRow) -> Result<Narration, StoreError> {
    Ok(Narration {
        id: col(row, "id")?,
        action_id: col(row, "action_id")?,
        author_id: col(row, "author_id")?,
        content: col(row, "content")?,
        created_at: col(row, "created_at")?,
    })
}

fn audit_from_row(row: &PgRow) -> Result<AuditEvent, StoreError> {
    Ok(AuditEvent {
        id: col(row, "id")?,
        game_id: col(row, "game_id")?,
        kind: col(row, "kind")?,
        payload: col(row, "payload")?,
        occurred_at: col(row, "occurred_at")?,
    })
}

fn settings_json(game: &Game) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(&game.settings)
        .map_err(|e| StoreError::Backend(format!("settings: {e}")))
}

#[async_trait]
impl GameRepo for PgStore {
    async fn insert_game(&self, game: &Game) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO games (id, name, status, current_phase, phase_started_at, \
             current_round_id, current_action_id, settings, npc_momentum, is_deleted, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(game.id)
        .bind(&game.name)
        .bind(codec::game_status_str(game.status))
        .bind(codec::phase_str(game.current_phase))
        .bind(game.phase_started_at)
        .bind(game.current_round_id)
        .bind(game.current_action_id)
        .bind(settings_json(game)?)
        .bind(game.npc_momentum)
        .bind(game.is_deleted)
        .bind(game.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn game(&self, id: Uuid) -> Result<Option<Game>, StoreError> {
        sqlx::query("SELECT * FROM games WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .map(|row| game_from_row(&row))
            .transpose()
    }

    async fn update_game(&self, game: &Game) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE games SET name = $2, status = $3, current_phase = $4, \
             phase_started_at = $5, current_round_id = $6, current_action_id = $7, \
             settings = $8, npc_momentum = $9, is_deleted = $10 WHERE id = $1",
        )
        .bind(game.id)
        .bind(&game.name)
        .bind(codec::game_status_str(game.status))
        .bind(codec::phase_str(game.current_phase))
        .bind(game.phase_started_at)
        .bind(game.current_round_id)
        .bind(game.current_action_id)
        .bind(settings_json(game)?)
        .bind(game.npc_momentum)
        .bind(game.is_deleted)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn commit_phase(
        &self,
        game_id: Uuid,
        expected: GamePhase,
        next: GamePhase,
        started_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE games SET current_phase = $3, phase_started_at = $4 \
             WHERE id = $1 AND current_phase = $2",
        )
        .bind(game_id)
        .bind(codec::phase_str(expected))
        .bind(codec::phase_str(next))
        .bind(started_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn timeout_candidates(&self) -> Result<Vec<Game>, StoreError> {
        sqlx::query(
            "SELECT * FROM games \
             WHERE status = 'active' AND is_deleted = FALSE \
             AND phase_started_at IS NOT NULL \
             AND current_phase IN ('proposal', 'argumentation', 'voting', 'narration')",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?
        .iter()
        .map(game_from_row)
        .collect()
    }

    async fn insert_round(&self, round: &Round) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO rounds (id, game_id, round_number, status, actions_completed, \
             total_actions_required) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(round.id)
        .bind(round.game_id)
        .bind(round.round_number)
        .bind(codec::round_status_str(round.status))
        .bind(round.actions_completed)
        .bind(round.total_actions_required)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn round(&self, id: Uuid) -> Result<Option<Round>, StoreError> {
        sqlx::query("SELECT * FROM rounds WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .map(|row| round_from_row(&row))
            .transpose()
    }

    async fn update_round(&self, round: &Round) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE rounds SET status = $2, actions_completed = $3, \
             total_actions_required = $4 WHERE id = $1",
        )
        .bind(round.id)
        .bind(codec::round_status_str(round.status))
        .bind(round.actions_completed)
        .bind(round.total_actions_required)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn increment_round_actions(
        &self,
        round_id: Uuid,
    ) -> Result<Option<Round>, StoreError> {
        sqlx::query(
            "UPDATE rounds SET actions_completed = actions_completed + 1 \
             WHERE id = $1 AND actions_completed < total_actions_required \
             RETURNING *",
        )
        .bind(round_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?
        .map(|row| round_from_row(&row))
        .transpose()
    }
}

#[async_trait]
impl RosterRepo for PgStore {
    async fn insert_player(&self, player: &Player) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO players (id, game_id, user_id, persona_id, is_persona_lead, \
             is_host, is_arbiter, is_npc, is_active, joined_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(player.id)
        .bind(player.game_id)
        .bind(player.user_id)
        .bind(player.persona_id)
        .bind(player.is_persona_lead)
        .bind(player.is_host)
        .bind(player.is_arbiter)
        .bind(player.is_npc)
        .bind(player.is_active)
        .bind(player.joined_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn player(&self, id: Uuid) -> Result<Option<Player>, StoreError> {
        sqlx::query("SELECT * FROM players WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .map(|row| player_from_row(&row))
            .transpose()
    }

    async fn players_in_game(&self, game_id: Uuid) -> Result<Vec<Player>, StoreError> {
        sqlx::query("SELECT * FROM players WHERE game_id = $1 ORDER BY joined_at")
            .bind(game_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?
            .iter()
            .map(player_from_row)
            .collect()
    }

    async fn update_player(&self, player: &Player) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE players SET persona_id = $2, is_persona_lead = $3, is_host = $4, \
             is_arbiter = $5, is_active = $6 WHERE id = $1",
        )
        .bind(player.id)
        .bind(player.persona_id)
        .bind(player.is_persona_lead)
        .bind(player.is_host)
        .bind(player.is_arbiter)
        .bind(player.is_active)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn insert_persona(&self, persona: &Persona) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO personas (id, game_id, name, is_npc, scripted_action, \
             scripted_outcome) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(persona.id)
        .bind(persona.game_id)
        .bind(&persona.name)
        .bind(persona.is_npc)
        .bind(&persona.scripted_action)
        .bind(&persona.scripted_outcome)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn persona(&self, id: Uuid) -> Result<Option<Persona>, StoreError> {
        sqlx::query("SELECT * FROM personas WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .map(|row| persona_from_row(&row))
            .transpose()
    }

    async fn personas_in_game(&self, game_id: Uuid) -> Result<Vec<Persona>, StoreError> {
        sqlx::query("SELECT * FROM personas WHERE game_id = $1 ORDER BY name")
            .bind(game_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?
            .iter()
            .map(persona_from_row)
            .collect()
    }
}

#[async_trait]
impl ActionRepo for PgStore {
    async fn insert_action(&self, action: &Action) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO actions (id, game_id, round_id, initiator_id, unit_key, \
             sequence_number, description, desired_outcome, status, \
             argumentation_started_at, voting_started_at, resolved_at, resolution_method, \
             resolution_result, resolution_data, argumentation_skipped, voting_skipped) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(action.id)
        .bind(action.game_id)
        .bind(action.round_id)
        .bind(action.initiator_id)
        .bind(&action.unit_key)
        .bind(action.sequence_number)
        .bind(&action.description)
        .bind(&action.desired_outcome)
        .bind(codec::action_status_str(action.status))
        .bind(action.argumentation_started_at)
        .bind(action.voting_started_at)
        .bind(action.resolved_at)
        .bind(&action.resolution_method)
        .bind(
            action
                .resolution_result
                .as_ref()
                .map(serde_json::to_value)
                .transpose()
                .map_err(|e| StoreError::Backend(format!("resolution_result: {e}")))?,
        )
        .bind(&action.resolution_data)
        .bind(action.argumentation_skipped)
        .bind(action.voting_skipped)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn action(&self, id: Uuid) -> Result<Option<Action>, StoreError> {
        sqlx::query("SELECT * FROM actions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .map(|row| action_from_row(&row))
            .transpose()
    }

    async fn actions_in_round(&self, round_id: Uuid) -> Result<Vec<Action>, StoreError> {
        sqlx::query("SELECT * FROM actions WHERE round_id = $1 ORDER BY sequence_number")
            .bind(round_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?
            .iter()
            .map(action_from_row)
            .collect()
    }

    async fn update_action(&self, action: &Action) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE actions SET description = $2, desired_outcome = $3, \
             argumentation_skipped = $4, voting_skipped = $5 WHERE id = $1",
        )
        .bind(action.id)
        .bind(&action.description)
        .bind(&action.desired_outcome)
        .bind(action.argumentation_skipped)
        .bind(action.voting_skipped)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn advance_action_status(
        &self,
        action_id: Uuid,
        expected: ActionStatus,
        next: ActionStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let sql = match next {
            ActionStatus::Voting => {
                "UPDATE actions SET status = $3, voting_started_at = $4 \
                 WHERE id = $1 AND status = $2"
            }
            ActionStatus::Resolved => {
                "UPDATE actions SET status = $3, resolved_at = $4 \
                 WHERE id = $1 AND status = $2"
            }
            ActionStatus::Arguing | ActionStatus::Narrated => {
                "UPDATE actions SET status = $3, argumentation_started_at = \
                 COALESCE(argumentation_started_at, $4) WHERE id = $1 AND status = $2"
            }
        };
        let result = sqlx::query(sql)
            .bind(action_id)
            .bind(codec::action_status_str(expected))
            .bind(codec::action_status_str(next))
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn record_resolution(
        &self,
        action_id: Uuid,
        method: &str,
        outcome: ResolutionOutcome,
        data: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let outcome = serde_json::to_value(outcome)
            .map_err(|e| StoreError::Backend(format!("resolution_result: {e}")))?;
        let result = sqlx::query(
            "UPDATE actions SET resolution_method = $2, resolution_result = $3, \
             resolution_data = $4 WHERE id = $1",
        )
        .bind(action_id)
        .bind(method)
        .bind(outcome)
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn next_sequence_number(&self, game_id: Uuid) -> Result<i64, StoreError> {
        let row = sqlx::query(
            "SELECT COALESCE(MAX(sequence_number), 0) + 1 AS next FROM actions \
             WHERE game_id = $1",
        )
        .bind(game_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?;
        col(&row, "next")
    }

    async fn insert_argument(&self, argument: &Argument) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO arguments (id, action_id, player_id, kind, content, sequence, \
             is_strong, is_placeholder, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(argument.id)
        .bind(argument.action_id)
        .bind(argument.player_id)
        .bind(codec::argument_kind_str(argument.kind))
        .bind(&argument.content)
        .bind(argument.sequence)
        .bind(argument.is_strong)
        .bind(argument.is_placeholder)
        .bind(argument.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn argument(&self, id: Uuid) -> Result<Option<Argument>, StoreError> {
        sqlx::query("SELECT * FROM arguments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .map(|row| argument_from_row(&row))
            .transpose()
    }

    async fn arguments_for_action(&self, action_id: Uuid) -> Result<Vec<Argument>, StoreError> {
        sqlx::query("SELECT * FROM arguments WHERE action_id = $1 ORDER BY sequence")
            .bind(action_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?
            .iter()
            .map(argument_from_row)
            .collect()
    }

    async fn update_argument(&self, argument: &Argument) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE arguments SET content = $2, is_strong = $3 WHERE id = $1",
        )
        .bind(argument.id)
        .bind(&argument.content)
        .bind(argument.is_strong)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn insert_vote(&self, vote: &Vote) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO votes (id, action_id, player_id, kind, success_tokens, \
             failure_tokens, was_skipped, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(vote.id)
        .bind(vote.action_id)
        .bind(vote.player_id)
        .bind(codec::vote_kind_str(vote.kind))
        .bind(vote.success_tokens)
        .bind(vote.failure_tokens)
        .bind(vote.was_skipped)
        .bind(vote.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn votes_for_action(&self, action_id: Uuid) -> Result<Vec<Vote>, StoreError> {
        sqlx::query("SELECT * FROM votes WHERE action_id = $1 ORDER BY created_at")
            .bind(action_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?
            .iter()
            .map(vote_from_row)
            .collect()
    }

    async fn record_argumentation_done(
        &self,
        action_id: Uuid,
        player_id: Uuid,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO argumentation_done (action_id, player_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(action_id)
        .bind(player_id)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn argumentation_done(&self, action_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        sqlx::query("SELECT player_id FROM argumentation_done WHERE action_id = $1")
            .bind(action_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?
            .iter()
            .map(|row| col(row, "player_id"))
            .collect()
    }

    async fn insert_narration(&self, narration: &Narration) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO narrations (id, action_id, author_id, content, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(narration.id)
        .bind(narration.action_id)
        .bind(narration.author_id)
        .bind(&narration.content)
        .bind(narration.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn narration_for_action(
        &self,
        action_id: Uuid,
    ) -> Result<Option<Narration>, StoreError> {
        sqlx::query("SELECT * FROM narrations WHERE action_id = $1")
            .bind(action_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .map(|row| narration_from_row(&row))
            .transpose()
    }

    async fn update_narration(&self, narration: &Narration) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE narrations SET content = $2 WHERE id = $1")
            .bind(narration.id)
            .bind(&narration.content)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl AuditRepo for PgStore {
    async fn append(&self, event: &AuditEvent) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO audit_events (id, game_id, kind, payload, occurred_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(event.id)
        .bind(event.game_id)
        .bind(&event.kind)
        .bind(&event.payload)
        .bind(event.occurred_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn events_for_game(&self, game_id: Uuid) -> Result<Vec<AuditEvent>, StoreError> {
        sqlx::query("SELECT * FROM audit_events WHERE game_id = $1 ORDER BY occurred_at")
            .bind(game_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?
            .iter()
            .map(audit_from_row)
            .collect()
    }
}
