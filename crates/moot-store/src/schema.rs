//! Database schema.

/// SQL to create every table the store uses. Idempotent; applied at
/// startup by the API binary.
pub const CREATE_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS games (
    id                 UUID PRIMARY KEY,
    name               TEXT NOT NULL,
    status             TEXT NOT NULL,
    current_phase      TEXT NOT NULL,
    phase_started_at   TIMESTAMPTZ,
    current_round_id   UUID,
    current_action_id  UUID,
    settings           JSONB NOT NULL,
    npc_momentum       BIGINT NOT NULL DEFAULT 0,
    is_deleted         BOOLEAN NOT NULL DEFAULT FALSE,
    created_at         TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS rounds (
    id                      UUID PRIMARY KEY,
    game_id                 UUID NOT NULL REFERENCES games (id),
    round_number            INTEGER NOT NULL,
    status                  TEXT NOT NULL,
    actions_completed       INTEGER NOT NULL DEFAULT 0,
    total_actions_required  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS personas (
    id                UUID PRIMARY KEY,
    game_id           UUID NOT NULL REFERENCES games (id),
    name              TEXT NOT NULL,
    is_npc            BOOLEAN NOT NULL DEFAULT FALSE,
    scripted_action   TEXT,
    scripted_outcome  TEXT
);

CREATE TABLE IF NOT EXISTS players (
    id               UUID PRIMARY KEY,
    game_id          UUID NOT NULL REFERENCES games (id),
    user_id          UUID,
    persona_id       UUID REFERENCES personas (id),
    is_persona_lead  BOOLEAN NOT NULL DEFAULT FALSE,
    is_host          BOOLEAN NOT NULL DEFAULT FALSE,
    is_arbiter       BOOLEAN NOT NULL DEFAULT FALSE,
    is_npc           BOOLEAN NOT NULL DEFAULT FALSE,
    is_active        BOOLEAN NOT NULL DEFAULT TRUE,
    joined_at        TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS actions (
    id                        UUID PRIMARY KEY,
    game_id                   UUID NOT NULL REFERENCES games (id),
    round_id                  UUID NOT NULL REFERENCES rounds (id),
    initiator_id              UUID NOT NULL REFERENCES players (id),
    unit_key                  TEXT NOT NULL,
    sequence_number           BIGINT NOT NULL,
    description               TEXT NOT NULL,
    desired_outcome           TEXT NOT NULL,
    status                    TEXT NOT NULL,
    argumentation_started_at  TIMESTAMPTZ,
    voting_started_at         TIMESTAMPTZ,
    resolved_at               TIMESTAMPTZ,
    resolution_method         TEXT,
    resolution_result         JSONB,
    resolution_data           JSONB,
    argumentation_skipped     BOOLEAN NOT NULL DEFAULT FALSE,
    voting_skipped            BOOLEAN NOT NULL DEFAULT FALSE,
    CONSTRAINT actions_round_unit_key UNIQUE (round_id, unit_key)
);

CREATE TABLE IF NOT EXISTS arguments (
    id              UUID PRIMARY KEY,
    action_id       UUID NOT NULL REFERENCES actions (id),
    player_id       UUID NOT NULL REFERENCES players (id),
    kind            TEXT NOT NULL,
    content         TEXT NOT NULL,
    sequence        INTEGER NOT NULL,
    is_strong       BOOLEAN NOT NULL DEFAULT FALSE,
    is_placeholder  BOOLEAN NOT NULL DEFAULT FALSE,
    created_at      TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS votes (
    id              UUID PRIMARY KEY,
    action_id       UUID NOT NULL REFERENCES actions (id),
    player_id       UUID NOT NULL REFERENCES players (id),
    kind            TEXT NOT NULL,
    success_tokens  INTEGER NOT NULL,
    failure_tokens  INTEGER NOT NULL,
    was_skipped     BOOLEAN NOT NULL DEFAULT FALSE,
    created_at      TIMESTAMPTZ NOT NULL,
    CONSTRAINT votes_action_player_key UNIQUE (action_id, player_id)
);

CREATE TABLE IF NOT EXISTS argumentation_done (
    action_id  UUID NOT NULL REFERENCES actions (id),
    player_id  UUID NOT NULL REFERENCES players (id),
    PRIMARY KEY (action_id, player_id)
);

CREATE TABLE IF NOT EXISTS narrations (
    id          UUID PRIMARY KEY,
    action_id   UUID NOT NULL REFERENCES actions (id),
    author_id   UUID NOT NULL REFERENCES players (id),
    content     TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL,
    CONSTRAINT narrations_action_key UNIQUE (action_id)
);

CREATE TABLE IF NOT EXISTS audit_events (
    id           UUID PRIMARY KEY,
    game_id      UUID NOT NULL REFERENCES games (id),
    kind         TEXT NOT NULL,
    payload      JSONB NOT NULL,
    occurred_at  TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_rounds_game_id ON rounds (game_id);
CREATE INDEX IF NOT EXISTS idx_players_game_id ON players (game_id);
CREATE INDEX IF NOT EXISTS idx_actions_round_id ON actions (round_id);
CREATE INDEX IF NOT EXISTS idx_arguments_action_id ON arguments (action_id, sequence);
CREATE INDEX IF NOT EXISTS idx_votes_action_id ON votes (action_id);
CREATE INDEX IF NOT EXISTS idx_audit_events_game_id ON audit_events (game_id, occurred_at);
";
