//! Entity model for the matrix-game core.
//!
//! History-bearing entities carry explicit soft-delete/soft-leave flags
//! and are never physically removed by the engine.

mod action;
mod argument;
mod audit;
mod game;
mod narration;
mod persona;
mod player;
mod round;
mod vote;

pub use action::{Action, ActionStatus, ResolutionOutcome, ResultType};
pub use argument::{Argument, ArgumentKind};
pub use audit::{AuditEvent, audit_kind};
pub use game::{
    ArgumentMode, Game, GamePhase, GameSettings, GameStatus, NarrationMode, PersonaSharing,
    VotingMode,
};
pub use narration::Narration;
pub use persona::Persona;
pub use player::Player;
pub use round::{Round, RoundStatus};
pub use vote::{TokenWeights, Vote, VoteKind};
