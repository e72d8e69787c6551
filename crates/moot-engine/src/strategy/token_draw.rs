//! Token-draw resolution: a seeded weighted draw from a pool built out
//! of the votes' token weights.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use moot_core::error::CoreError;
use moot_core::model::{ResolutionOutcome, ResultType, TokenWeights, VoteKind};

use super::{Resolved, ResolutionInput, ResolutionStrategy, TOKEN_DRAW_ID};

/// Tokens drawn per resolution.
const DRAW_SIZE: u32 = 3;

/// Base pool added on top of the vote weights, so the pool is never
/// empty and no outcome tier is ever unreachable.
const BASE_SUCCESS: u32 = 1;
const BASE_FAILURE: u32 = 1;

/// The default strategy: sum vote weights into a success/failure token
/// pool, draw three tokens without replacement with a recorded seed, and
/// classify the sample into one of four outcome tiers.
#[derive(Debug, Clone, Copy)]
pub struct TokenDraw;

/// Record of one draw, kept in the resolution audit payload.
#[derive(Debug)]
struct DrawRecord {
    successes_drawn: u32,
    sequence: Vec<&'static str>,
}

/// Draws `DRAW_SIZE` tokens without replacement from the given pool.
/// Index selection is a plain modulo over the RNG's output so a recorded
/// seed replays the draw exactly.
fn draw_tokens(mut success: u32, mut failure: u32, rng: &mut dyn RngCore) -> DrawRecord {
    let mut record = DrawRecord {
        successes_drawn: 0,
        sequence: Vec::new(),
    };
    for _ in 0..DRAW_SIZE {
        let total = success + failure;
        if total == 0 {
            break;
        }
        let pick = rng.next_u64() % u64::from(total);
        if pick < u64::from(success) {
            success -= 1;
            record.successes_drawn += 1;
            record.sequence.push("success");
        } else {
            failure -= 1;
            record.sequence.push("failure");
        }
    }
    record
}

/// Maps the number of successes in the sample to an outcome tier.
fn classify(successes_drawn: u32) -> ResolutionOutcome {
    match successes_drawn {
        3.. => ResolutionOutcome {
            result_type: ResultType::Triumph,
            result_value: 3,
        },
        2 => ResolutionOutcome {
            result_type: ResultType::SuccessBut,
            result_value: 1,
        },
        1 => ResolutionOutcome {
            result_type: ResultType::FailureBut,
            result_value: -1,
        },
        0 => ResolutionOutcome {
            result_type: ResultType::Disaster,
            result_value: -3,
        },
    }
}

impl ResolutionStrategy for TokenDraw {
    fn map_vote_to_tokens(&self, kind: VoteKind) -> TokenWeights {
        match kind {
            VoteKind::LikelySuccess => TokenWeights {
                success: 2,
                failure: 0,
            },
            VoteKind::LikelyFailure => TokenWeights {
                success: 0,
                failure: 2,
            },
            VoteKind::Uncertain => TokenWeights {
                success: 1,
                failure: 1,
            },
        }
    }

    fn resolve(&self, input: &ResolutionInput<'_>) -> Result<Resolved, CoreError> {
        let vote_success: u32 = input
            .votes
            .iter()
            .map(|v| u32::try_from(v.success_tokens.max(0)).unwrap_or(0))
            .sum();
        let vote_failure: u32 = input
            .votes
            .iter()
            .map(|v| u32::try_from(v.failure_tokens.max(0)).unwrap_or(0))
            .sum();
        let pool_success = BASE_SUCCESS + vote_success;
        let pool_failure = BASE_FAILURE + vote_failure;

        let mut rng = StdRng::seed_from_u64(input.seed);
        let record = draw_tokens(pool_success, pool_failure, &mut rng);
        let outcome = classify(record.successes_drawn);

        Ok(Resolved {
            outcome,
            data: serde_json::json!({
                "strategy": TOKEN_DRAW_ID,
                "seed": input.seed,
                "pool": { "success": pool_success, "failure": pool_failure },
                "draw": record.sequence,
                "successes_drawn": record.successes_drawn,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use moot_core::model::Vote;
    use uuid::Uuid;

    /// RNG that replays a scripted sequence of u64 values.
    struct ScriptRng {
        values: Vec<u64>,
        index: usize,
    }

    impl ScriptRng {
        fn new(values: Vec<u64>) -> Self {
            Self { values, index: 0 }
        }
    }

    impl RngCore for ScriptRng {
        fn next_u32(&mut self) -> u32 {
            u32::try_from(self.next_u64() & u64::from(u32::MAX)).unwrap()
        }

        fn next_u64(&mut self) -> u64 {
            let val = self.values[self.index];
            self.index += 1;
            val
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
    }

    fn vote(kind: VoteKind, success: i32, failure: i32) -> Vote {
        Vote {
            id: Uuid::new_v4(),
            action_id: Uuid::new_v4(),
            player_id: Uuid::new_v4(),
            kind,
            success_tokens: success,
            failure_tokens: failure,
            was_skipped: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_vote_weights() {
        let strategy = TokenDraw;
        assert_eq!(
            strategy.map_vote_to_tokens(VoteKind::LikelySuccess),
            TokenWeights {
                success: 2,
                failure: 0
            }
        );
        assert_eq!(
            strategy.map_vote_to_tokens(VoteKind::LikelyFailure),
            TokenWeights {
                success: 0,
                failure: 2
            }
        );
        assert_eq!(
            strategy.map_vote_to_tokens(VoteKind::Uncertain),
            TokenWeights {
                success: 1,
                failure: 1
            }
        );
    }

    #[test]
    fn test_classification_tiers() {
        assert_eq!(classify(3).result_type, ResultType::Triumph);
        assert_eq!(classify(3).result_value, 3);
        assert_eq!(classify(2).result_type, ResultType::SuccessBut);
        assert_eq!(classify(2).result_value, 1);
        assert_eq!(classify(1).result_type, ResultType::FailureBut);
        assert_eq!(classify(1).result_value, -1);
        assert_eq!(classify(0).result_type, ResultType::Disaster);
        assert_eq!(classify(0).result_value, -3);
    }

    #[test]
    fn test_scripted_all_success_draw_is_a_triumph() {
        // Pool of 5 success / 1 failure; picks 0,0,0 land in the success
        // range every time.
        let mut rng = ScriptRng::new(vec![0, 0, 0]);
        let record = draw_tokens(5, 1, &mut rng);
        assert_eq!(record.successes_drawn, 3);
        assert_eq!(record.sequence, vec!["success", "success", "success"]);
        assert_eq!(classify(record.successes_drawn).result_type, ResultType::Triumph);
    }

    #[test]
    fn test_scripted_all_failure_draw_is_a_disaster() {
        // Pool of 1 success / 5 failure; picking the last index each
        // round stays in the failure range as the pool shrinks.
        let mut rng = ScriptRng::new(vec![5, 4, 3]);
        let record = draw_tokens(1, 5, &mut rng);
        assert_eq!(record.successes_drawn, 0);
        assert_eq!(classify(record.successes_drawn).result_type, ResultType::Disaster);
    }

    #[test]
    fn test_scripted_mixed_draw_lands_in_middle_tiers() {
        // success, failure, success → 2 successes → SuccessBut.
        let mut rng = ScriptRng::new(vec![0, 4, 0]);
        let record = draw_tokens(3, 3, &mut rng);
        assert_eq!(record.sequence, vec!["success", "failure", "success"]);
        assert_eq!(classify(record.successes_drawn).result_type, ResultType::SuccessBut);
    }

    #[test]
    fn test_draw_is_without_replacement() {
        // Pool of exactly 3 tokens: 2 success + 1 failure. Whatever the
        // picks, all three tokens come out.
        let mut rng = ScriptRng::new(vec![0, 0, 0]);
        let record = draw_tokens(2, 1, &mut rng);
        assert_eq!(record.sequence.len(), 3);
        assert_eq!(record.successes_drawn, 2);
    }

    #[test]
    fn test_resolve_is_reproducible_from_the_seed() {
        let votes = vec![
            vote(VoteKind::LikelySuccess, 2, 0),
            vote(VoteKind::Uncertain, 1, 1),
        ];
        let input = ResolutionInput {
            votes: &votes,
            arguments: &[],
            seed: 0x5EED,
        };

        let first = TokenDraw.resolve(&input).unwrap();
        let second = TokenDraw.resolve(&input).unwrap();
        assert_eq!(first.data, second.data);
        assert_eq!(first.outcome, second.outcome);
    }

    #[test]
    fn test_resolve_records_pool_and_seed() {
        let votes = vec![
            vote(VoteKind::LikelySuccess, 2, 0),
            vote(VoteKind::LikelyFailure, 0, 2),
        ];
        let input = ResolutionInput {
            votes: &votes,
            arguments: &[],
            seed: 7,
        };

        let resolved = TokenDraw.resolve(&input).unwrap();
        assert_eq!(resolved.data["seed"], serde_json::json!(7));
        // Base pool of 1+1 on top of 2 success and 2 failure tokens.
        assert_eq!(resolved.data["pool"]["success"], serde_json::json!(3));
        assert_eq!(resolved.data["pool"]["failure"], serde_json::json!(3));
        assert_eq!(resolved.data["draw"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_outcome_matches_recorded_successes() {
        let votes = vec![vote(VoteKind::Uncertain, 1, 1)];
        let input = ResolutionInput {
            votes: &votes,
            arguments: &[],
            seed: 99,
        };

        let resolved = TokenDraw.resolve(&input).unwrap();
        let successes = u32::try_from(resolved.data["successes_drawn"].as_u64().unwrap()).unwrap();
        assert_eq!(resolved.outcome, classify(successes));
    }
}
