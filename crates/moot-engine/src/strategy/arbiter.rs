//! Arbiter resolution: votes are ignored; a distinguished arbiter flags
//! strong arguments and the tally decides the outcome.

use moot_core::error::CoreError;
use moot_core::model::{ResolutionOutcome, ResultType, TokenWeights, VoteKind};

use super::{ARBITER_ID, Resolved, ResolutionInput, ResolutionStrategy};

/// Resolution by argument strength. The arbiter marks arguments strong
/// during review; strong pro beats strong anti for a qualified success,
/// everything else (ties included) is a qualified failure.
#[derive(Debug, Clone, Copy)]
pub struct Arbiter;

impl ResolutionStrategy for Arbiter {
    fn map_vote_to_tokens(&self, _kind: VoteKind) -> TokenWeights {
        // Votes carry no weight under arbitration.
        TokenWeights {
            success: 0,
            failure: 0,
        }
    }

    fn resolve(&self, input: &ResolutionInput<'_>) -> Result<Resolved, CoreError> {
        let strong_pro = input
            .arguments
            .iter()
            .filter(|a| a.is_strong && a.kind.is_pro())
            .count();
        let strong_anti = input
            .arguments
            .iter()
            .filter(|a| a.is_strong && !a.kind.is_pro())
            .count();

        let outcome = if strong_pro > strong_anti {
            ResolutionOutcome {
                result_type: ResultType::SuccessBut,
                result_value: 1,
            }
        } else {
            ResolutionOutcome {
                result_type: ResultType::FailureBut,
                result_value: -1,
            }
        };

        Ok(Resolved {
            outcome,
            data: serde_json::json!({
                "strategy": ARBITER_ID,
                "strong_pro": strong_pro,
                "strong_anti": strong_anti,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use moot_core::model::{Argument, ArgumentKind};
    use uuid::Uuid;

    fn argument(kind: ArgumentKind, is_strong: bool) -> Argument {
        Argument {
            id: Uuid::new_v4(),
            action_id: Uuid::new_v4(),
            player_id: Uuid::new_v4(),
            kind,
            content: "because".to_owned(),
            sequence: 1,
            is_strong,
            is_placeholder: false,
            created_at: Utc::now(),
        }
    }

    fn resolve(arguments: &[Argument]) -> Resolved {
        Arbiter
            .resolve(&ResolutionInput {
                votes: &[],
                arguments,
                seed: 0,
            })
            .unwrap()
    }

    #[test]
    fn test_votes_carry_no_weight() {
        for kind in [
            VoteKind::LikelySuccess,
            VoteKind::LikelyFailure,
            VoteKind::Uncertain,
        ] {
            assert_eq!(
                Arbiter.map_vote_to_tokens(kind),
                TokenWeights {
                    success: 0,
                    failure: 0
                }
            );
        }
    }

    #[test]
    fn test_more_strong_pro_is_success_but() {
        let arguments = vec![
            argument(ArgumentKind::InitiatorFor, true),
            argument(ArgumentKind::For, true),
            argument(ArgumentKind::Against, true),
        ];
        let resolved = resolve(&arguments);
        assert_eq!(resolved.outcome.result_type, ResultType::SuccessBut);
        assert_eq!(resolved.outcome.result_value, 1);
        assert_eq!(resolved.data["strong_pro"], serde_json::json!(2));
        assert_eq!(resolved.data["strong_anti"], serde_json::json!(1));
    }

    #[test]
    fn test_tie_goes_to_failure_but() {
        let arguments = vec![
            argument(ArgumentKind::For, true),
            argument(ArgumentKind::Against, true),
        ];
        let resolved = resolve(&arguments);
        assert_eq!(resolved.outcome.result_type, ResultType::FailureBut);
        assert_eq!(resolved.outcome.result_value, -1);
    }

    #[test]
    fn test_weak_arguments_do_not_count() {
        let arguments = vec![
            argument(ArgumentKind::For, false),
            argument(ArgumentKind::For, false),
            argument(ArgumentKind::Against, true),
        ];
        let resolved = resolve(&arguments);
        assert_eq!(resolved.outcome.result_type, ResultType::FailureBut);
        assert_eq!(resolved.data["strong_pro"], serde_json::json!(0));
    }

    #[test]
    fn test_no_strong_arguments_at_all_is_failure_but() {
        let resolved = resolve(&[]);
        assert_eq!(resolved.outcome.result_type, ResultType::FailureBut);
    }
}
