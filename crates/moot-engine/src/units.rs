//! Acting-unit calculator.
//!
//! An acting unit is one independently-acting entity in a round: a solo
//! player, or the whole group sharing a persona. Every completion
//! threshold in the lifecycle (proposal uniqueness, argumentation,
//! voting) is sized here so "done" means the same thing everywhere.
//! All functions are pure.

use std::collections::HashSet;

use uuid::Uuid;

use moot_core::model::Player;

/// Groups active, non-NPC players into acting units. Players sharing a
/// persona form one unit; players without a persona are one unit each.
#[must_use]
pub fn acting_units(players: &[Player]) -> Vec<Vec<&Player>> {
    let mut units: Vec<Vec<&Player>> = Vec::new();
    let mut persona_index: Vec<(Uuid, usize)> = Vec::new();

    for player in players {
        if !player.is_active || player.is_npc {
            continue;
        }
        match player.persona_id {
            Some(persona_id) => {
                if let Some((_, idx)) = persona_index.iter().find(|(p, _)| *p == persona_id) {
                    units[*idx].push(player);
                } else {
                    persona_index.push((persona_id, units.len()));
                    units.push(vec![player]);
                }
            }
            None => units.push(vec![player]),
        }
    }
    units
}

/// Count of acting units among the active, non-NPC players.
#[must_use]
pub fn count_acting_units(players: &[Player]) -> usize {
    acting_units(players).len()
}

/// Active, non-NPC members of a persona.
#[must_use]
pub fn persona_member_ids(players: &[Player], persona_id: Uuid) -> Vec<Uuid> {
    players
        .iter()
        .filter(|p| p.is_active && !p.is_npc && p.persona_id == Some(persona_id))
        .map(|p| p.id)
        .collect()
}

/// Storage key of a player's acting unit, used by the
/// one-proposal-per-unit-per-round unique index.
#[must_use]
pub fn unit_key_for(player: &Player) -> String {
    match player.persona_id {
        Some(persona_id) => format!("persona:{persona_id}"),
        None => format!("player:{}", player.id),
    }
}

/// Whether an active NPC seat exists in the roster.
#[must_use]
pub fn has_npc_unit(players: &[Player]) -> bool {
    players.iter().any(|p| p.is_npc && p.is_active)
}

/// Membership rule for counting a persona unit as covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// Any active member acting covers the unit.
    AnyMember,
    /// Every active member must act before the unit is covered.
    AllMembers,
}

/// How many acting units are covered by the given set of actors.
#[must_use]
pub fn units_covered(players: &[Player], actors: &HashSet<Uuid>, coverage: Coverage) -> usize {
    acting_units(players)
        .iter()
        .filter(|unit| match coverage {
            Coverage::AnyMember => unit.iter().any(|p| actors.contains(&p.id)),
            Coverage::AllMembers => unit.iter().all(|p| actors.contains(&p.id)),
        })
        .count()
}

/// The member who acts for a unit when input has to be synthesized: the
/// persona lead if one is present, otherwise the first member.
#[must_use]
pub fn unit_representative<'a>(unit: &[&'a Player]) -> Option<&'a Player> {
    unit.iter()
        .find(|p| p.is_persona_lead)
        .or_else(|| unit.first())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use moot_core::model::Player;

    fn solo(game_id: Uuid) -> Player {
        Player::new(Uuid::new_v4(), game_id, Uuid::new_v4(), Utc::now())
    }

    fn with_persona(game_id: Uuid, persona_id: Uuid, lead: bool) -> Player {
        let mut player = solo(game_id);
        player.persona_id = Some(persona_id);
        player.is_persona_lead = lead;
        player
    }

    #[test]
    fn test_solo_players_count_one_each() {
        let game_id = Uuid::new_v4();
        let players = vec![solo(game_id), solo(game_id), solo(game_id)];
        assert_eq!(count_acting_units(&players), 3);
    }

    #[test]
    fn test_shared_persona_counts_once() {
        let game_id = Uuid::new_v4();
        let persona = Uuid::new_v4();
        let players = vec![
            with_persona(game_id, persona, true),
            with_persona(game_id, persona, false),
            solo(game_id),
        ];
        assert_eq!(count_acting_units(&players), 2);
    }

    #[test]
    fn test_inactive_and_npc_players_are_ignored() {
        let game_id = Uuid::new_v4();
        let mut gone = solo(game_id);
        gone.is_active = false;
        let npc = Player::new_npc(Uuid::new_v4(), game_id, Uuid::new_v4(), Utc::now());
        let players = vec![solo(game_id), gone, npc];
        assert_eq!(count_acting_units(&players), 1);
    }

    #[test]
    fn test_persona_member_ids_excludes_inactive() {
        let game_id = Uuid::new_v4();
        let persona = Uuid::new_v4();
        let a = with_persona(game_id, persona, true);
        let mut b = with_persona(game_id, persona, false);
        b.is_active = false;
        let players = vec![a.clone(), b];
        assert_eq!(persona_member_ids(&players, persona), vec![a.id]);
    }

    #[test]
    fn test_unit_key_distinguishes_solo_and_persona() {
        let game_id = Uuid::new_v4();
        let persona = Uuid::new_v4();
        let alone = solo(game_id);
        let shared = with_persona(game_id, persona, true);
        assert_eq!(unit_key_for(&alone), format!("player:{}", alone.id));
        assert_eq!(unit_key_for(&shared), format!("persona:{persona}"));
    }

    #[test]
    fn test_units_covered_any_member() {
        let game_id = Uuid::new_v4();
        let persona = Uuid::new_v4();
        let a = with_persona(game_id, persona, true);
        let b = with_persona(game_id, persona, false);
        let c = solo(game_id);
        let players = vec![a.clone(), b, c];

        let actors: HashSet<Uuid> = [a.id].into_iter().collect();
        assert_eq!(units_covered(&players, &actors, Coverage::AnyMember), 1);
    }

    #[test]
    fn test_units_covered_all_members_requires_everyone() {
        let game_id = Uuid::new_v4();
        let persona = Uuid::new_v4();
        let a = with_persona(game_id, persona, true);
        let b = with_persona(game_id, persona, false);
        let players = vec![a.clone(), b.clone()];

        let partial: HashSet<Uuid> = [a.id].into_iter().collect();
        assert_eq!(units_covered(&players, &partial, Coverage::AllMembers), 0);

        let full: HashSet<Uuid> = [a.id, b.id].into_iter().collect();
        assert_eq!(units_covered(&players, &full, Coverage::AllMembers), 1);
    }

    #[test]
    fn test_unit_representative_prefers_lead() {
        let game_id = Uuid::new_v4();
        let persona = Uuid::new_v4();
        let member = with_persona(game_id, persona, false);
        let lead = with_persona(game_id, persona, true);
        let unit = vec![&member, &lead];
        assert_eq!(unit_representative(&unit).unwrap().id, lead.id);
    }
}
