// g_utils.rs — entity pool management and spatial queries

use crate::g_local::*;
use crate::game_import::{gi_linkentity, gi_unlinkentity, gi_warn};
use rayon::prelude::*;

/// Either finds a free entity slot, or allocates a new one. Slots reserved
/// for clients are never handed out. Reused slots keep their bumped
/// generation so stale handles fail to resolve.
pub fn spawn_entity(ctx: &mut GameContext, class_name: &str) -> usize {
    let first = ctx.max_clients + 1;

    for idx in first..ctx.edicts.len() {
        if !ctx.edicts[idx].inuse {
            let generation = ctx.edicts[idx].generation;
            ctx.edicts[idx] = GEntity {
                inuse: true,
                generation,
                class_name: class_name.to_string(),
                mass: 1.0,
                gravity: 1.0,
                ..GEntity::default()
            };
            if idx >= ctx.num_entities {
                ctx.num_entities = idx + 1;
            }
            return idx;
        }
    }

    let idx = ctx.edicts.len();
    ctx.edicts.push(GEntity {
        inuse: true,
        class_name: class_name.to_string(),
        mass: 1.0,
        gravity: 1.0,
        ..GEntity::default()
    });
    ctx.num_entities = idx + 1;
    idx
}

/// Marks the entity as free and bumps its generation. The world and client
/// slots are never freed.
pub fn free_entity(ctx: &mut GameContext, idx: usize) {
    if idx <= ctx.max_clients {
        gi_warn(&format!("tried to free reserved entity {}\n", idx));
        return;
    }

    gi_unlinkentity(idx as i32);

    let generation = ctx.edicts[idx].generation.wrapping_add(1);
    ctx.edicts[idx] = GEntity {
        generation,
        ..GEntity::default()
    };
}

/// Relink an entity after a bounds or origin change.
pub fn link_entity(ctx: &mut GameContext, idx: usize) {
    let ent = &mut ctx.edicts[idx];
    ent.abs_mins = vector_add(&ent.s.origin, &ent.mins);
    ent.abs_maxs = vector_add(&ent.s.origin, &ent.maxs);
    let (abs_mins, abs_maxs) = (ent.abs_mins, ent.abs_maxs);
    gi_linkentity(idx as i32, &abs_mins, &abs_maxs);
}

/// Find all solid entities within a radius of the origin. The scan runs in
/// parallel; results are sorted so callers observe ascending entity order.
pub fn find_radius(ctx: &GameContext, origin: &Vec3, radius: f32) -> Vec<usize> {
    let radius_sq = radius * radius;

    let mut result: Vec<usize> = ctx.edicts[1..ctx.num_entities]
        .par_iter()
        .enumerate()
        .filter_map(|(rel_idx, ent)| {
            if !ent.inuse {
                return None;
            }
            if ent.solid == Solid::Not {
                return None;
            }

            let eorg = [
                origin[0] - (ent.s.origin[0] + (ent.mins[0] + ent.maxs[0]) * 0.5),
                origin[1] - (ent.s.origin[1] + (ent.mins[1] + ent.maxs[1]) * 0.5),
                origin[2] - (ent.s.origin[2] + (ent.mins[2] + ent.maxs[2]) * 0.5),
            ];
            let dist_sq = eorg[0] * eorg[0] + eorg[1] * eorg[1] + eorg[2] * eorg[2];

            if dist_sq < radius_sq {
                Some(rel_idx + 1)
            } else {
                None
            }
        })
        .collect();

    result.sort_unstable();
    result
}

/// Find entities by class name, in ascending index order.
pub fn find_by_class_name(ctx: &GameContext, class_name: &str) -> Vec<usize> {
    (0..ctx.num_entities)
        .filter(|&i| ctx.edicts[i].inuse && ctx.edicts[i].class_name == class_name)
        .collect()
}

/// First entity with the given class name, if any.
pub fn find_first_by_class_name(ctx: &GameContext, class_name: &str) -> Option<usize> {
    (0..ctx.num_entities).find(|&i| ctx.edicts[i].inuse && ctx.edicts[i].class_name == class_name)
}

/// Returns true if ent1 and ent2 are on the same team. Spectators are
/// considered teammates of each other.
pub fn on_same_team(ctx: &GameContext, ent1_idx: usize, ent2_idx: usize) -> bool {
    let c1 = match ctx.edicts[ent1_idx].client {
        Some(c) => c,
        None => return false,
    };
    let c2 = match ctx.edicts[ent2_idx].client {
        Some(c) => c,
        None => return false,
    };

    if ctx.clients[c1].persistent.spectator && ctx.clients[c2].persistent.spectator {
        return true;
    }

    if ctx.level.teams == 0 && !ctx.level.ctf {
        return false;
    }

    ctx.clients[c1].persistent.team == ctx.clients[c2].persistent.team
        && ctx.clients[c1].persistent.team.is_some()
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::g_local::test::make_ctx;

    #[test]
    fn test_spawn_reuses_freed_slot_with_new_generation() {
        let mut ctx = make_ctx(2);

        let idx = spawn_entity(&mut ctx, "rocket");
        let handle = ctx.handle(idx);
        assert_eq!(ctx.resolve(handle), Some(idx));

        free_entity(&mut ctx, idx);
        assert_eq!(ctx.resolve(handle), None);

        let idx2 = spawn_entity(&mut ctx, "grenade");
        assert_eq!(idx2, idx); // slot reused
        assert_eq!(ctx.resolve(handle), None); // old handle stays dead
        assert_eq!(ctx.resolve(ctx.handle(idx2)), Some(idx2));
    }

    #[test]
    fn test_free_reserved_slot_refused() {
        let mut ctx = make_ctx(2);
        free_entity(&mut ctx, 0);
        free_entity(&mut ctx, 1);
        assert!(ctx.edicts[0].inuse);
        assert!(ctx.edicts[1].inuse);
    }

    #[test]
    fn test_find_radius_sorted_and_bounded() {
        let mut ctx = make_ctx(2);

        let near = spawn_entity(&mut ctx, "near");
        ctx.edicts[near].s.origin = [50.0, 0.0, 0.0];
        ctx.edicts[near].solid = Solid::Box;

        let far = spawn_entity(&mut ctx, "far");
        ctx.edicts[far].s.origin = [500.0, 0.0, 0.0];
        ctx.edicts[far].solid = Solid::Box;

        // clients sit at the origin
        let found = find_radius(&ctx, &[0.0, 0.0, 0.0], 100.0);
        assert!(found.contains(&near));
        assert!(!found.contains(&far));

        let mut sorted = found.clone();
        sorted.sort_unstable();
        assert_eq!(found, sorted);
    }

    #[test]
    fn test_on_same_team_requires_team_play() {
        let mut ctx = make_ctx(2);
        ctx.clients[0].persistent.team = Some(TeamId::Good);
        ctx.clients[1].persistent.team = Some(TeamId::Good);

        ctx.level.teams = 0;
        ctx.level.ctf = false;
        assert!(!on_same_team(&ctx, 1, 2));

        ctx.level.teams = 1;
        assert!(on_same_team(&ctx, 1, 2));

        ctx.clients[1].persistent.team = Some(TeamId::Evil);
        assert!(!on_same_team(&ctx, 1, 2));
    }
}
