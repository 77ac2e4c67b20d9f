// g_combat.rs — damage resolution

use crate::dispatch::{call_die, call_pain};
use crate::g_items;
use crate::g_local::*;
use crate::game_import::{gi_multicast, gi_trace, gi_write_byte, gi_write_dir, gi_write_position};

pub const QUAD_DAMAGE_FACTOR: f32 = 2.5;
pub const QUAD_KNOCKBACK_FACTOR: f32 = 2.0;

/// Returns true if the inflictor has a clear line to the target. Inline BSP
/// models are tested against their bounds midpoint; everything else gets a
/// trace to its origin and four corner offsets.
pub fn can_damage(ctx: &GameContext, targ_idx: usize, inflictor_idx: usize) -> bool {
    let inflictor_origin = ctx.edicts[inflictor_idx].s.origin;
    let targ = &ctx.edicts[targ_idx];

    if targ.solid == Solid::Bsp {
        let dest = vector_scale(&vector_add(&targ.abs_mins, &targ.abs_maxs), 0.5);

        let tr = gi_trace(
            &inflictor_origin,
            &VEC3_ORIGIN,
            &VEC3_ORIGIN,
            &dest,
            inflictor_idx as i32,
            MASK_SOLID,
        );
        return tr.fraction == 1.0 || tr.ent_index == targ_idx as i32;
    }

    let offsets: [[f32; 2]; 5] = [
        [0.0, 0.0],
        [15.0, 15.0],
        [15.0, -15.0],
        [-15.0, 15.0],
        [-15.0, -15.0],
    ];

    for off in &offsets {
        let dest = [
            targ.s.origin[0] + off[0],
            targ.s.origin[1] + off[1],
            targ.s.origin[2],
        ];
        let tr = gi_trace(
            &inflictor_origin,
            &VEC3_ORIGIN,
            &VEC3_ORIGIN,
            &dest,
            inflictor_idx as i32,
            MASK_SOLID,
        );
        if tr.fraction == 1.0 {
            return true;
        }
    }

    false
}

/// Broadcasts a damage effect to everyone potentially seeing it. Heavier
/// hits repeat the event, capped at four.
pub fn spawn_damage(te_type: i32, origin: &Vec3, normal: &Vec3, damage: i32) {
    if damage < 1 {
        return;
    }

    let mut count = (damage / 50).clamp(1, 4);
    while count > 0 {
        gi_write_byte(SV_CMD_TEMP_ENTITY);
        gi_write_byte(te_type);
        gi_write_position(origin);
        gi_write_dir(normal);
        gi_multicast(origin, MULTICAST_PVS);
        count -= 1;
    }
}

/// Absorbs damage into the target's armor, consuming inventory. Returns the
/// amount saved.
pub fn check_armor(
    ctx: &mut GameContext,
    targ_idx: usize,
    pos: &Vec3,
    normal: &Vec3,
    damage: i32,
    dflags: DamageFlags,
) -> i32 {
    if damage < 1 {
        return 0;
    }
    if dflags.intersects(DMG_NO_ARMOR | DMG_NO_GOD) {
        return 0;
    }

    let client = match ctx.edicts[targ_idx].client {
        Some(c) => c,
        None => return 0,
    };
    let armor_idx = match g_items::client_armor(ctx, targ_idx) {
        Some(i) => i,
        None => return 0,
    };
    let info = match g_items::armor_info(armor_idx) {
        Some(i) => i,
        None => return 0,
    };

    let protection = if dflags.contains(DMG_ENERGY) {
        info.energy_protection
    } else {
        info.normal_protection
    };

    let quantity = ctx.clients[client].locals.inventory[armor_idx] as i32;
    let saved = ((damage as f32 * protection) as i32).clamp(0, quantity);

    ctx.clients[client].locals.inventory[armor_idx] -= saved as i16;
    spawn_damage(TE_BLOOD, pos, normal, saved);

    saved
}

/// Inflicts damage on the target.
///
/// `inflictor_idx` is the entity immediately responsible (a projectile, or
/// the attacker itself for hitscan); `attacker_idx` is the entity that owns
/// the attack. Knockback is applied even when scaling drops the damage to
/// zero.
#[allow(clippy::too_many_arguments)]
pub fn damage(
    ctx: &mut GameContext,
    targ_idx: usize,
    inflictor_idx: usize,
    attacker_idx: usize,
    dir: &Vec3,
    point: &Vec3,
    normal: &Vec3,
    mut damage: i32,
    mut knockback: i32,
    dflags: DamageFlags,
    mut means: u32,
) {
    let _ = inflictor_idx;

    if !ctx.edicts[targ_idx].take_damage {
        return;
    }

    if let Some(c) = ctx.edicts[targ_idx].client {
        if ctx.clients[c].locals.respawn_protection_time > ctx.level.time {
            return;
        }
    }

    if let Some(c) = ctx.edicts[attacker_idx].client {
        if ctx.clients[c].locals.quad_damage_time > ctx.level.time {
            damage = (damage as f32 * QUAD_DAMAGE_FACTOR) as i32;
            knockback = (knockback as f32 * QUAD_KNOCKBACK_FACTOR) as i32;
        }

        damage = (damage as f32 * ctx.clients[c].persistent.handicap as f32 / 100.0) as i32;
    }

    // no self damage in instagib or arena
    if targ_idx == attacker_idx
        && matches!(ctx.level.gameplay, Gameplay::Instagib | Gameplay::Arena)
    {
        damage = 0;
    }

    if targ_idx != attacker_idx
        && ctx.edicts[targ_idx].client.is_some()
        && ctx.edicts[attacker_idx].client.is_some()
        && crate::g_utils::on_same_team(ctx, targ_idx, attacker_idx)
    {
        if means == MOD_TELEFRAG {
            // telefrags can not be avoided
            means |= MOD_FRIENDLY_FIRE;
        } else if ctx.level.friendly_fire {
            means |= MOD_FRIENDLY_FIRE;
        } else {
            damage = 0;
        }
    }

    if knockback != 0 && ctx.edicts[targ_idx].move_type >= MoveType::Walk {
        let mut ndir = *dir;
        vector_normalize(&mut ndir);

        // bias the push upward so targets leave the ground
        if ndir[2] >= -0.25 {
            ndir[2] = ndir[2].max(0.25);
            vector_normalize(&mut ndir);
        }

        let mass = ctx.edicts[targ_idx].mass.clamp(1.0, 1000.0);
        let scale = if ctx.edicts[targ_idx].client.is_some() && targ_idx == attacker_idx {
            1200.0
        } else {
            800.0
        };

        let kvel = vector_scale(&ndir, scale * knockback as f32 / mass);
        ctx.edicts[targ_idx].velocity = vector_add(&ctx.edicts[targ_idx].velocity, &kvel);

        let giblet = match ctx.edicts[targ_idx].client {
            Some(c) => ctx.clients[c].pm.pm_flags & PMF_GIBLET != 0,
            None => true,
        };
        if giblet {
            let ascale = 100.0 * knockback as f32 / mass;
            let avel = vector_scale(&ndir, ascale);
            ctx.edicts[targ_idx].avelocity = vector_add(&ctx.edicts[targ_idx].avelocity, &avel);
        } else if let Some(c) = ctx.edicts[targ_idx].client {
            ctx.clients[c].pm.pm_flags |= PMF_TIME_PUSHED;
            ctx.clients[c].pm.pm_time = 120;
        }
    }

    let mut take = damage;
    let mut save = 0;

    if ctx.edicts[targ_idx].flags.contains(FL_GOD_MODE) && !dflags.contains(DMG_NO_GOD) {
        take = 0;
        save = damage;
        spawn_damage(TE_BLOOD, point, normal, save);
    }

    let mut asave = check_armor(ctx, targ_idx, point, normal, take, dflags);
    take -= asave;
    asave += save;

    if let Some(c) = ctx.edicts[targ_idx].client {
        ctx.clients[c].locals.damage_armor += asave as i16;
        ctx.clients[c].locals.damage_health += take as i16;
        ctx.clients[c].locals.damage_kick += knockback as f32;
    }
    if targ_idx != attacker_idx {
        if let Some(c) = ctx.edicts[attacker_idx].client {
            ctx.clients[c].locals.damage_inflicted += (take + asave) as i16;
        }
    }

    let attacker_handle = ctx.handle(attacker_idx);
    ctx.edicts[targ_idx].enemy = Some(attacker_handle);

    let was_dead = ctx.edicts[targ_idx].dead;

    if take > 0 {
        spawn_damage(damage_event(ctx, targ_idx, dflags), point, normal, take);

        ctx.edicts[targ_idx].health -= take;
        if ctx.edicts[targ_idx].health <= 0 {
            // a corpse only dies once
            if was_dead {
                return;
            }
            ctx.edicts[targ_idx].dead = true;
            call_die(ctx, targ_idx, attacker_idx, means);
            return;
        }
    }

    if was_dead {
        return;
    }

    if take > 0 || knockback > 0 {
        call_pain(ctx, targ_idx, attacker_idx, take, knockback);
    }
}

/// Picks the impact event for the target material: clients bleed,
/// structural entities spark or take bullet marks.
fn damage_event(ctx: &GameContext, targ_idx: usize, dflags: DamageFlags) -> i32 {
    if ctx.edicts[targ_idx].client.is_some() {
        TE_BLOOD
    } else if dflags.contains(DMG_BULLET) {
        TE_BULLET
    } else {
        TE_SPARKS
    }
}

/// Inflicts radius damage around the inflictor. Both damage and knockback
/// fall off by half the distance; the attacker takes reduced splash from
/// their own attacks.
#[allow(clippy::too_many_arguments)]
pub fn radius_damage(
    ctx: &mut GameContext,
    inflictor_idx: usize,
    attacker_idx: usize,
    damage: i32,
    knockback: i32,
    radius: f32,
    ignore_idx: Option<usize>,
    means: u32,
) {
    let origin = ctx.edicts[inflictor_idx].s.origin;

    for ent_idx in crate::g_utils::find_radius(ctx, &origin, radius) {
        if Some(ent_idx) == ignore_idx {
            continue;
        }
        if !ctx.edicts[ent_idx].take_damage {
            continue;
        }

        let dir = vector_subtract(&ctx.edicts[ent_idx].s.origin, &origin);
        let dist = vector_length(&dir);

        let mut d = damage as f32 - 0.5 * dist;
        let k = knockback as f32 - 0.5 * dist;

        if ent_idx == attacker_idx {
            // reduced self-inflicted splash
            d *= if means == MOD_BFG_BLAST { 0.25 } else { 0.5 };
        }

        if d <= 0.0 && k <= 0.0 {
            continue;
        }

        if can_damage(ctx, ent_idx, inflictor_idx) {
            let point = ctx.edicts[ent_idx].s.origin;
            self::damage(
                ctx,
                ent_idx,
                inflictor_idx,
                attacker_idx,
                &dir,
                &point,
                &VEC3_ORIGIN,
                d as i32,
                k as i32,
                DMG_RADIUS,
                means,
            );
        }
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{DieFunc, PainFunc};
    use crate::g_items::{ITEM_COMBAT_ARMOR, ITEM_JACKET_ARMOR};
    use crate::g_local::test::make_ctx;

    fn hit(ctx: &mut GameContext, targ: usize, attacker: usize, dmg: i32, knockback: i32, dflags: DamageFlags) {
        let dir = [1.0, 0.0, 0.0];
        let point = ctx.edicts[targ].s.origin;
        damage(ctx, targ, attacker, attacker, &dir, &point, &VEC3_ORIGIN, dmg, knockback, dflags, MOD_UNKNOWN);
    }

    #[test]
    fn test_non_positive_damage_is_noop() {
        let mut ctx = make_ctx(2);
        hit(&mut ctx, 1, 2, 0, 0, DamageFlags::empty());
        assert_eq!(ctx.edicts[1].health, 100);
        hit(&mut ctx, 1, 2, -10, 0, DamageFlags::empty());
        assert_eq!(ctx.edicts[1].health, 100);
    }

    #[test]
    fn test_jacket_armor_absorption() {
        let mut ctx = make_ctx(2);
        ctx.clients[0].locals.inventory[ITEM_JACKET_ARMOR] = 50;

        // 60 kinetic at 30% protection saves 18
        hit(&mut ctx, 1, 2, 60, 0, DamageFlags::empty());
        assert_eq!(ctx.edicts[1].health, 58);
        assert_eq!(ctx.clients[0].locals.inventory[ITEM_JACKET_ARMOR], 32);
    }

    #[test]
    fn test_armor_plus_health_equals_original_damage() {
        let mut ctx = make_ctx(2);
        ctx.clients[0].locals.inventory[ITEM_COMBAT_ARMOR] = 100;

        hit(&mut ctx, 1, 2, 75, 0, DamageFlags::empty());
        let absorbed = 100 - ctx.clients[0].locals.inventory[ITEM_COMBAT_ARMOR] as i32;
        let taken = 100 - ctx.edicts[1].health;
        assert_eq!(absorbed + taken, 75);
        assert_eq!(ctx.clients[0].locals.damage_armor as i32, absorbed);
        assert_eq!(ctx.clients[0].locals.damage_health as i32, taken);
    }

    #[test]
    fn test_jacket_ignores_energy_damage() {
        let mut ctx = make_ctx(2);
        ctx.clients[0].locals.inventory[ITEM_JACKET_ARMOR] = 50;

        hit(&mut ctx, 1, 2, 40, 0, DMG_ENERGY);
        assert_eq!(ctx.edicts[1].health, 60);
        assert_eq!(ctx.clients[0].locals.inventory[ITEM_JACKET_ARMOR], 50);
    }

    #[test]
    fn test_god_mode_blocks_unless_no_god() {
        let mut ctx = make_ctx(2);
        ctx.edicts[1].flags |= FL_GOD_MODE;

        hit(&mut ctx, 1, 2, 50, 0, DamageFlags::empty());
        assert_eq!(ctx.edicts[1].health, 100);
        // blocked damage still reports through the armor accumulator
        assert_eq!(ctx.clients[0].locals.damage_armor, 50);

        hit(&mut ctx, 1, 2, 50, 0, DMG_NO_GOD);
        assert_eq!(ctx.edicts[1].health, 50);
    }

    #[test]
    fn test_quad_and_handicap_scaling() {
        let mut ctx = make_ctx(2);
        ctx.level.time = 1000;
        ctx.clients[1].locals.quad_damage_time = 5000;
        ctx.clients[1].persistent.handicap = 50;

        // 40 * 2.5 = 100, then 50% handicap = 50
        hit(&mut ctx, 1, 2, 40, 0, DamageFlags::empty());
        assert_eq!(ctx.edicts[1].health, 50);
    }

    #[test]
    fn test_no_self_damage_in_instagib_or_arena() {
        let mut ctx = make_ctx(1);
        ctx.level.gameplay = Gameplay::Instagib;

        hit(&mut ctx, 1, 1, 100, 50, DamageFlags::empty());
        assert_eq!(ctx.edicts[1].health, 100);
        // knockback still applies
        assert!(vector_length(&ctx.edicts[1].velocity) > 0.0);
    }

    #[test]
    fn test_friendly_fire_gating() {
        let mut ctx = make_ctx(2);
        ctx.level.teams = 1;
        ctx.clients[0].persistent.team = Some(TeamId::Good);
        ctx.clients[1].persistent.team = Some(TeamId::Good);

        ctx.level.friendly_fire = false;
        hit(&mut ctx, 1, 2, 50, 0, DamageFlags::empty());
        assert_eq!(ctx.edicts[1].health, 100);

        ctx.level.friendly_fire = true;
        hit(&mut ctx, 1, 2, 50, 0, DamageFlags::empty());
        assert_eq!(ctx.edicts[1].health, 50);
    }

    #[test]
    fn test_knockback_scales_by_attacker() {
        let mut ctx = make_ctx(2);

        // self-damage gets the 1200 scale, mass 200
        hit(&mut ctx, 1, 1, 0, 100, DamageFlags::empty());
        let self_speed = vector_length(&ctx.edicts[1].velocity);
        assert!((self_speed - 1200.0 * 100.0 / 200.0).abs() < 0.01);

        // another attacker gets the 800 scale
        hit(&mut ctx, 2, 1, 0, 100, DamageFlags::empty());
        let other_speed = vector_length(&ctx.edicts[2].velocity);
        assert!((other_speed - 800.0 * 100.0 / 200.0).abs() < 0.01);

        // clients get push time instead of angular velocity
        assert_eq!(ctx.clients[0].pm.pm_flags & PMF_TIME_PUSHED, PMF_TIME_PUSHED);
        assert_eq!(ctx.clients[0].pm.pm_time, 120);
        assert_eq!(ctx.edicts[1].avelocity, VEC3_ORIGIN);
    }

    #[test]
    fn test_knockback_biased_upward() {
        let mut ctx = make_ctx(2);
        let dir = [1.0, 0.0, 0.0];
        let point = ctx.edicts[1].s.origin;
        damage(&mut ctx, 1, 2, 2, &dir, &point, &VEC3_ORIGIN, 0, 100, DamageFlags::empty(), MOD_UNKNOWN);
        assert!(ctx.edicts[1].velocity[2] > 0.0);
    }

    #[test]
    fn test_radius_damage_falloff_and_cutoff() {
        let mut ctx = make_ctx(3);
        ctx.edicts[1].s.origin = [0.0, 0.0, 0.0];
        ctx.edicts[2].s.origin = [100.0, 0.0, 0.0];
        ctx.edicts[3].s.origin = [300.0, 0.0, 0.0];

        let inflictor = crate::g_utils::spawn_entity(&mut ctx, "rocket");
        ctx.edicts[inflictor].s.origin = [0.0, 0.0, 0.0];

        // 120 damage reaches out to 240 units; entity 3 sits past that
        radius_damage(&mut ctx, inflictor, 1, 120, 120, 1000.0, None, MOD_ROCKET_SPLASH);

        // point-blank self splash: 120 * 0.5 = 60
        assert_eq!(ctx.edicts[1].health, 40);
        // at 100 units: 120 - 50 = 70
        assert_eq!(ctx.edicts[2].health, 30);
        // past max distance: untouched
        assert_eq!(ctx.edicts[3].health, 100);
    }

    #[test]
    fn test_radius_damage_bfg_self_scale() {
        let mut ctx = make_ctx(1);
        let inflictor = crate::g_utils::spawn_entity(&mut ctx, "bfg blast");
        ctx.edicts[inflictor].s.origin = ctx.edicts[1].s.origin;

        radius_damage(&mut ctx, inflictor, 1, 200, 0, 1000.0, None, MOD_BFG_BLAST);
        assert_eq!(ctx.edicts[1].health, 50);
    }

    #[test]
    fn test_radius_damage_ignores_requested_entity() {
        let mut ctx = make_ctx(2);
        let inflictor = crate::g_utils::spawn_entity(&mut ctx, "grenade");
        ctx.edicts[inflictor].s.origin = [0.0, 0.0, 0.0];

        radius_damage(&mut ctx, inflictor, 0, 100, 0, 1000.0, Some(1), MOD_GRENADE_SPLASH);
        assert_eq!(ctx.edicts[1].health, 100);
        assert_eq!(ctx.edicts[2].health, 0);
    }

    #[test]
    fn test_respawn_protection_blocks_damage() {
        let mut ctx = make_ctx(2);
        ctx.level.time = 1000;
        ctx.clients[0].locals.respawn_protection_time = 2000;

        hit(&mut ctx, 1, 2, 50, 0, DamageFlags::empty());
        assert_eq!(ctx.edicts[1].health, 100);
    }

    #[test]
    fn test_corpse_dies_only_once() {
        let mut ctx = make_ctx(2);
        ctx.edicts[1].die = DieFunc::Client;

        hit(&mut ctx, 1, 2, 200, 0, DamageFlags::empty());
        assert!(ctx.edicts[1].dead);
        assert_eq!(ctx.clients[1].persistent.score, 1);

        // further hits gib the corpse without a second obituary
        hit(&mut ctx, 1, 2, 200, 0, DamageFlags::empty());
        assert_eq!(ctx.clients[1].persistent.score, 1);
    }

    #[test]
    fn test_telefrag_overrides_friendly_fire_protection() {
        let mut ctx = make_ctx(2);
        ctx.level.teams = 1;
        ctx.level.friendly_fire = false;
        ctx.clients[0].persistent.team = Some(TeamId::Good);
        ctx.clients[1].persistent.team = Some(TeamId::Good);
        ctx.edicts[1].die = DieFunc::Client;

        let dir = [0.0, 0.0, -1.0];
        let point = ctx.edicts[1].s.origin;
        damage(&mut ctx, 1, 2, 2, &dir, &point, &VEC3_ORIGIN, 1000, 0, DMG_NO_GOD, MOD_TELEFRAG);

        // the full damage lands and the kill counts as friendly fire
        assert!(ctx.edicts[1].dead);
        assert_eq!(ctx.clients[1].persistent.score, -1);
    }

    #[test]
    fn test_fully_absorbed_hit_still_shoves() {
        let mut ctx = make_ctx(2);
        ctx.edicts[1].flags |= FL_GOD_MODE;
        ctx.edicts[1].pain = PainFunc::Client;

        hit(&mut ctx, 1, 2, 40, 50, DamageFlags::empty());
        assert_eq!(ctx.edicts[1].health, 100);
        assert!(vector_length(&ctx.edicts[1].velocity) > 0.0);

        // a corpse absorbs the shove without pain feedback
        ctx.edicts[1].dead = true;
        let before = ctx.edicts[1].velocity;
        hit(&mut ctx, 1, 2, 40, 50, DamageFlags::empty());
        assert!(vector_length(&ctx.edicts[1].velocity) > vector_length(&before));
    }

    #[test]
    fn test_damage_event_matches_target_material() {
        let mut ctx = make_ctx(1);
        let door = crate::g_utils::spawn_entity(&mut ctx, "func_door");

        assert_eq!(damage_event(&ctx, 1, DamageFlags::empty()), TE_BLOOD);
        assert_eq!(damage_event(&ctx, door, DMG_BULLET), TE_BULLET);
        assert_eq!(damage_event(&ctx, door, DMG_RADIUS), TE_SPARKS);
    }
}
