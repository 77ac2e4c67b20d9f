// g_phys.rs — per-entity movement

use crate::dispatch::{call_think, call_touch, has_touch};
use crate::g_local::*;
use crate::game_import::{gi_frame_seconds, gi_trace};

const STOP_EPSILON: f32 = 0.1;

/// Velocity reflection off a plane. `overbounce` is 1.0 for a slide and
/// greater for a bounce.
pub fn clip_velocity(incoming: &Vec3, normal: &Vec3, overbounce: f32) -> Vec3 {
    let backoff = dot_product(incoming, normal) * overbounce;

    let mut out = [0.0f32; 3];
    for i in 0..3 {
        let change = normal[i] * backoff;
        out[i] = incoming[i] - change;
        if out[i].abs() < STOP_EPSILON {
            out[i] = 0.0;
        }
    }
    out
}

/// Fires the entity's think if its deadline has arrived. Returns false if
/// the entity freed itself.
pub fn run_think(ctx: &mut GameContext, ent_idx: usize) -> bool {
    let next = ctx.edicts[ent_idx].next_think;
    if next == 0 || next > ctx.level.time {
        return true;
    }

    ctx.edicts[ent_idx].next_think = 0;
    call_think(ctx, ent_idx);

    ctx.edicts[ent_idx].inuse
}

/// Touch both sides of an impact.
fn impact(ctx: &mut GameContext, e1: usize, e2: usize) {
    if has_touch(ctx, e1) && ctx.edicts[e1].solid != Solid::Not {
        call_touch(ctx, e1, e2);
    }
    if has_touch(ctx, e2) && ctx.edicts[e2].solid != Solid::Not {
        call_touch(ctx, e2, e1);
    }
}

/// Trace-clipped linear move for one frame. Returns the trace so callers
/// can react to the surface hit.
fn fly_move(ctx: &mut GameContext, ent_idx: usize, frame_seconds: f32) -> Trace {
    let ent = &ctx.edicts[ent_idx];
    let start = ent.s.origin;
    let end = vector_ma(&start, frame_seconds, &ent.velocity);

    let mask = if ent.clip_mask != 0 {
        ent.clip_mask
    } else {
        MASK_SOLID
    };

    let tr = gi_trace(&start, &ent.mins, &ent.maxs, &end, ent_idx as i32, mask);

    ctx.edicts[ent_idx].s.origin = tr.endpos;
    crate::g_utils::link_entity(ctx, ent_idx);

    if tr.ent_index > 0 {
        impact(ctx, ent_idx, tr.ent_index as usize);
    }

    tr
}

/// Advances one entity for the current frame according to its move type.
/// Client-driven entities are moved by their input commands, not here.
pub fn run_entity(ctx: &mut GameContext, ent_idx: usize) {
    let frame_seconds = gi_frame_seconds();

    match ctx.edicts[ent_idx].move_type {
        MoveType::None | MoveType::Walk => {
            run_think(ctx, ent_idx);
        }

        MoveType::Push | MoveType::Stop => {
            // movers translate their riders; the think drives the motion
            run_think(ctx, ent_idx);
        }

        MoveType::NoClip => {
            if !run_think(ctx, ent_idx) {
                return;
            }
            let ent = &mut ctx.edicts[ent_idx];
            ent.s.angles = vector_ma(&ent.s.angles, frame_seconds, &ent.avelocity);
            ent.s.origin = vector_ma(&ent.s.origin, frame_seconds, &ent.velocity);
            crate::g_utils::link_entity(ctx, ent_idx);
        }

        MoveType::Fly => {
            if !run_think(ctx, ent_idx) {
                return;
            }
            let tr = fly_move(ctx, ent_idx, frame_seconds);
            if !ctx.edicts[ent_idx].inuse {
                return;
            }
            if tr.fraction < 1.0 {
                let v = clip_velocity(&ctx.edicts[ent_idx].velocity, &tr.plane.normal, 1.0);
                ctx.edicts[ent_idx].velocity = v;
            }
        }

        MoveType::Bounce => {
            if !run_think(ctx, ent_idx) {
                return;
            }

            {
                let gravity = ctx.level.gravity as f32 * ctx.edicts[ent_idx].gravity;
                let ent = &mut ctx.edicts[ent_idx];
                ent.velocity[2] -= gravity * frame_seconds;
                ent.s.angles = vector_ma(&ent.s.angles, frame_seconds, &ent.avelocity);
            }

            let tr = fly_move(ctx, ent_idx, frame_seconds);
            if !ctx.edicts[ent_idx].inuse {
                return;
            }

            if tr.fraction < 1.0 {
                let v = clip_velocity(&ctx.edicts[ent_idx].velocity, &tr.plane.normal, 1.5);
                ctx.edicts[ent_idx].velocity = v;

                // settle on mostly-horizontal surfaces at low speed
                if tr.plane.normal[2] > 0.7 && ctx.edicts[ent_idx].velocity[2] < 60.0 {
                    let ent = &mut ctx.edicts[ent_idx];
                    vector_clear(&mut ent.velocity);
                    vector_clear(&mut ent.avelocity);
                }
            }
        }
    }
}

// ============================================================
// Tests
// ============================================================
