// dispatch.rs — entity callback dispatch
//
// Entity behavior slots are capability-tagged enums rather than function
// pointers. An unset slot is a no-op; a fatally damaged entity with no die
// behavior is logged rather than fatal.

use crate::g_local::GameContext;
use crate::game_import::gi_debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThinkFunc {
    #[default]
    None,
    /// Releases the entity's slot back to the pool.
    FreeEntity,
    /// Makes a consumed item visible and touchable again.
    RespawnItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TouchFunc {
    #[default]
    None,
    /// Pickup handling for items.
    PickupItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PainFunc {
    #[default]
    None,
    Client,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DieFunc {
    #[default]
    None,
    Client,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockedFunc {
    #[default]
    None,
}

pub fn call_think(ctx: &mut GameContext, self_idx: usize) {
    match ctx.edicts[self_idx].think {
        ThinkFunc::None => {}
        ThinkFunc::FreeEntity => crate::g_utils::free_entity(ctx, self_idx),
        ThinkFunc::RespawnItem => crate::g_items::respawn_item(ctx, self_idx),
    }
}

pub fn call_touch(ctx: &mut GameContext, self_idx: usize, other_idx: usize) {
    match ctx.edicts[self_idx].touch {
        TouchFunc::None => {}
        TouchFunc::PickupItem => crate::g_items::touch_item(ctx, self_idx, other_idx),
    }
}

pub fn call_pain(ctx: &mut GameContext, self_idx: usize, attacker_idx: usize, damage: i32, knockback: i32) {
    match ctx.edicts[self_idx].pain {
        PainFunc::None => {}
        PainFunc::Client => crate::p_client::client_pain(ctx, self_idx, attacker_idx, damage, knockback),
    }
}

/// Dispatches the die behavior. Returns false when the entity has none,
/// which the caller reports through the debug log.
pub fn call_die(ctx: &mut GameContext, self_idx: usize, attacker_idx: usize, means: u32) {
    match ctx.edicts[self_idx].die {
        DieFunc::None => {
            gi_debug(&format!(
                "No die function for {}\n",
                ctx.edicts[self_idx].class_name
            ));
        }
        DieFunc::Client => crate::p_client::client_die(ctx, self_idx, attacker_idx, means),
    }
}

pub fn call_blocked(ctx: &mut GameContext, self_idx: usize, _other_idx: usize) {
    match ctx.edicts[self_idx].blocked {
        BlockedFunc::None => {}
    }
}

pub fn has_touch(ctx: &GameContext, self_idx: usize) -> bool {
    ctx.edicts[self_idx].touch != TouchFunc::None
}
