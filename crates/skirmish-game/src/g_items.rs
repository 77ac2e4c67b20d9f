// g_items.rs — item definitions, armor lookup, pickup and reset handling

use crate::dispatch::{ThinkFunc, TouchFunc};
use crate::g_local::*;
use crate::game_import::gi_sound;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Armor {
    None,
    Jacket,
    Combat,
    Body,
}

/// Armor attributes.
#[derive(Debug, Clone, Copy)]
pub struct ArmorInfo {
    pub tag: Armor,
    pub base_count: i16,
    pub max_count: i16,
    pub normal_protection: f32,
    pub energy_protection: f32,
}

#[derive(Debug, Clone)]
pub struct GItem {
    pub class_name: &'static str,
    pub pickup_name: &'static str,
    pub armor: Option<ArmorInfo>,
    /// Seconds until a consumed item respawns.
    pub respawn_seconds: u32,
}

/// Item indices are stable; inventories are indexed by these.
pub const ITEM_NONE: usize = 0;
pub const ITEM_JACKET_ARMOR: usize = 1;
pub const ITEM_COMBAT_ARMOR: usize = 2;
pub const ITEM_BODY_ARMOR: usize = 3;
pub const ITEM_QUAD_DAMAGE: usize = 4;
pub const NUM_ITEMS: usize = 5;

pub const ITEMS: [GItem; NUM_ITEMS] = [
    GItem {
        class_name: "item_none",
        pickup_name: "",
        armor: None,
        respawn_seconds: 0,
    },
    GItem {
        class_name: "item_armor_jacket",
        pickup_name: "Jacket Armor",
        armor: Some(ArmorInfo {
            tag: Armor::Jacket,
            base_count: 25,
            max_count: 50,
            normal_protection: 0.30,
            energy_protection: 0.00,
        }),
        respawn_seconds: 20,
    },
    GItem {
        class_name: "item_armor_combat",
        pickup_name: "Combat Armor",
        armor: Some(ArmorInfo {
            tag: Armor::Combat,
            base_count: 50,
            max_count: 100,
            normal_protection: 0.60,
            energy_protection: 0.30,
        }),
        respawn_seconds: 20,
    },
    GItem {
        class_name: "item_armor_body",
        pickup_name: "Body Armor",
        armor: Some(ArmorInfo {
            tag: Armor::Body,
            base_count: 100,
            max_count: 200,
            normal_protection: 0.80,
            energy_protection: 0.60,
        }),
        respawn_seconds: 20,
    },
    GItem {
        class_name: "item_quad",
        pickup_name: "Quad Damage",
        armor: None,
        respawn_seconds: 60,
    },
];

pub fn find_item_by_class_name(class_name: &str) -> Option<usize> {
    ITEMS.iter().position(|i| i.class_name == class_name)
}

/// The strongest armor the client currently holds, body first.
pub fn client_armor(ctx: &GameContext, ent_idx: usize) -> Option<usize> {
    let client = ctx.edicts[ent_idx].client?;
    let inventory = &ctx.clients[client].locals.inventory;

    for item_idx in [ITEM_BODY_ARMOR, ITEM_COMBAT_ARMOR, ITEM_JACKET_ARMOR] {
        if inventory.get(item_idx).copied().unwrap_or(0) > 0 {
            return Some(item_idx);
        }
    }
    None
}

pub fn armor_info(item_idx: usize) -> Option<&'static ArmorInfo> {
    ITEMS.get(item_idx).and_then(|i| i.armor.as_ref())
}

/// Touch behavior for item entities: apply the pickup, then hide the item
/// until its respawn think fires. Dropped items are freed on pickup.
pub fn touch_item(ctx: &mut GameContext, self_idx: usize, other_idx: usize) {
    let item_idx = match ctx.edicts[self_idx].item {
        Some(i) => i,
        None => return,
    };
    let client = match ctx.edicts[other_idx].client {
        Some(c) => c,
        None => return,
    };
    if ctx.edicts[other_idx].health <= 0 {
        return;
    }

    let taken = match ITEMS[item_idx].armor {
        Some(ref info) => {
            let count = &mut ctx.clients[client].locals.inventory[item_idx];
            if *count >= info.max_count {
                false
            } else {
                *count = (*count + info.base_count).min(info.max_count);
                true
            }
        }
        None => {
            if item_idx == ITEM_QUAD_DAMAGE {
                // quad stacks by time, not by count
                let base = ctx.clients[client].locals.quad_damage_time.max(ctx.level.time);
                ctx.clients[client].locals.quad_damage_time = base + 30000;
                ctx.clients[client].locals.inventory[ITEM_QUAD_DAMAGE] = 1;
                true
            } else {
                false
            }
        }
    };

    if !taken {
        return;
    }

    gi_sound(other_idx as i32, ctx.media.sounds.teleport, ATTEN_NORM);

    if ctx.edicts[self_idx].spawn_flags & SF_ITEM_DROPPED != 0 {
        crate::g_utils::free_entity(ctx, self_idx);
        return;
    }

    // hide until respawn
    ctx.edicts[self_idx].solid = Solid::Not;
    ctx.edicts[self_idx].s.model_index = 0;
    ctx.edicts[self_idx].think = ThinkFunc::RespawnItem;
    ctx.edicts[self_idx].next_think = ctx.level.time + ITEMS[item_idx].respawn_seconds * 1000;
}

/// Think behavior restoring a consumed item.
pub fn respawn_item(ctx: &mut GameContext, self_idx: usize) {
    ctx.edicts[self_idx].solid = Solid::Trigger;
    ctx.edicts[self_idx].s.model_index = 1;
    ctx.edicts[self_idx].think = ThinkFunc::None;
    ctx.edicts[self_idx].next_think = 0;
    crate::g_utils::link_entity(ctx, self_idx);
}

/// Restore a single item entity to its level-load state.
pub fn reset_item(ctx: &mut GameContext, self_idx: usize) {
    ctx.edicts[self_idx].solid = Solid::Trigger;
    ctx.edicts[self_idx].s.model_index = 1;
    ctx.edicts[self_idx].touch = TouchFunc::PickupItem;
    ctx.edicts[self_idx].think = ThinkFunc::None;
    ctx.edicts[self_idx].next_think = 0;
    crate::g_utils::link_entity(ctx, self_idx);
}

/// Reset all items in the level: dropped items are freed, placed items are
/// restored.
pub fn reset_items(ctx: &mut GameContext) {
    for i in 1..ctx.num_entities {
        if !ctx.edicts[i].inuse {
            continue;
        }
        if ctx.edicts[i].item.is_none() {
            continue;
        }

        if ctx.edicts[i].spawn_flags & SF_ITEM_DROPPED != 0 {
            crate::g_utils::free_entity(ctx, i);
            continue;
        }

        reset_item(ctx, i);
    }
}

/// Spawn an item entity of the given kind at an origin.
pub fn spawn_item(ctx: &mut GameContext, item_idx: usize, origin: &Vec3) -> usize {
    let ent_idx = crate::g_utils::spawn_entity(ctx, ITEMS[item_idx].class_name);
    ctx.edicts[ent_idx].s.origin = *origin;
    ctx.edicts[ent_idx].mins = [-16.0, -16.0, -16.0];
    ctx.edicts[ent_idx].maxs = [16.0, 16.0, 16.0];
    ctx.edicts[ent_idx].solid = Solid::Trigger;
    ctx.edicts[ent_idx].s.model_index = 1;
    ctx.edicts[ent_idx].item = Some(item_idx);
    ctx.edicts[ent_idx].touch = TouchFunc::PickupItem;
    crate::g_utils::link_entity(ctx, ent_idx);
    ent_idx
}

// ============================================================
// Tests
// ============================================================
