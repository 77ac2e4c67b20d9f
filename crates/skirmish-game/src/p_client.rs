// p_client.rs — client lifecycle: connect, spawn, input, death

use crate::dispatch::{DieFunc, PainFunc};
use crate::g_items::NUM_ITEMS;
use crate::g_local::*;
use crate::game_import::{gi_bprintf, gi_cprintf, gi_sound};
use rand::Rng;

/// Minimum delay between death and respawn.
const RESPAWN_DELAY: u32 = 1000;

// ============================================================
// Connection lifecycle
// ============================================================

/// Called when a client first contacts the server. Persistent state is
/// wiped; returning false rejects the connection.
pub fn client_connect(ctx: &mut GameContext, ent_idx: usize, user_info: &str) -> bool {
    let client = ent_idx - 1;

    ctx.clients[client] = GClient::default();
    ctx.clients[client].persistent.connected = true;
    ctx.clients[client].locals.inventory = vec![0; NUM_ITEMS];

    ctx.edicts[ent_idx].inuse = true;
    ctx.edicts[ent_idx].class_name = "client".to_string();
    ctx.edicts[ent_idx].client = Some(client);

    if info_value_for_key(user_info, "spectator") == "1" {
        ctx.clients[client].persistent.spectator = true;
    }

    client_user_info_changed(ctx, ent_idx, user_info);
    true
}

/// Called when the client has loaded the level and is ready to play.
pub fn client_begin(ctx: &mut GameContext, ent_idx: usize) {
    let client = match ctx.edicts[ent_idx].client {
        Some(c) => c,
        None => return,
    };

    // joining an in-progress match means spectating
    if ctx.level.match_mode && ctx.level.match_state == MatchState::Playing {
        ctx.clients[client].persistent.spectator = true;
        gi_cprintf(
            ent_idx as i32,
            PRINT_HIGH,
            "Match in progress, you are a spectator\n",
        );
    } else if ctx.level.teams != 0 || ctx.level.ctf {
        if ctx.clients[client].persistent.team.is_none() {
            ctx.clients[client].persistent.spectator = true;
        }
    }

    client_respawn(ctx, ent_idx);

    let name = ctx.clients[client].persistent.net_name.clone();
    gi_bprintf(PRINT_HIGH, &format!("{} connected\n", name));
}

/// Reparses the client's info string: name, skin, handicap. Team skins are
/// enforced while team play is on.
pub fn client_user_info_changed(ctx: &mut GameContext, ent_idx: usize, user_info: &str) {
    let client = match ctx.edicts[ent_idx].client {
        Some(c) => c,
        None => return,
    };

    let mut name = info_value_for_key(user_info, "name");
    if name.is_empty() {
        name = "newbie".to_string();
    }
    name.truncate(MAX_NET_NAME);

    let mut skin = info_value_for_key(user_info, "skin");
    if skin.is_empty() {
        skin = "qforcer/default".to_string();
    }
    if let Some(team) = ctx.clients[client].persistent.team {
        skin = ctx.team(team).skin.clone();
    }

    let handicap = info_value_for_key(user_info, "handicap")
        .parse::<i32>()
        .unwrap_or(100)
        .clamp(50, 100);

    let pers = &mut ctx.clients[client].persistent;
    pers.user_info = user_info.to_string();
    pers.net_name = name;
    pers.skin = skin;
    pers.handicap = handicap;
}

pub fn client_disconnect(ctx: &mut GameContext, ent_idx: usize) {
    let client = match ctx.edicts[ent_idx].client {
        Some(c) => c,
        None => return,
    };

    let name = ctx.clients[client].persistent.net_name.clone();
    gi_bprintf(PRINT_HIGH, &format!("{} disconnected\n", name));

    ctx.clients[client].persistent = ClientPersistent::default();
    ctx.clients[client].locals = ClientLocals::default();

    let generation = ctx.edicts[ent_idx].generation.wrapping_add(1);
    ctx.edicts[ent_idx] = GEntity {
        inuse: false,
        generation,
        ..GEntity::default()
    };
}

// ============================================================
// Spawning
// ============================================================

/// Picks a spawn point for the given team: team spawns, then deathmatch
/// spawns, then the single-player start.
pub fn select_spawn_point(ctx: &GameContext, team: Option<TeamId>) -> Option<usize> {
    let mut candidates = Vec::new();

    if let Some(team) = team {
        let class = match team {
            TeamId::Good => "info_player_team_good",
            TeamId::Evil => "info_player_team_evil",
        };
        candidates = crate::g_utils::find_by_class_name(ctx, class);
    }
    if candidates.is_empty() {
        candidates = crate::g_utils::find_by_class_name(ctx, "info_player_deathmatch");
    }
    if candidates.is_empty() {
        candidates = crate::g_utils::find_by_class_name(ctx, "info_player_start");
    }

    if candidates.is_empty() {
        return None;
    }
    let pick = rand::thread_rng().gen_range(0..candidates.len());
    Some(candidates[pick])
}

/// Respawns the client. Persistent state carries over; everything else is
/// reset.
pub fn client_respawn(ctx: &mut GameContext, ent_idx: usize) {
    let client = match ctx.edicts[ent_idx].client {
        Some(c) => c,
        None => return,
    };

    let persistent = ctx.clients[client].persistent.clone();
    let spectator = persistent.spectator;

    ctx.clients[client].locals = ClientLocals {
        inventory: vec![0; NUM_ITEMS],
        respawn_protection_time: if spectator {
            0
        } else {
            ctx.level.time + ctx.level.respawn_protection
        },
        ..ClientLocals::default()
    };
    ctx.clients[client].persistent = persistent;
    ctx.clients[client].pm = PmoveState::default();

    let generation = ctx.edicts[ent_idx].generation;
    ctx.edicts[ent_idx] = GEntity {
        inuse: true,
        generation,
        class_name: "client".to_string(),
        client: Some(client),
        mass: 200.0,
        gravity: 1.0,
        mins: [-16.0, -16.0, -24.0],
        maxs: [16.0, 16.0, 32.0],
        ..GEntity::default()
    };

    if spectator {
        ctx.edicts[ent_idx].move_type = MoveType::NoClip;
        ctx.edicts[ent_idx].solid = Solid::Not;
        ctx.edicts[ent_idx].take_damage = false;
        ctx.clients[client].pm.pm_type = PmType::Spectator;
    } else {
        ctx.edicts[ent_idx].move_type = MoveType::Walk;
        ctx.edicts[ent_idx].solid = Solid::Box;
        ctx.edicts[ent_idx].take_damage = true;
        ctx.edicts[ent_idx].health = 100;
        ctx.edicts[ent_idx].max_health = 100;
        ctx.edicts[ent_idx].pain = PainFunc::Client;
        ctx.edicts[ent_idx].die = DieFunc::Client;
        ctx.clients[client].pm.pm_type = PmType::Normal;
    }

    let team = ctx.clients[client].persistent.team;
    if let Some(spot) = select_spawn_point(ctx, team) {
        ctx.edicts[ent_idx].s.origin = ctx.edicts[spot].s.origin;
        ctx.edicts[ent_idx].s.origin[2] += 9.0;
        ctx.edicts[ent_idx].s.angles = ctx.edicts[spot].s.angles;
    }

    crate::g_utils::link_entity(ctx, ent_idx);
}

// ============================================================
// Per-frame input and bookkeeping
// ============================================================

/// Runs one frame of client input. Movement itself is resolved by the
/// shared player move code; this handles view angles and respawn requests.
pub fn client_think(ctx: &mut GameContext, ent_idx: usize, cmd: &UserCmd) {
    let client = match ctx.edicts[ent_idx].client {
        Some(c) => c,
        None => return,
    };

    ctx.clients[client].locals.angles = [
        cmd.angles[0] as f32 * (360.0 / 65536.0),
        cmd.angles[1] as f32 * (360.0 / 65536.0),
        cmd.angles[2] as f32 * (360.0 / 65536.0),
    ];

    // eliminated players stay down until the round resolves
    if ctx.edicts[ent_idx].dead
        && ctx.level.time > ctx.clients[client].locals.respawn_time
        && cmd.buttons & BUTTON_ANY != 0
        && ctx.level.match_state != MatchState::Timeout
        && !(ctx.level.rounds && ctx.level.round_active)
    {
        client_respawn(ctx, ent_idx);
    }
}

pub fn client_begin_frame(ctx: &mut GameContext, ent_idx: usize) {
    let client = match ctx.edicts[ent_idx].client {
        Some(c) => c,
        None => return,
    };

    // expire quad
    if ctx.clients[client].locals.quad_damage_time != 0
        && ctx.clients[client].locals.quad_damage_time <= ctx.level.time
    {
        ctx.clients[client].locals.quad_damage_time = 0;
        ctx.clients[client].locals.inventory[crate::g_items::ITEM_QUAD_DAMAGE] = 0;
    }
}

/// Flushes per-frame damage accumulators after replication state has been
/// built from them.
pub fn end_client_frames(ctx: &mut GameContext) {
    for client in &mut ctx.clients {
        if !client.persistent.connected {
            continue;
        }
        client.locals.damage_armor = 0;
        client.locals.damage_health = 0;
        client.locals.damage_inflicted = 0;
        client.locals.damage_kick = 0.0;
    }
}

// ============================================================
// Pain and death
// ============================================================

pub fn client_pain(
    _ctx: &mut GameContext,
    _self_idx: usize,
    _attacker_idx: usize,
    _damage: i32,
    _knockback: i32,
) {
    // feedback is built from the damage accumulators at end of frame
}

fn obituary_message(victim: &str, attacker: Option<&str>, means: u32) -> String {
    let ff = means & MOD_FRIENDLY_FIRE != 0;
    let means = means & !MOD_FRIENDLY_FIRE;

    if let Some(attacker) = attacker {
        if ff {
            return format!("{} was betrayed by {}\n", victim, attacker);
        }
        match means {
            MOD_BLASTER => format!("{} was blasted by {}\n", victim, attacker),
            MOD_SHOTGUN | MOD_SUPER_SHOTGUN | MOD_MACHINEGUN => {
                format!("{} was shot by {}\n", victim, attacker)
            }
            MOD_GRENADE | MOD_GRENADE_SPLASH => {
                format!("{} caught {}'s grenade\n", victim, attacker)
            }
            MOD_ROCKET | MOD_ROCKET_SPLASH => format!("{} ate {}'s rocket\n", victim, attacker),
            MOD_RAILGUN => format!("{} was railed by {}\n", victim, attacker),
            MOD_LIGHTNING => format!("{} was electrocuted by {}\n", victim, attacker),
            MOD_BFG_LASER | MOD_BFG_BLAST => {
                format!("{} saw the pretty lights from {}'s BFG\n", victim, attacker)
            }
            MOD_TELEFRAG => format!("{} tried to invade {}'s personal space\n", victim, attacker),
            _ => format!("{} was killed by {}\n", victim, attacker),
        }
    } else {
        match means {
            MOD_SUICIDE => format!("{} sucks at life\n", victim),
            MOD_FALLING => format!("{} cratered\n", victim),
            MOD_WATER => format!("{} sank like a rock\n", victim),
            MOD_SLIME => format!("{} melted\n", victim),
            MOD_LAVA => format!("{} did a back flip into the lava\n", victim),
            MOD_CRUSH => format!("{} was squished\n", victim),
            MOD_GRENADE_SPLASH => format!("{} tripped on their own grenade\n", victim),
            MOD_ROCKET_SPLASH => format!("{} blew themselves up\n", victim),
            _ => format!("{} died\n", victim),
        }
    }
}

/// Die behavior for clients: obituary, scoring, corpse state.
pub fn client_die(ctx: &mut GameContext, self_idx: usize, attacker_idx: usize, means: u32) {
    let client = match ctx.edicts[self_idx].client {
        Some(c) => c,
        None => return,
    };

    let victim_name = ctx.clients[client].persistent.net_name.clone();
    let suicide = attacker_idx == self_idx || ctx.edicts[attacker_idx].client.is_none();
    let ff = means & MOD_FRIENDLY_FIRE != 0;

    let attacker_name = if suicide {
        None
    } else {
        ctx.edicts[attacker_idx]
            .client
            .map(|c| ctx.clients[c].persistent.net_name.clone())
    };
    gi_bprintf(
        PRINT_MEDIUM,
        &obituary_message(&victim_name, attacker_name.as_deref(), means),
    );

    if suicide {
        ctx.clients[client].persistent.score -= 1;
        if let Some(team) = ctx.clients[client].persistent.team {
            ctx.team_mut(team).score -= 1;
        }
    } else if let Some(ac) = ctx.edicts[attacker_idx].client {
        let delta = if ff { -1 } else { 1 };
        ctx.clients[ac].persistent.score += delta;
        if let Some(team) = ctx.clients[ac].persistent.team {
            ctx.team_mut(team).score += delta;
        }
    }

    gi_sound(self_idx as i32, ctx.media.sounds.roar, ATTEN_NORM);

    // become a corpse
    ctx.edicts[self_idx].dead = true;
    ctx.edicts[self_idx].solid = Solid::Not;
    ctx.edicts[self_idx].enemy = None;
    ctx.clients[client].pm.pm_type = PmType::Dead;
    ctx.clients[client].locals.quad_damage_time = 0;
    ctx.clients[client].locals.respawn_time = ctx.level.time + RESPAWN_DELAY;

    crate::g_utils::link_entity(ctx, self_idx);
}

// ============================================================
// Teams and intermission
// ============================================================

/// Puts the client on a team and respawns them. Mid-match joins are
/// refused.
pub fn add_client_to_team(ctx: &mut GameContext, ent_idx: usize, team: TeamId) -> bool {
    let client = match ctx.edicts[ent_idx].client {
        Some(c) => c,
        None => return false,
    };

    if ctx.level.match_mode && ctx.level.match_state == MatchState::Playing {
        gi_cprintf(ent_idx as i32, PRINT_HIGH, "Match has already started\n");
        return false;
    }

    ctx.clients[client].persistent.team = Some(team);
    ctx.clients[client].persistent.spectator = false;
    ctx.clients[client].persistent.ready = false;

    let skin = ctx.team(team).skin.clone();
    ctx.clients[client].persistent.skin = skin;

    client_respawn(ctx, ent_idx);
    true
}

/// Moves a client to the intermission view.
pub fn client_to_intermission(ctx: &mut GameContext, ent_idx: usize) {
    let client = match ctx.edicts[ent_idx].client {
        Some(c) => c,
        None => return,
    };

    ctx.edicts[ent_idx].s.origin = ctx.level.intermission_origin;
    ctx.edicts[ent_idx].s.angles = ctx.level.intermission_angle;
    ctx.edicts[ent_idx].velocity = VEC3_ORIGIN;
    ctx.edicts[ent_idx].solid = Solid::Not;
    ctx.edicts[ent_idx].take_damage = false;

    ctx.clients[client].pm.pm_type = PmType::Freeze;
    ctx.clients[client].locals.quad_damage_time = 0;
}

// ============================================================
// Tests
// ============================================================
