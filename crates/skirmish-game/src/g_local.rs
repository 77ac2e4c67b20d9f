// g_local.rs — local definitions for the game module

// Re-export all q_shared items so game files can access them via `use crate::g_local::*`
pub use skirmish_common::q_shared::*;

use crate::dispatch::{BlockedFunc, DieFunc, PainFunc, ThinkFunc, TouchFunc};

// ============================================================
// Game config strings
// ============================================================

pub const CS_GAMEPLAY: usize = CS_GENERAL + 1;
pub const CS_TEAMS: usize = CS_GENERAL + 2;
pub const CS_CTF: usize = CS_GENERAL + 3;
pub const CS_MATCH: usize = CS_GENERAL + 4;
pub const CS_ROUNDS: usize = CS_GENERAL + 5;
pub const CS_TEAM_GOOD: usize = CS_GENERAL + 6;
pub const CS_TEAM_EVIL: usize = CS_GENERAL + 7;
pub const CS_TIME: usize = CS_GENERAL + 8;
pub const CS_VOTE: usize = CS_GENERAL + 9;
pub const CS_ROUND: usize = CS_GENERAL + 10;

// ============================================================
// Temp entity events
// ============================================================

pub const TE_BLOOD: i32 = 1;
pub const TE_GIB: i32 = 2;
pub const TE_SPARKS: i32 = 3;
pub const TE_BULLET: i32 = 4;

// ============================================================
// Entity spawn flags
// ============================================================

pub const SF_ITEM_DROPPED: i32 = 0x10000;

// ============================================================
// Entity flags
// ============================================================

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct EntityFlags: i32 {
        const GOD_MODE = 0x00000001;
    }
}
pub const FL_GOD_MODE: EntityFlags = EntityFlags::GOD_MODE;

// ============================================================
// Damage flags
// ============================================================

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct DamageFlags: u32 {
        const RADIUS   = 0x1;  // damage was indirect
        const ENERGY   = 0x2;  // damage is from an energy based weapon
        const BULLET   = 0x4;  // damage is from a bullet
        const NO_ARMOR = 0x8;  // armor does not protect from this damage
        const NO_GOD   = 0x10; // armor and god mode have no effect
    }
}
pub const DMG_RADIUS: DamageFlags = DamageFlags::RADIUS;
pub const DMG_ENERGY: DamageFlags = DamageFlags::ENERGY;
pub const DMG_BULLET: DamageFlags = DamageFlags::BULLET;
pub const DMG_NO_ARMOR: DamageFlags = DamageFlags::NO_ARMOR;
pub const DMG_NO_GOD: DamageFlags = DamageFlags::NO_GOD;

// ============================================================
// Means of death
// ============================================================

pub const MOD_UNKNOWN: u32 = 0;
pub const MOD_BLASTER: u32 = 1;
pub const MOD_SHOTGUN: u32 = 2;
pub const MOD_SUPER_SHOTGUN: u32 = 3;
pub const MOD_MACHINEGUN: u32 = 4;
pub const MOD_GRENADE: u32 = 5;
pub const MOD_GRENADE_SPLASH: u32 = 6;
pub const MOD_ROCKET: u32 = 7;
pub const MOD_ROCKET_SPLASH: u32 = 8;
pub const MOD_HYPERBLASTER: u32 = 9;
pub const MOD_LIGHTNING: u32 = 10;
pub const MOD_RAILGUN: u32 = 12;
pub const MOD_BFG_LASER: u32 = 13;
pub const MOD_BFG_BLAST: u32 = 14;
pub const MOD_WATER: u32 = 15;
pub const MOD_SLIME: u32 = 16;
pub const MOD_LAVA: u32 = 17;
pub const MOD_CRUSH: u32 = 18;
pub const MOD_TELEFRAG: u32 = 19;
pub const MOD_FALLING: u32 = 20;
pub const MOD_SUICIDE: u32 = 21;
pub const MOD_TRIGGER_HURT: u32 = 23;
pub const MOD_FRIENDLY_FIRE: u32 = 0x8000000;

// ============================================================
// Enums
// ============================================================

/// Move types, ordered so that `move_type >= MoveType::Walk` selects
/// everything knockback applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(i32)]
pub enum MoveType {
    #[default]
    None = 0,
    NoClip,
    Push,
    Stop,
    Walk,
    Fly,
    Bounce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum Solid {
    #[default]
    Not = 0,
    Trigger,
    Box,
    Bsp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum Gameplay {
    #[default]
    Deathmatch = 0,
    Instagib,
    Arena,
    Duel,
}

impl Gameplay {
    /// Parses a gameplay selection by name or numeric value.
    pub fn by_name(name: &str) -> Gameplay {
        let lower = name.to_ascii_lowercase();
        if lower.contains("insta") {
            Gameplay::Instagib
        } else if lower.contains("arena") {
            Gameplay::Arena
        } else if lower.contains("duel") {
            Gameplay::Duel
        } else {
            match lower.trim().parse::<i32>() {
                Ok(1) => Gameplay::Instagib,
                Ok(2) => Gameplay::Arena,
                Ok(3) => Gameplay::Duel,
                _ => Gameplay::Deathmatch,
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Gameplay::Deathmatch => "DEATHMATCH",
            Gameplay::Instagib => "INSTAGIB",
            Gameplay::Arena => "ARENA",
            Gameplay::Duel => "DUEL",
        }
    }
}

/// The phase of a match. Exactly one phase is active at a time; entering a
/// timeout replaces the playing state, and time-in restores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchState {
    #[default]
    Warmup,
    Countdown,
    Playing,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoteChoice {
    #[default]
    NoOp,
    Yes,
    No,
}

pub const VOTE_IDX_YES: usize = 1;
pub const VOTE_IDX_NO: usize = 2;

pub const MAX_VOTE_TIME: u32 = 60000;
pub const VOTE_MAJORITY: f32 = 0.51;

/// Team name and team skin changes are throttled.
pub const TEAM_CHANGE_TIME: u32 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamId {
    Good,
    Evil,
}

#[derive(Debug, Clone, Default)]
pub struct GTeam {
    pub name: String,
    pub skin: String,
    pub score: i32,
    pub captures: i32,
    /// Next name/skin change allowed when level time exceeds this.
    pub name_time: u32,
}

// ============================================================
// Entity handle (generation-tagged reference)
// ============================================================

/// A reference to an entity slot that survives slot reuse: the handle is
/// only valid while its generation matches the slot's generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityHandle {
    pub index: usize,
    pub generation: u32,
}

// ============================================================
// Entity state (replicated fields)
// ============================================================

#[derive(Debug, Clone, Default)]
pub struct EntityState {
    pub origin: Vec3,
    pub angles: Vec3,
    pub model_index: i32,
    pub sound: i32,
}

// ============================================================
// Entity
// ============================================================

#[derive(Debug, Clone, Default)]
pub struct GEntity {
    pub inuse: bool,
    /// Bumped on every free; stale handles fail to resolve.
    pub generation: u32,

    pub class_name: String,
    pub s: EntityState,

    pub mins: Vec3,
    pub maxs: Vec3,
    pub abs_mins: Vec3,
    pub abs_maxs: Vec3,

    pub solid: Solid,
    pub clip_mask: i32,

    pub move_type: MoveType,
    pub velocity: Vec3,
    pub avelocity: Vec3,
    pub mass: f32,
    pub gravity: f32,

    pub health: i32,
    pub max_health: i32,
    pub dead: bool,
    pub take_damage: bool,

    pub dmg: i32,
    pub spawn_flags: i32,
    pub flags: EntityFlags,

    pub owner: Option<EntityHandle>,
    pub enemy: Option<EntityHandle>,

    /// Client slot, if this entity is a connected player.
    pub client: Option<usize>,

    /// Item slot, if this entity represents a pickup.
    pub item: Option<usize>,

    pub next_think: u32,
    pub think: ThinkFunc,
    pub touch: TouchFunc,
    pub pain: PainFunc,
    pub die: DieFunc,
    pub blocked: BlockedFunc,

    pub timestamp: u32,
}

// ============================================================
// Client
// ============================================================

/// Client state that persists across respawns (and, for match play,
/// across restarts).
#[derive(Debug, Clone)]
pub struct ClientPersistent {
    pub user_info: String,
    pub net_name: String,
    pub skin: String,
    /// Damage handicap in percent, 50..=100.
    pub handicap: i32,
    pub score: i32,
    pub captures: i32,
    pub team: Option<TeamId>,
    pub spectator: bool,
    pub ready: bool,
    /// Match/round generation this client last participated in.
    pub match_num: u32,
    pub round_num: u32,
    pub vote: VoteChoice,
    pub connected: bool,
}

impl Default for ClientPersistent {
    fn default() -> Self {
        Self {
            user_info: String::new(),
            net_name: String::new(),
            skin: String::new(),
            handicap: 100,
            score: 0,
            captures: 0,
            team: None,
            spectator: false,
            ready: false,
            match_num: 0,
            round_num: 0,
            vote: VoteChoice::NoOp,
            connected: false,
        }
    }
}

/// Client state that is wiped on every respawn.
#[derive(Debug, Clone, Default)]
pub struct ClientLocals {
    pub inventory: Vec<i16>,

    // per-frame damage accumulators, reset by end_client_frames
    pub damage_armor: i16,
    pub damage_health: i16,
    pub damage_inflicted: i16,
    pub damage_kick: f32,

    pub respawn_time: u32,
    pub respawn_protection_time: u32,
    pub quad_damage_time: u32,
    pub chat_time: u32,
    pub muted: bool,

    pub angles: Vec3,
    pub chase_target: Option<EntityHandle>,
}

#[derive(Debug, Clone, Default)]
pub struct GClient {
    pub persistent: ClientPersistent,
    pub locals: ClientLocals,
    pub pm: PmoveState,
}

// ============================================================
// Level
// ============================================================

/// The main structure for all world management. Cleared at each level load.
#[derive(Debug, Clone, Default)]
pub struct GLevel {
    pub frame_num: u32,
    pub time: u32,

    pub title: String,
    pub name: String,

    pub gravity: i32,
    pub gameplay: Gameplay,
    pub teams: i32,
    pub ctf: bool,
    pub match_mode: bool,
    pub rounds: bool,

    pub frag_limit: i32,
    pub round_limit: i32,
    pub capture_limit: i32,
    pub time_limit: u32,

    pub friendly_fire: bool,
    /// Post-respawn invulnerability window, in millis.
    pub respawn_protection: u32,

    // intermission state
    pub intermission_time: u32,
    pub intermission_origin: Vec3,
    pub intermission_angle: Vec3,
    pub changemap: Option<String>,

    pub warmup: bool,

    pub start_match: bool,
    pub match_time: u32,
    pub match_num: u32,

    pub start_round: bool,
    pub round_active: bool,
    pub round_time: u32,
    pub round_num: u32,

    pub voting: bool,
    pub vote_cmd: String,
    pub votes: [u32; 3],
    pub vote_time: u32,

    pub current_entity: Option<usize>,

    pub match_state: MatchState,
    pub timeout_caller: Option<EntityHandle>,
    /// Timeout duration in seconds, 0 when timeouts are disabled.
    pub timeout_seconds: u32,
    pub timeout_time: u32,
    pub timeout_frame: u32,

    /// Last clock value pushed to CS_TIME, for the countdown highlight.
    pub last_displayed_time: u32,
}

// ============================================================
// Media and cvar handles
// ============================================================

#[derive(Debug, Clone, Default)]
pub struct GameMediaItems {
    pub jacket_armor: usize,
    pub combat_armor: usize,
    pub body_armor: usize,
    pub quad_damage: usize,
}

#[derive(Debug, Clone, Default)]
pub struct GameMediaSounds {
    pub teleport: i32,
    pub roar: i32,
    pub countdown: [i32; 11],
}

#[derive(Debug, Clone, Default)]
pub struct GameMedia {
    pub items: GameMediaItems,
    pub sounds: GameMediaSounds,
}

/// Handles for the cvars the game registers and watches.
#[derive(Debug, Clone, Default)]
pub struct GameCvars {
    pub g_auto_join: usize,
    pub g_capture_limit: usize,
    pub g_cheats: usize,
    pub g_ctf: usize,
    pub g_frag_limit: usize,
    pub g_friendly_fire: usize,
    pub g_gameplay: usize,
    pub g_gravity: usize,
    pub g_handicap: usize,
    pub g_map_list: usize,
    pub g_match: usize,
    pub g_max_entities: usize,
    pub g_random_map: usize,
    pub g_respawn_protection: usize,
    pub g_round_limit: usize,
    pub g_rounds: usize,
    pub g_spectator_chat: usize,
    pub g_teams: usize,
    pub g_time_limit: usize,
    pub g_timeout_time: usize,
    pub g_voting: usize,
    pub g_warmup_time: usize,
    pub sv_max_clients: usize,
}

// ============================================================
// Game context
// ============================================================

/// All mutable game state, threaded explicitly through the module.
/// Entity 0 is the world; entities 1..=max_clients are reserved for clients.
#[derive(Default)]
pub struct GameContext {
    pub edicts: Vec<GEntity>,
    pub clients: Vec<GClient>,
    pub level: GLevel,
    pub team_good: GTeam,
    pub team_evil: GTeam,
    pub media: GameMedia,
    pub cvars: GameCvars,
    pub map_list: crate::g_maplist::MapList,

    pub max_clients: usize,
    pub num_entities: usize,
}

impl GameContext {
    /// Entity index for a client slot.
    pub fn entity_for_client(&self, client: usize) -> usize {
        client + 1
    }

    /// A generation-tagged handle to a live entity slot.
    pub fn handle(&self, index: usize) -> EntityHandle {
        EntityHandle {
            index,
            generation: self.edicts[index].generation,
        }
    }

    /// Resolve a handle, returning None if the slot was freed or reused.
    pub fn resolve(&self, handle: EntityHandle) -> Option<usize> {
        let ent = self.edicts.get(handle.index)?;
        if ent.inuse && ent.generation == handle.generation {
            Some(handle.index)
        } else {
            None
        }
    }

    /// The team struct for a team id.
    pub fn team(&self, id: TeamId) -> &GTeam {
        match id {
            TeamId::Good => &self.team_good,
            TeamId::Evil => &self.team_evil,
        }
    }

    pub fn team_mut(&mut self, id: TeamId) -> &mut GTeam {
        match id {
            TeamId::Good => &mut self.team_good,
            TeamId::Evil => &mut self.team_evil,
        }
    }

    /// The smaller of the two teams, ties go to Good.
    pub fn smallest_team(&self) -> TeamId {
        let mut good = 0;
        let mut evil = 0;
        for client in &self.clients {
            if !client.persistent.connected || client.persistent.spectator {
                continue;
            }
            match client.persistent.team {
                Some(TeamId::Good) => good += 1,
                Some(TeamId::Evil) => evil += 1,
                None => {}
            }
        }
        if good <= evil {
            TeamId::Good
        } else {
            TeamId::Evil
        }
    }

    /// Find a connected client by name.
    pub fn client_by_name(&self, name: &str) -> Option<usize> {
        self.clients
            .iter()
            .position(|c| c.persistent.connected && c.persistent.net_name == name)
    }
}

// ============================================================
// Test support
// ============================================================

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::game_import::{set_gi, StubGameImport};

    /// Builds a game context with the stub import installed, `max_clients`
    /// connected player slots, and the world at entity 0.
    pub fn make_ctx(max_clients: usize) -> GameContext {
        set_gi(Box::new(StubGameImport));
        skirmish_common::cvar::cvar_init();

        let mut ctx = GameContext::default();
        crate::g_main::g_init(&mut ctx, max_clients);
        for i in 0..max_clients {
            let ent_idx = ctx.entity_for_client(i);
            ctx.edicts[ent_idx].inuse = true;
            ctx.edicts[ent_idx].class_name = "client".to_string();
            ctx.edicts[ent_idx].client = Some(i);
            ctx.edicts[ent_idx].move_type = MoveType::Walk;
            ctx.edicts[ent_idx].mass = 200.0;
            ctx.edicts[ent_idx].health = 100;
            ctx.edicts[ent_idx].max_health = 100;
            ctx.edicts[ent_idx].take_damage = true;
            ctx.edicts[ent_idx].solid = Solid::Box;
            ctx.clients[i].persistent.connected = true;
            ctx.clients[i].persistent.net_name = format!("player{}", i);
            ctx.clients[i].locals.inventory = vec![0; crate::g_items::NUM_ITEMS];
        }
        ctx
    }
}
