// sv_game.rs — the engine's half of the server/game boundary

use skirmish_common::cmd::{cmd_remove_group, CMD_GAME};
use skirmish_common::common::{com_dprintf, com_error, com_printf, com_warn};
use skirmish_common::q_shared::*;

use skirmish_game::game::{load_game, GameExport, GAME_API_VERSION};
use skirmish_game::game_import::GameImport;

use crate::server::*;
use crate::sv_send::{dest_for_multicast, MessageDest, OutgoingMessage};

pub const SV_FRAME_RATE: u32 = 40;
pub const SV_FRAME_MILLIS: u32 = 25;

// ============================================================
// ServerGameImport
// ============================================================

/// The real import table: every game callback lands on live server
/// state through the global context. Without a running server the
/// callbacks degrade to console prints and no-ops, which is what the
/// game's own unit tests rely on.
pub struct ServerGameImport;

impl ServerGameImport {
    /// Queues the current multicast buffer for one client, 1-based
    /// entity index.
    fn queue_unicast(&self, ent_idx: i32, reliable: bool) {
        with_server((), |sv| {
            let data = sv.multicast.take();
            if ent_idx < 1 || ent_idx as usize > sv.clients.len() {
                return;
            }
            sv.outgoing.push(OutgoingMessage {
                data,
                dest: MessageDest::Client {
                    slot: (ent_idx - 1) as usize,
                    reliable,
                },
            });
        });
    }
}

impl GameImport for ServerGameImport {
    fn print(&self, msg: &str) {
        com_printf(msg);
    }
    fn debug(&self, msg: &str) {
        com_dprintf(msg);
    }
    fn warn(&self, msg: &str) {
        com_warn(msg);
    }
    fn error(&self, msg: &str) -> ! {
        com_error(ERR_DROP, msg)
    }

    fn bprintf(&self, printlevel: i32, msg: &str) {
        // echo to the console as well
        com_printf(msg);
        with_server((), |sv| {
            let mut buf = crate::sv_send::MessageBuffer::new();
            buf.write_byte(SV_CMD_PRINT);
            buf.write_byte(printlevel);
            buf.write_string(msg);
            sv.outgoing.push(OutgoingMessage {
                data: buf.take(),
                dest: MessageDest::All { reliable: true },
            });
        });
    }

    fn cprintf(&self, ent_idx: i32, printlevel: i32, msg: &str) {
        if ent_idx == 0 {
            com_printf(msg);
            return;
        }
        with_server((), |sv| {
            let mut buf = crate::sv_send::MessageBuffer::new();
            buf.write_byte(SV_CMD_PRINT);
            buf.write_byte(printlevel);
            buf.write_string(msg);
            if ent_idx >= 1 && ent_idx as usize <= sv.clients.len() {
                sv.outgoing.push(OutgoingMessage {
                    data: buf.take(),
                    dest: MessageDest::Client {
                        slot: (ent_idx - 1) as usize,
                        reliable: true,
                    },
                });
            }
        });
    }

    fn centerprintf(&self, ent_idx: i32, msg: &str) {
        with_server((), |sv| {
            if ent_idx < 1 || ent_idx as usize > sv.clients.len() {
                return;
            }
            let mut buf = crate::sv_send::MessageBuffer::new();
            buf.write_byte(SV_CMD_CENTER_PRINT);
            buf.write_string(msg);
            sv.outgoing.push(OutgoingMessage {
                data: buf.take(),
                dest: MessageDest::Client {
                    slot: (ent_idx - 1) as usize,
                    reliable: true,
                },
            });
        });
    }

    fn configstring(&self, num: i32, string: &str) {
        with_server((), |sv| {
            if num >= 0 {
                sv.set_configstring(num as usize, string);
            }
        });
    }

    fn modelindex(&self, name: &str) -> i32 {
        with_server(0, |sv| sv.find_index(name, CS_MODELS, MAX_MODELS))
    }
    fn soundindex(&self, name: &str) -> i32 {
        with_server(0, |sv| sv.find_index(name, CS_SOUNDS, MAX_SOUNDS))
    }
    fn imageindex(&self, name: &str) -> i32 {
        with_server(0, |sv| sv.find_index(name, CS_IMAGES, MAX_IMAGES))
    }

    fn setmodel(&self, _ent_idx: i32, name: &str) {
        // the game tracks the returned index in its own entity state
        self.modelindex(name);
    }

    fn sound(&self, ent_idx: i32, soundindex: i32, attenuation: f32) {
        with_server((), |sv| {
            let mut buf = crate::sv_send::MessageBuffer::new();
            buf.write_byte(SV_CMD_SOUND);
            buf.write_byte(soundindex);
            buf.write_byte((attenuation * 64.0) as i32);
            buf.write_short(ent_idx);
            sv.outgoing.push(OutgoingMessage {
                data: buf.take(),
                dest: MessageDest::All { reliable: false },
            });
        });
    }

    fn positioned_sound(&self, origin: &Vec3, ent_idx: i32, soundindex: i32, attenuation: f32) {
        with_server((), |sv| {
            let mut buf = crate::sv_send::MessageBuffer::new();
            buf.write_byte(SV_CMD_SOUND);
            buf.write_byte(soundindex);
            buf.write_byte((attenuation * 64.0) as i32);
            buf.write_short(ent_idx);
            buf.write_position(origin);
            sv.outgoing.push(OutgoingMessage {
                data: buf.take(),
                dest: MessageDest::All { reliable: false },
            });
        });
    }

    // Collision queries resolve against the collision model, which is
    // attached by the host outside this crate. Without one, traces see
    // open space and visibility checks pass.
    fn trace(
        &self,
        _start: &Vec3,
        _mins: &Vec3,
        _maxs: &Vec3,
        end: &Vec3,
        _passent: i32,
        _contentmask: i32,
    ) -> Trace {
        Trace {
            endpos: *end,
            ..Trace::default()
        }
    }
    fn pointcontents(&self, _point: &Vec3) -> i32 {
        0
    }
    fn in_pvs(&self, _p1: &Vec3, _p2: &Vec3) -> bool {
        true
    }
    fn in_phs(&self, _p1: &Vec3, _p2: &Vec3) -> bool {
        true
    }
    fn set_area_portal_state(&self, _portalnum: i32, _open: bool) {}
    fn areas_connected(&self, _area1: i32, _area2: i32) -> bool {
        true
    }

    fn linkentity(&self, ent_idx: i32, abs_mins: &Vec3, abs_maxs: &Vec3) {
        with_server((), |sv| {
            if ent_idx >= 0 {
                sv.world.link_entity(ent_idx as usize, abs_mins, abs_maxs);
            }
        });
    }
    fn unlinkentity(&self, ent_idx: i32) {
        with_server((), |sv| {
            if ent_idx >= 0 {
                sv.world.unlink_entity(ent_idx as usize);
            }
        });
    }
    fn box_entities(&self, mins: &Vec3, maxs: &Vec3) -> Vec<i32> {
        with_server(Vec::new(), |sv| {
            sv.world
                .box_entities(mins, maxs)
                .into_iter()
                .map(|i| i as i32)
                .collect()
        })
    }

    fn multicast(&self, _origin: &Vec3, to: i32) {
        with_server((), |sv| {
            let data = sv.multicast.take();
            if data.is_empty() {
                return;
            }
            sv.outgoing.push(OutgoingMessage {
                data,
                dest: dest_for_multicast(to),
            });
        });
    }
    fn unicast(&self, ent_idx: i32, reliable: bool) {
        self.queue_unicast(ent_idx, reliable);
    }
    fn write_char(&self, c: i32) {
        with_server((), |sv| sv.multicast.write_char(c));
    }
    fn write_byte(&self, c: i32) {
        with_server((), |sv| sv.multicast.write_byte(c));
    }
    fn write_short(&self, c: i32) {
        with_server((), |sv| sv.multicast.write_short(c));
    }
    fn write_long(&self, c: i32) {
        with_server((), |sv| sv.multicast.write_long(c));
    }
    fn write_string(&self, s: &str) {
        with_server((), |sv| sv.multicast.write_string(s));
    }
    fn write_position(&self, pos: &Vec3) {
        with_server((), |sv| sv.multicast.write_position(pos));
    }
    fn write_dir(&self, dir: &Vec3) {
        with_server((), |sv| sv.multicast.write_dir(dir));
    }
    fn write_angle(&self, f: f32) {
        with_server((), |sv| sv.multicast.write_angle(f));
    }
    fn write_angles(&self, angles: &Vec3) {
        with_server((), |sv| sv.multicast.write_angles(angles));
    }

    fn cvar(&self, name: &str, value: &str, flags: i32, description: Option<&str>) -> usize {
        skirmish_common::cvar::cvar_get(name, value, flags, description).unwrap_or(0)
    }
    fn cvar_value(&self, handle: usize) -> f32 {
        skirmish_common::cvar::cvar_value_by_handle(handle)
    }
    fn cvar_string(&self, handle: usize) -> String {
        skirmish_common::cvar::cvar_string_by_handle(handle)
    }
    fn cvar_modified(&self, handle: usize) -> bool {
        skirmish_common::cvar::cvar_modified_by_handle(handle)
    }
    fn cvar_clear_modified(&self, handle: usize) {
        skirmish_common::cvar::cvar_clear_modified_by_handle(handle);
    }
    fn cvar_set(&self, name: &str, value: &str) {
        skirmish_common::cvar::cvar_set(name, value);
    }
    fn cvar_forceset(&self, name: &str, value: &str) {
        skirmish_common::cvar::cvar_force_set(name, value);
    }

    fn argc(&self) -> i32 {
        skirmish_common::cmd::cmd_argc() as i32
    }
    fn argv(&self, n: i32) -> String {
        skirmish_common::cmd::cmd_argv(n as usize)
    }
    fn args(&self) -> String {
        skirmish_common::cmd::cmd_args()
    }
    fn add_command_string(&self, text: &str) {
        skirmish_common::cmd::cbuf_add_text(text);
    }
    fn cmd(&self, name: &str, group: u32, description: Option<&str>) {
        skirmish_common::cmd::cmd_add_command(name, group, description);
    }

    fn frame_rate(&self) -> u32 {
        SV_FRAME_RATE
    }
    fn frame_millis(&self) -> u32 {
        SV_FRAME_MILLIS
    }
    fn frame_seconds(&self) -> f32 {
        SV_FRAME_MILLIS as f32 / 1000.0
    }
}

// ============================================================
// Game module lifecycle
// ============================================================

/// A version mismatch means the game module was built against another
/// boundary shape; running it would corrupt the session.
pub fn check_game_api(version: i32) {
    if version != GAME_API_VERSION {
        com_error(
            ERR_DROP,
            &format!("game is version {}, not {}", version, GAME_API_VERSION),
        );
    }
}

/// Creates the server context, loads the game module, and initializes it.
pub fn sv_init_game(max_clients: usize) -> GameExport {
    sv_create(max_clients);
    with_server((), |sv| sv.state = ServerState::Loading);

    let mut ge = load_game(Box::new(ServerGameImport));
    check_game_api(ge.api_version);
    ge.init(max_clients);
    ge
}

/// Loads a level into the game module and goes live.
pub fn sv_spawn_level(ge: &mut GameExport, name: &str, entity_string: &str) {
    with_server((), |sv| {
        sv.name = name.to_string();
        sv.state = ServerState::Loading;
        sv.world.clear();
        sv.set_configstring(CS_NAME, name);
    });

    ge.spawn_entities(name, entity_string);

    with_server((), |sv| sv.state = ServerState::Game);
}

/// Shuts the game module down and removes everything it registered.
pub fn sv_shutdown_game(ge: &mut GameExport) {
    ge.shutdown();
    cmd_remove_group(CMD_GAME);
    sv_destroy();
}

/// Runs one server tick: advance the clock, let the game simulate, then
/// hand the tick's messages to the per-client buffers.
pub fn sv_frame(ge: &mut GameExport) {
    with_server((), |sv| {
        sv.frame_num += 1;
        sv.time = sv.frame_num * SV_FRAME_MILLIS;
    });

    ge.frame();

    with_server((), |sv| sv.flush_outgoing());
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_common::cmd::cmd_exists;

    // The server singleton is process-global, so the whole lifecycle
    // runs in a single test.
    #[test]
    fn test_game_module_lifecycle() {
        skirmish_common::cvar::cvar_init();
        let mut ge = sv_init_game(2);
        assert_eq!(ge.api_version, GAME_API_VERSION);
        assert!(cmd_exists("mute"));

        sv_spawn_level(
            &mut ge,
            "edge",
            r#"
            { "classname" "worldspawn" "message" "The Edge" }
            { "classname" "info_player_deathmatch" "origin" "0 0 24" }
            "#,
        );
        assert_eq!(with_server(String::new(), |sv| sv.configstrings[CS_NAME].clone()), "edge");
        assert_eq!(with_server(ServerState::Dead, |sv| sv.state), ServerState::Game);

        // connect a client and watch a broadcast land in its buffer
        assert!(ge.client_connect(1, r"\name\grunt"));
        ge.client_begin(1);
        with_server((), |sv| sv.clients[0].state = SvClientState::Spawned);

        sv_frame(&mut ge);
        assert_eq!(ge.context().level.frame_num, 1);
        assert_eq!(with_server(0, |sv| sv.time), SV_FRAME_MILLIS);
        // "grunt connected" went out reliably during client_begin
        assert!(with_server(true, |sv| !sv.clients[0].message.is_empty()));

        // the client entity was linked into the world on respawn
        let hits = with_server(Vec::new(), |sv| {
            sv.world
                .box_entities(&[-512.0, -512.0, -512.0], &[512.0, 512.0, 512.0])
        });
        assert!(hits.contains(&1));

        sv_shutdown_game(&mut ge);
        assert!(!cmd_exists("mute"));
    }

    #[test]
    #[should_panic(expected = "game is version 3, not")]
    fn test_api_version_mismatch_drops() {
        check_game_api(3);
    }
}
