//! Game import interface — functions provided by the engine to the game module.
//!
//! The engine hands the game module one import table at load time. We mirror
//! this with a global static that is set once via `set_gi()`, and thin free
//! functions so call sites read like `gi_bprintf(..)`.

use skirmish_common::q_shared::{Trace, Vec3};
use std::sync::OnceLock;

/// Global game import interface, installed once at game load.
static GI: OnceLock<Box<dyn GameImport + Send + Sync>> = OnceLock::new();

/// Set the global game import interface. Called once during game load.
pub fn set_gi(gi: Box<dyn GameImport + Send + Sync>) {
    let _ = GI.set(gi);
}

/// Get a reference to the global game import interface.
fn gi() -> &'static dyn GameImport {
    GI.get().expect("GameImport not initialized").as_ref()
}

// ---- Free functions mirroring `gi.Xxx(..)` calls ----

pub fn gi_print(msg: &str) { gi().print(msg); }
pub fn gi_debug(msg: &str) { gi().debug(msg); }
pub fn gi_warn(msg: &str) { gi().warn(msg); }
pub fn gi_error(msg: &str) -> ! { gi().error(msg) }

pub fn gi_bprintf(printlevel: i32, msg: &str) { gi().bprintf(printlevel, msg); }
pub fn gi_cprintf(ent_idx: i32, printlevel: i32, msg: &str) { gi().cprintf(ent_idx, printlevel, msg); }
pub fn gi_centerprintf(ent_idx: i32, msg: &str) { gi().centerprintf(ent_idx, msg); }

pub fn gi_configstring(num: i32, string: &str) { gi().configstring(num, string); }

pub fn gi_modelindex(name: &str) -> i32 { gi().modelindex(name) }
pub fn gi_soundindex(name: &str) -> i32 { gi().soundindex(name) }
pub fn gi_imageindex(name: &str) -> i32 { gi().imageindex(name) }
pub fn gi_setmodel(ent_idx: i32, name: &str) { gi().setmodel(ent_idx, name); }

pub fn gi_sound(ent_idx: i32, soundindex: i32, attenuation: f32) {
    gi().sound(ent_idx, soundindex, attenuation);
}
pub fn gi_positioned_sound(origin: &Vec3, ent_idx: i32, soundindex: i32, attenuation: f32) {
    gi().positioned_sound(origin, ent_idx, soundindex, attenuation);
}

pub fn gi_trace(start: &Vec3, mins: &Vec3, maxs: &Vec3, end: &Vec3, passent: i32, contentmask: i32) -> Trace {
    gi().trace(start, mins, maxs, end, passent, contentmask)
}
pub fn gi_pointcontents(point: &Vec3) -> i32 { gi().pointcontents(point) }
pub fn gi_in_pvs(p1: &Vec3, p2: &Vec3) -> bool { gi().in_pvs(p1, p2) }
pub fn gi_in_phs(p1: &Vec3, p2: &Vec3) -> bool { gi().in_phs(p1, p2) }
pub fn gi_set_area_portal_state(portalnum: i32, open: bool) { gi().set_area_portal_state(portalnum, open); }
pub fn gi_areas_connected(area1: i32, area2: i32) -> bool { gi().areas_connected(area1, area2) }

pub fn gi_linkentity(ent_idx: i32, abs_mins: &Vec3, abs_maxs: &Vec3) {
    gi().linkentity(ent_idx, abs_mins, abs_maxs);
}
pub fn gi_unlinkentity(ent_idx: i32) { gi().unlinkentity(ent_idx); }
pub fn gi_box_entities(mins: &Vec3, maxs: &Vec3) -> Vec<i32> { gi().box_entities(mins, maxs) }

pub fn gi_multicast(origin: &Vec3, to: i32) { gi().multicast(origin, to); }
pub fn gi_unicast(ent_idx: i32, reliable: bool) { gi().unicast(ent_idx, reliable); }
pub fn gi_write_char(c: i32) { gi().write_char(c); }
pub fn gi_write_byte(c: i32) { gi().write_byte(c); }
pub fn gi_write_short(c: i32) { gi().write_short(c); }
pub fn gi_write_long(c: i32) { gi().write_long(c); }
pub fn gi_write_string(s: &str) { gi().write_string(s); }
pub fn gi_write_position(pos: &Vec3) { gi().write_position(pos); }
pub fn gi_write_dir(dir: &Vec3) { gi().write_dir(dir); }
pub fn gi_write_angle(f: f32) { gi().write_angle(f); }
pub fn gi_write_angles(angles: &Vec3) { gi().write_angles(angles); }

pub fn gi_cvar(name: &str, value: &str, flags: i32, description: Option<&str>) -> usize {
    gi().cvar(name, value, flags, description)
}
pub fn gi_cvar_value(handle: usize) -> f32 { gi().cvar_value(handle) }
pub fn gi_cvar_string(handle: usize) -> String { gi().cvar_string(handle) }
pub fn gi_cvar_modified(handle: usize) -> bool { gi().cvar_modified(handle) }
pub fn gi_cvar_clear_modified(handle: usize) { gi().cvar_clear_modified(handle); }
pub fn gi_cvar_set(name: &str, value: &str) { gi().cvar_set(name, value); }
pub fn gi_cvar_forceset(name: &str, value: &str) { gi().cvar_forceset(name, value); }

pub fn gi_argc() -> i32 { gi().argc() }
pub fn gi_argv(n: i32) -> String { gi().argv(n) }
pub fn gi_args() -> String { gi().args() }
pub fn gi_add_command_string(text: &str) { gi().add_command_string(text); }
pub fn gi_cmd(name: &str, group: u32, description: Option<&str>) { gi().cmd(name, group, description); }

pub fn gi_frame_rate() -> u32 { gi().frame_rate() }
pub fn gi_frame_millis() -> u32 { gi().frame_millis() }
pub fn gi_frame_seconds() -> f32 { gi().frame_seconds() }

/// Game import interface — functions provided by the engine to the game module.
pub trait GameImport {
    // Console printing
    fn print(&self, msg: &str);
    fn debug(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str) -> !;

    // Client printing
    fn bprintf(&self, printlevel: i32, msg: &str);
    fn cprintf(&self, ent_idx: i32, printlevel: i32, msg: &str);
    fn centerprintf(&self, ent_idx: i32, msg: &str);

    // Config strings
    fn configstring(&self, num: i32, string: &str);

    // Asset indexing
    fn modelindex(&self, name: &str) -> i32;
    fn soundindex(&self, name: &str) -> i32;
    fn imageindex(&self, name: &str) -> i32;
    fn setmodel(&self, ent_idx: i32, name: &str);

    // Sound
    fn sound(&self, ent_idx: i32, soundindex: i32, attenuation: f32);
    fn positioned_sound(&self, origin: &Vec3, ent_idx: i32, soundindex: i32, attenuation: f32);

    // Collision
    fn trace(&self, start: &Vec3, mins: &Vec3, maxs: &Vec3, end: &Vec3, passent: i32, contentmask: i32) -> Trace;
    fn pointcontents(&self, point: &Vec3) -> i32;
    fn in_pvs(&self, p1: &Vec3, p2: &Vec3) -> bool;
    fn in_phs(&self, p1: &Vec3, p2: &Vec3) -> bool;
    fn set_area_portal_state(&self, portalnum: i32, open: bool);
    fn areas_connected(&self, area1: i32, area2: i32) -> bool;

    // Entity linking
    fn linkentity(&self, ent_idx: i32, abs_mins: &Vec3, abs_maxs: &Vec3);
    fn unlinkentity(&self, ent_idx: i32);
    fn box_entities(&self, mins: &Vec3, maxs: &Vec3) -> Vec<i32>;

    // Network messaging
    fn multicast(&self, origin: &Vec3, to: i32);
    fn unicast(&self, ent_idx: i32, reliable: bool);
    fn write_char(&self, c: i32);
    fn write_byte(&self, c: i32);
    fn write_short(&self, c: i32);
    fn write_long(&self, c: i32);
    fn write_string(&self, s: &str);
    fn write_position(&self, pos: &Vec3);
    fn write_dir(&self, dir: &Vec3);
    fn write_angle(&self, f: f32);
    fn write_angles(&self, angles: &Vec3);

    // Cvars. Registration returns an opaque handle for value/modified queries.
    fn cvar(&self, name: &str, value: &str, flags: i32, description: Option<&str>) -> usize;
    fn cvar_value(&self, handle: usize) -> f32;
    fn cvar_string(&self, handle: usize) -> String;
    fn cvar_modified(&self, handle: usize) -> bool;
    fn cvar_clear_modified(&self, handle: usize);
    fn cvar_set(&self, name: &str, value: &str);
    fn cvar_forceset(&self, name: &str, value: &str);

    // Console command access
    fn argc(&self) -> i32;
    fn argv(&self, n: i32) -> String;
    fn args(&self) -> String;
    fn add_command_string(&self, text: &str);
    fn cmd(&self, name: &str, group: u32, description: Option<&str>);

    // Frame timing metadata
    fn frame_rate(&self) -> u32;
    fn frame_millis(&self) -> u32;
    fn frame_seconds(&self) -> f32;
}

/// Stub implementation of `GameImport` that wires available methods to the
/// skirmish_common singletons. Methods that require live server state
/// (config strings, indexing, linking, messaging, visibility) remain as
/// stubs; traces report open space.
pub struct StubGameImport;

impl GameImport for StubGameImport {
    fn print(&self, msg: &str) {
        skirmish_common::common::com_printf(msg);
    }
    fn debug(&self, msg: &str) {
        skirmish_common::common::com_dprintf(msg);
    }
    fn warn(&self, msg: &str) {
        skirmish_common::common::com_warn(msg);
    }
    fn error(&self, msg: &str) -> ! {
        skirmish_common::common::com_error(skirmish_common::q_shared::ERR_DROP, msg)
    }

    fn bprintf(&self, _printlevel: i32, msg: &str) {
        skirmish_common::common::com_printf(msg);
    }
    fn cprintf(&self, _ent_idx: i32, _printlevel: i32, msg: &str) {
        skirmish_common::common::com_printf(msg);
    }
    fn centerprintf(&self, _ent_idx: i32, msg: &str) {
        skirmish_common::common::com_printf(msg);
    }

    fn configstring(&self, _num: i32, _string: &str) {
        // stub: needs server state
    }

    fn modelindex(&self, _name: &str) -> i32 { 0 }
    fn soundindex(&self, _name: &str) -> i32 { 0 }
    fn imageindex(&self, _name: &str) -> i32 { 0 }
    fn setmodel(&self, _ent_idx: i32, _name: &str) {}

    fn sound(&self, _ent_idx: i32, _soundindex: i32, _attenuation: f32) {
        // stub: needs server net
    }
    fn positioned_sound(&self, _origin: &Vec3, _ent_idx: i32, _soundindex: i32, _attenuation: f32) {
        // stub: needs server net
    }

    fn trace(&self, _start: &Vec3, _mins: &Vec3, _maxs: &Vec3, end: &Vec3, _passent: i32, _contentmask: i32) -> Trace {
        // open space, full fraction
        Trace {
            endpos: *end,
            ..Trace::default()
        }
    }
    fn pointcontents(&self, _point: &Vec3) -> i32 { 0 }
    fn in_pvs(&self, _p1: &Vec3, _p2: &Vec3) -> bool { true }
    fn in_phs(&self, _p1: &Vec3, _p2: &Vec3) -> bool { true }
    fn set_area_portal_state(&self, _portalnum: i32, _open: bool) {}
    fn areas_connected(&self, _area1: i32, _area2: i32) -> bool { true }

    fn linkentity(&self, _ent_idx: i32, _abs_mins: &Vec3, _abs_maxs: &Vec3) {}
    fn unlinkentity(&self, _ent_idx: i32) {}
    fn box_entities(&self, _mins: &Vec3, _maxs: &Vec3) -> Vec<i32> {
        Vec::new()
    }

    fn multicast(&self, _origin: &Vec3, _to: i32) {}
    fn unicast(&self, _ent_idx: i32, _reliable: bool) {}
    fn write_char(&self, _c: i32) {}
    fn write_byte(&self, _c: i32) {}
    fn write_short(&self, _c: i32) {}
    fn write_long(&self, _c: i32) {}
    fn write_string(&self, _s: &str) {}
    fn write_position(&self, _pos: &Vec3) {}
    fn write_dir(&self, _dir: &Vec3) {}
    fn write_angle(&self, _f: f32) {}
    fn write_angles(&self, _angles: &Vec3) {}

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

    fn frame_rate(&self) -> u32 { 40 }
    fn frame_millis(&self) -> u32 { 25 }
    fn frame_seconds(&self) -> f32 { 0.025 }
}
