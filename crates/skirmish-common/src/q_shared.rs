// q_shared.rs — math, traces, and constants shared by the server and game module

pub const PITCH: usize = 0;
pub const YAW: usize = 1;
pub const ROLL: usize = 2;

pub type Vec3 = [f32; 3];

pub const VEC3_ORIGIN: Vec3 = [0.0, 0.0, 0.0];

pub const MAX_CLIENTS: usize = 256;
pub const MAX_EDICTS: usize = 1024;
pub const MAX_STRING_CHARS: usize = 1024;
pub const MAX_STRING_TOKENS: usize = 80;
pub const MAX_QPATH: usize = 64;
pub const MAX_NET_NAME: usize = 64;

// ============================================================
// Config strings
// ============================================================

pub const MAX_MODELS: usize = 256;
pub const MAX_SOUNDS: usize = 256;
pub const MAX_IMAGES: usize = 256;

pub const CS_NAME: usize = 0;
pub const CS_MAX_CLIENTS: usize = 30;
pub const CS_MODELS: usize = 32;
pub const CS_SOUNDS: usize = CS_MODELS + MAX_MODELS;
pub const CS_IMAGES: usize = CS_SOUNDS + MAX_SOUNDS;
pub const CS_GENERAL: usize = CS_IMAGES + MAX_IMAGES;
pub const MAX_CONFIG_STRINGS: usize = CS_GENERAL + 480;

// ============================================================
// Server protocol commands (server -> client message bytes)
// ============================================================

pub const SV_CMD_CONFIG_STRING: i32 = 4;
pub const SV_CMD_SOUND: i32 = 9;
pub const SV_CMD_PRINT: i32 = 10;
pub const SV_CMD_CENTER_PRINT: i32 = 11;
pub const SV_CMD_TEMP_ENTITY: i32 = 12;
pub const SV_CMD_STUFF_TEXT: i32 = 13;

// ============================================================
// Contents / masks
// ============================================================

pub const CONTENTS_SOLID: i32 = 1;
pub const CONTENTS_WINDOW: i32 = 2;
pub const CONTENTS_LAVA: i32 = 8;
pub const CONTENTS_SLIME: i32 = 16;
pub const CONTENTS_WATER: i32 = 32;
pub const CONTENTS_MONSTER: i32 = 0x2000000;
pub const CONTENTS_DEAD_MONSTER: i32 = 0x4000000;

pub const MASK_SOLID: i32 = CONTENTS_SOLID | CONTENTS_WINDOW;
pub const MASK_SHOT: i32 = CONTENTS_SOLID | CONTENTS_WINDOW | CONTENTS_MONSTER | CONTENTS_DEAD_MONSTER;

// ============================================================
// Multicast destinations
// ============================================================

pub const MULTICAST_ALL: i32 = 0;
pub const MULTICAST_PHS: i32 = 1;
pub const MULTICAST_PVS: i32 = 2;
pub const MULTICAST_ALL_R: i32 = 3;
pub const MULTICAST_PHS_R: i32 = 4;
pub const MULTICAST_PVS_R: i32 = 5;

// ============================================================
// Sound channels and attenuations
// ============================================================

pub const CHAN_AUTO: i32 = 0;
pub const CHAN_WEAPON: i32 = 1;
pub const CHAN_VOICE: i32 = 2;

pub const ATTEN_NONE: f32 = 0.0;
pub const ATTEN_NORM: f32 = 1.0;
pub const ATTEN_IDLE: f32 = 2.0;
pub const ATTEN_STATIC: f32 = 3.0;

// ============================================================
// Print levels / error codes
// ============================================================

pub const PRINT_LOW: i32 = 0;
pub const PRINT_MEDIUM: i32 = 1;
pub const PRINT_HIGH: i32 = 2;
pub const PRINT_CHAT: i32 = 3;

pub const ERR_FATAL: i32 = 0;
pub const ERR_DROP: i32 = 1;

// ============================================================
// Cvar flags
// ============================================================

pub const CVAR_ARCHIVE: i32 = 1;
pub const CVAR_USERINFO: i32 = 2;
pub const CVAR_SERVERINFO: i32 = 4;
pub const CVAR_NOSET: i32 = 8;
pub const CVAR_LATCH: i32 = 16;

// ============================================================
// Collision plane / surface / trace
// ============================================================

#[derive(Debug, Clone, Default)]
pub struct CPlane {
    pub normal: Vec3,
    pub dist: f32,
    pub plane_type: u8,
    pub signbits: u8,
}

#[derive(Debug, Clone, Default)]
pub struct CSurface {
    pub name: String,
    pub flags: i32,
    pub value: i32,
}

#[derive(Debug, Clone)]
pub struct Trace {
    pub allsolid: bool,
    pub startsolid: bool,
    pub fraction: f32,
    pub endpos: Vec3,
    pub plane: CPlane,
    pub surface: Option<CSurface>,
    pub contents: i32,
    /// Index of the entity struck, -1 for none.
    pub ent_index: i32,
}

impl Default for Trace {
    fn default() -> Self {
        Self {
            allsolid: false,
            startsolid: false,
            fraction: 1.0,
            endpos: [0.0; 3],
            plane: CPlane::default(),
            surface: None,
            contents: 0,
            ent_index: -1,
        }
    }
}

// ============================================================
// Player movement state
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum PmType {
    Normal = 0,
    Spectator = 1,
    Dead = 2,
    Freeze = 3,
}

pub const BUTTON_ATTACK: u8 = 1;
pub const BUTTON_USE: u8 = 2;
pub const BUTTON_ANY: u8 = 0x80; // any key down

/// A single frame of client input.
#[derive(Debug, Clone, Default)]
pub struct UserCmd {
    pub msec: u8,
    pub buttons: u8,
    pub angles: [i16; 3],
    pub forward_move: i16,
    pub side_move: i16,
    pub up_move: i16,
}

pub const PMF_DUCKED: u8 = 1;
pub const PMF_ON_GROUND: u8 = 2;
pub const PMF_TIME_PUSHED: u8 = 4;
pub const PMF_GIBLET: u8 = 8;
pub const PMF_NO_PREDICTION: u8 = 16;

/// Communicated bit-accurate between server and client for prediction sync.
#[derive(Debug, Clone, Copy)]
pub struct PmoveState {
    pub pm_type: PmType,
    pub origin: [i16; 3],   // 12.3 fixed point
    pub velocity: [i16; 3], // 12.3 fixed point
    pub pm_flags: u8,
    pub pm_time: u8,
    pub gravity: i16,
    pub delta_angles: [i16; 3],
}

impl Default for PmoveState {
    fn default() -> Self {
        Self {
            pm_type: PmType::Normal,
            origin: [0; 3],
            velocity: [0; 3],
            pm_flags: 0,
            pm_time: 0,
            gravity: 0,
            delta_angles: [0; 3],
        }
    }
}

// ============================================================
// Info string limits
// ============================================================

pub const MAX_INFO_KEY: usize = 64;
pub const MAX_INFO_VALUE: usize = 64;
pub const MAX_INFO_STRING: usize = 512;

/// Searches an info string ("\key\value\key\value") for the given key.
/// Returns "" when the key is absent.
pub fn info_value_for_key(info: &str, key: &str) -> String {
    let mut parts = info.split('\\');
    if info.starts_with('\\') {
        parts.next();
    }
    loop {
        let k = match parts.next() {
            Some(k) => k,
            None => return String::new(),
        };
        let v = parts.next().unwrap_or("");
        if k == key {
            return v.to_string();
        }
    }
}

/// Sets (or replaces) a key/value pair in an info string.
pub fn info_set_value_for_key(info: &mut String, key: &str, value: &str) {
    if key.contains('\\') || value.contains('\\') || key.contains(';') {
        return;
    }

    // Remove any existing pair first.
    let mut rebuilt = String::with_capacity(info.len());
    let stripped = info.strip_prefix('\\').unwrap_or(info);
    let mut parts = stripped.split('\\');
    loop {
        let k = match parts.next() {
            Some(k) if !k.is_empty() => k,
            Some(_) => continue,
            None => break,
        };
        let v = parts.next().unwrap_or("");
        if k != key {
            rebuilt.push('\\');
            rebuilt.push_str(k);
            rebuilt.push('\\');
            rebuilt.push_str(v);
        }
    }

    let pair = format!("\\{}\\{}", key, value);
    if rebuilt.len() + pair.len() > MAX_INFO_STRING {
        return;
    }
    rebuilt.push_str(&pair);
    *info = rebuilt;
}

// ============================================================
// MATHLIB — vector operations
// ============================================================

#[inline]
pub fn dot_product(a: &Vec3, b: &Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn vector_subtract(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn vector_add(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn vector_copy(src: &Vec3) -> Vec3 {
    *src
}

#[inline]
pub fn vector_clear(v: &mut Vec3) {
    v[0] = 0.0;
    v[1] = 0.0;
    v[2] = 0.0;
}

#[inline]
pub fn vector_set(v: &mut Vec3, x: f32, y: f32, z: f32) {
    v[0] = x;
    v[1] = y;
    v[2] = z;
}

/// veca + scale * vecb
pub fn vector_ma(veca: &Vec3, scale: f32, vecb: &Vec3) -> Vec3 {
    [
        veca[0] + scale * vecb[0],
        veca[1] + scale * vecb[1],
        veca[2] + scale * vecb[2],
    ]
}

pub fn vector_compare(v1: &Vec3, v2: &Vec3) -> bool {
    v1[0] == v2[0] && v1[1] == v2[1] && v1[2] == v2[2]
}

/// Normalize in place, returns original length.
pub fn vector_normalize(v: &mut Vec3) -> f32 {
    let length = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if length != 0.0 {
        let ilength = 1.0 / length;
        v[0] *= ilength;
        v[1] *= ilength;
        v[2] *= ilength;
    }
    length
}

pub fn vector_length(v: &Vec3) -> f32 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

pub fn vector_scale(v: &Vec3, scale: f32) -> Vec3 {
    [v[0] * scale, v[1] * scale, v[2] * scale]
}

pub fn cross_product(v1: &Vec3, v2: &Vec3) -> Vec3 {
    [
        v1[1] * v2[2] - v1[2] * v2[1],
        v1[2] * v2[0] - v1[0] * v2[2],
        v1[0] * v2[1] - v1[1] * v2[0],
    ]
}

pub fn angle_vectors(
    angles: &Vec3,
    forward: Option<&mut Vec3>,
    right: Option<&mut Vec3>,
    up: Option<&mut Vec3>,
) {
    let angle_yaw = angles[YAW].to_radians();
    let sy = angle_yaw.sin();
    let cy = angle_yaw.cos();

    let angle_pitch = angles[PITCH].to_radians();
    let sp = angle_pitch.sin();
    let cp = angle_pitch.cos();

    let angle_roll = angles[ROLL].to_radians();
    let sr = angle_roll.sin();
    let cr = angle_roll.cos();

    if let Some(fwd) = forward {
        fwd[0] = cp * cy;
        fwd[1] = cp * sy;
        fwd[2] = -sp;
    }
    if let Some(r) = right {
        r[0] = -sr * sp * cy + -cr * -sy;
        r[1] = -sr * sp * sy + -cr * cy;
        r[2] = -sr * cp;
    }
    if let Some(u) = up {
        u[0] = cr * sp * cy + -sr * -sy;
        u[1] = cr * sp * sy + -sr * cy;
        u[2] = cr * cp;
    }
}

/// Convenience version of angle_vectors that returns (forward, right, up).
pub fn angle_vectors_tuple(angles: &Vec3) -> (Vec3, Vec3, Vec3) {
    let mut forward = [0.0f32; 3];
    let mut right = [0.0f32; 3];
    let mut up = [0.0f32; 3];
    angle_vectors(angles, Some(&mut forward), Some(&mut right), Some(&mut up));
    (forward, right, up)
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_normalize_returns_length() {
        let mut v = [3.0, 0.0, 4.0];
        let len = vector_normalize(&mut v);
        assert_eq!(len, 5.0);
        assert!((vector_length(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_vector_normalize_zero() {
        let mut v = [0.0, 0.0, 0.0];
        assert_eq!(vector_normalize(&mut v), 0.0);
        assert!(vector_compare(&v, &VEC3_ORIGIN));
    }

    #[test]
    fn test_vector_ma() {
        let v = vector_ma(&[1.0, 2.0, 3.0], 2.0, &[1.0, 0.0, -1.0]);
        assert!(vector_compare(&v, &[3.0, 2.0, 1.0]));
    }

    #[test]
    fn test_info_value_for_key() {
        let info = "\\name\\grunt\\skin\\viper\\handicap\\80";
        assert_eq!(info_value_for_key(info, "name"), "grunt");
        assert_eq!(info_value_for_key(info, "handicap"), "80");
        assert_eq!(info_value_for_key(info, "missing"), "");
    }

    #[test]
    fn test_info_set_value_for_key_replaces() {
        let mut info = String::from("\\name\\grunt\\skin\\viper");
        info_set_value_for_key(&mut info, "name", "newbie");
        assert_eq!(info_value_for_key(&info, "name"), "newbie");
        assert_eq!(info_value_for_key(&info, "skin"), "viper");
    }

    #[test]
    fn test_angle_vectors_forward() {
        let (forward, _, _) = angle_vectors_tuple(&[0.0, 0.0, 0.0]);
        assert!((forward[0] - 1.0).abs() < 1e-6);
        assert!(forward[1].abs() < 1e-6);
        assert!(forward[2].abs() < 1e-6);
    }
}
