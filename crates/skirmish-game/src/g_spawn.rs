// g_spawn.rs — entity string parsing and level population

use crate::g_local::*;
use crate::game_import::*;

/// One parsed entity block: the key/value pairs between braces.
pub type SpawnPairs = Vec<(String, String)>;

// ============================================================
// Entity string parser
// ============================================================

/// Parses the map's entity string into per-entity key/value blocks.
/// Blocks look like `{ "classname" "info_player_start" "origin" "0 0 24" }`.
/// Malformed trailing data is dropped rather than treated as an error.
pub fn parse_entity_string(s: &str) -> Vec<SpawnPairs> {
    let mut entities = Vec::new();
    let mut chars = s.chars().peekable();

    fn skip_ws(chars: &mut std::iter::Peekable<std::str::Chars>) {
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
            } else if c == '/' {
                // comment runs to end of line
                while let Some(&c) = chars.peek() {
                    chars.next();
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn read_quoted(chars: &mut std::iter::Peekable<std::str::Chars>) -> Option<String> {
        skip_ws(chars);
        if chars.peek() != Some(&'"') {
            return None;
        }
        chars.next();
        let mut out = String::new();
        for c in chars.by_ref() {
            if c == '"' {
                return Some(out);
            }
            out.push(c);
        }
        None
    }

    loop {
        skip_ws(&mut chars);
        match chars.next() {
            Some('{') => {}
            _ => break,
        }

        let mut pairs = SpawnPairs::new();
        loop {
            skip_ws(&mut chars);
            if chars.peek() == Some(&'}') {
                chars.next();
                entities.push(pairs);
                break;
            }
            let key = match read_quoted(&mut chars) {
                Some(k) => k,
                None => return entities,
            };
            let value = match read_quoted(&mut chars) {
                Some(v) => v,
                None => return entities,
            };
            pairs.push((key, value));
        }
    }

    entities
}

fn pair_value<'a>(pairs: &'a SpawnPairs, key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Parses "x y z" into a vector, tolerating missing components.
pub fn parse_vec3(s: &str) -> Vec3 {
    let mut v = [0.0; 3];
    for (i, tok) in s.split_whitespace().take(3).enumerate() {
        v[i] = tok.parse().unwrap_or(0.0);
    }
    v
}

// ============================================================
// Worldspawn
// ============================================================

/// Applies worldspawn keys. These take precedence over the cvar defaults
/// already loaded into the level, so a map can pin its own rules.
fn spawn_worldspawn(ctx: &mut GameContext, pairs: &SpawnPairs) {
    for (key, value) in pairs {
        match key.as_str() {
            "message" => ctx.level.title = value.clone(),
            "gravity" => ctx.level.gravity = value.parse().unwrap_or(ctx.level.gravity),
            "gameplay" => ctx.level.gameplay = Gameplay::by_name(value),
            "teams" => ctx.level.teams = value.parse().unwrap_or(0),
            "ctf" => ctx.level.ctf = value.parse().unwrap_or(0) != 0,
            "match" => ctx.level.match_mode = value.parse().unwrap_or(0) != 0,
            "rounds" => ctx.level.rounds = value.parse().unwrap_or(0) != 0,
            "frag_limit" | "fraglimit" => {
                ctx.level.frag_limit = value.parse().unwrap_or(ctx.level.frag_limit)
            }
            "round_limit" => {
                ctx.level.round_limit = value.parse().unwrap_or(ctx.level.round_limit)
            }
            "capture_limit" | "capturelimit" => {
                ctx.level.capture_limit = value.parse().unwrap_or(ctx.level.capture_limit)
            }
            "time_limit" | "timelimit" => {
                ctx.level.time_limit = (value.parse().unwrap_or(0.0f32) * 60.0 * 1000.0) as u32
            }
            _ => {}
        }
    }

    ctx.edicts[0].inuse = true;
    ctx.edicts[0].class_name = "worldspawn".to_string();
    ctx.edicts[0].solid = Solid::Bsp;
    ctx.edicts[0].s.model_index = 1;

    if ctx.level.gameplay == Gameplay::Duel {
        // duel play implies teams of one and match mode
        ctx.level.teams = 1;
        ctx.level.match_mode = true;
    }

    gi_configstring(CS_GAMEPLAY as i32, ctx.level.gameplay.name());
}

// ============================================================
// Point entities
// ============================================================

const SPAWN_POINT_CLASSES: &[&str] = &[
    "info_player_start",
    "info_player_deathmatch",
    "info_player_intermission",
    "info_player_team_good",
    "info_player_team_evil",
];

fn spawn_point_entity(ctx: &mut GameContext, class_name: &str, pairs: &SpawnPairs) {
    let ent_idx = crate::g_utils::spawn_entity(ctx, class_name);

    if let Some(origin) = pair_value(pairs, "origin") {
        ctx.edicts[ent_idx].s.origin = parse_vec3(origin);
    }
    if let Some(angles) = pair_value(pairs, "angles") {
        ctx.edicts[ent_idx].s.angles = parse_vec3(angles);
    } else if let Some(angle) = pair_value(pairs, "angle") {
        ctx.edicts[ent_idx].s.angles = [0.0, angle.parse().unwrap_or(0.0), 0.0];
    }
    if let Some(flags) = pair_value(pairs, "spawnflags") {
        ctx.edicts[ent_idx].spawn_flags = flags.parse().unwrap_or(0);
    }
}

fn spawn_one(ctx: &mut GameContext, pairs: &SpawnPairs) -> bool {
    let class_name = match pair_value(pairs, "classname") {
        Some(c) => c.to_string(),
        None => {
            gi_debug("Entity block without a classname\n");
            return false;
        }
    };

    if SPAWN_POINT_CLASSES.contains(&class_name.as_str()) {
        spawn_point_entity(ctx, &class_name, pairs);
        return true;
    }

    if let Some(item_idx) = crate::g_items::find_item_by_class_name(&class_name) {
        let origin = pair_value(pairs, "origin")
            .map(parse_vec3)
            .unwrap_or_default();
        let ent_idx = crate::g_items::spawn_item(ctx, item_idx, &origin);
        if let Some(flags) = pair_value(pairs, "spawnflags") {
            ctx.edicts[ent_idx].spawn_flags = flags.parse().unwrap_or(0);
        }
        return true;
    }

    gi_debug(&format!("{}: unknown classname, skipped\n", class_name));
    false
}

/// Populates the level from the map's name and entity string. The first
/// block must be worldspawn; every other block spawns independently, so
/// one bad entity does not abort the load.
pub fn spawn_entities(ctx: &mut GameContext, name: &str, entity_string: &str) {
    ctx.level.name = name.to_string();

    let blocks = parse_entity_string(entity_string);
    let mut inhibited = 0;

    for (i, pairs) in blocks.iter().enumerate() {
        if i == 0 {
            match pair_value(pairs, "classname") {
                Some("worldspawn") => spawn_worldspawn(ctx, pairs),
                _ => gi_error("spawn_entities: first entity is not worldspawn"),
            }
            continue;
        }
        if !spawn_one(ctx, pairs) {
            inhibited += 1;
        }
    }

    if inhibited > 0 {
        gi_debug(&format!("{} entities inhibited\n", inhibited));
    }
}
