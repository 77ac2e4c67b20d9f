// g_maplist.rs — map rotation

use crate::g_local::Gameplay;
use rand::Rng;

/// One rotation entry. Optional fields override the corresponding cvars
/// when the map loads.
#[derive(Debug, Clone)]
pub struct MapListEntry {
    pub name: String,
    pub title: String,
    pub weight: f32,

    pub gravity: Option<i32>,
    pub gameplay: Option<Gameplay>,
    pub teams: Option<i32>,
    pub ctf: Option<bool>,
    pub match_mode: Option<bool>,
    pub rounds: Option<bool>,
    pub frag_limit: Option<i32>,
    pub round_limit: Option<i32>,
    pub capture_limit: Option<i32>,
    /// Minutes.
    pub time_limit: Option<f32>,
}

impl MapListEntry {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            title: String::new(),
            weight: 1.0,
            gravity: None,
            gameplay: None,
            teams: None,
            ctf: None,
            match_mode: None,
            rounds: None,
            frag_limit: None,
            round_limit: None,
            capture_limit: None,
            time_limit: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MapList {
    pub maps: Vec<MapListEntry>,
    pub index: usize,
}

/// Splits the list source into tokens, honoring double quotes and treating
/// braces as their own tokens.
fn tokenize(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = s.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '{' || c == '}' {
            chars.next();
            tokens.push(c.to_string());
        } else if c == '"' {
            chars.next();
            let mut tok = String::new();
            for c in chars.by_ref() {
                if c == '"' {
                    break;
                }
                tok.push(c);
            }
            tokens.push(tok);
        } else {
            let mut tok = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || c == '{' || c == '}' || c == '"' {
                    break;
                }
                tok.push(c);
                chars.next();
            }
            tokens.push(tok);
        }
    }

    tokens
}

fn parse_bool(v: &str) -> bool {
    v.parse::<f32>().map(|f| f != 0.0).unwrap_or(false)
}

impl MapList {
    /// Parses a rotation from the `g_map_list` source: bare map names, or
    /// `{ key value .. }` blocks with per-map overrides.
    pub fn parse(s: &str) -> MapList {
        let tokens = tokenize(s);
        let mut maps = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            if tokens[i] == "{" {
                let mut entry = MapListEntry::new("");
                i += 1;
                while i < tokens.len() && tokens[i] != "}" {
                    if i + 1 >= tokens.len() || tokens[i + 1] == "}" {
                        break;
                    }
                    let key = tokens[i].as_str();
                    let value = tokens[i + 1].as_str();
                    match key {
                        "name" => entry.name = value.to_string(),
                        "title" => entry.title = value.to_string(),
                        "weight" => entry.weight = value.parse().unwrap_or(1.0),
                        "gravity" => entry.gravity = value.parse().ok(),
                        "gameplay" => entry.gameplay = Some(Gameplay::by_name(value)),
                        "teams" => entry.teams = value.parse().ok(),
                        "ctf" => entry.ctf = Some(parse_bool(value)),
                        "match" => entry.match_mode = Some(parse_bool(value)),
                        "rounds" => entry.rounds = Some(parse_bool(value)),
                        "frag_limit" => entry.frag_limit = value.parse().ok(),
                        "round_limit" => entry.round_limit = value.parse().ok(),
                        "capture_limit" => entry.capture_limit = value.parse().ok(),
                        "time_limit" => entry.time_limit = value.parse().ok(),
                        _ => {}
                    }
                    i += 2;
                }
                if i < tokens.len() && tokens[i] == "}" {
                    i += 1;
                }
                if !entry.name.is_empty() {
                    maps.push(entry);
                }
            } else {
                maps.push(MapListEntry::new(&tokens[i]));
                i += 1;
            }
        }

        MapList { maps, index: 0 }
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.maps.iter().position(|m| m.name == name)
    }

    pub fn current(&self) -> Option<&MapListEntry> {
        self.maps.get(self.index)
    }

    /// Advances the rotation and returns the new current entry. A random
    /// rotation draws by weight and avoids repeating the current map.
    pub fn next(&mut self, random: bool) -> Option<&MapListEntry> {
        if self.maps.is_empty() {
            return None;
        }

        if random && self.maps.len() > 1 {
            let total: f32 = self.maps.iter().map(|m| m.weight.max(0.0)).sum();
            let mut rng = rand::thread_rng();
            loop {
                let mut roll = rng.gen_range(0.0..total.max(f32::MIN_POSITIVE));
                let mut pick = self.maps.len() - 1;
                for (i, m) in self.maps.iter().enumerate() {
                    roll -= m.weight.max(0.0);
                    if roll <= 0.0 {
                        pick = i;
                        break;
                    }
                }
                if pick != self.index {
                    self.index = pick;
                    break;
                }
            }
        } else {
            self.index = (self.index + 1) % self.maps.len();
        }

        self.maps.get(self.index)
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_names() {
        let list = MapList::parse("edge frag3 vertigo");
        assert_eq!(list.maps.len(), 3);
        assert_eq!(list.maps[1].name, "frag3");
        assert_eq!(list.maps[1].weight, 1.0);
    }

    #[test]
    fn test_parse_block_overrides() {
        let src = r#"
            { name edge title "The Edge" gravity 600 gameplay instagib teams 2 frag_limit 50 }
            frag3
        "#;
        let list = MapList::parse(src);
        assert_eq!(list.maps.len(), 2);
        let edge = &list.maps[0];
        assert_eq!(edge.name, "edge");
        assert_eq!(edge.title, "The Edge");
        assert_eq!(edge.gravity, Some(600));
        assert_eq!(edge.gameplay, Some(Gameplay::Instagib));
        assert_eq!(edge.teams, Some(2));
        assert_eq!(edge.frag_limit, Some(50));
        assert_eq!(edge.ctf, None);
    }

    #[test]
    fn test_nameless_block_dropped() {
        let list = MapList::parse("{ gravity 800 } edge");
        assert_eq!(list.maps.len(), 1);
        assert_eq!(list.maps[0].name, "edge");
    }

    #[test]
    fn test_cyclic_next_wraps() {
        let mut list = MapList::parse("a b c");
        assert_eq!(list.next(false).unwrap().name, "b");
        assert_eq!(list.next(false).unwrap().name, "c");
        assert_eq!(list.next(false).unwrap().name, "a");
    }

    #[test]
    fn test_random_next_never_repeats_current() {
        let mut list = MapList::parse("a b");
        for _ in 0..20 {
            let prev = list.index;
            list.next(true);
            assert_ne!(list.index, prev);
        }
    }

    #[test]
    fn test_random_single_map_stays() {
        let mut list = MapList::parse("only");
        assert_eq!(list.next(true).unwrap().name, "only");
        assert_eq!(list.index, 0);
    }
}
