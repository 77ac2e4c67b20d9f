// cmd.rs — console command registration and script command buffer

use crate::common::com_printf;
use crate::q_shared::{MAX_STRING_CHARS, MAX_STRING_TOKENS};

use parking_lot::Mutex;
use std::collections::HashMap;

/// Command groups. A whole group can be removed at once when its owner
/// unloads (the game module removes CMD_GAME on shutdown).
pub const CMD_SERVER: u32 = 1;
pub const CMD_GAME: u32 = 2;

/// A registered console command.
#[derive(Clone)]
pub struct CmdFunction {
    pub name: String,
    pub group: u32,
    pub description: Option<String>,
}

/// The full command system context.
pub struct CmdContext {
    /// Deferred command text, consumed by the host once per frame.
    cmd_text: String,

    // Tokenized command line
    pub cmd_argc: usize,
    pub cmd_argv: Vec<String>,
    pub cmd_args: String,

    pub cmd_functions: Vec<CmdFunction>,
    /// O(1) command lookup by name -> index in cmd_functions
    cmd_functions_index: HashMap<String, usize>,
}

impl CmdContext {
    pub fn new() -> Self {
        Self {
            cmd_text: String::new(),
            cmd_argc: 0,
            cmd_argv: Vec::new(),
            cmd_args: String::new(),
            cmd_functions: Vec::new(),
            cmd_functions_index: HashMap::new(),
        }
    }

    // ========================================================
    // Command buffer (cbuf_*)
    // ========================================================

    /// Add command text at the end of the buffer.
    pub fn cbuf_add_text(&mut self, text: &str) {
        if self.cmd_text.len() + text.len() > 65536 {
            com_printf("cbuf_add_text: overflow\n");
            return;
        }
        self.cmd_text.push_str(text);
    }

    /// Take all buffered command text, leaving the buffer empty.
    pub fn cbuf_take(&mut self) -> String {
        std::mem::take(&mut self.cmd_text)
    }

    // ========================================================
    // Tokenizer
    // ========================================================

    /// Parse the given text into argv tokens. The first token is the command
    /// name; `cmd_args` holds the raw text after it.
    pub fn tokenize_string(&mut self, text: &str) {
        self.cmd_argc = 0;
        self.cmd_argv.clear();
        self.cmd_args.clear();

        let text = match text.find('\n') {
            Some(pos) => &text[..pos],
            None => text,
        };
        if text.len() >= MAX_STRING_CHARS {
            com_printf("tokenize_string: line too long, discarded\n");
            return;
        }

        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            // Skip whitespace
            while i < bytes.len() && bytes[i] <= b' ' {
                i += 1;
            }
            if i >= bytes.len() {
                break;
            }

            // Everything after the command name is the args string
            if self.cmd_argc == 1 {
                self.cmd_args = text[i..].trim_end().to_string();
            }

            if self.cmd_argc == MAX_STRING_TOKENS {
                break;
            }

            let token = if bytes[i] == b'"' {
                i += 1;
                let start = i;
                while i < bytes.len() && bytes[i] != b'"' {
                    i += 1;
                }
                let t = &text[start..i];
                if i < bytes.len() {
                    i += 1; // closing quote
                }
                t
            } else {
                let start = i;
                while i < bytes.len() && bytes[i] > b' ' {
                    i += 1;
                }
                &text[start..i]
            };

            self.cmd_argv.push(token.to_string());
            self.cmd_argc += 1;
        }
    }

    pub fn argc(&self) -> usize {
        self.cmd_argc
    }

    pub fn argv(&self, i: usize) -> &str {
        self.cmd_argv.get(i).map_or("", |s| s.as_str())
    }

    pub fn args(&self) -> &str {
        &self.cmd_args
    }

    // ========================================================
    // Command registration
    // ========================================================

    /// Register a command name under a group. Re-registering an existing
    /// name is a no-op with a warning.
    pub fn add_command(&mut self, name: &str, group: u32, description: Option<&str>) {
        if self.cmd_functions_index.contains_key(name) {
            com_printf(&format!("add_command: {} already defined\n", name));
            return;
        }
        let idx = self.cmd_functions.len();
        self.cmd_functions.push(CmdFunction {
            name: name.to_string(),
            group,
            description: description.map(String::from),
        });
        self.cmd_functions_index.insert(name.to_string(), idx);
    }

    pub fn command_exists(&self, name: &str) -> bool {
        self.cmd_functions_index.contains_key(name)
    }

    /// Remove every command registered under the given group.
    pub fn remove_group(&mut self, group: u32) {
        self.cmd_functions.retain(|f| f.group != group);
        self.cmd_functions_index.clear();
        for (idx, f) in self.cmd_functions.iter().enumerate() {
            self.cmd_functions_index.insert(f.name.clone(), idx);
        }
    }
}

impl Default for CmdContext {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================
// Global singleton and free-function wrappers
// ============================================================

static CMD_CTX: Mutex<Option<CmdContext>> = Mutex::new(None);

pub fn cmd_init() {
    let mut g = CMD_CTX.lock();
    *g = Some(CmdContext::new());
}

pub fn cmd_shutdown() {
    let mut g = CMD_CTX.lock();
    *g = None;
}

fn with_ctx<F, R>(default: R, f: F) -> R
where
    F: FnOnce(&mut CmdContext) -> R,
{
    let mut g = CMD_CTX.lock();
    if g.is_none() {
        *g = Some(CmdContext::new());
    }
    g.as_mut().map_or(default, f)
}

pub fn cmd_add_command(name: &str, group: u32, description: Option<&str>) {
    with_ctx((), |c| c.add_command(name, group, description));
}

pub fn cmd_remove_group(group: u32) {
    with_ctx((), |c| c.remove_group(group));
}

pub fn cmd_exists(name: &str) -> bool {
    with_ctx(false, |c| c.command_exists(name))
}

pub fn cmd_tokenize_string(text: &str) {
    with_ctx((), |c| c.tokenize_string(text));
}

pub fn cmd_argc() -> usize {
    with_ctx(0, |c| c.argc())
}

pub fn cmd_argv(i: usize) -> String {
    with_ctx(String::new(), |c| c.argv(i).to_string())
}

pub fn cmd_args() -> String {
    with_ctx(String::new(), |c| c.args().to_string())
}

pub fn cbuf_add_text(text: &str) {
    with_ctx((), |c| c.cbuf_add_text(text));
}

pub fn cbuf_take() -> String {
    with_ctx(String::new(), |c| c.cbuf_take())
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        let mut ctx = CmdContext::new();
        ctx.tokenize_string("vote map edge");
        assert_eq!(ctx.argc(), 3);
        assert_eq!(ctx.argv(0), "vote");
        assert_eq!(ctx.argv(1), "map");
        assert_eq!(ctx.argv(2), "edge");
        assert_eq!(ctx.args(), "map edge");
    }

    #[test]
    fn test_tokenize_quoted() {
        let mut ctx = CmdContext::new();
        ctx.tokenize_string("say \"hello there\"");
        assert_eq!(ctx.argc(), 2);
        assert_eq!(ctx.argv(1), "hello there");
    }

    #[test]
    fn test_tokenize_stops_at_newline() {
        let mut ctx = CmdContext::new();
        ctx.tokenize_string("first one\nsecond two");
        assert_eq!(ctx.argc(), 2);
        assert_eq!(ctx.argv(0), "first");
    }

    #[test]
    fn test_argv_out_of_range() {
        let mut ctx = CmdContext::new();
        ctx.tokenize_string("only");
        assert_eq!(ctx.argv(5), "");
    }

    #[test]
    fn test_add_and_remove_group() {
        let mut ctx = CmdContext::new();
        ctx.add_command("mute", CMD_GAME, Some("silence a client"));
        ctx.add_command("unmute", CMD_GAME, None);
        ctx.add_command("status", CMD_SERVER, None);
        assert!(ctx.command_exists("mute"));

        ctx.remove_group(CMD_GAME);
        assert!(!ctx.command_exists("mute"));
        assert!(!ctx.command_exists("unmute"));
        assert!(ctx.command_exists("status"));
    }

    #[test]
    fn test_duplicate_registration_ignored() {
        let mut ctx = CmdContext::new();
        ctx.add_command("mute", CMD_GAME, None);
        ctx.add_command("mute", CMD_SERVER, None);
        assert_eq!(ctx.cmd_functions.len(), 1);
        assert_eq!(ctx.cmd_functions[0].group, CMD_GAME);
    }

    #[test]
    fn test_cbuf_add_and_take() {
        let mut ctx = CmdContext::new();
        ctx.cbuf_add_text("map edge\n");
        ctx.cbuf_add_text("mute grunt\n");
        assert_eq!(ctx.cbuf_take(), "map edge\nmute grunt\n");
        assert_eq!(ctx.cbuf_take(), "");
    }
}
