// game.rs — the interface the server drives the game module through

use skirmish_common::q_shared::UserCmd;

use crate::g_local::GameContext;
use crate::game_import::{set_gi, GameImport};
use crate::{g_cmds, g_main, g_spawn, g_svcmds, p_client};

/// Bumped whenever the server/game interface changes shape. The server
/// refuses to load a game module built against a different version.
pub const GAME_API_VERSION: i32 = 4;

/// The game module's side of the server/game boundary. The server calls
/// these entry points; everything else in this crate is internal.
pub struct GameExport {
    pub api_version: i32,
    pub name: &'static str,
    ctx: GameContext,
}

/// Installs the import interface and builds the export table. Init is
/// deferred so the server can size the client pool from its own cvars.
pub fn load_game(import: Box<dyn GameImport + Send + Sync>) -> GameExport {
    set_gi(import);
    GameExport {
        api_version: GAME_API_VERSION,
        name: g_main::game_name(),
        ctx: GameContext::default(),
    }
}

impl GameExport {
    pub fn init(&mut self, max_clients: usize) {
        g_main::g_init(&mut self.ctx, max_clients);
    }

    pub fn shutdown(&mut self) {
        g_main::g_shutdown(&mut self.ctx);
    }

    pub fn spawn_entities(&mut self, name: &str, entity_string: &str) {
        g_spawn::spawn_entities(&mut self.ctx, name, entity_string);
    }

    pub fn frame(&mut self) {
        g_main::g_frame(&mut self.ctx);
    }

    pub fn client_connect(&mut self, ent_idx: usize, user_info: &str) -> bool {
        p_client::client_connect(&mut self.ctx, ent_idx, user_info)
    }

    pub fn client_begin(&mut self, ent_idx: usize) {
        p_client::client_begin(&mut self.ctx, ent_idx);
    }

    pub fn client_user_info_changed(&mut self, ent_idx: usize, user_info: &str) {
        p_client::client_user_info_changed(&mut self.ctx, ent_idx, user_info);
    }

    pub fn client_disconnect(&mut self, ent_idx: usize) {
        p_client::client_disconnect(&mut self.ctx, ent_idx);
    }

    pub fn client_command(&mut self, ent_idx: usize) {
        g_cmds::client_command(&mut self.ctx, ent_idx);
    }

    pub fn client_think(&mut self, ent_idx: usize, cmd: &UserCmd) {
        p_client::client_think(&mut self.ctx, ent_idx, cmd);
    }

    pub fn server_command(&mut self) {
        g_svcmds::server_command(&mut self.ctx);
    }

    /// Test and tooling access to the game state.
    pub fn context(&self) -> &GameContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut GameContext {
        &mut self.ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_import::StubGameImport;

    #[test]
    fn test_load_game_exports_version_and_name() {
        let mut ge = load_game(Box::new(StubGameImport));
        assert_eq!(ge.api_version, GAME_API_VERSION);
        assert_eq!(ge.name, "skirmish");

        skirmish_common::cvar::cvar_init();
        ge.init(4);
        assert_eq!(ge.context().max_clients, 4);

        assert!(ge.client_connect(1, r"\name\quake_guy"));
        ge.client_begin(1);
        assert!(ge.context().clients[0].persistent.connected);

        ge.frame();
        assert_eq!(ge.context().level.frame_num, 1);

        ge.shutdown();
    }
}
