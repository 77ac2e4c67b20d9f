#![allow(dead_code)]
#![allow(clippy::too_many_arguments, clippy::float_cmp, clippy::manual_range_contains,
         clippy::needless_range_loop, clippy::collapsible_if, clippy::collapsible_else_if)]

pub mod dispatch;
pub mod g_cmds;
pub mod g_combat;
pub mod g_items;
pub mod g_local;
pub mod g_main;
pub mod g_maplist;
pub mod g_phys;
pub mod g_spawn;
pub mod g_svcmds;
pub mod g_utils;
pub mod game;
pub mod game_import;
pub mod p_client;
