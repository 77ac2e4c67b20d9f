// g_svcmds.rs — dedicated server console commands

use crate::g_local::*;
use crate::game_import::*;

/// Entry point for a console command issued on the server. The command
/// name itself arrives as argv(1) because argv(0) is always "sv".
pub fn server_command(ctx: &mut GameContext) {
    let argc = gi_argc();
    let args: Vec<String> = (0..argc).map(gi_argv).collect();
    dispatch(ctx, &args);
}

pub fn dispatch(ctx: &mut GameContext, args: &[String]) {
    let cmd = match args.get(1) {
        Some(c) => c.to_lowercase(),
        None => return,
    };

    match cmd.as_str() {
        "mute" => sv_mute(ctx, args, true),
        "unmute" => sv_mute(ctx, args, false),
        "stuff" => sv_stuff(ctx, args),
        "stuffall" => sv_stuff_all(ctx, args),
        _ => gi_print(&format!("Unknown server command \"{}\"\n", cmd)),
    }
}

/// Toggles chat for the named client. Also reachable through a passed
/// "mute" or "unmute" vote.
pub fn mute_client(ctx: &mut GameContext, name: &str, mute: bool) -> bool {
    let client = match ctx.client_by_name(name) {
        Some(c) => c,
        None => {
            gi_print(&format!("No player named \"{}\"\n", name));
            return false;
        }
    };

    ctx.clients[client].locals.muted = mute;

    let net_name = ctx.clients[client].persistent.net_name.clone();
    if mute {
        gi_bprintf(PRINT_HIGH, &format!("{} has been muted\n", net_name));
    } else {
        gi_bprintf(PRINT_HIGH, &format!("{} has been unmuted\n", net_name));
    }
    true
}

fn sv_mute(ctx: &mut GameContext, args: &[String], mute: bool) {
    match args.get(2) {
        Some(name) => {
            mute_client(ctx, name, mute);
        }
        None => gi_print(&format!(
            "Usage: sv {} <player>\n",
            if mute { "mute" } else { "unmute" }
        )),
    }
}

/// Forces the named client to execute a console command.
fn sv_stuff(ctx: &mut GameContext, args: &[String]) {
    if args.len() < 4 {
        gi_print("Usage: sv stuff <player> <command>\n");
        return;
    }

    let client = match ctx.client_by_name(&args[2]) {
        Some(c) => c,
        None => {
            gi_print(&format!("No player named \"{}\"\n", args[2]));
            return;
        }
    };

    stuff_text(ctx.entity_for_client(client), &args[3..].join(" "));
}

/// Forces every connected client to execute a console command.
fn sv_stuff_all(ctx: &mut GameContext, args: &[String]) {
    if args.len() < 3 {
        gi_print("Usage: sv stuffall <command>\n");
        return;
    }

    let text = args[2..].join(" ");
    for i in 0..ctx.max_clients {
        if !ctx.clients[i].persistent.connected {
            continue;
        }
        stuff_text(ctx.entity_for_client(i), &text);
    }
}

fn stuff_text(ent_idx: usize, text: &str) {
    gi_write_byte(SV_CMD_STUFF_TEXT);
    gi_write_string(&format!("{}\n", text));
    gi_unicast(ent_idx as i32, true);
}
