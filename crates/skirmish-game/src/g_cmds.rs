// g_cmds.rs — client console commands

use crate::g_local::*;
use crate::g_main;
use crate::game_import::*;
use crate::p_client;

/// Entry point for a client console command. Arguments are snapshotted
/// from the tokenizer and handed to the individual handlers.
pub fn client_command(ctx: &mut GameContext, ent_idx: usize) {
    let argc = gi_argc();
    let args: Vec<String> = (0..argc).map(gi_argv).collect();
    let raw = gi_args();
    dispatch(ctx, ent_idx, &args, &raw);
}

pub fn dispatch(ctx: &mut GameContext, ent_idx: usize, args: &[String], raw: &str) {
    let cmd = match args.first() {
        Some(c) => c.to_lowercase(),
        None => return,
    };

    match cmd.as_str() {
        "say" => cmd_say(ctx, ent_idx, false, raw),
        "say_team" => cmd_say(ctx, ent_idx, true, raw),
        "team" | "join" => cmd_team(ctx, ent_idx, args),
        "team_name" => cmd_team_name(ctx, ent_idx, args),
        "team_skin" => cmd_team_skin(ctx, ent_idx, args),
        "spectate" => cmd_spectate(ctx, ent_idx),
        "ready" => cmd_ready(ctx, ent_idx),
        "unready" => cmd_unready(ctx, ent_idx),
        "vote" => cmd_vote(ctx, ent_idx, args),
        "yes" => cast_vote(ctx, ent_idx, VoteChoice::Yes),
        "no" => cast_vote(ctx, ent_idx, VoteChoice::No),
        "timeout" => {
            g_main::call_timeout(ctx, ent_idx);
        }
        "timein" => cmd_timein(ctx, ent_idx),
        _ => gi_cprintf(
            ent_idx as i32,
            PRINT_HIGH,
            &format!("Unknown command \"{}\"\n", cmd),
        ),
    }
}

// ============================================================
// Chat
// ============================================================

pub fn cmd_say(ctx: &mut GameContext, ent_idx: usize, team_only: bool, text: &str) {
    let client = match ctx.edicts[ent_idx].client {
        Some(c) => c,
        None => return,
    };

    if ctx.clients[client].locals.muted {
        gi_cprintf(ent_idx as i32, PRINT_HIGH, "You have been muted\n");
        return;
    }

    let text = text.trim().trim_matches('"').trim();
    if text.is_empty() {
        return;
    }

    // flood control, one message a second
    if ctx.level.time < ctx.clients[client].locals.chat_time {
        return;
    }
    ctx.clients[client].locals.chat_time = ctx.level.time + 1000;

    let name = ctx.clients[client].persistent.net_name.clone();
    let spectator = ctx.clients[client].persistent.spectator;
    let spectator_chat = gi_cvar_value(ctx.cvars.g_spectator_chat) != 0.0;

    if team_only {
        let team = ctx.clients[client].persistent.team;
        for i in 0..ctx.max_clients {
            if !ctx.clients[i].persistent.connected || ctx.clients[i].persistent.team != team {
                continue;
            }
            gi_cprintf(
                ctx.entity_for_client(i) as i32,
                PRINT_CHAT,
                &format!("({}): {}\n", name, text),
            );
        }
    } else if spectator && !spectator_chat {
        for i in 0..ctx.max_clients {
            if !ctx.clients[i].persistent.connected || !ctx.clients[i].persistent.spectator {
                continue;
            }
            gi_cprintf(
                ctx.entity_for_client(i) as i32,
                PRINT_CHAT,
                &format!("{}: {}\n", name, text),
            );
        }
    } else {
        gi_bprintf(PRINT_CHAT, &format!("{}: {}\n", name, text));
    }
}

// ============================================================
// Teams and spectating
// ============================================================

pub fn cmd_team(ctx: &mut GameContext, ent_idx: usize, args: &[String]) {
    if args.len() < 2 {
        gi_cprintf(ent_idx as i32, PRINT_HIGH, "Usage: team <name>\n");
        return;
    }
    if ctx.level.teams == 0 && !ctx.level.ctf {
        gi_cprintf(ent_idx as i32, PRINT_HIGH, "Teams are disabled\n");
        return;
    }

    let wanted = args[1].to_lowercase();
    let team = if wanted == ctx.team_good.name.to_lowercase() || wanted == "good" {
        Some(TeamId::Good)
    } else if wanted == ctx.team_evil.name.to_lowercase() || wanted == "evil" {
        Some(TeamId::Evil)
    } else {
        None
    };

    match team {
        Some(team) => {
            if p_client::add_client_to_team(ctx, ent_idx, team) {
                if let Some(client) = ctx.edicts[ent_idx].client {
                    let name = ctx.clients[client].persistent.net_name.clone();
                    let team_name = ctx.team(team).name.clone();
                    gi_bprintf(PRINT_HIGH, &format!("{} joined {}\n", name, team_name));
                }
            }
        }
        None => gi_cprintf(
            ent_idx as i32,
            PRINT_HIGH,
            &format!("No such team \"{}\"\n", args[1]),
        ),
    }
}

/// Resolves the caller's team, enforcing the rename throttle. Shared by
/// the team_name and team_skin commands.
fn team_for_rename(ctx: &mut GameContext, ent_idx: usize) -> Option<TeamId> {
    let client = ctx.edicts[ent_idx].client?;
    let team = match ctx.clients[client].persistent.team {
        Some(t) => t,
        None => {
            gi_cprintf(ent_idx as i32, PRINT_HIGH, "You are not on a team\n");
            return None;
        }
    };

    let name_time = ctx.team(team).name_time;
    if name_time != 0 && ctx.level.time < name_time + TEAM_CHANGE_TIME {
        gi_cprintf(ent_idx as i32, PRINT_HIGH, "You can't do that yet\n");
        return None;
    }
    Some(team)
}

pub fn cmd_team_name(ctx: &mut GameContext, ent_idx: usize, args: &[String]) {
    if args.len() < 2 {
        gi_cprintf(ent_idx as i32, PRINT_HIGH, "Usage: team_name <name>\n");
        return;
    }
    let team = match team_for_rename(ctx, ent_idx) {
        Some(t) => t,
        None => return,
    };

    let mut name = args[1].clone();
    name.truncate(MAX_NET_NAME);

    let time = ctx.level.time;
    let old = std::mem::replace(&mut ctx.team_mut(team).name, name.clone());
    ctx.team_mut(team).name_time = time;

    let cs = match team {
        TeamId::Good => CS_TEAM_GOOD,
        TeamId::Evil => CS_TEAM_EVIL,
    };
    gi_configstring(cs as i32, &name);
    gi_bprintf(PRINT_HIGH, &format!("{} is now known as {}\n", old, name));
}

pub fn cmd_team_skin(ctx: &mut GameContext, ent_idx: usize, args: &[String]) {
    if args.len() < 2 {
        gi_cprintf(ent_idx as i32, PRINT_HIGH, "Usage: team_skin <skin>\n");
        return;
    }
    let team = match team_for_rename(ctx, ent_idx) {
        Some(t) => t,
        None => return,
    };

    let skin = args[1].clone();
    let time = ctx.level.time;
    ctx.team_mut(team).skin = skin.clone();
    ctx.team_mut(team).name_time = time;

    // everyone on the team wears the new skin
    for i in 0..ctx.max_clients {
        if !ctx.clients[i].persistent.connected {
            continue;
        }
        if ctx.clients[i].persistent.team == Some(team) {
            ctx.clients[i].persistent.skin = skin.clone();
        }
    }

    let name = ctx.team(team).name.clone();
    gi_bprintf(PRINT_HIGH, &format!("{} will now be wearing {}\n", name, skin));
}

pub fn cmd_spectate(ctx: &mut GameContext, ent_idx: usize) {
    let client = match ctx.edicts[ent_idx].client {
        Some(c) => c,
        None => return,
    };

    let spectating = ctx.clients[client].persistent.spectator;
    if spectating {
        // rejoining mid-match is refused the same as a team join
        if ctx.level.match_mode && ctx.level.match_state == MatchState::Playing {
            gi_cprintf(ent_idx as i32, PRINT_HIGH, "Match has already started\n");
            return;
        }
        ctx.clients[client].persistent.spectator = false;
        if ctx.level.teams != 0 && ctx.clients[client].persistent.team.is_none() {
            let team = ctx.smallest_team();
            ctx.clients[client].persistent.team = Some(team);
            ctx.clients[client].persistent.skin = ctx.team(team).skin.clone();
        }
    } else {
        ctx.clients[client].persistent.spectator = true;
        ctx.clients[client].persistent.ready = false;
    }

    p_client::client_respawn(ctx, ent_idx);
}

// ============================================================
// Match readiness
// ============================================================

fn all_players_ready(ctx: &GameContext) -> bool {
    let mut players = 0;
    for client in &ctx.clients {
        if !client.persistent.connected || client.persistent.spectator {
            continue;
        }
        if !client.persistent.ready {
            return false;
        }
        players += 1;
    }
    players >= 2
}

pub fn cmd_ready(ctx: &mut GameContext, ent_idx: usize) {
    let client = match ctx.edicts[ent_idx].client {
        Some(c) => c,
        None => return,
    };

    if !ctx.level.match_mode {
        gi_cprintf(ent_idx as i32, PRINT_HIGH, "Match mode is disabled\n");
        return;
    }
    if ctx.level.match_state != MatchState::Warmup {
        return;
    }
    if ctx.clients[client].persistent.spectator {
        return;
    }
    if ctx.clients[client].persistent.ready {
        gi_cprintf(ent_idx as i32, PRINT_HIGH, "You are already ready\n");
        return;
    }

    ctx.clients[client].persistent.ready = true;
    let name = ctx.clients[client].persistent.net_name.clone();
    gi_bprintf(PRINT_HIGH, &format!("{} is ready\n", name));

    if all_players_ready(ctx) {
        let warmup = (gi_cvar_value(ctx.cvars.g_warmup_time) as u32).min(30);
        ctx.level.match_state = MatchState::Countdown;
        ctx.level.start_match = true;
        ctx.level.match_time = ctx.level.time + warmup * 1000;
        gi_bprintf(
            PRINT_HIGH,
            &format!("Match starting in {} seconds...\n", warmup),
        );
    }
}

pub fn cmd_unready(ctx: &mut GameContext, ent_idx: usize) {
    let client = match ctx.edicts[ent_idx].client {
        Some(c) => c,
        None => return,
    };

    if !ctx.level.match_mode || !ctx.clients[client].persistent.ready {
        return;
    }
    if ctx.level.match_state == MatchState::Playing {
        return;
    }

    ctx.clients[client].persistent.ready = false;
    let name = ctx.clients[client].persistent.net_name.clone();
    gi_bprintf(PRINT_HIGH, &format!("{} is no longer ready\n", name));

    if ctx.level.match_state == MatchState::Countdown {
        ctx.level.match_state = MatchState::Warmup;
        ctx.level.start_match = false;
        ctx.level.match_time = 0;
        gi_bprintf(PRINT_HIGH, "Countdown aborted\n");
    }
}

pub fn cmd_timein(ctx: &mut GameContext, ent_idx: usize) {
    if ctx.level.match_state != MatchState::Timeout {
        gi_cprintf(ent_idx as i32, PRINT_HIGH, "There is no timeout to end\n");
        return;
    }

    let caller = ctx.level.timeout_caller.and_then(|h| ctx.resolve(h));
    if caller != Some(ent_idx) {
        gi_cprintf(ent_idx as i32, PRINT_HIGH, "Only the caller may end the timeout\n");
        return;
    }

    // shorten the pause to the ten second resume countdown
    let resume = ctx.level.time + 10000;
    if ctx.level.timeout_time > resume {
        ctx.level.timeout_time = resume;
        gi_bprintf(PRINT_HIGH, "Play will resume in 10 seconds...\n");
    }
}

// ============================================================
// Voting
// ============================================================

fn vote_config_string(level: &GLevel) -> String {
    format!(
        "{} {}:{}",
        level.vote_cmd,
        level.votes[VOTE_IDX_YES],
        level.votes[VOTE_IDX_NO]
    )
}

pub fn cast_vote(ctx: &mut GameContext, ent_idx: usize, choice: VoteChoice) {
    let client = match ctx.edicts[ent_idx].client {
        Some(c) => c,
        None => return,
    };

    if ctx.level.vote_time == 0 {
        gi_cprintf(ent_idx as i32, PRINT_HIGH, "No vote in progress\n");
        return;
    }

    ctx.clients[client].persistent.vote = choice;

    let mut yes = 0;
    let mut no = 0;
    for c in &ctx.clients {
        if !c.persistent.connected {
            continue;
        }
        match c.persistent.vote {
            VoteChoice::Yes => yes += 1,
            VoteChoice::No => no += 1,
            VoteChoice::NoOp => {}
        }
    }
    ctx.level.votes[VOTE_IDX_YES] = yes;
    ctx.level.votes[VOTE_IDX_NO] = no;

    gi_configstring(CS_VOTE as i32, &vote_config_string(&ctx.level));
}

pub fn cmd_vote(ctx: &mut GameContext, ent_idx: usize, args: &[String]) {
    if !ctx.level.voting {
        gi_cprintf(ent_idx as i32, PRINT_HIGH, "Voting is disabled\n");
        return;
    }

    if args.len() < 2 {
        if ctx.level.vote_time != 0 {
            gi_cprintf(
                ent_idx as i32,
                PRINT_HIGH,
                &format!("Vote in progress: {}\n", vote_config_string(&ctx.level)),
            );
        } else {
            gi_cprintf(ent_idx as i32, PRINT_HIGH, "Usage: vote <command>\n");
        }
        return;
    }

    let verb = args[1].to_lowercase();
    match verb.as_str() {
        "yes" => return cast_vote(ctx, ent_idx, VoteChoice::Yes),
        "no" => return cast_vote(ctx, ent_idx, VoteChoice::No),
        _ => {}
    }

    if ctx.level.vote_time != 0 {
        gi_cprintf(ent_idx as i32, PRINT_HIGH, "A vote is already in progress\n");
        return;
    }

    let valid = match verb.as_str() {
        "map" => {
            if args.len() != 3 {
                false
            } else if ctx.map_list.find(&args[2]).is_none() {
                gi_cprintf(
                    ent_idx as i32,
                    PRINT_HIGH,
                    &format!("Map \"{}\" is not in the rotation\n", args[2]),
                );
                return;
            } else {
                true
            }
        }
        "next_map" | "restart" => args.len() == 2,
        "mute" | "unmute" => {
            if args.len() != 3 {
                false
            } else if ctx.client_by_name(&args[2]).is_none() {
                gi_cprintf(
                    ent_idx as i32,
                    PRINT_HIGH,
                    &format!("No player named \"{}\"\n", args[2]),
                );
                return;
            } else {
                true
            }
        }
        _ => false,
    };

    if !valid {
        gi_cprintf(
            ent_idx as i32,
            PRINT_HIGH,
            &format!("\"{}\" is not a valid vote\n", args[1..].join(" ")),
        );
        return;
    }

    ctx.level.vote_cmd = args[1..].join(" ");
    ctx.level.vote_time = ctx.level.time;
    ctx.level.votes = [0; 3];
    for c in &mut ctx.clients {
        c.persistent.vote = VoteChoice::NoOp;
    }

    let client = ctx.edicts[ent_idx].client;
    if let Some(client) = client {
        let name = ctx.clients[client].persistent.net_name.clone();
        gi_bprintf(
            PRINT_HIGH,
            &format!("{} has called a vote: {}\n", name, ctx.level.vote_cmd),
        );
    }
    cast_vote(ctx, ent_idx, VoteChoice::Yes);
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::g_local::test::make_ctx;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_vote_lifecycle() {
        let mut ctx = make_ctx(3);
        ctx.level.time = 1000;
        ctx.map_list = crate::g_maplist::MapList::parse("edge frag3");

        cmd_vote(&mut ctx, 1, &args(&["vote", "map", "frag3"]));
        assert_eq!(ctx.level.vote_cmd, "map frag3");
        assert_eq!(ctx.level.vote_time, 1000);
        // caller votes yes automatically
        assert_eq!(ctx.level.votes[VOTE_IDX_YES], 1);

        // second vote attempt is refused
        cmd_vote(&mut ctx, 2, &args(&["vote", "restart"]));
        assert_eq!(ctx.level.vote_cmd, "map frag3");

        cast_vote(&mut ctx, 2, VoteChoice::No);
        assert_eq!(ctx.level.votes[VOTE_IDX_NO], 1);

        // changing a cast vote recounts rather than stacking
        cast_vote(&mut ctx, 2, VoteChoice::Yes);
        assert_eq!(ctx.level.votes[VOTE_IDX_YES], 2);
        assert_eq!(ctx.level.votes[VOTE_IDX_NO], 0);
    }

    #[test]
    fn test_vote_rejects_unknown_map_and_verb() {
        let mut ctx = make_ctx(1);
        ctx.level.time = 1000;
        ctx.map_list = crate::g_maplist::MapList::parse("edge");

        cmd_vote(&mut ctx, 1, &args(&["vote", "map", "nosuchmap"]));
        assert_eq!(ctx.level.vote_time, 0);

        cmd_vote(&mut ctx, 1, &args(&["vote", "format_drive"]));
        assert_eq!(ctx.level.vote_time, 0);
    }

    #[test]
    fn test_ready_schedules_countdown_when_all_ready() {
        let mut ctx = make_ctx(2);
        ctx.level.match_mode = true;
        ctx.level.time = 2000;

        cmd_ready(&mut ctx, 1);
        assert!(ctx.clients[0].persistent.ready);
        assert_eq!(ctx.level.match_state, MatchState::Warmup);

        cmd_ready(&mut ctx, 2);
        assert_eq!(ctx.level.match_state, MatchState::Countdown);
        assert!(ctx.level.start_match);
        assert!(ctx.level.match_time > 2000);
        assert!(ctx.level.match_time <= 2000 + 30000); // warmup is capped
    }

    #[test]
    fn test_single_player_ready_does_not_start() {
        let mut ctx = make_ctx(2);
        ctx.level.match_mode = true;
        ctx.clients[1].persistent.spectator = true;

        cmd_ready(&mut ctx, 1);
        assert!(!ctx.level.start_match);
    }

    #[test]
    fn test_unready_aborts_countdown() {
        let mut ctx = make_ctx(2);
        ctx.level.match_mode = true;

        cmd_ready(&mut ctx, 1);
        cmd_ready(&mut ctx, 2);
        assert_eq!(ctx.level.match_state, MatchState::Countdown);

        cmd_unready(&mut ctx, 1);
        assert_eq!(ctx.level.match_state, MatchState::Warmup);
        assert!(!ctx.level.start_match);
        assert!(ctx.clients[1].persistent.ready); // only the caller unreadied
    }

    #[test]
    fn test_ready_requires_match_mode() {
        let mut ctx = make_ctx(2);
        cmd_ready(&mut ctx, 1);
        assert!(!ctx.clients[0].persistent.ready);
    }

    #[test]
    fn test_team_command_joins_by_name() {
        let mut ctx = make_ctx(1);
        ctx.level.teams = 1;

        cmd_team(&mut ctx, 1, &args(&["team", "EVIL"]));
        assert_eq!(ctx.clients[0].persistent.team, Some(TeamId::Evil));

        cmd_team(&mut ctx, 1, &args(&["team", "nonsense"]));
        assert_eq!(ctx.clients[0].persistent.team, Some(TeamId::Evil));
    }

    #[test]
    fn test_team_command_refused_without_teams() {
        let mut ctx = make_ctx(1);
        cmd_team(&mut ctx, 1, &args(&["team", "good"]));
        assert_eq!(ctx.clients[0].persistent.team, None);
    }

    #[test]
    fn test_team_rename_throttled() {
        let mut ctx = make_ctx(2);
        ctx.level.teams = 1;
        ctx.level.time = 1000;
        ctx.clients[0].persistent.team = Some(TeamId::Good);
        ctx.clients[1].persistent.team = Some(TeamId::Good);

        cmd_team_name(&mut ctx, 1, &args(&["team_name", "Stompers"]));
        assert_eq!(ctx.team_good.name, "Stompers");
        assert_eq!(ctx.team_good.name_time, 1000);

        // too soon, even from a teammate
        ctx.level.time = 1000 + TEAM_CHANGE_TIME - 1;
        cmd_team_name(&mut ctx, 2, &args(&["team_name", "Chumps"]));
        assert_eq!(ctx.team_good.name, "Stompers");

        ctx.level.time = 1000 + TEAM_CHANGE_TIME;
        cmd_team_name(&mut ctx, 2, &args(&["team_name", "Chumps"]));
        assert_eq!(ctx.team_good.name, "Chumps");
    }

    #[test]
    fn test_team_skin_applies_to_members() {
        let mut ctx = make_ctx(2);
        ctx.level.teams = 1;
        ctx.level.time = 1000;
        ctx.clients[0].persistent.team = Some(TeamId::Evil);
        ctx.clients[1].persistent.team = Some(TeamId::Evil);

        cmd_team_skin(&mut ctx, 1, &args(&["team_skin", "qforcer/enforcer"]));
        assert_eq!(ctx.team_evil.skin, "qforcer/enforcer");
        assert_eq!(ctx.clients[0].persistent.skin, "qforcer/enforcer");
        assert_eq!(ctx.clients[1].persistent.skin, "qforcer/enforcer");
    }

    #[test]
    fn test_team_rename_requires_team() {
        let mut ctx = make_ctx(1);
        let before = ctx.team_good.name.clone();
        cmd_team_name(&mut ctx, 1, &args(&["team_name", "Loners"]));
        assert_eq!(ctx.team_good.name, before);
    }

    #[test]
    fn test_spectate_toggle_assigns_smallest_team() {
        let mut ctx = make_ctx(2);
        ctx.level.teams = 1;
        ctx.clients[0].persistent.team = Some(TeamId::Good);

        cmd_spectate(&mut ctx, 2);
        assert!(ctx.clients[1].persistent.spectator);

        cmd_spectate(&mut ctx, 2);
        assert!(!ctx.clients[1].persistent.spectator);
        assert_eq!(ctx.clients[1].persistent.team, Some(TeamId::Evil));
    }

    #[test]
    fn test_muted_client_chat_suppressed() {
        let mut ctx = make_ctx(1);
        ctx.clients[0].locals.muted = true;
        ctx.clients[0].locals.chat_time = 0;

        cmd_say(&mut ctx, 1, false, "hello");
        // flood timer untouched proves the message never went out
        assert_eq!(ctx.clients[0].locals.chat_time, 0);
    }

    #[test]
    fn test_chat_flood_control() {
        let mut ctx = make_ctx(1);
        ctx.level.time = 5000;

        cmd_say(&mut ctx, 1, false, "one");
        assert_eq!(ctx.clients[0].locals.chat_time, 6000);

        cmd_say(&mut ctx, 1, false, "two");
        assert_eq!(ctx.clients[0].locals.chat_time, 6000); // dropped

        ctx.level.time = 6000;
        cmd_say(&mut ctx, 1, false, "three");
        assert_eq!(ctx.clients[0].locals.chat_time, 7000);
    }

    #[test]
    fn test_timein_only_for_caller() {
        let mut ctx = make_ctx(2);
        ctx.level.match_state = MatchState::Playing;
        ctx.level.timeout_seconds = 120;
        assert!(g_main::call_timeout(&mut ctx, 1));
        let full = ctx.level.timeout_time;

        cmd_timein(&mut ctx, 2);
        assert_eq!(ctx.level.timeout_time, full);

        cmd_timein(&mut ctx, 1);
        assert_eq!(ctx.level.timeout_time, ctx.level.time + 10000);
    }
}
