// g_main.rs — init, frame scheduler, match and round rules

use crate::g_local::*;
use crate::game_import::*;
use crate::p_client;
use skirmish_common::cmd::CMD_GAME;

/// Millis spent on the scoreboard before the next level loads.
pub const INTERMISSION_TIME: u32 = 10000;

// ============================================================
// Init and shutdown
// ============================================================

pub fn game_name() -> &'static str {
    "skirmish"
}

/// Registers cvars and server commands, allocates the entity and client
/// arrays, and primes level state from the current cvar values.
pub fn g_init(ctx: &mut GameContext, max_clients: usize) {
    gi_print(&format!("  {} initialization...\n", game_name()));

    let cv = &mut ctx.cvars;
    cv.g_auto_join = gi_cvar("g_auto_join", "1", 0, Some("assign players to teams automatically"));
    cv.g_capture_limit = gi_cvar("g_capture_limit", "8", CVAR_SERVERINFO, Some("captures to win a CTF game"));
    cv.g_cheats = gi_cvar("g_cheats", "0", CVAR_SERVERINFO, Some("enable cheat commands"));
    cv.g_ctf = gi_cvar("g_ctf", "0", CVAR_SERVERINFO, Some("enable capture the flag"));
    cv.g_frag_limit = gi_cvar("g_frag_limit", "30", CVAR_SERVERINFO, Some("frags to win the game"));
    cv.g_friendly_fire = gi_cvar("g_friendly_fire", "0", 0, Some("enable team damage"));
    cv.g_gameplay = gi_cvar("g_gameplay", "0", CVAR_SERVERINFO, Some("DEATHMATCH, INSTAGIB, ARENA or DUEL"));
    cv.g_gravity = gi_cvar("g_gravity", "800", 0, Some("world gravity"));
    cv.g_handicap = gi_cvar("g_handicap", "1", 0, Some("allow client damage handicaps"));
    cv.g_map_list = gi_cvar("g_map_list", "", 0, Some("map rotation"));
    cv.g_match = gi_cvar("g_match", "0", CVAR_SERVERINFO, Some("enable match mode with warmup and readiness"));
    cv.g_max_entities = gi_cvar("g_max_entities", "1024", CVAR_LATCH, Some("entity pool size"));
    cv.g_random_map = gi_cvar("g_random_map", "0", 0, Some("draw the next map from the rotation at random"));
    cv.g_respawn_protection = gi_cvar("g_respawn_protection", "0", 0, Some("seconds of post-respawn invulnerability"));
    cv.g_round_limit = gi_cvar("g_round_limit", "20", CVAR_SERVERINFO, Some("rounds to win a rounds game"));
    cv.g_rounds = gi_cvar("g_rounds", "0", CVAR_SERVERINFO, Some("enable round play"));
    cv.g_spectator_chat = gi_cvar("g_spectator_chat", "1", 0, Some("spectator chat visible to players"));
    cv.g_teams = gi_cvar("g_teams", "0", CVAR_SERVERINFO, Some("enable teams; 2 requires balanced teams"));
    cv.g_time_limit = gi_cvar("g_time_limit", "0", CVAR_SERVERINFO, Some("minutes before the next map loads"));
    cv.g_timeout_time = gi_cvar("g_timeout_time", "120", 0, Some("seconds a timeout lasts, 0 disables"));
    cv.g_voting = gi_cvar("g_voting", "1", 0, Some("enable voting"));
    cv.g_warmup_time = gi_cvar("g_warmup_time", "15", 0, Some("seconds of match countdown, up to 30"));
    cv.sv_max_clients = gi_cvar("sv_max_clients", "8", CVAR_SERVERINFO | CVAR_LATCH, None);

    ctx.max_clients = max_clients;
    ctx.edicts = vec![GEntity::default(); max_clients + 1];
    ctx.clients = vec![GClient::default(); max_clients];
    ctx.num_entities = max_clients + 1;

    ctx.edicts[0].inuse = true;
    ctx.edicts[0].class_name = "worldspawn".to_string();
    ctx.edicts[0].solid = Solid::Bsp;

    ctx.level = GLevel::default();
    refresh_level_from_cvars(ctx);
    ctx.level.warmup = ctx.level.match_mode;
    ctx.map_list = crate::g_maplist::MapList::parse(&gi_cvar_string(ctx.cvars.g_map_list));

    ctx.media.items.jacket_armor =
        crate::g_items::find_item_by_class_name("item_armor_jacket").unwrap_or(0);
    ctx.media.items.combat_armor =
        crate::g_items::find_item_by_class_name("item_armor_combat").unwrap_or(0);
    ctx.media.items.body_armor =
        crate::g_items::find_item_by_class_name("item_armor_body").unwrap_or(0);
    ctx.media.items.quad_damage =
        crate::g_items::find_item_by_class_name("item_quad").unwrap_or(0);

    ctx.media.sounds.teleport = gi_soundindex("world/teleport.wav");
    ctx.media.sounds.roar = gi_soundindex("world/roar.wav");
    for i in 0..=10 {
        ctx.media.sounds.countdown[i] = gi_soundindex(&format!("world/countdown_{}.wav", i));
    }

    reset_teams(ctx);
    reset_vote(ctx);

    gi_cmd("mute", CMD_GAME, Some("silence a player"));
    gi_cmd("unmute", CMD_GAME, Some("restore a muted player"));
    gi_cmd("stuff", CMD_GAME, Some("force a command on a client"));
    gi_cmd("stuffall", CMD_GAME, Some("force a command on all clients"));

    // consume the registration-time modified flags
    clear_cvar_modified(ctx);

    gi_print(&format!("  {} initialized\n", game_name()));
}

pub fn g_shutdown(ctx: &mut GameContext) {
    gi_print(&format!("  {} shutdown...\n", game_name()));
    ctx.edicts.clear();
    ctx.clients.clear();
    ctx.num_entities = 0;
}

fn refresh_level_from_cvars(ctx: &mut GameContext) {
    let cv = &ctx.cvars;
    ctx.level.gameplay = Gameplay::by_name(&gi_cvar_string(cv.g_gameplay));
    ctx.level.gravity = gi_cvar_value(cv.g_gravity) as i32;
    ctx.level.teams = gi_cvar_value(cv.g_teams) as i32;
    ctx.level.ctf = gi_cvar_value(cv.g_ctf) != 0.0;
    ctx.level.match_mode = gi_cvar_value(cv.g_match) != 0.0;
    ctx.level.rounds = gi_cvar_value(cv.g_rounds) != 0.0;
    ctx.level.frag_limit = gi_cvar_value(cv.g_frag_limit) as i32;
    ctx.level.round_limit = gi_cvar_value(cv.g_round_limit) as i32;
    ctx.level.capture_limit = gi_cvar_value(cv.g_capture_limit) as i32;
    ctx.level.friendly_fire = gi_cvar_value(cv.g_friendly_fire) != 0.0;
    ctx.level.respawn_protection = (gi_cvar_value(cv.g_respawn_protection) * 1000.0) as u32;
    ctx.level.timeout_seconds = gi_cvar_value(cv.g_timeout_time) as u32;
    ctx.level.time_limit = (gi_cvar_value(cv.g_time_limit) * 60.0 * 1000.0) as u32;
    ctx.level.voting = gi_cvar_value(cv.g_voting) != 0.0;
}

fn clear_cvar_modified(ctx: &GameContext) {
    let cv = &ctx.cvars;
    for handle in [
        cv.g_auto_join, cv.g_capture_limit, cv.g_cheats, cv.g_ctf, cv.g_frag_limit,
        cv.g_friendly_fire, cv.g_gameplay, cv.g_gravity, cv.g_handicap, cv.g_map_list,
        cv.g_match, cv.g_max_entities, cv.g_random_map, cv.g_respawn_protection,
        cv.g_round_limit, cv.g_rounds, cv.g_spectator_chat, cv.g_teams, cv.g_time_limit,
        cv.g_timeout_time, cv.g_voting, cv.g_warmup_time, cv.sv_max_clients,
    ] {
        gi_cvar_clear_modified(handle);
    }
}

// ============================================================
// Frame scheduler
// ============================================================

/// Advances the simulation one server frame.
pub fn g_frame(ctx: &mut GameContext) {
    ctx.level.frame_num += 1;
    ctx.level.time = ctx.level.frame_num * gi_frame_millis();

    // leave the scoreboard for the next level
    if ctx.level.intermission_time != 0 {
        if ctx.level.time > ctx.level.intermission_time + INTERMISSION_TIME {
            exit_level(ctx);
        }
        return;
    }

    // the world stands still during a timeout
    if ctx.level.match_state != MatchState::Timeout {
        for i in 0..ctx.num_entities {
            if !ctx.edicts[i].inuse {
                continue;
            }
            ctx.level.current_entity = Some(i);

            if ctx.edicts[i].client.is_some() {
                p_client::client_begin_frame(ctx, i);
            } else {
                crate::g_phys::run_entity(ctx, i);
            }
        }
        ctx.level.current_entity = None;
    }

    check_vote(ctx);
    check_rules(ctx);
    check_match_end(ctx);
    check_round_start(ctx);
    check_round_end(ctx);

    p_client::end_client_frames(ctx);
}

// ============================================================
// Clock and countdowns
// ============================================================

/// Renders a clock value as `MM:SS`, blinking green on odd seconds once a
/// countdown dips under thirty seconds.
fn format_time(level: &mut GLevel, millis: u32) -> String {
    let secs = millis / 1000;
    let color = if millis < 30000 && millis < level.last_displayed_time && secs & 1 != 0 {
        "^2"
    } else {
        "^7"
    };
    level.last_displayed_time = millis;
    format!("{}{:2}:{:02}", color, secs / 60, secs % 60)
}

fn update_clock(ctx: &mut GameContext, millis: u32) {
    let s = format_time(&mut ctx.level, millis);
    gi_configstring(CS_TIME as i32, &s);
}

/// Whole seconds remaining until `target`, rounded up.
fn seconds_until(level: &GLevel, target: u32) -> u32 {
    (target.saturating_sub(level.time) + 999) / 1000
}

fn once_per_second(level: &GLevel) -> bool {
    level.frame_num % gi_frame_rate() == 0
}

fn countdown_tick(ctx: &mut GameContext, target: u32) {
    if !once_per_second(&ctx.level) {
        return;
    }
    let j = seconds_until(&ctx.level, target);
    if j <= 5 {
        gi_sound(0, ctx.media.sounds.countdown[j as usize], ATTEN_NONE);
    }
    if j > 0 {
        for i in 0..ctx.max_clients {
            let ent = ctx.entity_for_client(i);
            if ctx.edicts[ent].inuse {
                gi_centerprintf(ent as i32, &format!("{}", j));
            }
        }
    }
}

/// Drives the clock, the match and round countdowns, the time limit, and
/// timeout expiry.
pub fn run_timers(ctx: &mut GameContext) {
    if ctx.level.match_state == MatchState::Timeout {
        let remaining = ctx.level.timeout_time.saturating_sub(ctx.level.time);
        update_clock(ctx, remaining);

        if once_per_second(&ctx.level) {
            let j = seconds_until(&ctx.level, ctx.level.timeout_time);
            if j <= 10 {
                gi_sound(0, ctx.media.sounds.countdown[j as usize], ATTEN_NONE);
            }
            if j == 0 {
                call_timein(ctx);
            }
        }
        return;
    }

    if ctx.level.start_match && ctx.level.match_time > ctx.level.time {
        countdown_tick(ctx, ctx.level.match_time);
    } else if ctx.level.start_round && ctx.level.round_time > ctx.level.time {
        countdown_tick(ctx, ctx.level.round_time);
    }

    if ctx.level.time_limit != 0 {
        if ctx.level.time >= ctx.level.time_limit {
            gi_bprintf(PRINT_HIGH, "Timelimit hit\n");
            end_level(ctx);
            return;
        }
        update_clock(ctx, ctx.level.time_limit - ctx.level.time);
    } else {
        update_clock(ctx, ctx.level.time);
    }
}

// ============================================================
// Votes
// ============================================================

fn execute_vote(ctx: &mut GameContext) {
    let cmd = ctx.level.vote_cmd.clone();

    if let Some(name) = cmd.strip_prefix("map ") {
        begin_intermission(ctx, name);
    } else if cmd == "next_map" {
        end_level(ctx);
    } else if cmd == "restart" {
        restart_game(ctx);
    } else if let Some(name) = cmd.strip_prefix("mute ") {
        crate::g_svcmds::mute_client(ctx, name, true);
    } else if let Some(name) = cmd.strip_prefix("unmute ") {
        crate::g_svcmds::mute_client(ctx, name, false);
    } else {
        gi_add_command_string(&format!("{}\n", cmd));
    }
}

/// Expires or resolves the active vote. Majority is 51% of connected
/// clients, yes or no.
pub fn check_vote(ctx: &mut GameContext) {
    if !ctx.level.voting {
        return;
    }
    if ctx.level.vote_time == 0 {
        return;
    }

    // the clock runs backwards across a time-in
    if ctx.level.time.saturating_sub(ctx.level.vote_time) > MAX_VOTE_TIME {
        gi_bprintf(
            PRINT_HIGH,
            &format!("Vote \"{}\" expired\n", ctx.level.vote_cmd),
        );
        reset_vote(ctx);
        return;
    }

    let count = ctx.clients.iter().filter(|c| c.persistent.connected).count();
    let majority = count as f32 * VOTE_MAJORITY;

    if ctx.level.votes[VOTE_IDX_YES] as f32 >= majority {
        gi_bprintf(
            PRINT_HIGH,
            &format!("Vote \"{}\" passed\n", ctx.level.vote_cmd),
        );
        execute_vote(ctx);
        reset_vote(ctx);
    } else if ctx.level.votes[VOTE_IDX_NO] as f32 >= majority {
        gi_bprintf(
            PRINT_HIGH,
            &format!("Vote \"{}\" failed\n", ctx.level.vote_cmd),
        );
        reset_vote(ctx);
    }
}

pub fn reset_vote(ctx: &mut GameContext) {
    ctx.level.vote_cmd.clear();
    ctx.level.votes = [0; 3];
    ctx.level.vote_time = 0;
    for client in &mut ctx.clients {
        client.persistent.vote = VoteChoice::NoOp;
    }
    gi_configstring(CS_VOTE as i32, "");
}

// ============================================================
// Rules
// ============================================================

fn count_players(ctx: &GameContext) -> (usize, usize, usize) {
    let mut good = 0;
    let mut evil = 0;
    let mut total = 0;
    for client in &ctx.clients {
        if !client.persistent.connected || client.persistent.spectator {
            continue;
        }
        total += 1;
        match client.persistent.team {
            Some(TeamId::Good) => good += 1,
            Some(TeamId::Evil) => evil += 1,
            None => {}
        }
    }
    (good, evil, total)
}

fn start_match(ctx: &mut GameContext) {
    ctx.level.start_match = false;
    ctx.level.match_state = MatchState::Playing;
    ctx.level.match_num += 1;
    ctx.level.warmup = false;

    let minutes = gi_cvar_value(ctx.cvars.g_time_limit);
    if minutes > 0.0 {
        ctx.level.time_limit = (minutes * 60.0 * 1000.0) as u32 + ctx.level.time;
    }

    for i in 0..ctx.max_clients {
        let ent = ctx.entity_for_client(i);
        if !ctx.clients[i].persistent.connected || ctx.clients[i].persistent.spectator {
            continue;
        }
        ctx.clients[i].persistent.score = 0;
        ctx.clients[i].persistent.captures = 0;
        ctx.clients[i].persistent.match_num = ctx.level.match_num;
        p_client::client_respawn(ctx, ent);
    }
    ctx.team_good.score = 0;
    ctx.team_evil.score = 0;

    gi_sound(0, ctx.media.sounds.teleport, ATTEN_NONE);
    gi_bprintf(PRINT_HIGH, "Match has started\n");
}

/// Applies gameplay cvar changes made at the console while the level runs.
/// Structural toggles restart the game.
fn reconcile_cvars(ctx: &mut GameContext) {
    let mut restart = false;

    if gi_cvar_modified(ctx.cvars.g_gameplay) {
        gi_cvar_clear_modified(ctx.cvars.g_gameplay);
        ctx.level.gameplay = Gameplay::by_name(&gi_cvar_string(ctx.cvars.g_gameplay));
        gi_configstring(CS_GAMEPLAY as i32, ctx.level.gameplay.name());
        gi_bprintf(
            PRINT_HIGH,
            &format!("Gameplay has changed to {}\n", ctx.level.gameplay.name()),
        );

        if ctx.level.gameplay == Gameplay::Duel {
            // duel implies two teams of one in match mode
            if gi_cvar_value(ctx.cvars.g_teams) == 0.0 {
                gi_cvar_set("g_teams", "1");
            }
            if gi_cvar_value(ctx.cvars.g_match) == 0.0 {
                gi_cvar_set("g_match", "1");
            }
        }
        restart = true;
    }

    if gi_cvar_modified(ctx.cvars.g_teams) {
        gi_cvar_clear_modified(ctx.cvars.g_teams);
        let value = gi_cvar_value(ctx.cvars.g_teams) as i32;
        if ctx.level.gameplay == Gameplay::Duel && value == 0 {
            gi_bprintf(PRINT_HIGH, "Teams can't be disabled in DUEL mode, enabling...\n");
            gi_add_command_string("set g_teams 1\n");
        } else {
            ctx.level.teams = value;
            gi_configstring(CS_TEAMS as i32, &value.to_string());
            restart = true;
        }
    }

    if gi_cvar_modified(ctx.cvars.g_match) {
        gi_cvar_clear_modified(ctx.cvars.g_match);
        let on = gi_cvar_value(ctx.cvars.g_match) != 0.0;
        if ctx.level.gameplay == Gameplay::Duel && !on {
            gi_bprintf(PRINT_HIGH, "Match can't be disabled in DUEL mode, enabling...\n");
            gi_add_command_string("set g_match 1\n");
        } else {
            ctx.level.match_mode = on;
            gi_configstring(CS_MATCH as i32, if on { "1" } else { "0" });
            restart = true;
        }
    }

    if gi_cvar_modified(ctx.cvars.g_ctf) {
        gi_cvar_clear_modified(ctx.cvars.g_ctf);
        ctx.level.ctf = gi_cvar_value(ctx.cvars.g_ctf) != 0.0;
        gi_configstring(CS_CTF as i32, if ctx.level.ctf { "1" } else { "0" });
        restart = true;
    }

    if gi_cvar_modified(ctx.cvars.g_rounds) {
        gi_cvar_clear_modified(ctx.cvars.g_rounds);
        ctx.level.rounds = gi_cvar_value(ctx.cvars.g_rounds) != 0.0;
        gi_configstring(CS_ROUNDS as i32, if ctx.level.rounds { "1" } else { "0" });
        restart = true;
    }

    if gi_cvar_modified(ctx.cvars.g_frag_limit) {
        gi_cvar_clear_modified(ctx.cvars.g_frag_limit);
        ctx.level.frag_limit = gi_cvar_value(ctx.cvars.g_frag_limit) as i32;
    }
    if gi_cvar_modified(ctx.cvars.g_round_limit) {
        gi_cvar_clear_modified(ctx.cvars.g_round_limit);
        ctx.level.round_limit = gi_cvar_value(ctx.cvars.g_round_limit) as i32;
    }
    if gi_cvar_modified(ctx.cvars.g_capture_limit) {
        gi_cvar_clear_modified(ctx.cvars.g_capture_limit);
        ctx.level.capture_limit = gi_cvar_value(ctx.cvars.g_capture_limit) as i32;
    }
    if gi_cvar_modified(ctx.cvars.g_friendly_fire) {
        gi_cvar_clear_modified(ctx.cvars.g_friendly_fire);
        ctx.level.friendly_fire = gi_cvar_value(ctx.cvars.g_friendly_fire) != 0.0;
    }
    if gi_cvar_modified(ctx.cvars.g_respawn_protection) {
        gi_cvar_clear_modified(ctx.cvars.g_respawn_protection);
        ctx.level.respawn_protection =
            (gi_cvar_value(ctx.cvars.g_respawn_protection) * 1000.0) as u32;
    }
    if gi_cvar_modified(ctx.cvars.g_gravity) {
        gi_cvar_clear_modified(ctx.cvars.g_gravity);
        ctx.level.gravity = gi_cvar_value(ctx.cvars.g_gravity) as i32;
    }
    if gi_cvar_modified(ctx.cvars.g_timeout_time) {
        gi_cvar_clear_modified(ctx.cvars.g_timeout_time);
        ctx.level.timeout_seconds = gi_cvar_value(ctx.cvars.g_timeout_time) as u32;
    }
    if gi_cvar_modified(ctx.cvars.g_time_limit) {
        gi_cvar_clear_modified(ctx.cvars.g_time_limit);
        ctx.level.time_limit = (gi_cvar_value(ctx.cvars.g_time_limit) * 60.0 * 1000.0) as u32;
    }
    if gi_cvar_modified(ctx.cvars.g_voting) {
        gi_cvar_clear_modified(ctx.cvars.g_voting);
        ctx.level.voting = gi_cvar_value(ctx.cvars.g_voting) != 0.0;
    }

    if restart {
        restart_game(ctx);
    }
}

/// Frame-rate rule checks: timers, pending match start, score limits, and
/// console reconfiguration.
pub fn check_rules(ctx: &mut GameContext) {
    run_timers(ctx);

    if ctx.level.intermission_time != 0 {
        return;
    }

    // warmup play: the match or round has not started counting yet
    ctx.level.warmup = ctx.level.match_mode
        && (ctx.level.match_time == 0 || ctx.level.match_time > ctx.level.time);
    ctx.level.warmup |= ctx.level.rounds
        && (ctx.level.round_time == 0 || ctx.level.round_time > ctx.level.time);

    if ctx.level.start_match && ctx.level.time >= ctx.level.match_time {
        start_match(ctx);
    }

    if !ctx.level.ctf && ctx.level.frag_limit > 0 {
        let hit = if ctx.level.teams != 0 {
            ctx.team_good.score >= ctx.level.frag_limit
                || ctx.team_evil.score >= ctx.level.frag_limit
        } else {
            ctx.clients.iter().any(|c| {
                c.persistent.connected && c.persistent.score >= ctx.level.frag_limit
            })
        };
        if hit {
            gi_bprintf(PRINT_HIGH, "Fraglimit hit\n");
            end_level(ctx);
            return;
        }
    }

    if ctx.level.ctf && ctx.level.capture_limit > 0 {
        if ctx.team_good.captures >= ctx.level.capture_limit
            || ctx.team_evil.captures >= ctx.level.capture_limit
        {
            gi_bprintf(PRINT_HIGH, "Capturelimit hit\n");
            end_level(ctx);
            return;
        }
    }

    reconcile_cvars(ctx);
}

// ============================================================
// Match end
// ============================================================

/// Aborts a running match when too few players remain.
pub fn check_match_end(ctx: &mut GameContext) {
    if !ctx.level.match_mode || ctx.level.match_state != MatchState::Playing {
        return;
    }

    let (good, evil, total) = count_players(ctx);

    if total == 0 {
        gi_bprintf(PRINT_HIGH, "No players left\n");
        restart_game(ctx);
        return;
    }

    if ctx.level.teams != 0 && (good == 0 || evil == 0) {
        gi_bprintf(PRINT_HIGH, "Not enough players left\n");
        restart_game(ctx);
    }
}

// ============================================================
// Rounds
// ============================================================

fn begin_round(ctx: &mut GameContext) {
    ctx.level.start_round = false;
    ctx.level.round_active = true;
    ctx.level.round_num += 1;
    gi_configstring(CS_ROUND as i32, &ctx.level.round_num.to_string());

    crate::g_items::reset_items(ctx);

    for i in 0..ctx.max_clients {
        let ent = ctx.entity_for_client(i);
        if !ctx.clients[i].persistent.connected || ctx.clients[i].persistent.spectator {
            continue;
        }
        ctx.clients[i].persistent.round_num = ctx.level.round_num;
        p_client::client_respawn(ctx, ent);
    }

    for i in 0..ctx.max_clients {
        let ent = ctx.entity_for_client(i);
        if ctx.edicts[ent].inuse {
            gi_centerprintf(ent as i32, "Fight!");
        }
    }
}

/// Schedules and begins rounds once enough players are present.
pub fn check_round_start(ctx: &mut GameContext) {
    if !ctx.level.rounds || ctx.level.round_active || ctx.level.intermission_time != 0 {
        return;
    }
    if ctx.level.match_mode && ctx.level.match_state != MatchState::Playing {
        return;
    }

    if ctx.level.start_round {
        if ctx.level.time >= ctx.level.round_time {
            begin_round(ctx);
        }
        return;
    }

    let (good, evil, total) = count_players(ctx);
    if total < 2 {
        return;
    }

    if ctx.level.teams != 0 {
        if good == 0 || evil == 0 {
            return;
        }
        // teams 2 means the round can not start unbalanced
        if ctx.level.teams == 2 && good != evil {
            if ctx.level.frame_num % 100 == 0 {
                gi_bprintf(PRINT_HIGH, "Teams are unbalanced\n");
            }
            return;
        }
    }

    gi_bprintf(PRINT_HIGH, "Round starting in 10 seconds...\n");
    ctx.level.start_round = true;
    ctx.level.round_time = ctx.level.time + 10000;
}

/// True when a live enemy projectile still owes the survivors a hit.
fn enemy_projectiles_in_flight(ctx: &GameContext, survivor_team: Option<TeamId>) -> bool {
    for i in (ctx.max_clients + 1)..ctx.num_entities {
        if !ctx.edicts[i].inuse {
            continue;
        }
        let owner = match ctx.edicts[i].owner.and_then(|h| ctx.resolve(h)) {
            Some(o) => o,
            None => continue,
        };
        let client = match ctx.edicts[owner].client {
            Some(c) => c,
            None => continue,
        };
        if ctx.clients[client].persistent.team != survivor_team {
            return true;
        }
    }
    false
}

fn end_round(ctx: &mut GameContext) {
    ctx.level.round_active = false;
    ctx.level.round_time = 0;
    check_round_limit(ctx);
}

/// Ends the round when at most one side has survivors. A winner is not
/// declared while enemy projectiles are still in flight.
pub fn check_round_end(ctx: &mut GameContext) {
    if !ctx.level.rounds || !ctx.level.round_active {
        return;
    }

    let mut alive: Vec<usize> = Vec::new();
    for i in 0..ctx.max_clients {
        let ent = ctx.entity_for_client(i);
        if !ctx.clients[i].persistent.connected || ctx.clients[i].persistent.spectator {
            continue;
        }
        if ctx.edicts[ent].inuse && !ctx.edicts[ent].dead {
            alive.push(i);
        }
    }

    if alive.is_empty() {
        gi_bprintf(PRINT_HIGH, "Tie!\n");
        end_round(ctx);
        return;
    }

    if ctx.level.teams != 0 {
        let good_alive = alive
            .iter()
            .any(|&c| ctx.clients[c].persistent.team == Some(TeamId::Good));
        let evil_alive = alive
            .iter()
            .any(|&c| ctx.clients[c].persistent.team == Some(TeamId::Evil));

        if good_alive && evil_alive {
            return;
        }

        let winner = if good_alive { TeamId::Good } else { TeamId::Evil };
        if enemy_projectiles_in_flight(ctx, Some(winner)) {
            return;
        }

        let name = ctx.team(winner).name.clone();
        gi_bprintf(PRINT_HIGH, &format!("{} wins!\n", name));
        ctx.team_mut(winner).score += 1;
        end_round(ctx);
    } else {
        if alive.len() > 1 {
            return;
        }

        let winner = alive[0];
        let team = ctx.clients[winner].persistent.team;
        if enemy_projectiles_in_flight(ctx, team) {
            return;
        }

        let name = ctx.clients[winner].persistent.net_name.clone();
        gi_bprintf(PRINT_HIGH, &format!("{} wins!\n", name));
        ctx.clients[winner].persistent.score += 1;
        end_round(ctx);
    }
}

/// Ends the level at the round limit; otherwise rejoins everyone who took
/// part in the round that just finished.
pub fn check_round_limit(ctx: &mut GameContext) {
    if ctx.level.round_limit > 0 && ctx.level.round_num >= ctx.level.round_limit as u32 {
        gi_bprintf(PRINT_HIGH, "Roundlimit hit\n");
        end_level(ctx);
        return;
    }

    for i in 0..ctx.max_clients {
        if !ctx.clients[i].persistent.connected {
            continue;
        }
        // anyone not stamped with this round is spectating on purpose
        if ctx.clients[i].persistent.round_num != ctx.level.round_num {
            continue;
        }

        if ctx.level.teams != 0 || ctx.level.ctf {
            let team = match ctx.clients[i].persistent.team {
                Some(t) => t,
                None => ctx.smallest_team(),
            };
            ctx.clients[i].persistent.team = Some(team);
            ctx.clients[i].persistent.skin = ctx.team(team).skin.clone();
        }
        ctx.clients[i].persistent.spectator = false;

        let ent = ctx.entity_for_client(i);
        p_client::client_respawn(ctx, ent);
    }
}

// ============================================================
// Timeouts
// ============================================================

/// Freezes play. Returns false if timeouts are unavailable right now.
pub fn call_timeout(ctx: &mut GameContext, ent_idx: usize) -> bool {
    let seconds = ctx.level.timeout_seconds;
    if seconds == 0 {
        gi_cprintf(ent_idx as i32, PRINT_HIGH, "Timeouts are disabled\n");
        return false;
    }
    if ctx.level.match_state != MatchState::Playing {
        gi_cprintf(ent_idx as i32, PRINT_HIGH, "Timeouts can only be called during a match\n");
        return false;
    }

    ctx.level.match_state = MatchState::Timeout;
    ctx.level.timeout_caller = Some(ctx.handle(ent_idx));
    ctx.level.timeout_time = ctx.level.time + seconds * 1000;
    ctx.level.timeout_frame = ctx.level.frame_num;

    for i in 0..ctx.max_clients {
        if ctx.clients[i].persistent.connected {
            ctx.clients[i].pm.pm_type = PmType::Freeze;
        }
    }

    let client = ctx.edicts[ent_idx].client;
    let name = client
        .map(|c| ctx.clients[c].persistent.net_name.clone())
        .unwrap_or_default();
    let clock = format_time(&mut ctx.level, seconds * 1000);
    gi_bprintf(
        PRINT_HIGH,
        &format!("{} called a timeout, play will resume in {}\n", name, clock),
    );
    true
}

/// Resumes play, restoring the frame counter so match time is unaffected
/// by the pause.
pub fn call_timein(ctx: &mut GameContext) {
    ctx.level.frame_num = ctx.level.timeout_frame;
    ctx.level.time = ctx.level.frame_num * gi_frame_millis();
    ctx.level.match_state = MatchState::Playing;
    ctx.level.timeout_caller = None;
    ctx.level.timeout_time = 0;
    ctx.level.timeout_frame = 0;

    for i in 0..ctx.max_clients {
        if !ctx.clients[i].persistent.connected {
            continue;
        }
        let ent = ctx.entity_for_client(i);
        ctx.clients[i].pm.pm_type = if ctx.clients[i].persistent.spectator {
            PmType::Spectator
        } else if ctx.edicts[ent].dead {
            PmType::Dead
        } else {
            PmType::Normal
        };
    }

    gi_bprintf(PRINT_HIGH, "Play has resumed\n");
}

// ============================================================
// Restart, teams, level transitions
// ============================================================

pub fn reset_teams(ctx: &mut GameContext) {
    ctx.team_good = GTeam {
        name: "Good".to_string(),
        skin: "qforcer/blue".to_string(),
        ..GTeam::default()
    };
    ctx.team_evil = GTeam {
        name: "Evil".to_string(),
        skin: "qforcer/red".to_string(),
        ..GTeam::default()
    };
    gi_configstring(CS_TEAM_GOOD as i32, "Good");
    gi_configstring(CS_TEAM_EVIL as i32, "Evil");
}

/// Returns the level to warmup: scores wiped, readiness cleared, items
/// restored. Clients who sat out the interrupted match or round are
/// benched; everyone else respawns.
pub fn restart_game(ctx: &mut GameContext) {
    // restarting mid-match or mid-round invalidates participation
    if ctx.level.match_time != 0 {
        ctx.level.match_num += 1;
    }
    if ctx.level.round_time != 0 {
        ctx.level.round_num += 1;
    }

    ctx.level.match_state = MatchState::Warmup;
    ctx.level.warmup = ctx.level.match_mode;
    ctx.level.start_match = false;
    ctx.level.match_time = 0;
    ctx.level.start_round = false;
    ctx.level.round_time = 0;
    ctx.level.round_active = false;
    ctx.level.timeout_caller = None;
    ctx.level.timeout_time = 0;

    let auto_join = gi_cvar_value(ctx.cvars.g_auto_join) != 0.0;

    for i in 0..ctx.max_clients {
        if !ctx.clients[i].persistent.connected {
            continue;
        }

        ctx.clients[i].persistent.ready = false;
        ctx.clients[i].persistent.score = 0;
        ctx.clients[i].persistent.captures = 0;

        if ctx.level.match_mode {
            ctx.clients[i].persistent.spectator =
                ctx.clients[i].persistent.match_num != ctx.level.match_num;
        } else if ctx.level.rounds {
            ctx.clients[i].persistent.spectator =
                ctx.clients[i].persistent.round_num != ctx.level.round_num;
        }

        if (ctx.level.teams != 0 || ctx.level.ctf) && ctx.clients[i].persistent.team.is_none() {
            // never auto-join in duel, seeding is manual there
            if auto_join && ctx.level.gameplay != Gameplay::Duel {
                let team = ctx.smallest_team();
                ctx.clients[i].persistent.team = Some(team);
                ctx.clients[i].persistent.skin = ctx.team(team).skin.clone();
                ctx.clients[i].persistent.spectator = false;
            } else {
                ctx.clients[i].persistent.spectator = true;
            }
        }

        let ent = ctx.entity_for_client(i);
        p_client::client_respawn(ctx, ent);
    }

    ctx.team_good.score = 0;
    ctx.team_good.captures = 0;
    ctx.team_evil.score = 0;
    ctx.team_evil.captures = 0;

    crate::g_items::reset_items(ctx);
    reset_vote(ctx);

    gi_sound(0, ctx.media.sounds.teleport, ATTEN_NONE);
    gi_bprintf(PRINT_HIGH, "Game restarted\n");
}

/// Moves everyone to the scoreboard and schedules the map change.
pub fn begin_intermission(ctx: &mut GameContext, next_map: &str) {
    if ctx.level.intermission_time != 0 {
        return;
    }

    ctx.level.intermission_time = ctx.level.time;
    ctx.level.changemap = Some(next_map.to_string());

    let spot = crate::g_utils::find_first_by_class_name(ctx, "info_player_intermission")
        .or_else(|| crate::g_utils::find_first_by_class_name(ctx, "info_player_start"))
        .or_else(|| crate::g_utils::find_first_by_class_name(ctx, "info_player_deathmatch"));
    if let Some(spot) = spot {
        ctx.level.intermission_origin = ctx.edicts[spot].s.origin;
        ctx.level.intermission_angle = ctx.edicts[spot].s.angles;
    }

    for i in 0..ctx.max_clients {
        if !ctx.clients[i].persistent.connected {
            continue;
        }
        let ent = ctx.entity_for_client(i);

        // nobody watches the scoreboard as a corpse
        if ctx.edicts[ent].dead {
            p_client::client_respawn(ctx, ent);
        }
        p_client::client_to_intermission(ctx, ent);
    }

    gi_sound(0, ctx.media.sounds.teleport, ATTEN_NONE);
}

/// Ends the level: next rotation map in free play, same map in match mode.
pub fn end_level(ctx: &mut GameContext) {
    let next = if ctx.level.match_mode {
        ctx.level.name.clone()
    } else {
        let random = gi_cvar_value(ctx.cvars.g_random_map) != 0.0;
        match ctx.map_list.next(random) {
            Some(entry) => entry.name.clone(),
            None => ctx.level.name.clone(),
        }
    };
    begin_intermission(ctx, &next);
}

/// Issues the map change once the intermission has run its course.
pub fn exit_level(ctx: &mut GameContext) {
    if let Some(map) = ctx.level.changemap.take() {
        gi_add_command_string(&format!("map {}\n", map));
    }
    ctx.level.intermission_time = 0;
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::g_local::test::make_ctx;

    fn connect_team(ctx: &mut GameContext, client: usize, team: TeamId) {
        ctx.clients[client].persistent.team = Some(team);
        ctx.clients[client].persistent.spectator = false;
    }

    #[test]
    fn test_frame_advances_clock() {
        let mut ctx = make_ctx(1);
        g_frame(&mut ctx);
        assert_eq!(ctx.level.frame_num, 1);
        assert_eq!(ctx.level.time, 25);
        g_frame(&mut ctx);
        assert_eq!(ctx.level.time, 50);
    }

    #[test]
    fn test_frag_limit_ends_level_exactly_once() {
        let mut ctx = make_ctx(2);
        ctx.level.frag_limit = 30;
        ctx.clients[0].persistent.score = 30;

        g_frame(&mut ctx);
        assert_ne!(ctx.level.intermission_time, 0);
        let started_at = ctx.level.intermission_time;

        // still on the scoreboard, no second trigger
        g_frame(&mut ctx);
        assert_eq!(ctx.level.intermission_time, started_at);
    }

    #[test]
    fn test_score_below_limit_does_not_end() {
        let mut ctx = make_ctx(2);
        ctx.level.frag_limit = 30;
        ctx.clients[0].persistent.score = 29;
        g_frame(&mut ctx);
        assert_eq!(ctx.level.intermission_time, 0);
    }

    #[test]
    fn test_vote_passes_at_majority() {
        let mut ctx = make_ctx(3);
        ctx.level.time = 1000;
        ctx.level.vote_cmd = "next_map".to_string();
        ctx.level.vote_time = 1000;

        // 3 clients: majority is ceil(3 * 0.51) = 2
        ctx.level.votes[VOTE_IDX_YES] = 1;
        check_vote(&mut ctx);
        assert_eq!(ctx.level.vote_time, 1000); // still open

        ctx.level.votes[VOTE_IDX_YES] = 2;
        check_vote(&mut ctx);
        assert_eq!(ctx.level.vote_time, 0); // resolved
        assert_ne!(ctx.level.intermission_time, 0); // next_map executed
    }

    #[test]
    fn test_vote_fails_and_expires() {
        let mut ctx = make_ctx(2);
        ctx.level.time = 1000;
        ctx.level.vote_cmd = "restart".to_string();
        ctx.level.vote_time = 1000;
        ctx.level.votes[VOTE_IDX_NO] = 2;

        check_vote(&mut ctx);
        assert_eq!(ctx.level.vote_time, 0);
        assert_eq!(ctx.level.intermission_time, 0); // nothing executed

        ctx.level.vote_cmd = "restart".to_string();
        ctx.level.vote_time = 1000;
        ctx.level.time = 1000 + MAX_VOTE_TIME + 1;
        check_vote(&mut ctx);
        assert_eq!(ctx.level.vote_time, 0);
        assert!(ctx.level.vote_cmd.is_empty());
    }

    #[test]
    fn test_match_countdown_starts_match() {
        let mut ctx = make_ctx(2);
        ctx.level.match_mode = true;
        ctx.level.match_state = MatchState::Countdown;
        ctx.level.start_match = true;
        ctx.level.match_time = 500;

        while ctx.level.time < 500 {
            g_frame(&mut ctx);
        }

        assert_eq!(ctx.level.match_state, MatchState::Playing);
        assert!(!ctx.level.start_match);
        assert!(!ctx.level.warmup);
    }

    #[test]
    fn test_round_never_ends_while_both_sides_alive() {
        let mut ctx = make_ctx(2);
        ctx.level.rounds = true;
        ctx.level.teams = 1;
        ctx.level.round_active = true;
        ctx.level.round_num = 1;
        connect_team(&mut ctx, 0, TeamId::Good);
        connect_team(&mut ctx, 1, TeamId::Evil);

        check_round_end(&mut ctx);
        assert!(ctx.level.round_active);

        // one side falls
        ctx.edicts[2].dead = true;
        check_round_end(&mut ctx);
        assert!(!ctx.level.round_active);
        assert_eq!(ctx.team_good.score, 1);
    }

    #[test]
    fn test_round_end_waits_for_enemy_projectiles() {
        let mut ctx = make_ctx(2);
        ctx.level.rounds = true;
        ctx.level.teams = 1;
        ctx.level.round_active = true;
        connect_team(&mut ctx, 0, TeamId::Good);
        connect_team(&mut ctx, 1, TeamId::Evil);
        ctx.edicts[2].dead = true;

        // the dead side still has a rocket in the air
        let rocket = crate::g_utils::spawn_entity(&mut ctx, "rocket");
        ctx.edicts[rocket].owner = Some(ctx.handle(2));

        check_round_end(&mut ctx);
        assert!(ctx.level.round_active);

        crate::g_utils::free_entity(&mut ctx, rocket);
        check_round_end(&mut ctx);
        assert!(!ctx.level.round_active);
    }

    #[test]
    fn test_round_tie_scores_nobody() {
        let mut ctx = make_ctx(2);
        ctx.level.rounds = true;
        ctx.level.round_active = true;
        ctx.edicts[1].dead = true;
        ctx.edicts[2].dead = true;

        check_round_end(&mut ctx);
        assert!(!ctx.level.round_active);
        assert_eq!(ctx.clients[0].persistent.score, 0);
        assert_eq!(ctx.clients[1].persistent.score, 0);
    }

    #[test]
    fn test_round_start_requires_balance_when_teams_2() {
        let mut ctx = make_ctx(3);
        ctx.level.rounds = true;
        ctx.level.teams = 2;
        connect_team(&mut ctx, 0, TeamId::Good);
        connect_team(&mut ctx, 1, TeamId::Good);
        connect_team(&mut ctx, 2, TeamId::Evil);

        check_round_start(&mut ctx);
        assert!(!ctx.level.start_round);

        connect_team(&mut ctx, 1, TeamId::Evil);
        check_round_start(&mut ctx);
        assert!(ctx.level.start_round);
        assert_eq!(ctx.level.round_time, ctx.level.time + 10000);
    }

    #[test]
    fn test_round_limit_ends_level() {
        let mut ctx = make_ctx(2);
        ctx.level.rounds = true;
        ctx.level.round_limit = 3;
        ctx.level.round_num = 3;

        check_round_limit(&mut ctx);
        assert_ne!(ctx.level.intermission_time, 0);
    }

    #[test]
    fn test_timeout_freezes_and_auto_resumes() {
        let mut ctx = make_ctx(2);
        ctx.level.match_state = MatchState::Playing;

        // make the pause short enough to simulate
        ctx.level.timeout_seconds = 2;
        for _ in 0..10 {
            g_frame(&mut ctx);
        }
        let frozen_at = ctx.level.frame_num;

        assert!(call_timeout(&mut ctx, 1));
        assert_eq!(ctx.level.match_state, MatchState::Timeout);
        assert_eq!(ctx.clients[1].pm.pm_type, PmType::Freeze);

        let mut guard = 0;
        while ctx.level.match_state == MatchState::Timeout {
            g_frame(&mut ctx);
            guard += 1;
            assert!(guard < 1000, "timeout never resumed");
        }

        // the pause did not consume match time
        assert_eq!(ctx.level.frame_num, frozen_at);
        assert_eq!(ctx.level.match_state, MatchState::Playing);
        assert_eq!(ctx.clients[0].pm.pm_type, PmType::Normal);
    }

    #[test]
    fn test_timeout_disabled_by_cvar() {
        let mut ctx = make_ctx(1);
        ctx.level.match_state = MatchState::Playing;
        ctx.level.timeout_seconds = 0;
        assert!(!call_timeout(&mut ctx, 1));
        assert_eq!(ctx.level.match_state, MatchState::Playing);
    }

    #[test]
    fn test_format_time_blinks_green_under_thirty() {
        let mut level = GLevel::default();
        assert_eq!(format_time(&mut level, 95000), "^7 1:35");

        // counting down, odd second, under thirty
        level.last_displayed_time = 26000;
        assert_eq!(format_time(&mut level, 25000), "^2 0:25");

        // even second stays white
        assert_eq!(format_time(&mut level, 24000), "^7 0:24");

        // counting up never blinks
        level.last_displayed_time = 24000;
        assert_eq!(format_time(&mut level, 25000), "^7 0:25");
    }

    #[test]
    fn test_intermission_exits_after_ten_seconds() {
        let mut ctx = make_ctx(1);
        ctx.map_list = crate::g_maplist::MapList::parse("alpha beta");
        ctx.level.frag_limit = 1;
        ctx.clients[0].persistent.score = 1;

        g_frame(&mut ctx);
        assert_ne!(ctx.level.intermission_time, 0);
        assert_eq!(ctx.level.changemap.as_deref(), Some("beta"));
        assert_eq!(ctx.clients[0].pm.pm_type, PmType::Freeze);

        let mut guard = 0;
        while ctx.level.intermission_time != 0 {
            g_frame(&mut ctx);
            guard += 1;
            assert!(guard < 1000, "intermission never ended");
        }
        assert!(ctx.level.changemap.is_none());
    }

    #[test]
    fn test_restart_clears_scores_and_readiness() {
        let mut ctx = make_ctx(2);
        ctx.clients[0].persistent.score = 12;
        ctx.clients[0].persistent.ready = true;
        ctx.team_good.score = 5;
        ctx.level.match_state = MatchState::Playing;

        restart_game(&mut ctx);
        assert_eq!(ctx.clients[0].persistent.score, 0);
        assert!(!ctx.clients[0].persistent.ready);
        assert_eq!(ctx.team_good.score, 0);
        assert_eq!(ctx.level.match_state, MatchState::Warmup);
    }

    #[test]
    fn test_restart_auto_joins_smallest_team() {
        let mut ctx = make_ctx(3);
        ctx.level.teams = 1;
        connect_team(&mut ctx, 0, TeamId::Good);
        connect_team(&mut ctx, 1, TeamId::Good);

        restart_game(&mut ctx);
        assert_eq!(ctx.clients[2].persistent.team, Some(TeamId::Evil));
    }

    #[test]
    fn test_match_aborts_when_team_empties() {
        let mut ctx = make_ctx(2);
        ctx.level.match_mode = true;
        ctx.level.teams = 1;
        ctx.level.match_state = MatchState::Playing;
        connect_team(&mut ctx, 0, TeamId::Good);
        ctx.clients[1].persistent.spectator = true;

        check_match_end(&mut ctx);
        assert_eq!(ctx.level.match_state, MatchState::Warmup);
    }

    #[test]
    fn test_vote_survives_timein_clock_rollback() {
        let mut ctx = make_ctx(2);
        ctx.level.match_state = MatchState::Playing;
        ctx.level.timeout_seconds = 2;
        for _ in 0..10 {
            g_frame(&mut ctx);
        }
        assert!(call_timeout(&mut ctx, 1));

        // a vote opened during the pause is stamped with the paused clock
        ctx.level.vote_cmd = "restart".to_string();
        ctx.level.vote_time = ctx.level.time + 1000;

        let mut guard = 0;
        while ctx.level.match_state == MatchState::Timeout {
            g_frame(&mut ctx);
            guard += 1;
            assert!(guard < 1000, "timeout never resumed");
        }

        // time-in rolled the clock back behind the stamp; the vote stays open
        g_frame(&mut ctx);
        assert_ne!(ctx.level.vote_time, 0);
        assert_eq!(ctx.level.vote_cmd, "restart");
    }

    #[test]
    fn test_vote_frozen_while_voting_disabled() {
        let mut ctx = make_ctx(2);
        ctx.level.time = 1000;
        ctx.level.vote_cmd = "next_map".to_string();
        ctx.level.vote_time = 1000;
        ctx.level.votes[VOTE_IDX_YES] = 2;

        ctx.level.voting = false;
        check_vote(&mut ctx);
        assert_eq!(ctx.level.vote_time, 1000); // untouched

        ctx.level.voting = true;
        check_vote(&mut ctx);
        assert_eq!(ctx.level.vote_time, 0);
        assert_ne!(ctx.level.intermission_time, 0);
    }

    #[test]
    fn test_map_vote_ends_through_intermission() {
        let mut ctx = make_ctx(2);
        ctx.level.time = 1000;
        ctx.level.vote_cmd = "map frag3".to_string();
        ctx.level.vote_time = 1000;
        ctx.level.votes[VOTE_IDX_YES] = 2;

        check_vote(&mut ctx);
        assert_ne!(ctx.level.intermission_time, 0);
        assert_eq!(ctx.level.changemap.as_deref(), Some("frag3"));
    }

    #[test]
    fn test_frag_limit_ignored_in_ctf() {
        let mut ctx = make_ctx(2);
        ctx.level.ctf = true;
        ctx.level.frag_limit = 30;
        ctx.clients[0].persistent.score = 30;

        g_frame(&mut ctx);
        assert_eq!(ctx.level.intermission_time, 0);
    }

    #[test]
    fn test_warmup_covers_rounds_play() {
        let mut ctx = make_ctx(2);
        ctx.level.rounds = true;

        g_frame(&mut ctx);
        assert!(ctx.level.warmup);

        // force the round underway
        ctx.level.round_time = ctx.level.time;
        g_frame(&mut ctx);
        assert!(!ctx.level.warmup);
    }

    #[test]
    fn test_time_limit_cvar_feeds_level() {
        let _ = make_ctx(1);

        gi_cvar_set("g_time_limit", "50");
        let ctx = make_ctx(1);
        assert_eq!(ctx.level.time_limit, 50 * 60 * 1000);

        gi_cvar_set("g_time_limit", "0");
    }

    #[test]
    fn test_restart_keeps_time_limit() {
        let mut ctx = make_ctx(1);
        ctx.level.time_limit = 60000;

        restart_game(&mut ctx);
        assert_eq!(ctx.level.time_limit, 60000);
    }

    #[test]
    fn test_restart_benches_non_participants() {
        let mut ctx = make_ctx(2);
        ctx.level.match_mode = true;
        ctx.level.match_num = 3;
        ctx.clients[0].persistent.match_num = 3;
        ctx.clients[1].persistent.match_num = 1;

        restart_game(&mut ctx);
        assert!(!ctx.clients[0].persistent.spectator);
        assert!(ctx.clients[1].persistent.spectator);
    }

    #[test]
    fn test_restart_mid_match_benches_everyone() {
        let mut ctx = make_ctx(2);
        ctx.level.match_mode = true;
        ctx.level.match_num = 3;
        ctx.level.match_time = 500;
        ctx.clients[0].persistent.match_num = 3;
        ctx.clients[1].persistent.match_num = 3;

        restart_game(&mut ctx);
        assert_eq!(ctx.level.match_num, 4);
        assert_eq!(ctx.level.match_time, 0);
        assert!(ctx.clients[0].persistent.spectator);
        assert!(ctx.clients[1].persistent.spectator);
    }

    #[test]
    fn test_round_rejoin_keyed_on_participation() {
        let mut ctx = make_ctx(2);
        ctx.level.rounds = true;
        ctx.level.round_limit = 10;
        ctx.level.round_num = 2;

        // player 0 fought in round 2; player 1 sat out on purpose
        ctx.clients[0].persistent.round_num = 2;
        ctx.clients[0].persistent.spectator = true;
        ctx.clients[1].persistent.round_num = 0;
        ctx.clients[1].persistent.spectator = true;

        check_round_limit(&mut ctx);
        assert!(!ctx.clients[0].persistent.spectator);
        assert!(ctx.clients[1].persistent.spectator);
    }
}
