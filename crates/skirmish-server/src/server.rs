// server.rs — core server state

use parking_lot::Mutex;

use skirmish_common::q_shared::*;

use crate::sv_send::{MessageBuffer, MessageDest, OutgoingMessage};
use crate::sv_world::World;

// ============================================================
// Server and client state
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerState {
    /// No map loaded.
    #[default]
    Dead,
    /// Spawning level entities; config string writes stay local.
    Loading,
    /// Actively running; config string changes are broadcast.
    Game,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SvClientState {
    #[default]
    Free,
    Connected,
    Spawned,
}

/// Per-client connection state. The reliable buffer must be delivered in
/// order; the datagram can be dropped harmlessly.
#[derive(Debug, Clone, Default)]
pub struct SvClient {
    pub state: SvClientState,
    pub name: String,
    pub user_info: String,
    pub message: MessageBuffer,
    pub datagram: MessageBuffer,
}

// ============================================================
// ServerContext
// ============================================================

pub struct ServerContext {
    pub state: ServerState,
    pub name: String,

    pub frame_num: u32,
    pub time: u32,

    pub configstrings: Vec<String>,

    /// Marshalling area for the message the game is currently writing.
    pub multicast: MessageBuffer,
    /// Finished messages, drained into client buffers once per tick.
    pub outgoing: Vec<OutgoingMessage>,

    pub clients: Vec<SvClient>,
    pub world: World,
}

impl ServerContext {
    pub fn new(max_clients: usize) -> Self {
        Self {
            state: ServerState::Dead,
            name: String::new(),
            frame_num: 0,
            time: 0,
            configstrings: vec![String::new(); MAX_CONFIG_STRINGS],
            multicast: MessageBuffer::new(),
            outgoing: Vec::new(),
            clients: vec![SvClient::default(); max_clients],
            world: World::new(),
        }
    }

    /// Updates a config string. Unchanged values are dropped early so
    /// repeated writes (the clock, vote tallies) cost nothing on the wire.
    /// While the server is live the new value is broadcast reliably.
    pub fn set_configstring(&mut self, index: usize, value: &str) {
        if index >= MAX_CONFIG_STRINGS {
            skirmish_common::common::com_warn(&format!(
                "set_configstring: index {} out of range\n",
                index
            ));
            return;
        }
        if self.configstrings[index] == value {
            return;
        }
        self.configstrings[index] = value.to_string();

        if self.state == ServerState::Game {
            let mut msg = MessageBuffer::new();
            msg.write_byte(SV_CMD_CONFIG_STRING);
            msg.write_short(index as i32);
            msg.write_string(value);
            self.outgoing.push(OutgoingMessage {
                data: msg.take(),
                dest: MessageDest::All { reliable: true },
            });
        }
    }

    /// Finds or registers an asset name inside a config string range,
    /// returning its 1-based index within the range. 0 means no name.
    pub fn find_index(&mut self, name: &str, start: usize, max: usize) -> i32 {
        if name.is_empty() {
            return 0;
        }

        for i in 1..max {
            let cs = &self.configstrings[start + i];
            if cs.is_empty() {
                self.set_configstring(start + i, name);
                return i as i32;
            }
            if cs == name {
                return i as i32;
            }
        }

        skirmish_common::common::com_warn(&format!(
            "find_index: range at {} is full, dropped \"{}\"\n",
            start, name
        ));
        0
    }

    /// Moves queued messages into the per-client buffers. Unreliable
    /// traffic only reaches spawned clients.
    pub fn flush_outgoing(&mut self) {
        for msg in std::mem::take(&mut self.outgoing) {
            match msg.dest {
                MessageDest::All { reliable } => {
                    for client in &mut self.clients {
                        match client.state {
                            SvClientState::Free => continue,
                            SvClientState::Connected if !reliable => continue,
                            _ => {}
                        }
                        if reliable {
                            client.message.write(&msg.data);
                        } else {
                            client.datagram.write(&msg.data);
                        }
                    }
                }
                MessageDest::Client { slot, reliable } => {
                    if let Some(client) = self.clients.get_mut(slot) {
                        if client.state == SvClientState::Free {
                            continue;
                        }
                        if reliable {
                            client.message.write(&msg.data);
                        } else {
                            client.datagram.write(&msg.data);
                        }
                    }
                }
            }
        }
    }
}

// ============================================================
// Global singleton
// ============================================================

static SERVER: Mutex<Option<ServerContext>> = Mutex::new(None);

/// Installs a fresh server context. Any previous context is dropped.
pub fn sv_create(max_clients: usize) {
    let mut g = SERVER.lock();
    *g = Some(ServerContext::new(max_clients));
}

pub fn sv_destroy() {
    let mut g = SERVER.lock();
    *g = None;
}

/// Runs a closure against the live server context. Returns the default
/// when no server exists, so game callbacks degrade to no-ops in tests.
pub fn with_server<F, R>(default: R, f: F) -> R
where
    F: FnOnce(&mut ServerContext) -> R,
{
    let mut g = SERVER.lock();
    g.as_mut().map_or(default, f)
}
