// sv_send.rs — message buffers and per-tick multicast queue

use skirmish_common::q_shared::*;

/// Little-endian wire message under construction. The game marshals one
/// event at a time into the server's multicast buffer, then directs it
/// with a multicast or unicast call.
#[derive(Debug, Clone, Default)]
pub struct MessageBuffer {
    pub data: Vec<u8>,
}

impl MessageBuffer {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Take the accumulated bytes, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn write_char(&mut self, c: i32) {
        self.data.push(c as i8 as u8);
    }

    pub fn write_byte(&mut self, c: i32) {
        self.data.push(c as u8);
    }

    pub fn write_short(&mut self, c: i32) {
        self.data.extend_from_slice(&(c as i16).to_le_bytes());
    }

    pub fn write_long(&mut self, c: i32) {
        self.data.extend_from_slice(&c.to_le_bytes());
    }

    /// NUL-terminated string.
    pub fn write_string(&mut self, s: &str) {
        self.data.extend_from_slice(s.as_bytes());
        self.data.push(0);
    }

    /// Coordinates go out in 13.3 fixed point.
    pub fn write_coord(&mut self, f: f32) {
        self.write_short((f * 8.0) as i32);
    }

    pub fn write_position(&mut self, pos: &Vec3) {
        self.write_coord(pos[0]);
        self.write_coord(pos[1]);
        self.write_coord(pos[2]);
    }

    /// Unit direction, one signed byte per component.
    pub fn write_dir(&mut self, dir: &Vec3) {
        for i in 0..3 {
            self.write_char((dir[i].clamp(-1.0, 1.0) * 127.0) as i32);
        }
    }

    /// Single angle as a byte, 360 degrees over 256 steps.
    pub fn write_angle(&mut self, f: f32) {
        self.write_byte(((f * 256.0 / 360.0) as i32) & 255);
    }

    /// Full-precision angles, 360 degrees over 65536 steps.
    pub fn write_angles(&mut self, angles: &Vec3) {
        for i in 0..3 {
            self.write_short((angles[i] * 65536.0 / 360.0) as i32);
        }
    }
}

// ============================================================
// Outgoing message queue
// ============================================================

/// Where a finished message goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDest {
    /// All spawned clients. PVS/PHS multicasts collapse to this; the
    /// transport applies visibility culling when a collision model is
    /// attached.
    All { reliable: bool },
    /// A single client, by client slot.
    Client { slot: usize, reliable: bool },
}

/// A finished message waiting for the end-of-tick flush.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub data: Vec<u8>,
    pub dest: MessageDest,
}

/// Maps a MULTICAST_* destination onto the queue's delivery semantics.
pub fn dest_for_multicast(to: i32) -> MessageDest {
    let reliable = matches!(to, MULTICAST_ALL_R | MULTICAST_PHS_R | MULTICAST_PVS_R);
    MessageDest::All { reliable }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_primitives_little_endian() {
        let mut buf = MessageBuffer::new();
        buf.write_byte(SV_CMD_TEMP_ENTITY);
        buf.write_short(-2);
        buf.write_long(0x01020304);
        assert_eq!(
            buf.data,
            vec![SV_CMD_TEMP_ENTITY as u8, 0xfe, 0xff, 0x04, 0x03, 0x02, 0x01]
        );
    }

    #[test]
    fn test_write_string_nul_terminated() {
        let mut buf = MessageBuffer::new();
        buf.write_string("hi");
        assert_eq!(buf.data, vec![b'h', b'i', 0]);
    }

    #[test]
    fn test_write_position_fixed_point() {
        let mut buf = MessageBuffer::new();
        buf.write_position(&[1.0, -1.0, 0.5]);
        assert_eq!(buf.len(), 6);
        assert_eq!(i16::from_le_bytes([buf.data[0], buf.data[1]]), 8);
        assert_eq!(i16::from_le_bytes([buf.data[2], buf.data[3]]), -8);
        assert_eq!(i16::from_le_bytes([buf.data[4], buf.data[5]]), 4);
    }

    #[test]
    fn test_write_dir_clamps_components() {
        let mut buf = MessageBuffer::new();
        buf.write_dir(&[0.0, 2.0, -1.0]);
        assert_eq!(buf.data[0] as i8, 0);
        assert_eq!(buf.data[1] as i8, 127);
        assert_eq!(buf.data[2] as i8, -127);
    }

    #[test]
    fn test_take_leaves_buffer_empty() {
        let mut buf = MessageBuffer::new();
        buf.write_byte(1);
        let taken = buf.take();
        assert_eq!(taken, vec![1]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_dest_for_multicast_reliability() {
        assert_eq!(
            dest_for_multicast(MULTICAST_ALL),
            MessageDest::All { reliable: false }
        );
        assert_eq!(
            dest_for_multicast(MULTICAST_PVS_R),
            MessageDest::All { reliable: true }
        );
        assert_eq!(
            dest_for_multicast(MULTICAST_PHS),
            MessageDest::All { reliable: false }
        );
    }
}
