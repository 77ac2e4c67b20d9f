// common.rs — print and error entry points shared by the server and game module

use parking_lot::Mutex;

use crate::q_shared::{ERR_DROP, ERR_FATAL};

pub const MAX_PRINT_MSG: usize = 4096;

// ============================================================
// Redirect buffer for com_printf
// ============================================================

static RD_BUFFER: Mutex<Option<String>> = Mutex::new(None);

/// Begin redirecting printf output into a buffer.
pub fn com_begin_redirect() {
    let mut buf = RD_BUFFER.lock();
    *buf = Some(String::new());
}

/// End redirect and return the captured output.
pub fn com_end_redirect() -> Option<String> {
    let mut buf = RD_BUFFER.lock();
    buf.take()
}

// ============================================================
// com_printf / com_dprintf / com_warn / com_error
// ============================================================

/// General-purpose print function. Prints to stdout and appends to the
/// redirect buffer if one is active.
pub fn com_printf(msg: &str) {
    {
        let mut buf = RD_BUFFER.lock();
        if let Some(ref mut s) = *buf {
            s.push_str(msg);
            return;
        }
    }
    print!("{}", msg);
}

/// Developer-only print. Controlled by the "developer" cvar.
pub fn com_dprintf(msg: &str) {
    if crate::cvar::cvar_variable_value("developer") == 0.0 {
        return;
    }
    com_printf(msg);
}

/// Non-fatal warning print.
pub fn com_warn(msg: &str) {
    com_printf(&format!("WARNING: {}", msg));
}

/// Error handler.
/// - `ERR_FATAL`: unrecoverable, aborts the process state via panic.
/// - `ERR_DROP`: aborts the current server session; the panic unwinds to
///   the session scope, which catches it and returns to an idle server.
pub fn com_error(code: i32, msg: &str) -> ! {
    if code == ERR_FATAL {
        eprintln!("Error: {}", msg);
        panic!("Fatal error: {}", msg);
    }
    debug_assert_eq!(code, ERR_DROP);
    eprintln!("********************\nERROR: {}\n********************", msg);
    panic!("Server error: {}", msg);
}
