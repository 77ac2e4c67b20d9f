#![allow(dead_code)]
#![allow(clippy::too_many_arguments, clippy::float_cmp, clippy::manual_range_contains,
         clippy::needless_range_loop, clippy::collapsible_if, clippy::collapsible_else_if)]

pub mod q_shared;
pub mod cvar;
pub mod cmd;
pub mod common;
