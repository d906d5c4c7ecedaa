//! Standard exit codes (BSD sysexits.h compatible)

/// Command line usage error, unknown node id
pub const USAGE: i32 = 64;

/// Data format error: unreadable snapshot, duplicate ids, rejected move
pub const DATAERR: i32 = 65;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
