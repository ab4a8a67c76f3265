//! Hard caps on the in-memory store. Anything past these is rejected with a
//! `LimitExceeded` error instead of growing without bound.

pub const MAX_ROOMS: usize = 10_000;
pub const MAX_NAME_LEN: usize = 256;
pub const MAX_RESERVATIONS_PER_ROOM: usize = 50_000;

pub const MAX_USERS: usize = 10_000;
pub const MIN_PASSWORD_LEN: usize = 19;
/// bcrypt only reads the first 72 bytes.
pub const MAX_PASSWORD_LEN: usize = 72;
