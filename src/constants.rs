// Fundamental configuration constants
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3030;
pub const WS_PATH: &str = "game";
pub const HEALTH_PATH: &str = "health";

// Liveness
pub const DEFAULT_HEARTBEAT_SECS: u64 = 20;

// Transport limits
pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024;

// Identity
pub const DEFAULT_IDENTITY_HEADER: &str = "x-username";
pub const MIN_NAME_LENGTH: usize = 3;
pub const MAX_NAME_LENGTH: usize = 16;

// Protocol delimiters
/// Joins the two participant names into a room id. Never valid inside a name.
pub const ROOM_SEPARATOR: char = '‗';
/// Separates sender name from text in relayed chat lines.
pub const CHAT_SEPARATOR: char = '﹕';
pub const ARG_DELIMITER: char = ':';
pub const VERB_PREFIX: char = '/';
