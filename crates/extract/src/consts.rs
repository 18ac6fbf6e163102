/// Length of a BitTorrent v1 info-hash in hexadecimal characters.
pub const HASH_LENGTH: usize = 40;

// `<series> SxxExx <info>`. The series is greedy so the last episode code in
// the title wins.
pub(crate) const TITLE_PATTERN: &str = r"^(.+)\s+S(\d{2})E(\d{2})\s+(.+)";
pub(crate) const LINK_PATTERN: &str = r"^magnet:\?xt=urn:btih:([0-9A-Fa-f]{40})(?:&|$)";
