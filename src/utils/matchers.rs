use lazy_static::lazy_static;
use regex::Regex;

/// Extracts the user id from a `<@id>` or `<@!id>` mention.
pub fn get_mention(msg: &str) -> Option<u64> {
    ID_MATCHER
        .captures(msg)
        .and_then(|captures| captures.get(1))
        .and_then(|id| id.as_str().parse::<u64>().ok())
}

lazy_static! {
    static ref ID_MATCHER: Regex = Regex::new(r"^<@!?([0-9]+)>$").unwrap();
}
