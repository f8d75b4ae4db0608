use std::fmt::Display;

/// Store-assigned document identifier. ULID under the hood, so ids sort
/// by allocation time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Eid(String);

impl Display for Eid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Eid {
    #[inline]
    pub fn new() -> Eid {
        Eid(rusty_ulid::generate_ulid_string())
    }
}
