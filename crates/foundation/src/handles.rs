/// Load generation token.
///
/// Every model or credential (re)load takes a fresh generation. Asynchronous
/// results are tagged with the generation they were started under and are
/// discarded when it is no longer current.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn new(n: u64) -> Self {
        Generation(n)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

/// Monotonic source of [`Generation`] tokens.
#[derive(Debug, Default)]
pub struct GenerationCounter {
    latest: Generation,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Generation {
        self.latest
    }

    pub fn advance(&mut self) -> Generation {
        self.latest = Generation(self.latest.0.wrapping_add(1));
        self.latest
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.latest
    }
}
