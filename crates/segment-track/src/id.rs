/// Source of the opaque identity values that mark a segment row as dirty.
///
/// Values only need to be unique within one session; renderers compare them
/// for equality and never parse them.
pub trait IdGenerator: Send + Sync {
    fn next_id(&mut self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGen;

impl IdGenerator for UuidIdGen {
    fn next_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Monotonic counter, optionally prefixed. Deterministic, so tests and
/// snapshots can assert on exact identities.
#[derive(Debug, Default, Clone)]
pub struct SequentialIdGen {
    prefix: &'static str,
    next: u64,
}

impl SequentialIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: &'static str) -> Self {
        Self { prefix, next: 0 }
    }
}

impl IdGenerator for SequentialIdGen {
    fn next_id(&mut self) -> String {
        let n = self.next;
        self.next += 1;
        format!("{}{n}", self.prefix)
    }
}
