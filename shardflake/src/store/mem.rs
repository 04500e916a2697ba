use crate::error::Error;

use super::{Cursor, Lease, SequenceStore};

/// Process local cursor, lost on restart.
///
/// Exclusion comes from the generator's mutex, so leasing never blocks.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    cursor: Cursor,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Lease for &mut Cursor {
    fn get(&mut self) -> Result<Cursor, Error> {
        Ok(**self)
    }

    fn set(&mut self, cursor: Cursor) -> Result<(), Error> {
        **self = cursor;
        Ok(())
    }
}

impl SequenceStore for MemoryStore {
    type Guard<'a> = &'a mut Cursor;

    fn lease(&mut self) -> Result<Self::Guard<'_>, Error> {
        Ok(&mut self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty_and_keeps_last_set() {
        let mut store = MemoryStore::new();
        assert_eq!(store.lease().unwrap().get().unwrap(), Cursor::default());

        store.lease().unwrap().set(Cursor::new(42, 3)).unwrap();
        assert_eq!(store.lease().unwrap().get().unwrap(), Cursor::new(42, 3));
    }
}
