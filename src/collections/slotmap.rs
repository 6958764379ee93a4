/// Dense storage with index reuse. Released slots form a free list threaded
/// through the `Err` variants, `u32::MAX` terminating it.
#[derive(Debug)]
pub struct SlotMap<T> {
    head: u32,
    len: usize,
    entries: Vec<Result<T, u32>>,
}
impl<T> Default for SlotMap<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T> SlotMap<T> {
    pub fn new() -> Self {
        Self {
            head: u32::MAX,
            len: 0,
            entries: vec![],
        }
    }
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn get(&self, i: usize) -> Option<&T> {
        self.entries.get(i).and_then(|r| r.as_ref().ok())
    }
    /// The index the next `insert` will hand out.
    pub fn next_idx(&self) -> usize {
        if self.head == u32::MAX {
            self.entries.len()
        } else {
            self.head as usize
        }
    }
    pub fn insert(&mut self, value: T) -> usize {
        self.len += 1;
        if self.head == u32::MAX {
            self.entries.push(Ok(value));
            return self.entries.len() - 1;
        }
        let id = self.head as usize;
        match core::mem::replace(&mut self.entries[id], Ok(value)) {
            Err(next) => self.head = next,
            Ok(_) => unreachable!("free list points at an occupied slot"),
        }
        id
    }
    pub fn release(&mut self, i: usize) -> Option<T> {
        let slot = self.entries.get_mut(i)?;
        if slot.is_err() {
            return None;
        }
        self.len -= 1;
        let old = core::mem::replace(slot, Err(self.head));
        self.head = i as u32;
        old.ok()
    }
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().ok().map(|v| (i, v)))
    }
}
