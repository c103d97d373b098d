use std::collections::HashMap;

/// Foreground color of every graphics context created in the session, keyed by GC id.
#[derive(Debug, Default)]
pub struct GcColorTable {
    colors: HashMap<u32, u32>,
}

impl GcColorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, gc: u32, foreground: u32) {
        if let Some(previous) = self.colors.insert(gc, foreground) {
            log::debug!(
                "GC {:#x} foreground replaced: {:#08x} -> {:#08x}",
                gc,
                previous,
                foreground
            );
        }
    }

    pub fn get(&self, gc: u32) -> Option<u32> {
        self.colors.get(&gc).copied()
    }

    pub fn contains(&self, gc: u32) -> bool {
        self.colors.contains_key(&gc)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn clear(&mut self) {
        self.colors.clear();
    }
}
