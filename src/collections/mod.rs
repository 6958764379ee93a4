mod slotmap;

pub use slotmap::SlotMap;
