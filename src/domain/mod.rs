pub mod item;

pub use item::StreamItem;
