pub mod analysis;
pub mod content;
pub mod item;

pub use analysis::*;
pub use content::*;
pub use item::*;
