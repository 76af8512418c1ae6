pub mod board;
pub mod layout;
pub mod letters;
pub mod room;
pub mod scoring;
pub mod session;
pub mod store;
pub mod tile_bag;
pub mod word_validation;

// Re-export main components
pub use board::*;
pub use layout::*;
pub use letters::*;
pub use room::*;
pub use scoring::*;
pub use session::*;
pub use store::*;
pub use tile_bag::*;
pub use word_validation::*;
