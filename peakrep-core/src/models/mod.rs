pub mod replicate;
pub mod score_table;
pub mod window;
pub mod window_list;

// re-export for cleaner imports
pub use self::replicate::{Replicate, ReplicateSet};
pub use self::score_table::ScoreTable;
pub use self::window::Window;
pub use self::window_list::{ChromPartition, WindowList};
