pub mod state;
pub mod test_utils;
pub mod utils;

pub use state::AppState;
