pub mod retry;
pub mod shared;
pub mod urls;
