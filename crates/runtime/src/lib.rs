pub mod notice;

pub use notice::*;
