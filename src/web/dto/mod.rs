pub mod lessons;
pub mod progress;
pub mod submissions;
