pub mod goal;
pub mod log;
pub mod status;
pub mod timer;
pub mod wait;
