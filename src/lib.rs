pub mod audio;
pub mod capture;
pub mod config;
pub mod ring;
pub mod storage;
