pub mod downstream;
pub mod storage;
