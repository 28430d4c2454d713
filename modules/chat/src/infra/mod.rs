pub mod realtime;
pub mod storage;
