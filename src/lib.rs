pub mod backend;
pub mod combo;
pub mod config;
pub mod feed;
pub mod http_client;
pub mod options;
pub mod planner;
pub mod selection;
pub mod session;
pub mod storage;
pub mod ticket;
pub mod tips;
