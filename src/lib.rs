pub mod event;
pub mod ingest;
pub mod logging;
pub mod profile;
pub mod record;
pub mod storage;
pub mod web;
