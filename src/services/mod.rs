pub mod storage_client;
pub mod storage_service;
