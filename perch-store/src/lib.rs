pub mod app_config;
pub mod memory;
pub mod redis_repo;

pub use memory::MemorySlotStore;
pub use redis_repo::RedisSlotStore;
