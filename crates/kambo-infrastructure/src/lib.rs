pub mod config_service;
pub mod jsonl_interaction_repository;
pub mod knowledge_base;
pub mod paths;
pub mod secret_service;
pub mod storage;

pub use config_service::ConfigService;
pub use jsonl_interaction_repository::JsonlInteractionRepository;
pub use knowledge_base::StaticKnowledgeBase;
pub use paths::{KamboPaths, PathError};
pub use secret_service::SecretServiceImpl;
