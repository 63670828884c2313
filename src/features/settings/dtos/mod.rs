mod settings_dto;

pub use settings_dto::{DatabaseStatusDto, SaveDatabaseConfigDto, StorageMode};
