mod settings_handler;

pub use settings_handler::{
    __path_clear_database_settings, __path_get_database_settings, __path_save_database_settings,
    __path_sync_local_data, __path_test_database_connection, clear_database_settings,
    get_database_settings, save_database_settings, sync_local_data, test_database_connection,
};
