pub mod report_handler;

pub use report_handler::{
    __path_bulk_delete_reports, __path_create_report, __path_delete_report, __path_export_reports,
    __path_get_report, __path_import_reports, __path_list_governorates, __path_list_reports,
    __path_stream_reports, __path_update_report, bulk_delete_reports, create_report,
    delete_report, export_reports, get_report, import_reports, list_governorates, list_reports,
    stream_reports, update_report,
};
