mod report_dto;

pub use report_dto::{
    BulkDeleteDto, BulkDeleteResultDto, GovernorateOptionsDto, ImportRequestDto,
    ImportResultDto, ReportFormDto, ReportQueryParams,
};
