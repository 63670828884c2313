use chrono::{DateTime, TimeZone, Utc};

use crate::features::auth::password::hash_password;
use crate::features::reports::models::{Report, ReportCategory};
use crate::features::users::models::{User, UserRole};

/// Password of the seeded demo accounts
pub const DEMO_PASSWORD: &str = "password";

pub fn demo_users() -> Vec<User> {
    vec![
        User {
            id: "user-1".to_string(),
            username: "admin".to_string(),
            password: hash_password(DEMO_PASSWORD),
            role: UserRole::Admin,
            name: "مدير النظام".to_string(),
        },
        User {
            id: "user-2".to_string(),
            username: "bank".to_string(),
            password: hash_password(DEMO_PASSWORD),
            role: UserRole::Bank,
            name: "مستخدم البنك".to_string(),
        },
    ]
}

pub fn demo_reports() -> Vec<Report> {
    vec![
        Report {
            id: "report-1".to_string(),
            atm_name: "فرع مدينة نصر".to_string(),
            atm_number: "ATM-1042".to_string(),
            serial_number: "SN-558120".to_string(),
            governorate: "القاهرة".to_string(),
            address: "12 شارع عباس العقاد".to_string(),
            maintenance_date: at(2024, 5, 14, 9, 30),
            technical_report: "تم استبدال الواجهة الأمامية وإصلاح الإضاءة".to_string(),
            notes: String::new(),
            before_photos: Vec::new(),
            after_photos: Vec::new(),
            category: vec![ReportCategory::Corrective],
        },
        Report {
            id: "report-2".to_string(),
            atm_name: "فرع سموحة".to_string(),
            atm_number: "ATM-2210".to_string(),
            serial_number: "SN-771045".to_string(),
            governorate: "الإسكندرية".to_string(),
            address: "45 طريق فوزي معاذ".to_string(),
            maintenance_date: at(2024, 4, 2, 11, 0),
            technical_report: "تركيب كسوة حديثة للماكينة".to_string(),
            notes: "تمت المعاينة مع مدير الفرع".to_string(),
            before_photos: Vec::new(),
            after_photos: Vec::new(),
            category: vec![ReportCategory::Modern],
        },
    ]
}

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .unwrap_or_default()
}
