use crate::domain::model::{SheetRow, PRODUCT_PLACEHOLDER};
use chrono::NaiveDate;

/// Exact-calendar date check. Fails closed on empty or unparsable
/// components; day/month overflow is rejected rather than rolled over
/// (2023-02-30 is invalid, 2024-02-29 is fine).
pub fn is_valid_date(year: &str, month: &str, day: &str) -> bool {
    let y = match year.trim().parse::<i32>() {
        Ok(y) => y,
        Err(_) => return false,
    };
    let m = match month.trim().parse::<u32>() {
        Ok(m) => m,
        Err(_) => return false,
    };
    let d = match day.trim().parse::<u32>() {
        Ok(d) => d,
        Err(_) => return false,
    };

    NaiveDate::from_ymd_opt(y, m, d).is_some()
}

/// 一列要能送出：日期有效、產品非空白也非預留字、至少填了一個識別欄位
pub fn is_row_submittable(row: &SheetRow) -> bool {
    if !is_valid_date(&row.year, &row.month, &row.day) {
        return false;
    }

    let producto = row.producto.trim();
    if producto.is_empty() || producto == PRODUCT_PLACEHOLDER {
        return false;
    }

    // 完全空白的列（沒有任何識別號）不算有效
    [&row.dni, &row.caso_yoizen, &row.gestion]
        .iter()
        .any(|field| !field.trim().is_empty())
}
