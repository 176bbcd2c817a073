use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// 下拉選單的固定選項，模板列預設取第一項
pub const FLOW_SIN_DECO_OPTIONS: [&str; 4] = [
    "Se activa en Línea",
    "No se activa - Problema de herramientas",
    "No se activa - Cte no acepta activarlo en el caso",
    "N/A",
];

/// 表格輸入框的預留文字，視同空白產品
pub const PRODUCT_PLACEHOLDER: &str = "Ingresa un producto válido";

// Session-local row identity. Never serialized; the backend keys nothing on it.
static NEXT_ROW_ID: AtomicU64 = AtomicU64::new(1);

fn next_row_id() -> u64 {
    NEXT_ROW_ID.fetch_add(1, Ordering::Relaxed)
}

/// One editable sales-transaction row. Date components stay as strings
/// (form-entry semantics: possibly empty, possibly unpadded).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetRow {
    #[serde(skip, default = "next_row_id")]
    pub id: u64,
    pub year: String,
    pub month: String,
    pub day: String,
    pub servicio: String,
    pub lider: String,
    pub representante: String,
    pub producto: String,
    pub dni: String,
    pub gestion: String,
    pub caso_yoizen: String,
    pub flow_sin_deco: String,
    pub unificacion: String,
    pub provincia: String,
    pub promo_tactica: String,
}

impl SheetRow {
    /// 以今天日期與固定欄位預設值建立新列
    pub fn template() -> Self {
        let today = Local::now().date_naive();
        Self {
            id: next_row_id(),
            year: today.year().to_string(),
            month: format!("{:02}", today.month()),
            day: format!("{:02}", today.day()),
            servicio: "HOGAR".to_string(),
            lider: "AYLEN GONZALEZ".to_string(),
            representante: String::new(),
            producto: String::new(),
            dni: String::new(),
            gestion: String::new(),
            caso_yoizen: String::new(),
            flow_sin_deco: FLOW_SIN_DECO_OPTIONS[0].to_string(),
            unificacion: "No Corresponde (no tiene serv. Para unificar)".to_string(),
            provincia: "OTRA".to_string(),
            promo_tactica: "NO".to_string(),
        }
    }

    /// 送往表單端點的日期格式：YYYY-MM-DD（零補齊）
    pub fn date_string(&self) -> String {
        let pad = |s: &str| {
            if s.len() >= 2 {
                s.to_string()
            } else {
                format!("{:0>2}", s)
            }
        };
        format!("{}-{}-{}", self.year, pad(&self.month), pad(&self.day))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub email: String,
    pub name: String,
}

/// 儀表板指標；後端算不出來時一律歸零
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserMetrics {
    pub sph_total: f64,
    pub sph_internet: f64,
    pub ventas_mes: u64,
    pub ventas_hoy: u64,
    pub sph_hoy: f64,
    pub internet_hoy: u64,
}

/// Which rows get transported. Persistence always covers the full valid set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPolicy {
    /// 每次都重送全部有效列
    AllRows,
    /// 只送 watermark 之後新增的列（前 watermark 列上次已保存過）
    NewRowsOnly { watermark: usize },
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        SubmitPolicy::AllRows
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Saved { rows: usize },
    Failed { message: String },
    TimedOut { seconds: u64 },
}

/// Aggregate result of one submission pass. Positions are 1-based display
/// positions at the moment the pipeline snapshot was taken.
#[derive(Debug, Clone)]
pub struct SubmitReport {
    pub attempted: usize,
    pub submitted: usize,
    pub skipped_rows: Vec<usize>,
    pub failed_rows: Vec<usize>,
    pub persistence: PersistOutcome,
}

impl SubmitReport {
    /// 組出單行狀態訊息（計數 + 失敗列 + 保存結果）
    pub fn status_line(&self) -> String {
        let mut line = format!("{}/{} rows sent", self.submitted, self.attempted);

        if !self.skipped_rows.is_empty() {
            line.push_str(&format!(", skipped rows {:?} (validation)", self.skipped_rows));
        }
        if !self.failed_rows.is_empty() {
            line.push_str(&format!(", failed rows {:?} (transport)", self.failed_rows));
        }

        match &self.persistence {
            PersistOutcome::Saved { rows } => {
                format!("✅ Submit complete: {}, {} rows saved", line, rows)
            }
            PersistOutcome::Failed { message } => {
                format!("❌ Submit complete: {}, but saving failed: {}", line, message)
            }
            PersistOutcome::TimedOut { seconds } => {
                format!(
                    "❌ Submit complete: {}, but saving timed out after {}s",
                    line, seconds
                )
            }
        }
    }
}
