use crate::config::form::{FormConfig, LOGICAL_FIELDS};
use crate::domain::model::SheetRow;
use crate::domain::ports::RowSubmitter;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static NEXT_CHANNEL: AtomicU64 = AtomicU64::new(1);

/// Transient submission channel. Uniquely named per submission so
/// overlapping passes could never collide; released on every exit path via
/// Drop, including early bail-out on a send error.
struct TransportChannel {
    name: String,
    debug_mode: bool,
}

impl TransportChannel {
    fn acquire(debug_mode: bool) -> Self {
        let name = format!("channel_{}", NEXT_CHANNEL.fetch_add(1, Ordering::Relaxed));
        if debug_mode {
            tracing::info!("🔍 Opened submission channel '{}'", name);
        } else {
            tracing::trace!("Opened submission channel '{}'", name);
        }
        Self { name, debug_mode }
    }
}

impl Drop for TransportChannel {
    fn drop(&mut self) {
        if self.debug_mode {
            tracing::info!("🔍 Released submission channel '{}'", self.name);
        } else {
            tracing::trace!("Released submission channel '{}'", self.name);
        }
    }
}

/// Posts one row to the form endpoint as urlencoded form data. The
/// endpoint's response is deliberately never inspected: the cross-origin
/// posting model gives no readable answer, so Ok only ever means
/// "dispatched".
pub struct FormSubmitter {
    client: Client,
    debug_mode: bool,
    settle_delay: Duration,
    debug_settle_delay: Duration,
}

impl FormSubmitter {
    pub fn new(debug_mode: bool) -> Self {
        Self {
            client: Client::new(),
            debug_mode,
            settle_delay: Duration::from_millis(800),
            debug_settle_delay: Duration::from_millis(3000),
        }
    }

    /// 測試用：縮短 settle 延遲
    pub fn with_settle_delays(mut self, normal: Duration, debug: Duration) -> Self {
        self.settle_delay = normal;
        self.debug_settle_delay = debug;
        self
    }

    /// 依邏輯欄位順序組 payload，鍵用 config 映射出的後端欄位鍵
    fn encode_row(row: &SheetRow, config: &FormConfig) -> Vec<(String, String)> {
        LOGICAL_FIELDS
            .iter()
            .filter_map(|logical| {
                let key = config.entries.get(*logical)?;
                Some((key.clone(), field_value(row, logical)))
            })
            .collect()
    }
}

fn field_value(row: &SheetRow, logical: &str) -> String {
    match logical {
        "fecha" => row.date_string(),
        "servicio" => row.servicio.clone(),
        "lider" => row.lider.clone(),
        "representante" => row.representante.clone(),
        "producto" => row.producto.clone(),
        "dni" => row.dni.clone(),
        "gestion" => row.gestion.clone(),
        "caso_yoizen" => row.caso_yoizen.clone(),
        "flow_sin_deco" => row.flow_sin_deco.clone(),
        "unificacion" => row.unificacion.clone(),
        "provincia" => row.provincia.clone(),
        "promo_tactica" => row.promo_tactica.clone(),
        _ => String::new(),
    }
}

#[async_trait]
impl RowSubmitter for FormSubmitter {
    async fn submit_row(&self, row: &SheetRow, config: &FormConfig) -> Result<()> {
        let _channel = TransportChannel::acquire(self.debug_mode);

        let fields = Self::encode_row(row, config);

        if self.debug_mode {
            tracing::info!("🔍 Payload for {}:", config.form_url);
            for (key, value) in &fields {
                tracing::info!("🔍   {} = {}", key, value);
            }
        }

        // 回應刻意不檢查；send 成功即視為已派送
        self.client
            .post(&config.form_url)
            .form(&fields)
            .send()
            .await
            .map_err(|e| crate::utils::error::FillerError::TransportError {
                message: e.to_string(),
            })?;

        let delay = if self.debug_mode {
            self.debug_settle_delay
        } else {
            self.settle_delay
        };
        tokio::time::sleep(delay).await;

        Ok(())
    }
}
