use std::sync::Arc;

use serde_json::Value;

/// Событие доставки, проходящее через канал.
///
/// Несёт каноническое имя канала и полезную нагрузку `detail` в виде
/// JSON-значения. Слушатели получают только `detail`; само событие
/// остаётся внутренней оболочкой доставки.
#[derive(Debug, Clone)]
pub struct DispatchEvent {
    pub channel: Arc<str>,
    pub detail: Value,
}

impl DispatchEvent {
    pub fn new(channel: Arc<str>, detail: Value) -> Self {
        Self { channel, detail }
    }

    /// Событие без полезной нагрузки: `detail` — пустой JSON-объект.
    pub fn empty(channel: Arc<str>) -> Self {
        Self::new(channel, Value::Object(serde_json::Map::new()))
    }
}
