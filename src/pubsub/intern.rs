use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

/// Префикс канонических имён каналов. Отделяет пространство имён событий
/// от прочих идентификаторов процесса.
pub(crate) const CHANNEL_PREFIX: &str = "ev-";

/// Пул для повторного использования Arc<str> по одинаковым каноническим именам.
/// Crate-private: другие модули внутри этого крейта видят, а внешние — нет.
static CHANNEL_INTERN: Lazy<DashMap<String, Arc<str>>> = Lazy::new(DashMap::new);

/// Проверяет, что имя канала непустое после обрезки пробелов.
#[inline(always)]
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty()
}

/// Возвращает interned каноническое имя канала: `"ev-" + trim(name)`.
/// При первом вызове для нового имени создаёт Arc<str> и сохраняет его в пуле.
pub(crate) fn canonical_channel<S: AsRef<str>>(name: S) -> Arc<str> {
    let key = format!("{CHANNEL_PREFIX}{}", name.as_ref().trim());
    if let Some(existing) = CHANNEL_INTERN.get(&key) {
        existing.clone()
    } else {
        let arc: Arc<str> = Arc::from(key.as_str());
        CHANNEL_INTERN.insert(key, arc.clone());
        arc
    }
}
