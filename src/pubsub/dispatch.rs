use std::sync::Arc;

use parking_lot::RwLock;

use super::DispatchEvent;

/// Обёрнутый колбэк слушателя: принимает событие целиком, но передаёт
/// пользовательской функции только `detail`.
pub(crate) type WrappedCallback = Arc<dyn Fn(&DispatchEvent) + Send + Sync>;

/// Запись слушателя в порядке подключения.
#[derive(Clone)]
pub(crate) struct ListenerEntry {
    pub id: String,
    pub callback: WrappedCallback,
}

/// Цель доставки канала.
///
/// Упорядоченный список слушателей с синхронным веером по снимку.
/// `dispatch` снимает стабильный снимок под read-блокировкой и вызывает
/// колбэки уже без блокировок, поэтому слушатель может отписать себя,
/// подписать других или уничтожить канал прямо во время доставки.
#[derive(Default)]
pub struct DispatchTarget {
    entries: RwLock<Vec<ListenerEntry>>,
}

impl DispatchTarget {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Подключает колбэк в конец списка (порядок доставки — порядок подключения).
    pub(crate) fn attach(&self, id: String, callback: WrappedCallback) {
        self.entries.write().push(ListenerEntry { id, callback });
    }

    /// Отключает колбэк по id. Возвращает `true`, если запись была найдена.
    pub(crate) fn detach(&self, id: &str) -> bool {
        let mut entries = self.entries.write();
        match entries.iter().position(|e| e.id == id) {
            Some(idx) => {
                entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Возвращает количество подключённых слушателей.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Стабильный снимок подключённых слушателей на момент вызова.
    pub(crate) fn snapshot(&self) -> Vec<ListenerEntry> {
        self.entries.read().clone()
    }

    /// Синхронно доставляет событие всем слушателям из снимка.
    /// Возвращает число вызванных колбэков.
    pub(crate) fn dispatch(&self, event: &DispatchEvent) -> usize {
        let snapshot = self.snapshot();
        for entry in &snapshot {
            (entry.callback)(event);
        }
        snapshot.len()
    }
}
