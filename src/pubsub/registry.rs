use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::debug;

use super::{
    dispatch::{DispatchTarget, WrappedCallback},
    handle::ChannelHandle,
    intern::{canonical_channel, is_valid_name},
};
use crate::error::{PubSubError, PubSubResult};

/// Внутреннее состояние реестра: три согласованные карты по каноническому
/// имени канала. Имя, присутствующее в одной карте и отсутствующее в
/// другой, — нарушение инварианта (баг реестра, не пользовательская ошибка).
pub(crate) struct RegistryInner {
    /// Каноническое имя → цель доставки.
    pub(crate) dispatchers: DashMap<Arc<str>, Arc<DispatchTarget>>,
    /// Каноническое имя → таблица слушателей (id → обёрнутый колбэк).
    pub(crate) listeners: DashMap<Arc<str>, HashMap<String, WrappedCallback>>,
    /// Каноническое имя → живой экземпляр хэндла (singleton на имя).
    pub(crate) handles: DashMap<Arc<str>, ChannelHandle>,
    /// Общее количество рассылок по живым каналам.
    pub(crate) emit_count: AtomicUsize,
    /// Количество рассылок, не достигших ни одного слушателя.
    pub(crate) empty_emit_count: AtomicUsize,
}

/// Реестр именованных каналов.
///
/// Владеет созданием, проверкой и демонтажом каналов; хэндлы лишь
/// обращаются к нему и никогда не меняют карты напрямую. На каждое
/// каноническое имя реестр держит ровно один живой хэндл и возвращает
/// его же при повторных запросах.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                dispatchers: DashMap::new(),
                listeners: DashMap::new(),
                handles: DashMap::new(),
                emit_count: AtomicUsize::new(0),
                empty_emit_count: AtomicUsize::new(0),
            }),
        }
    }

    /// Возвращает хэндл канала по имени, создавая канал при первом запросе.
    ///
    /// Имя должно быть непустым после обрезки пробелов, иначе
    /// [`PubSubError::InvalidChannelName`]. Каноническая форма —
    /// `"ev-" + trim(name)`; повторный запрос того же имени возвращает
    /// закэшированный хэндл без повторной регистрации.
    pub fn resolve_or_create(&self, name: &str) -> PubSubResult<ChannelHandle> {
        if !is_valid_name(name) {
            return Err(PubSubError::InvalidChannelName);
        }
        let canonical = canonical_channel(name);

        if let Some(existing) = self.inner.handles.get(&canonical) {
            return Ok(existing.value().clone());
        }

        self.register_channel(&canonical)?;
        let handle = ChannelHandle::new(canonical.clone(), Arc::downgrade(&self.inner));
        handle.immutable();
        self.inner.handles.insert(canonical.clone(), handle.clone());
        debug!("registered channel '{}'", canonical);
        Ok(handle)
    }

    /// Регистрирует цель доставки и пустую таблицу слушателей.
    ///
    /// Защитный инвариант: создание канала при уже занятом каноническом
    /// имени — ошибка, хотя через публичный resolve-путь она недостижима.
    fn register_channel(&self, canonical: &Arc<str>) -> PubSubResult<()> {
        if self.inner.dispatchers.contains_key(canonical) {
            return Err(PubSubError::ChannelAlreadyExists(canonical.to_string()));
        }
        self.inner
            .dispatchers
            .insert(canonical.clone(), Arc::new(DispatchTarget::new()));
        self.inner.listeners.insert(canonical.clone(), HashMap::new());
        Ok(())
    }

    /// Уничтожает канал по каноническому имени.
    ///
    /// Неизвестное имя — тихий no-op (`false`). Иначе по одному отключает
    /// каждого зарегистрированного слушателя (в обратном порядке
    /// регистрации), затем убирает таблицу слушателей, цель доставки и
    /// хэндл. Следующий resolve того же имени создаёт свежий канал;
    /// старые хэндлы не возрождаются.
    pub fn destroy_channel(&self, canonical: &str) -> bool {
        if !self.inner.handles.contains_key(canonical) {
            return false;
        }

        let ids: Vec<String> = self
            .inner
            .listeners
            .get(canonical)
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default();
        if let Some(entry) = self.inner.dispatchers.get(canonical) {
            let target = entry.value().clone();
            drop(entry);
            for id in ids.iter().rev() {
                target.detach(id);
            }
        }

        if let Some((_, mut table)) = self.inner.listeners.remove(canonical) {
            table.clear();
        }
        self.inner.dispatchers.remove(canonical);
        self.inner.handles.remove(canonical);
        debug!("destroyed channel '{}'", canonical);
        true
    }

    /// Уничтожает все зарегистрированные каналы.
    ///
    /// Идёт по снимку текущих имён, поэтому мутация во время обхода
    /// (в том числе из колбэков) не пропускает и не дублирует каналы.
    /// Всегда сообщает об успехе.
    pub fn destroy_all(&self) -> bool {
        let names: Vec<Arc<str>> = self
            .inner
            .handles
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for name in names.iter().rev() {
            self.destroy_channel(name);
        }
        true
    }

    /// Список канонических имён живых каналов.
    pub fn active_channels(&self) -> Vec<String> {
        self.inner
            .handles
            .iter()
            .map(|entry| entry.key().to_string())
            .collect()
    }

    /// Количество живых каналов.
    pub fn channel_count(&self) -> usize {
        self.inner.handles.len()
    }

    /// Количество слушателей на канале (0 для неизвестного имени).
    pub fn listener_count(&self, canonical: &str) -> usize {
        self.inner
            .listeners
            .get(canonical)
            .map(|table| table.len())
            .unwrap_or(0)
    }

    /// Общее количество рассылок по живым каналам.
    pub fn emit_count(&self) -> usize {
        self.inner.emit_count.load(Ordering::Relaxed)
    }

    /// Количество рассылок без единого слушателя.
    pub fn empty_emit_count(&self) -> usize {
        self.inner.empty_emit_count.load(Ordering::Relaxed)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// === Глобальный фасад ===

/// Реестр процесса. Инициализируется при первом обращении.
static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

/// Глобальный реестр процесса (для интроспекции и статистики).
pub fn global() -> &'static Registry {
    &GLOBAL
}

/// Возвращает хэндл именованного канала из глобального реестра,
/// создавая канал при первом запросе.
pub fn channel(name: &str) -> PubSubResult<ChannelHandle> {
    GLOBAL.resolve_or_create(name)
}

/// Уничтожает все каналы глобального реестра.
pub fn destroy_all() -> bool {
    GLOBAL.destroy_all()
}
