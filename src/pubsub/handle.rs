use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{dispatch::WrappedCallback, intern::is_valid_name, registry::RegistryInner, DispatchEvent};
use crate::error::{PubSubError, PubSubResult};

/// Маркер вида capability-объекта. Проверяется по значению,
/// без рефлексии во время выполнения.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Channel,
}

/// Снимок собственного перечислимого состояния хэндла: только имя канала.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleSnapshot {
    pub event: String,
}

/// Capability-объект одного именованного канала.
///
/// Выдаётся реестром; на каждое каноническое имя существует один живой
/// экземпляр, повторные запросы возвращают его же. Само состояние каналов
/// хэндл не хранит — все операции идут через реестр, который его создал.
///
/// После уничтожения канала хэндл становится «мёртвым»: его операции
/// мягко завершаются неуспехом и не возрождают канал.
pub struct ChannelHandle {
    /// Каноническое имя канала (`"ev-" + name`).
    pub(crate) event: Arc<str>,
    kind: HandleKind,
    frozen: Arc<AtomicBool>,
    registry: Weak<RegistryInner>,
}

impl Clone for ChannelHandle {
    fn clone(&self) -> Self {
        Self {
            event: self.event.clone(),
            kind: self.kind,
            frozen: self.frozen.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl PartialEq for ChannelHandle {
    /// Идентичность хэндла: тот же реестр и то же interned каноническое имя.
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.registry, &other.registry) && Arc::ptr_eq(&self.event, &other.event)
    }
}

impl Eq for ChannelHandle {}

impl ChannelHandle {
    pub(crate) fn new(event: Arc<str>, registry: Weak<RegistryInner>) -> Self {
        Self {
            event,
            kind: HandleKind::Channel,
            frozen: Arc::new(AtomicBool::new(false)),
            registry,
        }
    }

    /// Возвращает каноническое имя канала, к которому привязан хэндл.
    pub fn channel_name(&self) -> &Arc<str> {
        &self.event
    }

    /// Вид capability-объекта.
    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    /// Канал жив: присутствует и в карте целей доставки, и в таблице слушателей.
    fn channel_exists(&self, inner: &RegistryInner) -> bool {
        inner.dispatchers.contains_key(&self.event) && inner.listeners.contains_key(&self.event)
    }

    /// Подписывает слушателя `(id, fn)` на канал.
    ///
    /// Слой намеренно снисходителен: пустой id тихо игнорируется, как и
    /// подписка через мёртвый хэндл. Повторный id на том же канале —
    /// ошибка [`PubSubError::ListenerAlreadyExists`].
    ///
    /// Колбэк получает только полезную нагрузку события (`detail`).
    pub fn subscribe<F>(&self, id: &str, f: F) -> PubSubResult<()>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        let Some(inner) = self.registry.upgrade() else {
            debug!("subscribe ignored: registry is gone (channel '{}')", self.event);
            return Ok(());
        };
        if !self.channel_exists(&inner) {
            debug!(
                "subscribe ignored: channel '{}' is not registered",
                self.event
            );
            return Ok(());
        }
        if !is_valid_name(id) {
            debug!("subscribe ignored: empty listener id on channel '{}'", self.event);
            return Ok(());
        }

        let target = match inner.dispatchers.get(&self.event) {
            Some(entry) => entry.value().clone(),
            None => return Ok(()),
        };

        let wrapped: WrappedCallback = Arc::new(move |event: &DispatchEvent| {
            f(event.detail.clone());
        });

        {
            let mut table = match inner.listeners.get_mut(&self.event) {
                Some(table) => table,
                None => return Ok(()),
            };
            if table.contains_key(id) {
                return Err(PubSubError::ListenerAlreadyExists {
                    id: id.to_string(),
                    channel: self.event.to_string(),
                });
            }
            table.insert(id.to_string(), wrapped.clone());
        }

        target.attach(id.to_string(), wrapped);
        debug!("subscribed listener '{}' on channel '{}'", id, self.event);
        Ok(())
    }

    /// Отписывает слушателя по id.
    ///
    /// Возвращает `false` без предупреждения, если id не зарегистрирован
    /// на живом канале; `false` с предупреждением — если сам хэндл или
    /// канал уже недействительны. Никогда не возвращает ошибку, чтобы
    /// код демонтажа мог вызываться безусловно.
    pub fn unsubscribe(&self, id: &str) -> bool {
        let inner = match self.registry.upgrade() {
            Some(inner) if self.channel_exists(&inner) => inner,
            _ => {
                warn!(
                    "no listener with id '{}' for channel '{}'",
                    id, self.event
                );
                return false;
            }
        };

        let removed = inner
            .listeners
            .get_mut(&self.event)
            .map(|mut table| table.remove(id).is_some())
            .unwrap_or(false);
        if !removed {
            return false;
        }

        if let Some(entry) = inner.dispatchers.get(&self.event) {
            let target = entry.value().clone();
            drop(entry);
            target.detach(id);
        }
        debug!("unsubscribed listener '{}' from channel '{}'", id, self.event);
        true
    }

    /// Синхронно рассылает нагрузку всем подключённым слушателям
    /// в порядке подписки, в потоке вызывающего.
    ///
    /// Доставка идёт по стабильному снимку, поэтому слушатель может
    /// менять таблицу (отписать себя, подписать других, уничтожить канал)
    /// прямо из колбэка. Возвращает число вызванных слушателей;
    /// рассылка без слушателей — успешный no-op.
    pub fn emit(&self, payload: Value) -> usize {
        let Some(inner) = self.registry.upgrade() else {
            debug!("emit ignored: registry is gone (channel '{}')", self.event);
            return 0;
        };
        let target = match inner.dispatchers.get(&self.event) {
            Some(entry) => entry.value().clone(),
            None => {
                debug!("emit ignored: channel '{}' is not registered", self.event);
                return 0;
            }
        };

        inner.emit_count.fetch_add(1, Ordering::Relaxed);
        let event = DispatchEvent::new(self.event.clone(), payload);
        let reached = target.dispatch(&event);
        if reached == 0 {
            inner.empty_emit_count.fetch_add(1, Ordering::Relaxed);
        }
        reached
    }

    /// Рассылка без нагрузки: `detail` — пустой JSON-объект.
    pub fn emit_empty(&self) -> usize {
        self.emit(Value::Object(serde_json::Map::new()))
    }

    /// Сериализует значение в JSON и рассылает его как нагрузку.
    pub fn emit_json<T: Serialize>(&self, value: &T) -> PubSubResult<usize> {
        let payload = serde_json::to_value(value)?;
        Ok(self.emit(payload))
    }

    /// Снимок собственного состояния хэндла (аналог `toObject`).
    pub fn snapshot(&self) -> HandleSnapshot {
        HandleSnapshot {
            event: self.event.to_string(),
        }
    }

    /// Идемпотентная заморозка хэндла: собственные поля больше не меняются.
    /// Повторный вызов — no-op, всегда сообщает об успехе.
    pub fn immutable(&self) -> bool {
        self.frozen.store(true, Ordering::Release);
        true
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }
}

impl fmt::Display for ChannelHandle {
    /// Сериализованная форма снимка (аналог `toString`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(&self.snapshot()).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl fmt::Debug for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelHandle")
            .field("event", &self.event)
            .field("kind", &self.kind)
            .field("frozen", &self.is_frozen())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Weak;

    use super::*;

    fn detached_handle(name: &str) -> ChannelHandle {
        ChannelHandle::new(Arc::from(name), Weak::new())
    }

    /// Тест проверяет снимок и строковую форму хэндла.
    #[test]
    fn test_snapshot_and_display() {
        let handle = detached_handle("ev-news");

        assert_eq!(
            handle.snapshot(),
            HandleSnapshot {
                event: "ev-news".into()
            }
        );
        assert_eq!(handle.to_string(), r#"{"event":"ev-news"}"#);
    }

    /// Тест проверяет маркер вида capability-объекта.
    #[test]
    fn test_kind_marker() {
        let handle = detached_handle("ev-x");
        assert_eq!(handle.kind(), HandleKind::Channel);
    }

    /// Тест проверяет идемпотентность заморозки.
    #[test]
    fn test_immutable_is_idempotent() {
        let handle = detached_handle("ev-x");
        assert!(!handle.is_frozen());
        assert!(handle.immutable());
        assert!(handle.is_frozen());
        assert!(handle.immutable(), "повторная заморозка — успех");
        assert!(handle.is_frozen());
    }

    /// Тест проверяет, что клон хэндла разделяет флаг заморозки.
    #[test]
    fn test_clone_shares_frozen_flag() {
        let handle = detached_handle("ev-x");
        let cloned = handle.clone();
        handle.immutable();
        assert!(cloned.is_frozen());
    }

    /// Тест проверяет мягкое поведение мёртвого хэндла: подписка тихо
    /// игнорируется, отписка возвращает false, рассылка — no-op.
    #[test]
    fn test_dead_handle_soft_failures() {
        let handle = detached_handle("ev-dead");

        assert!(handle.subscribe("a", |_payload| {}).is_ok());
        assert!(!handle.unsubscribe("a"));
        assert_eq!(handle.emit_empty(), 0);
    }
}
