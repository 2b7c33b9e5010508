//! Подсистема Publish–Subscribe (pub/sub).
//!
//! Этот модуль реализует лёгкую систему pub/sub для внутрипроцессного
//! вещания именованных событий и управления подписками:
//!
//! - `registry`: реестр каналов — три согласованные карты (цели доставки,
//!   таблицы слушателей, живые хэндлы) и глобальный фасад.
//! - `handle`: capability-объект канала — subscribe/unsubscribe/emit.
//! - `dispatch`: цель доставки — упорядоченный список слушателей
//!   и синхронный веер по снимку.
//! - `message`: структура события доставки с JSON-нагрузкой.
//! - `intern` (приватный): канонизация имён каналов и интернирование.
//!
//! Публичный API переэкспортирует:
//! - `registry::*`
//! - `handle::*`
//! - `message::*`

pub mod dispatch;
pub mod handle;
mod intern;
pub mod message;
pub mod registry;

// Публичный экспорт основных типов из вложенных модулей,
// чтобы упростить доступ к ним из внешнего кода.
pub use dispatch::DispatchTarget;
pub use handle::{ChannelHandle, HandleKind, HandleSnapshot};
pub use message::DispatchEvent;
pub use registry::{channel, destroy_all, global, Registry};
