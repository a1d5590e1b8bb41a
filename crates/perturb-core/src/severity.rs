//! Уровень интенсивности искажения (1 - слабый, 5 - сильный)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::PerturbError;

/// Проверенный уровень интенсивности
///
/// Конструируется только через [`Severity::new`], поэтому индексация
/// таблиц параметров через [`Severity::pick`] не может выйти за границы.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Severity(u8);

impl Severity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(level: i64) -> Result<Self, PerturbError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&level) {
            Ok(Self(level as u8))
        } else {
            Err(PerturbError::SeverityOutOfRange(level))
        }
    }

    pub fn level(self) -> u8 {
        self.0
    }

    /// Все уровни по возрастанию
    pub fn all() -> impl Iterator<Item = Severity> {
        (Self::MIN..=Self::MAX).map(Severity)
    }

    /// Параметр из таблицы на пять уровней
    pub fn pick<T: Copy>(self, table: &[T; 5]) -> T {
        table[usize::from(self.0 - 1)]
    }
}

impl TryFrom<i64> for Severity {
    type Error = PerturbError;

    fn try_from(level: i64) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity.0
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
