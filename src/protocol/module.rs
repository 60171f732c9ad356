//! Module identity: the closed set of field modules and their wire identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source byte the host puts on every frame it sends
pub const HOST_SOURCE: u8 = 0x7F;

/// A physical field-installed control module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModuleKind {
    SteeringActuator,
    ImplementController,
    InertialUnit,
}

impl ModuleKind {
    /// Every module kind, in a stable order
    pub const ALL: [ModuleKind; 3] = [
        ModuleKind::SteeringActuator,
        ModuleKind::ImplementController,
        ModuleKind::InertialUnit,
    ];

    /// Source byte carried on frames originated by this module
    pub const fn source(self) -> u8 {
        match self {
            ModuleKind::SteeringActuator => 0x7E,
            ModuleKind::ImplementController => 0x7B,
            ModuleKind::InertialUnit => 0x79,
        }
    }

    /// PGN of the hello this module sends
    pub const fn hello_pgn(self) -> u8 {
        match self {
            ModuleKind::SteeringActuator => 126,
            ModuleKind::ImplementController => 123,
            ModuleKind::InertialUnit => 121,
        }
    }

    pub fn from_source(source: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.source() == source)
    }

    pub fn from_hello_pgn(pgn: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.hello_pgn() == pgn)
    }

    /// Dense index for fixed-size per-module tables
    pub(crate) const fn index(self) -> usize {
        match self {
            ModuleKind::SteeringActuator => 0,
            ModuleKind::ImplementController => 1,
            ModuleKind::InertialUnit => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ModuleKind::SteeringActuator => "steering",
            ModuleKind::ImplementController => "implement",
            ModuleKind::InertialUnit => "imu",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
