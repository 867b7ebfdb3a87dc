use std::collections::BTreeMap;

use tracing::debug;

use crate::isp_frontend::stripe::types::FilterModule;

/// Table bank selection of stateful filter modules, carried across frames.
///
/// Both stripes of a frame are stamped with the same selection; the split
/// itself never changes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleHistory {
    banks: BTreeMap<FilterModule, u8>,
    generation: u64,
}

impl ModuleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking the stateful modules among `modules` on bank 0.
    pub fn track(modules: impl IntoIterator<Item = FilterModule>) -> Self {
        let banks = modules
            .into_iter()
            .filter(|m| m.is_stateful())
            .map(|m| (m, 0))
            .collect();
        Self {
            banks,
            generation: 0,
        }
    }

    /// Tracks the stateful modules among `modules`, keeping the current bank
    /// of those already tracked and starting new ones on bank 0.
    pub fn retrack(&self, modules: impl IntoIterator<Item = FilterModule>) -> Self {
        let banks: BTreeMap<FilterModule, u8> = modules
            .into_iter()
            .filter(|m| m.is_stateful())
            .map(|m| (m, self.bank(m).unwrap_or(0)))
            .collect();
        let generation = if banks == self.banks {
            self.generation
        } else {
            self.generation + 1
        };
        Self { banks, generation }
    }

    /// Flips the bank of every tracked module whose table is reprogrammed
    /// this frame. Returns whether any selection changed.
    pub fn advance(&mut self, reprogrammed: &[FilterModule]) -> bool {
        let mut changed = false;
        for module in reprogrammed {
            if let Some(bank) = self.banks.get_mut(module) {
                *bank ^= 1;
                changed = true;
                debug!(?module, bank = *bank, "Switched table bank");
            }
        }
        if changed {
            self.generation += 1;
        }
        changed
    }

    pub fn bank(&self, module: FilterModule) -> Option<u8> {
        self.banks.get(&module).copied()
    }

    pub fn snapshot(&self) -> Vec<(FilterModule, u8)> {
        self.banks.iter().map(|(m, b)| (*m, *b)).collect()
    }

    /// Increments whenever any bank selection changes.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
