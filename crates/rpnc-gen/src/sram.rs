//! SRAM layout for the ATmega328P.
//!
//! Named memories live in a fixed window right above the register file and
//! I/O space: `0x0120..0x0139`, 26 cells, one per name in first-seen order,
//! so the layout is a deterministic function of the TAC. Temporaries never
//! come through here - they are register-resident for the whole emission
//! run; the `.bss` section still reserves their `0x0100..0x011F` window.

use indexmap::IndexMap;

/// Base address of the named-memory window.
pub const NAMED_BASE: u16 = 0x0120;
/// Cells in the named-memory window (`0x0120..0x0139`).
pub const NAMED_CELLS: u16 = 26;

/// First-seen SRAM cell assignment for named memories.
pub struct SramLayout {
    named: IndexMap<String, u16>,
}

impl SramLayout {
    pub fn new() -> Self {
        Self {
            named: IndexMap::new(),
        }
    }

    /// Address of a named memory, assigning a cell on first sight.
    pub fn named_addr(&mut self, name: &str) -> u16 {
        if let Some(&addr) = self.named.get(name) {
            return addr;
        }
        let addr = NAMED_BASE + (self.named.len() as u16 % NAMED_CELLS);
        self.named.insert(name.to_string(), addr);
        addr
    }

    /// Named memories in assignment order.
    pub fn named_cells(&self) -> impl Iterator<Item = (&str, u16)> {
        self.named.iter().map(|(name, &addr)| (name.as_str(), addr))
    }
}

impl Default for SramLayout {
    fn default() -> Self {
        Self::new()
    }
}
