//! Symbol pool: one interned record per unique code address.
//!
//! A chained hash table keyed by address (`addr % buckets`). Symbols live in
//! an arena and buckets hold the head of an intrusive chain of arena indices,
//! so a [`SymbolHandle`] stays valid across resizes: growing the table only
//! rewires chains.
//!
//! The table grows by 50% whenever the fill degree goes above 80%.

use libsig_common::DEFAULT_POOL_SIZE;
use log::debug;

use crate::domain::{Address, TrackerError};

/// Non-owning reference to an interned symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolHandle(u32);

/// Resolution state of a symbol's name
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SymbolName {
    /// Never looked up
    #[default]
    Unresolved,
    /// Name from the bootstrap file or the host
    Resolved(String),
    /// The host had no name; never asked again
    Unknown,
}

#[derive(Debug)]
struct Symbol {
    address: Address,
    name: SymbolName,
    chain: Option<SymbolHandle>,
}

/// Resizable hash table of unique symbols
#[derive(Debug)]
pub struct SymbolPool {
    table: Vec<Option<SymbolHandle>>,
    symbols: Vec<Symbol>,
    entries: usize,
}

impl SymbolPool {
    /// Create a pool with the default bucket count
    #[must_use]
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_POOL_SIZE)
    }

    /// Create a pool with a custom initial bucket count (minimum 2)
    #[must_use]
    pub fn with_buckets(buckets: usize) -> Self {
        Self { table: vec![None; buckets.max(2)], symbols: Vec::new(), entries: 0 }
    }

    /// Number of interned symbols
    #[must_use]
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Current bucket count
    #[must_use]
    pub fn table_size(&self) -> usize {
        self.table.len()
    }

    /// Return the symbol for `addr`, creating an unresolved one if needed
    ///
    /// # Errors
    /// Returns [`TrackerError::ZeroAddress`] for the null address.
    pub fn intern(&mut self, addr: Address) -> Result<SymbolHandle, TrackerError> {
        if let Some(handle) = self.lookup(addr)? {
            return Ok(handle);
        }

        // Check fill degree and resize if needed (>80%)
        self.entries += 1;
        if 10 * self.entries / self.table.len() > 8 {
            self.resize();
        }

        #[allow(clippy::cast_possible_truncation)]
        let handle = SymbolHandle(self.symbols.len() as u32);
        let idx = bucket_index(addr, self.table.len());
        self.symbols.push(Symbol { address: addr, name: SymbolName::Unresolved, chain: self.table[idx] });
        self.table[idx] = Some(handle);

        Ok(handle)
    }

    /// Non-creating lookup
    ///
    /// # Errors
    /// Returns [`TrackerError::ZeroAddress`] for the null address.
    pub fn lookup(&self, addr: Address) -> Result<Option<SymbolHandle>, TrackerError> {
        if addr.is_null() {
            return Err(TrackerError::ZeroAddress);
        }

        let mut cursor = self.table[bucket_index(addr, self.table.len())];
        while let Some(handle) = cursor {
            let symbol = self.symbol(handle);
            if symbol.address == addr {
                return Ok(Some(handle));
            }
            cursor = symbol.chain;
        }

        Ok(None)
    }

    /// Address of an interned symbol
    #[must_use]
    pub fn address_of(&self, handle: SymbolHandle) -> Address {
        self.symbol(handle).address
    }

    /// Resolved name of a symbol, if any
    ///
    /// Unresolved and unknown symbols both return `None`.
    #[must_use]
    pub fn name_of(&self, handle: SymbolHandle) -> Option<&str> {
        match &self.symbol(handle).name {
            SymbolName::Resolved(name) => Some(name),
            SymbolName::Unresolved | SymbolName::Unknown => None,
        }
    }

    /// Full resolution state of a symbol
    #[must_use]
    pub fn name_state(&self, handle: SymbolHandle) -> &SymbolName {
        &self.symbol(handle).name
    }

    /// Set a symbol's name unless it has already been decided
    ///
    /// Returns false (and leaves the symbol untouched) if a name or the
    /// unknown marker was already set.
    pub fn set_name(&mut self, handle: SymbolHandle, name: Option<String>) -> bool {
        let symbol = self.symbol_mut(handle);
        if symbol.name != SymbolName::Unresolved {
            return false;
        }
        symbol.name = name.map_or(SymbolName::Unknown, SymbolName::Resolved);
        true
    }

    /// Resolve a symbol's name on first use
    ///
    /// `resolver` runs at most once per symbol over the pool's lifetime; a
    /// `None` answer is remembered as unknown.
    pub fn resolve_with<F>(&mut self, handle: SymbolHandle, resolver: F)
    where
        F: FnOnce(Address) -> Option<String>,
    {
        let symbol = self.symbol_mut(handle);
        if symbol.name == SymbolName::Unresolved {
            symbol.name = resolver(symbol.address).map_or(SymbolName::Unknown, SymbolName::Resolved);
        }
    }

    /// Tear the pool down, checking that every entry was accounted for
    ///
    /// # Errors
    /// Returns [`TrackerError::PoolLeak`] if the chains did not reach every
    /// counted entry.
    pub fn destroy(mut self) -> Result<(), TrackerError> {
        for bucket in &mut self.table {
            let mut cursor = bucket.take();
            while let Some(handle) = cursor {
                cursor = self.symbols[handle.0 as usize].chain.take();
                self.entries = self.entries.saturating_sub(1);
            }
        }

        if self.entries != 0 {
            return Err(TrackerError::PoolLeak { remaining: self.entries });
        }

        Ok(())
    }

    fn resize(&mut self) {
        // Increase table by 50%
        let new_size = self.table.len() * 3 / 2;
        let mut new_table: Vec<Option<SymbolHandle>> = vec![None; new_size];
        let mut conflicts = 0usize;

        for bucket in &mut self.table {
            let mut cursor = bucket.take();
            while let Some(handle) = cursor {
                let symbol = &mut self.symbols[handle.0 as usize];
                cursor = symbol.chain;

                let idx = bucket_index(symbol.address, new_size);
                symbol.chain = new_table[idx];
                if symbol.chain.is_some() {
                    conflicts += 1;
                }
                new_table[idx] = Some(handle);
            }
        }

        debug!(
            "Resize symbols pool: {} => {new_size} (entries {}, conflicts {conflicts})",
            self.table.len(),
            self.entries
        );

        self.table = new_table;
    }

    fn symbol(&self, handle: SymbolHandle) -> &Symbol {
        &self.symbols[handle.0 as usize]
    }

    fn symbol_mut(&mut self, handle: SymbolHandle) -> &mut Symbol {
        &mut self.symbols[handle.0 as usize]
    }
}

impl Default for SymbolPool {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
#[allow(clippy::cast_possible_truncation)]
fn bucket_index(addr: Address, size: usize) -> usize {
    (addr.0 % size as u64) as usize
}
