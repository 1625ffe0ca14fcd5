//! The symbol table (spec.md §3, §4.2, §4.3) and the entry/external lists
//! built alongside it.
//!
//! Lookup order never matters for correctness here (names are unique by
//! construction, spec.md §4.3 step 2), but the *iteration* order of the
//! table feeds the `.ent`/`.ext` emission order, so an [`indexmap::IndexMap`]
//! is used in place of the teacher's `std::collections::HashMap` wherever
//! insertion order must be preserved.

use indexmap::IndexMap;

/// What a name in the symbol table currently stands for (spec.md §4.2).
/// Several kinds are promotion states a symbol passes through rather than
/// a final classification — see [`SymbolTable::promote_to_entry`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolKind {
    Extern,
    /// Declared with `.entry` before its defining line was seen.
    EntryPending,
    DataEntry,
    InstEntry,
    Data,
    Inst,
    Const,
}

/// spec.md §3: every kind carries both `address` and `value`, but only one
/// is meaningful at a time — `address` for `data`/`inst`/`*_entry` symbols
/// (a position in one of the images) and for `const` (the source line of
/// its definition, used to enforce "defined before use"); `value` only for
/// `const` (the defined integer).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub address: i32,
    pub value: i32,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            symbols: IndexMap::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    /// Inserts a brand-new symbol. Callers must have already checked
    /// [`SymbolTable::contains`] per the uniqueness invariant (spec.md
    /// §4.3 step 2) — this never overwrites.
    pub fn insert(&mut self, name: impl Into<String>, kind: SymbolKind, address: i32, value: i32) {
        let name = name.into();
        self.symbols.insert(
            name.clone(),
            Symbol {
                name,
                kind,
                address,
                value,
            },
        );
    }

    /// Moves a symbol from `EntryPending` to `DataEntry`/`InstEntry` once its
    /// defining line is found, or from `Data`/`Inst` to the matching entry
    /// kind once a later `.entry` line names it (spec.md §4.3 step 2's
    /// promotion rules). Panics if `name` is absent; callers only call this
    /// after confirming the symbol exists.
    pub fn promote_to_entry(&mut self, name: &str) {
        let symbol = self
            .symbols
            .get_mut(name)
            .expect("promote_to_entry called on an unknown symbol");
        symbol.kind = match symbol.kind {
            SymbolKind::EntryPending | SymbolKind::Data => SymbolKind::DataEntry,
            SymbolKind::Inst => SymbolKind::InstEntry,
            other => other,
        };
    }

    pub fn set_address(&mut self, name: &str, address: i32) {
        let symbol = self
            .symbols
            .get_mut(name)
            .expect("set_address called on an unknown symbol");
        symbol.address = address;
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Symbol> {
        self.symbols.values_mut()
    }
}

/// One external symbol and every address that referenced it, in the order
/// spec.md §3 "External reference list" pins down.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExternalRef {
    pub name: String,
    pub addresses: Vec<i32>,
}

/// `.extern` references recorded at each instruction word that used one
/// (spec.md §3 "External reference list", §6 ".ext file").
///
/// Construction policy (spec.md §3, §9 "Intrusive linked lists for entries
/// and externals"): a new address is prepended to *its own symbol's*
/// address list; a symbol seen for the first time is prepended to the
/// outer list. A symbol already present keeps its position in the outer
/// list — only its address list grows — so two references to the same
/// external interleaved with a reference to a different external do not
/// reorder the symbols relative to each other.
#[derive(Debug, Default)]
pub struct ExternalsList {
    refs: Vec<ExternalRef>,
}

impl ExternalsList {
    pub fn new() -> Self {
        ExternalsList::default()
    }

    pub fn record(&mut self, name: impl Into<String>, address: i32) {
        let name = name.into();
        match self.refs.iter_mut().find(|r| r.name == name) {
            Some(existing) => existing.addresses.insert(0, address),
            None => self.refs.insert(
                0,
                ExternalRef {
                    name,
                    addresses: vec![address],
                },
            ),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExternalRef> {
        self.refs.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

/// The `.entry` list (spec.md §6 ".ent file"), built the same way.
#[derive(Debug, Default)]
pub struct EntriesList {
    entries: Vec<(String, i32)>,
}

impl EntriesList {
    pub fn new() -> Self {
        EntriesList::default()
    }

    pub fn prepend(&mut self, name: impl Into<String>, value: i32) {
        self.entries.insert(0, (name.into(), value));
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, i32)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn insert_and_lookup() {
        let mut table = SymbolTable::new();
        table.insert("LOOP", SymbolKind::Inst, 100, 0);
        assert!(table.contains("LOOP"));
        assert_eq!(table.get("LOOP").unwrap().address, 100);
    }

    #[test]
    fn promote_pending_entry_to_data_entry() {
        let mut table = SymbolTable::new();
        table.insert("ARR", SymbolKind::EntryPending, 0, 0);
        table.promote_to_entry("ARR");
        assert_eq!(table.get("ARR").unwrap().kind, SymbolKind::DataEntry);
    }

    #[test]
    fn promote_existing_inst_to_inst_entry() {
        let mut table = SymbolTable::new();
        table.insert("LOOP", SymbolKind::Inst, 100, 0);
        table.promote_to_entry("LOOP");
        assert_eq!(table.get("LOOP").unwrap().kind, SymbolKind::InstEntry);
    }

    #[test]
    fn repeated_references_group_under_one_symbol_in_reverse_order() {
        let mut list = ExternalsList::new();
        list.record("EXT", 10);
        list.record("EXT", 20);
        let refs: Vec<_> = list.iter().cloned().collect();
        assert_eq!(
            refs,
            vec![ExternalRef {
                name: "EXT".to_string(),
                addresses: vec![20, 10],
            }]
        );
    }

    #[test]
    fn a_symbol_keeps_its_outer_position_when_referenced_again() {
        let mut list = ExternalsList::new();
        list.record("EXT", 101);
        list.record("EXT2", 102);
        list.record("EXT", 103);
        let refs: Vec<_> = list.iter().cloned().collect();
        assert_eq!(
            refs,
            vec![
                ExternalRef {
                    name: "EXT2".to_string(),
                    addresses: vec![102],
                },
                ExternalRef {
                    name: "EXT".to_string(),
                    addresses: vec![103, 101],
                },
            ]
        );
    }
}
