//! Two level symbol table.
use smol_str::SmolStr;
use std::collections::BTreeMap;

use crate::vm_writer::Segment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: SmolStr,
    /// Declared type, a primitive keyword or a class name.
    pub ty: SmolStr,
    pub kind: SymbolKind,
    /// Number of symbols of the same kind declared
    /// before this one, in the same scope.
    pub index: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Class variable shared by all instances.
    Static,
    /// Instance variable.
    Field,
    /// Subroutine parameter.
    Argument,
    /// Subroutine local variable.
    Local,
}

impl SymbolKind {
    /// Memory segment where variables of this kind live.
    #[rustfmt::skip]
    pub fn segment(&self) -> Segment {
        match self {
            Self::Static   => Segment::Static,
            Self::Field    => Segment::This,
            Self::Argument => Segment::Argument,
            Self::Local    => Segment::Local,
        }
    }

    /// Whether the kind belongs in class scope, as opposed to subroutine scope.
    #[inline]
    pub fn is_class_level(&self) -> bool {
        matches!(self, Self::Static | Self::Field)
    }
}

/// Outcome of [`SymbolTable::define`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Defined {
    Inserted,
    /// Name already exists in the scope; the table is unchanged.
    Duplicate,
    /// Every index of the kind is taken; the table is unchanged.
    Exhausted,
}

/// Name to symbol mapping with per kind counters.
#[derive(Debug, Default)]
struct Scope {
    symbols: BTreeMap<SmolStr, Symbol>,
    /// Counters indexed by [`Scope::slot`].
    counts: [u16; 2],
}

impl Scope {
    /// Each scope only holds two kinds, which share the counter slots.
    #[inline]
    fn slot(kind: SymbolKind) -> usize {
        match kind {
            SymbolKind::Static | SymbolKind::Argument => 0,
            SymbolKind::Field | SymbolKind::Local => 1,
        }
    }

    fn define(&mut self, name: &str, ty: &str, kind: SymbolKind) -> Defined {
        if self.symbols.contains_key(name) {
            return Defined::Duplicate;
        }

        let slot = Self::slot(kind);
        let index = self.counts[slot];
        match index.checked_add(1) {
            Some(count) => self.counts[slot] = count,
            None => return Defined::Exhausted,
        }

        self.symbols.insert(
            SmolStr::new(name),
            Symbol {
                name: SmolStr::new(name),
                ty: SmolStr::new(ty),
                kind,
                index,
            },
        );

        Defined::Inserted
    }

    #[inline]
    fn count(&self, kind: SymbolKind) -> u16 {
        self.counts[Self::slot(kind)]
    }

    fn clear(&mut self) {
        self.symbols.clear();
        self.counts = [0; 2];
    }
}

/// Class scope holding statics and fields, and a subroutine
/// scope holding arguments and locals.
///
/// Subroutine scope shadows class scope.
#[derive(Debug, Default)]
pub struct SymbolTable {
    class: Scope,
    subroutine: Scope,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the subroutine scope, in preparation for the next subroutine.
    pub fn start_subroutine(&mut self) {
        self.subroutine.clear();
    }

    /// Declare a name in the scope implied by its kind.
    ///
    /// The first definition of a name wins.
    pub fn define(&mut self, name: &str, ty: &str, kind: SymbolKind) -> Defined {
        let defined = self.scope_mut(kind).define(name, ty, kind);
        if defined == Defined::Inserted {
            log::trace!("define {kind:?} {ty} {name}");
        }
        defined
    }

    /// Look up a name, subroutine scope first.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.subroutine
            .symbols
            .get(name)
            .or_else(|| self.class.symbols.get(name))
    }

    #[inline]
    pub fn kind_of(&self, name: &str) -> Option<SymbolKind> {
        self.get(name).map(|symbol| symbol.kind)
    }

    #[inline]
    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.get(name).map(|symbol| symbol.ty.as_str())
    }

    #[inline]
    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.get(name).map(|symbol| symbol.index)
    }

    /// Number of symbols of the given kind in the scope that holds that kind.
    #[inline]
    pub fn var_count(&self, kind: SymbolKind) -> u16 {
        self.scope(kind).count(kind)
    }

    fn scope(&self, kind: SymbolKind) -> &Scope {
        if kind.is_class_level() {
            &self.class
        } else {
            &self.subroutine
        }
    }

    fn scope_mut(&mut self, kind: SymbolKind) -> &mut Scope {
        if kind.is_class_level() {
            &mut self.class
        } else {
            &mut self.subroutine
        }
    }
}
