//! Link properties: how one unit references another's skeleton.

use std::fmt;

/// Whether the referenced image is consumed as an assembly or as a module.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum ReferenceKind {
    /// A standalone assembly reference.
    #[default]
    Assembly,
    /// A module linked into the referencing assembly.
    Module,
}

/// The value-equality key under which a skeleton artifact memoizes its
/// references.
///
/// Immutable once built: the `with_*` methods return a new value.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct LinkProperties {
    kind: ReferenceKind,
    aliases: Vec<String>,
    embed_interop_types: bool,
}

impl LinkProperties {
    /// Properties for a plain assembly reference.
    pub fn assembly() -> Self {
        Self::default()
    }

    /// Properties for a module reference.
    pub fn module() -> Self {
        Self {
            kind: ReferenceKind::Module,
            ..Self::default()
        }
    }

    /// Returns a copy with the given extern aliases.
    pub fn with_aliases<I, S>(&self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            aliases: aliases.into_iter().map(Into::into).collect(),
            ..self.clone()
        }
    }

    /// Returns a copy with interop types embedded by value or not.
    pub fn with_embed_interop_types(&self, embed: bool) -> Self {
        Self {
            embed_interop_types: embed,
            ..self.clone()
        }
    }

    /// The reference kind.
    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }

    /// The extern aliases the referenced image is visible under.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Whether interop types are embedded into the referencing unit.
    pub fn embed_interop_types(&self) -> bool {
        self.embed_interop_types
    }
}

impl fmt::Display for LinkProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ReferenceKind::Assembly => "assembly",
            ReferenceKind::Module => "module",
        };
        f.write_str(kind)?;
        if !self.aliases.is_empty() {
            write!(f, " aliases={}", self.aliases.join(","))?;
        }
        if self.embed_interop_types {
            f.write_str(" embed")?;
        }
        Ok(())
    }
}
