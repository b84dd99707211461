//! Dependency specification parsing and representation.
//!
//! A dependency is a single atom from a `Requires`, `Requires.private`,
//! `Requires.internal`, `Conflicts`, or `Provides` field: a package name,
//! optionally followed by a version comparator and a version string, e.g.
//! `glib-2.0 >= 2.50`. Multiple atoms are separated by commas and/or
//! whitespace.

use std::fmt;

use crate::version::Comparator;

/// A single dependency atom: a package name with an optional version constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// The name of the required package (or provided name, for `Provides`).
    pub package: String,

    /// The version comparator. Defaults to [`Comparator::Any`] when no
    /// version constraint was given.
    pub compare: Comparator,

    /// The version to compare against, if a constraint was specified.
    pub version: Option<String>,

    /// Whether this dependency came from a `Requires.internal` field.
    ///
    /// Internal dependencies are resolved and satisfied like any other
    /// requirement, but their `Cflags` are excluded from a consuming
    /// package's compile flags unless the client disables that filtering.
    pub internal: bool,
}

impl Dependency {
    /// Create an unversioned dependency on `package`.
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            compare: Comparator::Any,
            version: None,
            internal: false,
        }
    }

    /// Create a dependency constrained to `compare version`.
    pub fn with_version(
        package: impl Into<String>,
        compare: Comparator,
        version: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            compare,
            version: Some(version.into()),
            internal: false,
        }
    }

    /// Return a copy of this dependency tagged as internal.
    pub fn into_internal(mut self) -> Self {
        self.internal = true;
        self
    }

    /// Whether this dependency carries a version constraint.
    pub fn has_version(&self) -> bool {
        self.version.is_some()
    }

    /// Check whether `candidate_version` satisfies this dependency's constraint.
    ///
    /// An unversioned dependency is satisfied by any version.
    pub fn version_satisfied_by(&self, candidate_version: &str) -> bool {
        match &self.version {
            Some(required) => self.compare.eval(candidate_version, required),
            None => true,
        }
    }
}

impl fmt::Display for Dependency {
    /// Render as `name` or `name op version`, matching the grammar [`DependencyList::parse`]
    /// accepts — round-tripping through `Display`/`parse` preserves meaning.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) if self.compare != Comparator::Any => {
                write!(f, "{} {} {}", self.package, self.compare.as_str(), v)
            }
            _ => write!(f, "{}", self.package),
        }
    }
}

/// An ordered list of [`Dependency`] atoms, as parsed from a single
/// `Requires`-like field value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyList {
    entries: Vec<Dependency>,
}

impl DependencyList {
    /// Create an empty dependency list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `Requires`-style field value into a list of dependency atoms.
    ///
    /// Atoms are separated by commas and/or runs of whitespace. Each atom is
    /// a package name optionally followed by a comparator (`<`, `<=`, `=`,
    /// `>=`, `>`, `!=`) and a version token. The parser is a small state
    /// machine over the characters of the field, since depending on
    /// formatting the name, operator, and version may or may not be
    /// separated by spaces (`foo>=1.0` and `foo >= 1.0` are both valid).
    ///
    /// Duplicate atoms for the same package name collide: an unconstrained
    /// (no comparator) atom is considered weaker and is replaced by any
    /// later constrained atom for the same name, and vice versa an already
    /// present constrained atom is not overwritten by a later unconstrained
    /// one. If neither atom is unconstrained, both are kept (pkgconf does
    /// not attempt to merge two differing version constraints itself; the
    /// resolver is responsible for rejecting graphs that cannot satisfy
    /// both).
    pub fn parse(value: &str) -> Self {
        let mut list = Self::new();
        for atom in split_atoms(value) {
            if let Some(dep) = parse_atom(&atom) {
                list.push(dep);
            }
        }
        list
    }

    /// Append a single dependency, applying the collision rule against any
    /// existing atom with the same package name.
    pub fn push(&mut self, dep: Dependency) {
        if let Some(existing_idx) = self.entries.iter().position(|d| d.package == dep.package) {
            let existing_unconstrained = !self.entries[existing_idx].has_version();
            let new_unconstrained = !dep.has_version();

            match (existing_unconstrained, new_unconstrained) {
                // Existing has no constraint, new one does: replace.
                (true, false) => self.entries[existing_idx] = dep,
                // Existing already constrained, new one unconstrained: keep existing.
                (false, true) => {}
                // Both unconstrained, or both constrained: keep both as distinct
                // atoms (matches pkgconf, which never silently drops a
                // constrained duplicate).
                _ => self.entries.push(dep),
            }
        } else {
            self.entries.push(dep);
        }
    }

    /// Append all entries from `other`, applying the same collision rule.
    pub fn append(&mut self, other: &DependencyList) {
        for dep in &other.entries {
            self.push(dep.clone());
        }
    }

    /// Iterate over the dependency atoms in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Dependency> {
        self.entries.iter()
    }

    /// Borrow the underlying slice of atoms.
    pub fn entries(&self) -> &[Dependency] {
        &self.entries
    }

    /// Whether this list has no atoms.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The number of atoms in this list.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<'a> IntoIterator for &'a DependencyList {
    type Item = &'a Dependency;
    type IntoIter = std::slice::Iter<'a, Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for DependencyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.entries.iter().map(|d| d.to_string()).collect();
        write!(f, "{}", rendered.join(", "))
    }
}

/// Split a `Requires`-style value into individual atom strings on commas,
/// collapsing any run of whitespace that also separates atoms.
///
/// This does not yet split name/operator/version apart — it only isolates
/// each comma-delimited (or otherwise self-contained) atom for
/// [`parse_atom`].
fn split_atoms(value: &str) -> Vec<String> {
    value
        .split(',')
        .flat_map(split_atoms_on_whitespace_boundaries)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// A single comma-delimited segment may itself contain multiple atoms
/// separated only by whitespace (e.g. `"foo bar >= 1.0"` is two atoms: `foo`
/// and `bar >= 1.0`). We use the atom grammar state machine to find the atom
/// boundaries rather than naively splitting on every space, since an atom's
/// name/operator/version may themselves be separated by spaces.
fn split_atoms_on_whitespace_boundaries(segment: &str) -> Vec<String> {
    let mut atoms = Vec::new();
    let mut remaining = segment.trim();

    while !remaining.is_empty() {
        let (atom, rest) = take_one_atom(remaining);
        if atom.is_empty() {
            break;
        }
        atoms.push(atom);
        remaining = rest.trim_start();
    }

    atoms
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum AtomState {
    Outside,
    InName,
    BeforeOp,
    InOp,
    AfterOp,
    InVersion,
}

/// Consume one atom (`name`, or `name op version`) from the front of `input`,
/// returning the consumed text and whatever remains.
///
/// This implements the dependency-string grammar as a small state machine:
/// a name is read until whitespace; if what follows (after skipping
/// whitespace) is an operator character, the operator and then the version
/// token are consumed as part of the same atom. If what follows is not an
/// operator, the name alone is the whole atom and a new atom begins.
fn take_one_atom(input: &str) -> (String, &str) {
    let mut state = AtomState::Outside;
    let mut end = 0;
    let bytes = input.as_bytes();

    while end < bytes.len() {
        let c = bytes[end] as char;
        match state {
            AtomState::Outside => {
                if c.is_whitespace() {
                    end += 1;
                } else {
                    state = AtomState::InName;
                }
            }
            AtomState::InName => {
                if c.is_whitespace() {
                    state = AtomState::BeforeOp;
                    end += 1;
                } else if is_operator_char(c) {
                    state = AtomState::InOp;
                } else {
                    end += 1;
                }
            }
            AtomState::BeforeOp => {
                if c.is_whitespace() {
                    end += 1;
                } else if is_operator_char(c) {
                    state = AtomState::InOp;
                } else {
                    // Next non-whitespace token is not an operator: the name
                    // atom ends here, and what follows starts a new atom.
                    break;
                }
            }
            AtomState::InOp => {
                if is_operator_char(c) {
                    end += 1;
                } else {
                    state = AtomState::AfterOp;
                }
            }
            AtomState::AfterOp => {
                if c.is_whitespace() {
                    end += 1;
                } else {
                    state = AtomState::InVersion;
                }
            }
            AtomState::InVersion => {
                if c.is_whitespace() {
                    break;
                } else {
                    end += 1;
                }
            }
        }
    }

    let atom = input[..end].trim_end();
    let rest = &input[end..];
    (atom.to_string(), rest)
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '<' | '>' | '=' | '!')
}

/// Parse a single atom string (`name`, `name op version`, or `name=version`)
/// into a [`Dependency`].
fn parse_atom(atom: &str) -> Option<Dependency> {
    let atom = atom.trim();
    if atom.is_empty() {
        return None;
    }

    // Find where the operator begins, if any.
    let op_start = atom.find(is_operator_char);

    match op_start {
        None => Some(Dependency::new(atom)),
        Some(idx) => {
            let name = atom[..idx].trim();
            if name.is_empty() {
                return None;
            }

            let rest = &atom[idx..];
            let op_len = rest
                .chars()
                .take_while(|c| is_operator_char(*c))
                .map(|c| c.len_utf8())
                .sum();
            let (op_str, version_str) = rest.split_at(op_len);
            let version = version_str.trim();

            // An operator string that doesn't match a known comparator falls
            // back to the `any` comparator rather than rejecting the atom.
            let compare = Comparator::from_str(op_str.trim()).unwrap_or(Comparator::Any);

            if version.is_empty() || compare == Comparator::Any {
                Some(Dependency::new(name))
            } else {
                Some(Dependency::with_version(name, compare, version))
            }
        }
    }
}
