// SPDX-License-Identifier: MIT OR Apache-2.0
//! Version constraint solver for module source resolution (§4.1).
//!
//! `pick` chooses the version a module resolver should use out of the set
//! a registry reports, given an optional caller-supplied constraint
//! expression in Terraform's pessimistic-operator style (`~>`), not
//! cargo's caret/tilde `VersionReq` syntax.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use orc_error::CoreError;
use semver::Version;
use std::collections::BTreeSet;
use std::fmt;

/// A single comparison operator recognised in a constraint predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Pessimistic: allow the rightmost explicit component to increase.
    Pessimistic,
}

impl Op {
    /// Parse the operator prefix of a predicate, returning the operator and
    /// the remaining (version) text.
    fn parse(s: &str) -> Option<(Op, &str)> {
        // Longer tokens first so `!=` isn't mis-split as `=`.
        const TOKENS: &[(&str, Op)] = &[
            ("~>", Op::Pessimistic),
            ("!=", Op::Ne),
            ("<=", Op::Le),
            (">=", Op::Ge),
            ("=", Op::Eq),
            ("<", Op::Lt),
            (">", Op::Gt),
        ];
        for (token, op) in TOKENS {
            if let Some(rest) = s.strip_prefix(token) {
                return Some((*op, rest));
            }
        }
        None
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Pessimistic => "~>",
        };
        write!(f, "{s}")
    }
}

/// One parsed `<op><semver>` predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Predicate {
    op: Op,
    version: Version,
    /// Upper-exclusive bound for `~>`, computed from how many version
    /// components were explicit in the source text (major.minor vs.
    /// major.minor.patch).
    pessimistic_ceiling: Option<Version>,
}

impl Predicate {
    fn matches(&self, v: &Version) -> bool {
        match self.op {
            Op::Eq => v == &self.version,
            Op::Ne => v != &self.version,
            Op::Lt => v < &self.version,
            Op::Le => v <= &self.version,
            Op::Gt => v > &self.version,
            Op::Ge => v >= &self.version,
            Op::Pessimistic => {
                v >= &self.version
                    && self
                        .pessimistic_ceiling
                        .as_ref()
                        .is_none_or(|ceiling| v < ceiling)
            }
        }
    }
}

/// A full constraint expression: every predicate must be satisfied (AND).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    predicates: Vec<Predicate>,
}

impl Constraint {
    /// `true` if `version` satisfies every predicate in this constraint.
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.predicates.iter().all(|p| p.matches(version))
    }
}

/// Parse `text` as the version portion of a predicate, tolerating a
/// truncated `major` or `major.minor` form (only meaningful for `~>`; the
/// other operators still require a fully precise version per the
/// specification's `<op><semver>` grammar, but we don't reject extra
/// leniency there since it doesn't change behavior: missing components
/// default to zero).
///
/// Returns the parsed [`Version`] plus the number of explicit numeric
/// components (1, 2, or 3) found before any pre-release/build suffix.
fn parse_version_text(text: &str) -> Option<(Version, usize)> {
    let core_end = text.find(['-', '+']).unwrap_or(text.len());
    let (core, suffix) = text.split_at(core_end);
    let parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    let mut padded = parts.to_vec();
    while padded.len() < 3 {
        padded.push("0");
    }
    let full = format!("{}{}", padded.join("."), suffix);
    Version::parse(&full).ok().map(|v| (v, parts.len()))
}

/// Compute the upper-exclusive ceiling for a `~>` predicate given the
/// number of explicit components in its right-hand side.
fn pessimistic_ceiling(version: &Version, explicit_components: usize) -> Version {
    match explicit_components {
        // `~> 1.2` allows any 1.x.y, excludes 2.0.0.
        1 | 2 => Version::new(version.major + 1, 0, 0),
        // `~> 1.2.3` allows any 1.2.x >= 1.2.3, excludes 1.3.0.
        _ => Version::new(version.major, version.minor + 1, 0),
    }
}

fn parse_predicate(text: &str) -> Result<Predicate, CoreError> {
    let text = text.trim();
    let (op, rest) = Op::parse(text).ok_or_else(|| {
        CoreError::invalid(format!("malformed version constraint predicate: '{text}'"))
    })?;
    let (version, components) = parse_version_text(rest.trim()).ok_or_else(|| {
        CoreError::invalid(format!("malformed version in constraint predicate: '{text}'"))
    })?;
    let pessimistic_ceiling = matches!(op, Op::Pessimistic)
        .then(|| pessimistic_ceiling(&version, components));
    Ok(Predicate { op, version, pessimistic_ceiling })
}

/// Parse a full, comma-separated constraint expression.
///
/// # Errors
/// Returns [`orc_error::ErrorKind::Invalid`] if any predicate is malformed.
pub fn parse_constraint(text: &str) -> Result<Constraint, CoreError> {
    let predicates = text
        .split(',')
        .map(parse_predicate)
        .collect::<Result<Vec<_>, _>>()?;
    if predicates.is_empty() {
        return Err(CoreError::invalid("empty version constraint"));
    }
    Ok(Constraint { predicates })
}

/// Pick the version a module resolver should use (§4.1).
///
/// # Errors
/// - [`orc_error::ErrorKind::Invalid`] if `wanted` is present, isn't an
///   exact match, and fails to parse as a constraint expression.
/// - [`orc_error::ErrorKind::NotFound`] if no version in `versions`
///   satisfies the (possibly absent) constraint.
pub fn pick(versions: &BTreeSet<String>, wanted: Option<&str>) -> Result<String, CoreError> {
    if let Some(w) = wanted
        && versions.contains(w)
    {
        return Ok(w.to_string());
    }

    let constraint = wanted.map(parse_constraint).transpose()?;

    let mut candidates: Vec<(Version, &str)> = versions
        .iter()
        .filter_map(|v| Version::parse(v).ok().map(|sv| (sv, v.as_str())))
        .filter(|(sv, _)| sv.pre.is_empty())
        .filter(|(sv, _)| constraint.as_ref().is_none_or(|c| c.matches(sv)))
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0));

    candidates.last().map(|(_, s)| (*s).to_string()).ok_or_else(|| {
        if wanted.is_some() {
            CoreError::not_found("no matching version found")
        } else {
            CoreError::not_found("no available version found")
        }
    })
}
