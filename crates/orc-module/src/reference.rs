// SPDX-License-Identifier: MIT OR Apache-2.0
//! Module-source string parsing (§4.5 steps 1-3).

use orc_core::ModuleReference;
use orc_error::CoreError;

/// Result of classifying a raw module-source string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Parsed as a `host/namespace/name/system` registry address.
    Registry(ModuleReference),
    /// Not a registry address, but a valid generic remote (go-getter-style)
    /// source — e.g. a VCS URL. Callers treat this as a non-registry module
    /// and never reach the resolver.
    Remote,
}

/// Classify a module-source string (§4.5 steps 1-3).
///
/// # Errors
/// Returns [`orc_error::ErrorKind::Invalid`] if `source` is a local path
/// (`./`, `../`, or a leading `/`), names a non-empty registry subdirectory
/// (`//subdir`, unsupported), or is neither a valid registry address nor a
/// recognisable remote address.
pub fn parse_reference(source: &str) -> Result<ParseOutcome, CoreError> {
    let source = source.trim();
    if source.is_empty() {
        return Err(CoreError::invalid("module source must not be empty"));
    }
    if source.starts_with("./") || source.starts_with("../") || source.starts_with('/') {
        return Err(CoreError::invalid("local module sources are not supported"));
    }

    let (main, subdir) = match source.split_once("//") {
        Some((main, subdir)) => (main, Some(subdir)),
        None => (source, None),
    };

    let segments: Vec<&str> = main.split('/').collect();
    if segments.len() == 4 && segments.iter().all(|s| !s.is_empty()) {
        if subdir.is_some_and(|s| !s.is_empty()) {
            return Err(CoreError::invalid(
                "subdirectories are not supported for registry module sources",
            ));
        }
        return Ok(ParseOutcome::Registry(ModuleReference {
            host: segments[0].to_string(),
            namespace: segments[1].to_string(),
            name: segments[2].to_string(),
            system: segments[3].to_string(),
        }));
    }

    if is_valid_remote_address(source) {
        return Ok(ParseOutcome::Remote);
    }

    Err(CoreError::invalid(format!(
        "'{source}' is not a valid module source"
    )))
}

/// Loose validation of a go-getter-style remote address: a forced-getter
/// prefix (`git::`, `hg::`, `s3::`, ...), an explicit URL scheme, or a bare
/// `host.tld/path` shorthand (e.g. `github.com/org/repo`).
fn is_valid_remote_address(source: &str) -> bool {
    if source.contains("::") {
        return true;
    }
    if let Some(scheme_end) = source.find("://") {
        let scheme = &source[..scheme_end];
        return !scheme.is_empty()
            && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-');
    }
    let first_segment = source.split('/').next().unwrap_or("");
    first_segment.contains('.') && source.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_relative_local_paths() {
        for source in ["./modules/vpc", "../modules/vpc"] {
            let err = parse_reference(source).unwrap_err();
            assert_eq!(err.kind, orc_error::ErrorKind::Invalid);
        }
    }

    #[test]
    fn rejects_absolute_local_paths() {
        let err = parse_reference("/modules/vpc").unwrap_err();
        assert_eq!(err.kind, orc_error::ErrorKind::Invalid);
    }

    #[test]
    fn parses_registry_tuple() {
        let outcome = parse_reference("registry.example.com/ns/m/aws").unwrap();
        assert_eq!(
            outcome,
            ParseOutcome::Registry(ModuleReference {
                host: "registry.example.com".into(),
                namespace: "ns".into(),
                name: "m".into(),
                system: "aws".into(),
            })
        );
    }

    #[test]
    fn rejects_registry_tuple_with_subdir() {
        let err = parse_reference("registry.example.com/ns/m/aws//modules/child").unwrap_err();
        assert_eq!(err.kind, orc_error::ErrorKind::Invalid);
    }

    #[test]
    fn falls_back_to_remote_for_forced_getter_prefix() {
        let outcome = parse_reference("git::https://example.com/vpc.git").unwrap();
        assert_eq!(outcome, ParseOutcome::Remote);
    }

    #[test]
    fn falls_back_to_remote_for_github_shorthand() {
        let outcome = parse_reference("github.com/acme/terraform-vpc").unwrap();
        assert_eq!(outcome, ParseOutcome::Remote);
    }

    #[test]
    fn rejects_source_that_is_neither_registry_nor_remote() {
        let err = parse_reference("not-a-source").unwrap_err();
        assert_eq!(err.kind, orc_error::ErrorKind::Invalid);
    }
}
