/// Rego identifiers that may never appear in a policy body: each reaches
/// outside the sandboxed evaluation the platform promises (network I/O,
/// wall-clock reads that break decision determinism).
pub const DENYLISTED_IMPORTS: &[&str] = &[
    "http.send",
    "net.lookup_ip_addr",
    "net.cidr_contains",
    "time.now_ns",
];

/// Scans `content` for denylisted imports or direct calls, per §4.5 step 2.
/// Catches both `import http.send` and bare `http.send(...)` usage.
#[must_use]
pub fn denylist_violations(content: &str) -> Vec<String> {
    DENYLISTED_IMPORTS
        .iter()
        .filter(|name| {
            let import_form = format!("import {name}");
            let call_form = format!("{name}(");
            content.contains(&import_form) || content.contains(&call_form)
        })
        .map(|name| format!("denylisted import: {name}"))
        .collect()
}

/// Checks for a `package` declaration, per §4.5 step 1. Runs unconditionally
/// ahead of compiler delegation, not only as part of the local fallback.
#[must_use]
pub fn missing_package_declaration(content: &str) -> Option<String> {
    if content.contains("package") {
        None
    } else {
        Some("missing 'package' declaration".to_owned())
    }
}

/// Balanced-delimiter check, the other half of the local fallback used when
/// the external compiler is unreachable (§4.5 step 3). Not a substitute for
/// real compilation, only a best-effort sanity check so Draft creation
/// doesn't hard-fail on a transport outage.
#[must_use]
pub fn unbalanced_delimiter_violations(content: &str) -> Vec<String> {
    let mut errors = Vec::new();

    for (open, close, label) in [('{', '}', "braces"), ('[', ']', "brackets"), ('(', ')', "parentheses")] {
        let opens = content.chars().filter(|c| *c == open).count();
        let closes = content.chars().filter(|c| *c == close).count();
        if opens != closes {
            errors.push(format!("unbalanced {label}"));
        }
    }

    errors
}

/// Local fallback structural check used when the external compiler is
/// unreachable (§4.5 step 3): a `package` declaration plus balanced
/// delimiters.
#[must_use]
pub fn local_structural_check(content: &str) -> Vec<String> {
    let mut errors: Vec<String> = missing_package_declaration(content).into_iter().collect();
    errors.extend(unbalanced_delimiter_violations(content));
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_import_statement_form() {
        let violations = denylist_violations("package p\nimport http.send\n");
        assert_eq!(violations, vec!["denylisted import: http.send".to_owned()]);
    }

    #[test]
    fn detects_direct_call_form() {
        let violations = denylist_violations("package p\nallow { http.send({}) }\n");
        assert_eq!(violations, vec!["denylisted import: http.send".to_owned()]);
    }

    #[test]
    fn clean_content_has_no_violations() {
        assert!(denylist_violations("package p\nallow := true\n").is_empty());
    }

    #[test]
    fn structural_check_flags_missing_package() {
        let errors = local_structural_check("allow := true");
        assert!(errors.contains(&"missing 'package' declaration".to_owned()));
    }

    #[test]
    fn structural_check_flags_unbalanced_braces() {
        let errors = local_structural_check("package p\nallow { true\n");
        assert!(errors.iter().any(|e| e.contains("braces")));
    }

    #[test]
    fn structural_check_passes_well_formed_content() {
        assert!(local_structural_check("package p\nallow { true }\n").is_empty());
    }
}
