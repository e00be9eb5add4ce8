//! Intent classification.
//!
//! Decides whether a free-form query asks for diagnostics and which workflow
//! family answers it. Single-word keywords match whole words only, so "http"
//! never fires on "httpd" and "ping" never on "mapping"; phrases match as
//! substrings of the lower-cased query.

use tracing::debug;

use crate::catalog::{
    CONTEXTUAL_SYMPTOMS, CREATION_MARKERS, DIAGNOSTIC_VERBS, NETWORK_KEYWORDS,
    POD_SYMPTOM_KEYWORDS,
};
use crate::types::{Classification, WorkflowType};

/// Returns true if `keyword` occurs in the lower-cased `query`.
///
/// Purely alphanumeric keywords must match a whole word; anything else
/// (phrases, dotted names) is matched as a substring.
#[must_use]
pub fn contains_keyword(query: &str, keyword: &str) -> bool {
    if keyword.chars().all(char::is_alphanumeric) {
        words(query).any(|w| w == keyword)
    } else {
        query.contains(keyword)
    }
}

fn words(query: &str) -> impl Iterator<Item = &str> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

fn contains_any(query: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| contains_keyword(query, k))
}

fn mentions_pod(query: &str) -> bool {
    words(query).any(|w| w == "pod" || w == "pods")
}

/// Classifies a query.
///
/// Rules, first hit wins:
/// 1. creation/RBAC wording without any symptom word is not diagnostic
/// 2. a diagnostic verb together with "pod" selects pod diagnostics, even when
///    a network tool is also named
/// 3. the first network-tool keyword in catalog order selects its family
/// 4. a pod symptom keyword, or "pod" next to a symptom token, selects pod
///    diagnostics
/// 5. any remaining verb or symptom selects the general workflow
#[must_use]
pub fn classify(query: &str) -> Classification {
    let query = query.to_lowercase();

    let pod_symptom = contains_any(&query, POD_SYMPTOM_KEYWORDS);
    let contextual_symptom = contains_any(&query, CONTEXTUAL_SYMPTOMS);

    if !pod_symptom && !contextual_symptom && contains_any(&query, CREATION_MARKERS) {
        debug!("creation request without symptoms, not diagnostic");
        return Classification::not_diagnostic();
    }

    let pod = mentions_pod(&query);
    let verb = contains_any(&query, DIAGNOSTIC_VERBS);

    if verb && pod {
        return Classification::diagnostic(WorkflowType::PodDiagnostics);
    }

    if let Some(rule) = NETWORK_KEYWORDS
        .iter()
        .find(|r| contains_keyword(&query, r.keyword))
    {
        debug!(keyword = rule.keyword, workflow = %rule.workflow, "matched network keyword");
        return Classification::diagnostic(rule.workflow);
    }

    if pod_symptom || (pod && contextual_symptom) {
        return Classification::diagnostic(WorkflowType::PodDiagnostics);
    }

    if verb || contextual_symptom {
        return Classification::diagnostic(WorkflowType::General);
    }

    Classification::not_diagnostic()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod keyword_tests {
        use super::*;
        use test_case::test_case;

        #[test_case("troubleshoot the httpd pod", "http", false ; "http inside httpd")]
        #[test_case("show the mapping table", "ping", false ; "ping inside mapping")]
        #[test_case("check the image digest", "dig", false ; "dig inside digest")]
        #[test_case("ping 8.8.8.8 from web", "ping", true ; "whole word")]
        #[test_case("run tcpdump, then stop", "tcpdump", true ; "punctuation boundary")]
        #[test_case("do a packet capture on eth0", "packet capture", true ; "phrase")]
        #[test_case("show resolv.conf of web", "resolv.conf", true ; "dotted keyword")]
        fn test_contains_keyword(query: &str, keyword: &str, expected: bool) {
            assert_eq!(contains_keyword(query, keyword), expected);
        }
    }

    mod classify_tests {
        use super::*;
        use test_case::test_case;

        #[test_case("troubleshoot the httpd pod in app1 namespace", WorkflowType::PodDiagnostics ; "troubleshoot pod")]
        #[test_case("debug pod web-1 in shop", WorkflowType::PodDiagnostics ; "debug pod")]
        #[test_case("why is my pod crashing", WorkflowType::PodDiagnostics ; "why is pod crashing")]
        #[test_case("pod api is stuck in pending", WorkflowType::PodDiagnostics ; "stuck pending")]
        #[test_case("api keeps hitting CrashLoopBackOff", WorkflowType::PodDiagnostics ; "symptom keyword")]
        #[test_case("run tcpdump on pod web in shop", WorkflowType::Tcpdump ; "tcpdump")]
        #[test_case("ping google.com from pod web", WorkflowType::Ping ; "ping")]
        #[test_case("nslookup kubernetes.default from web", WorkflowType::Dns ; "nslookup")]
        #[test_case("curl http://api:8080/health from pod web", WorkflowType::Http ; "curl")]
        #[test_case("show netstat for pod web", WorkflowType::Netstat ; "netstat")]
        #[test_case("list open ports of web", WorkflowType::Netstat ; "open ports")]
        #[test_case("diagnose the cluster", WorkflowType::General ; "general verb")]
        fn test_diagnostic_queries(query: &str, expected: WorkflowType) {
            let classification = classify(query);
            assert!(classification.is_diagnostic, "{query} should be diagnostic");
            assert_eq!(classification.workflow, expected);
        }

        #[test_case("create a service account with admin access in the test namespace" ; "service account")]
        #[test_case("create a deployment called web" ; "create deployment")]
        #[test_case("apply this manifest to the test namespace" ; "apply")]
        #[test_case("grant admin access to user alice" ; "grant")]
        #[test_case("create a pod and check it pings google" ; "create with network keyword")]
        #[test_case("hello there" ; "small talk")]
        fn test_non_diagnostic_queries(query: &str) {
            let classification = classify(query);
            assert!(!classification.is_diagnostic, "{query} should not be diagnostic");
            assert_eq!(classification.workflow, WorkflowType::General);
        }

        #[test]
        fn test_diagnostic_verb_with_pod_outranks_network_keyword() {
            let classification = classify("troubleshoot tcpdump issues on the web pod");
            assert_eq!(classification.workflow, WorkflowType::PodDiagnostics);
        }

        #[test]
        fn test_creation_with_symptom_is_diagnostic() {
            let classification = classify("create failed, why is pod web pending");
            assert!(classification.is_diagnostic);
            assert_eq!(classification.workflow, WorkflowType::PodDiagnostics);
        }

        #[test]
        fn test_case_insensitive() {
            assert_eq!(
                classify("TROUBLESHOOT THE HTTPD POD").workflow,
                WorkflowType::PodDiagnostics
            );
        }
    }

    proptest! {
        #[test]
        fn creation_without_symptoms_is_never_diagnostic(
            verb in prop::sample::select(vec!["create", "apply", "Create", "APPLY"]),
            words in prop::collection::vec(
                prop::sample::select(vec![
                    "a", "service", "account", "deployment", "pod", "with", "admin",
                    "access", "in", "test", "namespace", "tcpdump", "ping", "web", "role",
                ]),
                0..8,
            ),
        ) {
            let query = format!("{verb} {}", words.join(" "));
            prop_assert!(!classify(&query).is_diagnostic);
        }

        #[test]
        fn classify_is_deterministic(query in "[a-zA-Z0-9 /.-]{0,60}") {
            prop_assert_eq!(classify(&query), classify(&query));
        }
    }
}
