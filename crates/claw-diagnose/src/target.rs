//! Target extraction.
//!
//! Pulls the pod, namespace and network-probe parameters out of a free-form
//! query. Rules are tried in the order listed; the combined pod+namespace
//! shapes come first because the generic "pod X" rule would otherwise take
//! the namespace token as a pod name.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::catalog::NOISE_WORDS;
use crate::types::Target;

/// Namespace used when neither the query nor configuration names one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// A named extraction pattern.
#[derive(Debug)]
pub struct ExtractionRule {
    /// Rule name, for logging.
    pub name: &'static str,
    /// Pattern with `pod` and/or `ns` (or `v`) capture groups.
    pub pattern: Regex,
}

fn extraction_rule(name: &'static str, pattern: &str) -> ExtractionRule {
    let pattern = pattern.replace("NAME", r"[a-z0-9][a-z0-9._-]*");
    ExtractionRule {
        name,
        pattern: Regex::new(&pattern).unwrap_or_else(|_| unreachable!()),
    }
}

/// Pod+namespace shapes, most specific first.
pub static COMBINED_RULES: Lazy<Vec<ExtractionRule>> = Lazy::new(|| {
    vec![
        extraction_rule(
            "<pod> pod in <ns> namespace",
            r"\b(?P<pod>NAME)\s+pod\s+in\s+(?:the\s+)?(?P<ns>NAME)(?:\s+namespace)?",
        ),
        extraction_rule(
            "pod <pod> in <ns>",
            r"\bpods?\s+(?:named\s+|called\s+)?(?P<pod>NAME)\s+in\s+(?:the\s+)?(?:namespace\s+)?(?P<ns>NAME)",
        ),
        extraction_rule(
            "<ns>/<pod>",
            r"(?:^|\s)(?P<ns>NAME)/(?P<pod>NAME)(?:$|[\s?!,;])",
        ),
    ]
});

/// Isolated pod mentions.
pub static POD_RULES: Lazy<Vec<ExtractionRule>> = Lazy::new(|| {
    vec![
        extraction_rule(
            "why is <pod> pod",
            r"\bwhy\s+is\s+(?:the\s+)?(?P<pod>NAME)\s+pod\b",
        ),
        extraction_rule(
            "pod <pod>",
            r"\bpods?\s+(?:named\s+|called\s+)?(?P<pod>NAME)",
        ),
        extraction_rule("<pod> pod", r"\b(?P<pod>NAME)\s+pod\b"),
    ]
});

/// Isolated namespace mentions.
pub static NAMESPACE_RULES: Lazy<Vec<ExtractionRule>> = Lazy::new(|| {
    vec![
        extraction_rule("<ns> namespace", r"\b(?P<ns>NAME)\s+namespace\b"),
        extraction_rule("namespace <ns>", r"\bnamespace\s+(?P<ns>NAME)"),
        extraction_rule("-n <ns>", r"(?:^|\s)(?:-n|--namespace)[\s=]+(?P<ns>NAME)"),
        // only as the last words of the query
        extraction_rule("in <ns>", r"\bin\s+(?:the\s+)?(?P<ns>NAME)[?!.]*$"),
    ]
});

static INTERFACE_RULES: Lazy<Vec<ExtractionRule>> = Lazy::new(|| {
    vec![
        extraction_rule("interface <if>", r"\b(?:interface|iface)\s+(?P<v>[a-z0-9@._-]+)"),
        extraction_rule("-i <if>", r"(?:^|\s)-i\s+(?P<v>[a-z0-9@._-]+)"),
        extraction_rule(
            "on <if>",
            r"\bon\s+(?P<v>(?:eth|ens|enp|eno|lo|veth|tun|wg|cali|flannel|cni|docker|br)[a-z0-9@._-]*)",
        ),
    ]
});

static QUOTED_FILTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bfilter\s+(?:"(?P<dq>[^"]+)"|'(?P<sq>[^']+)')"#).unwrap_or_else(|_| unreachable!())
});

static FILTER_PARTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?P<v>(?:(?:tcp|udp)\s+)?port\s+\d+|host\s+[a-z0-9._:-]+)")
        .unwrap_or_else(|_| unreachable!())
});

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?P<n>\d+)\s*(?P<u>seconds|second|secs|sec|s|minutes|minute|mins|min|m)\b")
        .unwrap_or_else(|_| unreachable!())
});

static URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bhttps?://\S+").unwrap_or_else(|_| unreachable!()));

static DESTINATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:ping|nslookup|dig|resolve|resolving|curl|wget|reach|to)\s+(?P<v>[a-z0-9-]+(?:\.[a-z0-9-]+)+(?::\d+)?(?:/\S*)?)",
    )
    .unwrap_or_else(|_| unreachable!())
});

fn clean(value: &str) -> Option<String> {
    let value = value.trim_end_matches(['.', '-', '_']);
    if value.is_empty() || NOISE_WORDS.contains(&value) {
        None
    } else {
        Some(value.to_string())
    }
}

fn first_match(rules: &[ExtractionRule], query: &str, group: &str) -> Option<String> {
    rules.iter().find_map(|rule| {
        rule.pattern.captures_iter(query).find_map(|caps| {
            let value = clean(caps.name(group)?.as_str())?;
            debug!(rule = rule.name, value = %value, "extraction rule matched");
            Some(value)
        })
    })
}

fn first_pair(rules: &[ExtractionRule], query: &str) -> Option<(String, String)> {
    rules.iter().find_map(|rule| {
        rule.pattern.captures_iter(query).find_map(|caps| {
            let pod = clean(caps.name("pod")?.as_str())?;
            let ns = clean(caps.name("ns")?.as_str())?;
            debug!(rule = rule.name, pod = %pod, namespace = %ns, "extraction rule matched");
            Some((pod, ns))
        })
    })
}

fn extract_filter(query: &str) -> Option<String> {
    if let Some(caps) = QUOTED_FILTER.captures(query) {
        return caps
            .name("dq")
            .or_else(|| caps.name("sq"))
            .map(|m| m.as_str().trim().to_string());
    }

    let parts: Vec<&str> = FILTER_PARTS
        .captures_iter(query)
        .filter_map(|caps| caps.name("v").map(|m| m.as_str()))
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" and "))
    }
}

fn extract_duration(query: &str) -> Option<u64> {
    let caps = DURATION.captures(query)?;
    let amount: u64 = caps.name("n")?.as_str().parse().ok()?;
    let unit = caps.name("u")?.as_str();
    if unit.starts_with('m') {
        amount.checked_mul(60)
    } else {
        Some(amount)
    }
}

fn extract_destination(query: &str) -> Option<String> {
    let found = URL
        .find(query)
        .map(|m| m.as_str())
        .or_else(|| DESTINATION.captures(query).and_then(|c| c.name("v")).map(|m| m.as_str()))?;
    let trimmed = found.trim_end_matches(['.', ',', '?', '!', ';', ')', '"', '\'']);
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Extracts a target, falling back to the `"default"` namespace.
#[must_use]
pub fn extract(query: &str) -> Target {
    extract_with_default(query, DEFAULT_NAMESPACE)
}

/// Extracts a target, falling back to `default_namespace`.
///
/// Pure: the same query and default always give the same target.
#[must_use]
pub fn extract_with_default(query: &str, default_namespace: &str) -> Target {
    let query = query.to_lowercase();

    let (pod, namespace) = match first_pair(&COMBINED_RULES, &query) {
        Some((pod, ns)) => (Some(pod), Some(ns)),
        None => (
            first_match(&POD_RULES, &query, "pod"),
            first_match(&NAMESPACE_RULES, &query, "ns"),
        ),
    };

    let mut target = Target::new(namespace.unwrap_or_else(|| default_namespace.to_string()));
    if let Some(pod) = pod {
        target = target.with_resource(pod);
    }
    target.interface = first_match(&INTERFACE_RULES, &query, "v");
    target.filter = extract_filter(&query);
    target.duration_secs = extract_duration(&query);
    target.destination = extract_destination(&query);
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod pod_namespace_tests {
        use super::*;
        use test_case::test_case;

        #[test_case("troubleshoot the httpd pod in app1 namespace", "httpd", "app1" ; "pod in namespace")]
        #[test_case("why is the web-1 pod in the shop namespace failing", "web-1", "shop" ; "pod in the namespace")]
        #[test_case("check pod httpd in app1", "httpd", "app1" ; "pod x in y")]
        #[test_case("debug pod named api-7d9f in namespace payments", "api-7d9f", "payments" ; "named in namespace")]
        #[test_case("look at app1/httpd please", "httpd", "app1" ; "slash shape")]
        #[test_case("why is httpd pod crashing in namespace app1", "httpd", "app1" ; "why is with namespace")]
        #[test_case("debug pod web -n shop", "web", "shop" ; "dash n flag")]
        #[test_case("Troubleshoot the HTTPD pod in APP1 namespace", "httpd", "app1" ; "mixed case")]
        fn test_extracts_pod_and_namespace(query: &str, pod: &str, namespace: &str) {
            let target = extract(query);
            assert!(target.found);
            assert_eq!(target.pod_name(), Some(pod));
            assert_eq!(target.namespace, namespace);
        }

        #[test_case("why is httpd pod failing in app1", "httpd", "app1" ; "trailing in")]
        #[test_case("why is the web pod crashing in the shop?", "web", "shop" ; "trailing in the")]
        fn test_trailing_namespace(query: &str, pod: &str, namespace: &str) {
            let target = extract(query);
            assert_eq!(target.pod_name(), Some(pod));
            assert_eq!(target.namespace, namespace);
        }

        #[test]
        fn test_trailing_in_cluster_is_not_a_namespace() {
            let target = extract("why is the web pod crashing in the cluster");
            assert_eq!(target.pod_name(), Some("web"));
            assert_eq!(target.namespace, "default");
        }

        #[test]
        fn test_pod_without_namespace_uses_default() {
            let target = extract("why is the api-server pod restarting");
            assert_eq!(target.pod_name(), Some("api-server"));
            assert_eq!(target.namespace, "default");
        }

        #[test]
        fn test_custom_default_namespace() {
            let target = extract_with_default("debug pod web", "staging");
            assert_eq!(target.pod_name(), Some("web"));
            assert_eq!(target.namespace, "staging");
        }

        #[test]
        fn test_namespace_only_query() {
            let target = extract("show failing pods in the payments namespace");
            assert!(!target.found);
            assert!(target.pod_name().is_none());
            assert_eq!(target.namespace, "payments");
        }

        #[test_case("why is my pod crashing" ; "pronoun")]
        #[test_case("why is the pod failing" ; "article")]
        #[test_case("check pod status" ; "status word")]
        #[test_case("diagnose the cluster" ; "no pod at all")]
        fn test_noise_is_not_a_pod(query: &str) {
            let target = extract(query);
            assert!(!target.found, "{query} should not yield a pod");
            assert_eq!(target.namespace, "default");
        }

        #[test]
        fn test_url_is_not_namespace_slash_pod() {
            let target = extract("curl http://api:8080/health from pod web");
            assert_eq!(target.pod_name(), Some("web"));
            assert_eq!(target.namespace, "default");
        }

        #[test]
        fn test_trailing_punctuation_is_trimmed() {
            let target = extract("troubleshoot app1/httpd.");
            assert_eq!(target.pod_name(), Some("httpd"));
        }
    }

    mod network_parameter_tests {
        use super::*;

        #[test]
        fn test_interface_filter_and_duration() {
            let target =
                extract("run tcpdump on pod web in shop on interface eth0 port 443 for 30 seconds");
            assert_eq!(target.pod_name(), Some("web"));
            assert_eq!(target.namespace, "shop");
            assert_eq!(target.interface.as_deref(), Some("eth0"));
            assert_eq!(target.filter.as_deref(), Some("port 443"));
            assert_eq!(target.duration_secs, Some(30));
        }

        #[test]
        fn test_on_interface_shorthand() {
            let target = extract("capture traffic on eth1 of pod web");
            assert_eq!(target.interface.as_deref(), Some("eth1"));
        }

        #[test]
        fn test_quoted_filter_wins() {
            let target = extract("tcpdump pod web filter \"tcp port 80 and host 10.0.0.5\"");
            assert_eq!(target.filter.as_deref(), Some("tcp port 80 and host 10.0.0.5"));
        }

        #[test]
        fn test_combined_filter_parts() {
            let target = extract("tcpdump pod web port 53 host 10.0.0.10");
            assert_eq!(target.filter.as_deref(), Some("port 53 and host 10.0.0.10"));
        }

        #[test]
        fn test_minutes_convert_to_seconds() {
            assert_eq!(extract("capture packets for 2 minutes").duration_secs, Some(120));
            assert_eq!(extract("capture packets for 15s").duration_secs, Some(15));
        }

        #[test]
        fn test_destinations() {
            assert_eq!(
                extract("ping google.com from pod web").destination.as_deref(),
                Some("google.com")
            );
            assert_eq!(
                extract("nslookup kubernetes.default from pod web").destination.as_deref(),
                Some("kubernetes.default")
            );
            assert_eq!(
                extract("curl http://api:8080/health from pod web").destination.as_deref(),
                Some("http://api:8080/health")
            );
            assert_eq!(extract("ping from pod web").destination, None);
        }
    }

    proptest! {
        #[test]
        fn extract_is_pure(query in "[a-zA-Z0-9 /._-]{0,80}") {
            prop_assert_eq!(extract(&query), extract(&query));
        }

        #[test]
        fn troubleshoot_shape_round_trips(
            pod in "[a-z][a-z0-9-]{1,12}[a-z0-9]",
            ns in "[a-z][a-z0-9-]{1,12}[a-z0-9]",
        ) {
            prop_assume!(!NOISE_WORDS.contains(&pod.as_str()));
            prop_assume!(!NOISE_WORDS.contains(&ns.as_str()));
            let target = extract(&format!("troubleshoot the {pod} pod in {ns} namespace"));
            prop_assert!(target.found);
            prop_assert_eq!(target.pod_name(), Some(pod.as_str()));
            prop_assert_eq!(target.namespace, ns);
        }
    }
}
