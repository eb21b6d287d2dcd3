use url::Url;

use crate::config::RulePolicy;

/// Builds the rewrite rules that forbid requests not referred by `origin`.
///
/// The output is three lines: enable the rewrite engine, match referrers that do
/// not start with the origin (case-insensitive), and forbid the request. The
/// origin always ends with a slash so `https://example.com.evil` is not
/// mistaken for the site.
pub fn generate_rules(origin: &Url, policy: &RulePolicy) -> String {
    let mut origin = origin.as_str().to_string();
    if !origin.ends_with('/') {
        origin.push('/');
    }

    let mut rules = String::new();
    rules.push_str("RewriteEngine On\n");
    rules.push_str(&format!(
        "RewriteCond %{{HTTP_REFERER}} !^{origin}.*$ [NC]\n"
    ));
    rules.push_str(&format!("RewriteRule {} - [NC,L,F]\n", rule_pattern(policy)));
    rules
}

fn rule_pattern(policy: &RulePolicy) -> String {
    let extensions: Vec<&str> = match policy {
        RulePolicy::DenyAll => Vec::new(),
        RulePolicy::DenyExtensions { extensions } => extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.'))
            .filter(|ext| !ext.is_empty())
            .collect(),
    };

    // An empty extension list would match nothing; fall back to denying everything.
    if extensions.is_empty() {
        return ".*".to_string();
    }
    format!("\\.({})$", extensions.join("|"))
}
