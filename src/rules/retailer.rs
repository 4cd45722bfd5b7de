use crate::config::RetailerEntry;
use crate::rules::LinkClass;
use crate::ConfigError;
use regex::Regex;

/// Compiled URL rules for one retailer
///
/// Rules are matched against the path and query of a URL, never the host,
/// so numeric rules do not trip over ports or IP addresses.
#[derive(Debug, Clone)]
pub struct RetailerRuleSet {
    pattern: String,
    product: Vec<Regex>,
    pagination: Vec<Regex>,
    exclusions: Vec<Regex>,
}

impl RetailerRuleSet {
    /// Compiles a rule set from regex sources
    pub fn new<S: AsRef<str>>(
        pattern: &str,
        product: &[S],
        pagination: &[S],
        exclusions: &[S],
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            pattern: pattern.to_lowercase(),
            product: compile_all(pattern, product)?,
            pagination: compile_all(pattern, pagination)?,
            exclusions: compile_all(pattern, exclusions)?,
        })
    }

    /// Compiles a `[[retailers]]` config entry
    pub fn from_entry(entry: &RetailerEntry) -> Result<Self, ConfigError> {
        Self::new(
            &entry.domain,
            &entry.product,
            &entry.pagination,
            &entry.exclude,
        )
    }

    /// The domain pattern this rule set was registered for
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Classifies a path-and-query string
    ///
    /// Exclusions win over everything, then product rules, then pagination.
    pub fn classify_target(&self, target: &str) -> LinkClass {
        if self.exclusions.iter().any(|re| re.is_match(target)) {
            LinkClass::Irrelevant
        } else if self.product.iter().any(|re| re.is_match(target)) {
            LinkClass::Product
        } else if self.pagination.iter().any(|re| re.is_match(target)) {
            LinkClass::Pagination
        } else {
            LinkClass::Irrelevant
        }
    }
}

fn compile_all<S: AsRef<str>>(domain: &str, sources: &[S]) -> Result<Vec<Regex>, ConfigError> {
    sources
        .iter()
        .map(|source| {
            Regex::new(source.as_ref()).map_err(|e| ConfigError::InvalidRule {
                domain: domain.to_string(),
                message: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RetailerRuleSet {
        RetailerRuleSet::new(
            "*.shop.example",
            &[r"^/p/\d+"],
            &[r"^/c/", r"[?&]page=\d+"],
            &[r"^/p/\d+/reviews"],
        )
        .unwrap()
    }

    #[test]
    fn test_product_and_pagination() {
        let rules = sample();
        assert_eq!(rules.classify_target("/p/123"), LinkClass::Product);
        assert_eq!(rules.classify_target("/c/shoes"), LinkClass::Pagination);
        assert_eq!(rules.classify_target("/search?page=2"), LinkClass::Pagination);
        assert_eq!(rules.classify_target("/about"), LinkClass::Irrelevant);
    }

    #[test]
    fn test_exclusions_win() {
        let rules = sample();
        assert_eq!(rules.classify_target("/p/123/reviews"), LinkClass::Irrelevant);
    }

    #[test]
    fn test_invalid_regex_names_domain() {
        let err = RetailerRuleSet::new("shop.example", &["[a-"], &[], &[]).unwrap_err();
        match err {
            ConfigError::InvalidRule { domain, .. } => assert_eq!(domain, "shop.example"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_entry() {
        let entry = RetailerEntry {
            domain: "Shop.Example".to_string(),
            product: vec![r"/item/\d+".to_string()],
            pagination: vec![],
            exclude: vec![],
        };
        let rules = RetailerRuleSet::from_entry(&entry).unwrap();
        assert_eq!(rules.pattern(), "shop.example");
        assert_eq!(rules.classify_target("/item/42"), LinkClass::Product);
    }
}
