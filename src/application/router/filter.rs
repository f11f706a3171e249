//! Category and keyword rules applied before fan-out.

use crate::domain::{Record, RejectReason};
use crate::infrastructure::config::filter::FilterConfig;

/// Compiled filter rules.
///
/// Keywords are lowercased once at construction; matching is a
/// case-insensitive substring test against `title + " " + body`.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    categories: Vec<String>,
    keywords: Vec<String>,
    exclude_keywords: Vec<String>,
    min_title_length: usize,
}

impl RecordFilter {
    #[must_use]
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            categories: config.categories.clone(),
            keywords: lowercase_all(&config.keywords),
            exclude_keywords: lowercase_all(&config.exclude_keywords),
            min_title_length: config.min_title_length,
        }
    }

    /// Check the minimum shape a record needs to be routed at all.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason when the title is empty or too short.
    pub fn validate(&self, record: &Record) -> Result<(), String> {
        let length = record.title.trim().chars().count();
        if length == 0 {
            return Err("missing title".to_string());
        }
        if length < self.min_title_length {
            return Err(format!(
                "title shorter than {} characters",
                self.min_title_length
            ));
        }
        Ok(())
    }

    /// Apply the category allow-list, then the keyword allow-list, then the
    /// deny-list. The first failing rule decides.
    ///
    /// # Errors
    ///
    /// Returns the [`RejectReason`] of the first rule that rejects.
    pub fn check(&self, record: &Record) -> Result<(), RejectReason> {
        if !self.categories.is_empty() && !self.matches_category(record) {
            return Err(RejectReason::Category);
        }

        if self.keywords.is_empty() && self.exclude_keywords.is_empty() {
            return Ok(());
        }
        let text = record.search_text();

        if !self.keywords.is_empty() && !self.keywords.iter().any(|k| text.contains(k.as_str())) {
            return Err(RejectReason::MissingKeyword);
        }

        if let Some(keyword) = self
            .exclude_keywords
            .iter()
            .find(|k| text.contains(k.as_str()))
        {
            return Err(RejectReason::ExcludedKeyword {
                keyword: keyword.clone(),
            });
        }

        Ok(())
    }

    fn matches_category(&self, record: &Record) -> bool {
        let id = record.catalog_id.to_string();
        self.categories
            .iter()
            .any(|c| *c == id || *c == record.catalog_name)
    }
}

fn lowercase_all(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::RecordBuilder;

    fn filter(categories: &[&str], keywords: &[&str], exclude: &[&str]) -> RecordFilter {
        let owned = |v: &[&str]| v.iter().map(|s| (*s).to_string()).collect();
        RecordFilter::new(&FilterConfig {
            categories: owned(categories),
            keywords: owned(keywords),
            exclude_keywords: owned(exclude),
            ..FilterConfig::default()
        })
    }

    #[test]
    fn empty_rules_accept_everything() {
        let record = RecordBuilder::new().title("Anything at all").build();
        assert_eq!(filter(&[], &[], &[]).check(&record), Ok(()));
    }

    #[test]
    fn category_matches_id_or_name() {
        let rules = filter(&["161", "Delisting"], &[], &[]);

        let by_id = RecordBuilder::new().catalog(161, "New Cryptocurrency Listing").build();
        let by_name = RecordBuilder::new().catalog(48, "Delisting").build();
        let neither = RecordBuilder::new().catalog(49, "Latest News").build();

        assert_eq!(rules.check(&by_id), Ok(()));
        assert_eq!(rules.check(&by_name), Ok(()));
        assert_eq!(rules.check(&neither), Err(RejectReason::Category));
    }

    #[test]
    fn keywords_match_case_insensitively_in_title_or_body() {
        let rules = filter(&[], &["LISTING"], &[]);

        let in_title = RecordBuilder::new().title("New Listing: XYZ").build();
        let in_body = RecordBuilder::new()
            .title("Notice")
            .body("a new listing is coming")
            .build();
        let missing = RecordBuilder::new().title("Maintenance notice").build();

        assert_eq!(rules.check(&in_title), Ok(()));
        assert_eq!(rules.check(&in_body), Ok(()));
        assert_eq!(rules.check(&missing), Err(RejectReason::MissingKeyword));
    }

    #[test]
    fn deny_list_wins_over_allow_list() {
        let rules = filter(&[], &["listing"], &["Futures"]);
        let record = RecordBuilder::new().title("New Listing: XYZ futures").build();

        assert_eq!(
            rules.check(&record),
            Err(RejectReason::ExcludedKeyword {
                keyword: "futures".to_string()
            })
        );
    }

    #[test]
    fn category_is_checked_before_keywords() {
        let rules = filter(&["161"], &["never-present"], &[]);
        let record = RecordBuilder::new().catalog(48, "Delisting").build();
        assert_eq!(rules.check(&record), Err(RejectReason::Category));
    }

    #[test]
    fn short_or_missing_title_is_invalid() {
        let rules = filter(&[], &[], &[]);
        assert!(rules.validate(&RecordBuilder::new().title("").build()).is_err());
        assert!(rules.validate(&RecordBuilder::new().title("Hey").build()).is_err());
        assert!(rules
            .validate(&RecordBuilder::new().title("Hello").build())
            .is_ok());
    }
}
