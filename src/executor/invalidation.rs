use crate::store::CacheStore;

pub const PREFIX_DELIMITER: char = ':';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationTag<'a> {
    Exact(&'a str),
    Prefix(&'a str),
}

impl<'a> InvalidationTag<'a> {
    pub fn classify(tag: &'a str) -> Self {
        if tag.ends_with(PREFIX_DELIMITER) {
            Self::Prefix(tag)
        } else {
            Self::Exact(tag)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationReport {
    pub removed: usize,
    pub failures: Vec<String>,
}

impl InvalidationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub fn invalidate(store: &CacheStore, tags: &[String]) -> InvalidationReport {
    let mut report = InvalidationReport::default();
    let mut exact = Vec::new();

    for tag in tags {
        match InvalidationTag::classify(tag) {
            InvalidationTag::Prefix(prefix) => match store.invalidate_prefix(prefix) {
                Ok(removed) => report.removed += removed,
                Err(err) => report.failures.push(format!("prefix `{prefix}`: {err}")),
            },
            InvalidationTag::Exact(_) => exact.push(tag.clone()),
        }
    }

    if !exact.is_empty() {
        match store.invalidate_tags(&exact) {
            Ok(removed) => report.removed += removed,
            Err(err) => report
                .failures
                .push(format!("tags `{}`: {err}", exact.join(", "))),
        }
    }

    report
}
