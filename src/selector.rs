use std::io::BufRead;

use tracing::info;

use crate::errors::Result;
use crate::feed::JsonLines;
use crate::models::{BusinessIdSet, BusinessRecord};

/// Scan the business feed and collect ids of businesses listed under
/// `category` (among other categories) in `region`.
pub fn select_businesses<R: BufRead>(feed: R, category: &str, region: &str) -> Result<BusinessIdSet> {
    let mut ids = BusinessIdSet::new();
    let mut scanned = 0usize;

    for record in JsonLines::<_, BusinessRecord>::new(feed) {
        let record = record?;
        scanned += 1;

        if record.matches(category, region) {
            ids.insert(record.business_id);
        }
    }

    info!(scanned, found = ids.len(), category, region, "Selected businesses");
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::errors::PipelineError;

    const FEED: &str = concat!(
        r#"{"business_id":"keep","categories":["Cafes","Bakeries"],"state":"NV"}"#, "\n",
        r#"{"business_id":"only-cafe","categories":["Cafes"],"state":"NV"}"#, "\n",
        r#"{"business_id":"elsewhere","categories":["Cafes","Bakeries"],"state":"AZ"}"#, "\n",
        r#"{"business_id":"no-cafe","categories":["Bars","Pubs"],"state":"NV"}"#, "\n",
    );

    #[test]
    fn applies_category_count_and_region_rules() {
        let ids = select_businesses(Cursor::new(FEED), "Cafes", "NV").unwrap();
        assert_eq!(ids, BusinessIdSet::from(["keep".to_string()]));
    }

    #[test]
    fn duplicate_lines_do_not_change_the_result() {
        let doubled = format!("{FEED}{FEED}");
        let once = select_businesses(Cursor::new(FEED), "Cafes", "NV").unwrap();
        let twice = select_businesses(Cursor::new(doubled), "Cafes", "NV").unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.len(), 1);
    }

    #[test]
    fn malformed_line_is_fatal() {
        let feed = format!("{FEED}{{\"business_id\": 7}}\n");
        let err = select_businesses(Cursor::new(feed), "Cafes", "NV").unwrap_err();
        assert!(matches!(err, PipelineError::Decode { line: 5, .. }));
    }

    #[test]
    fn invalid_utf8_line_is_a_decode_error() {
        let mut feed = FEED.as_bytes().to_vec();
        feed.extend_from_slice(b"{\"business_id\":\"x\",\"categories\":[\"Caf\xe9s\",\"Tea\"],\"state\":\"NV\"}\n");
        let err = select_businesses(Cursor::new(feed), "Cafes", "NV").unwrap_err();
        assert!(matches!(err, PipelineError::Decode { line: 5, .. }), "{err:?}");
    }

    #[test]
    fn empty_feed_selects_nothing() {
        let ids = select_businesses(Cursor::new(""), "Cafes", "NV").unwrap();
        assert!(ids.is_empty());
    }
}
