use super::ports::SearchResult;

/// Tool output for a search that found nothing
pub const NO_RESULTS_SENTINEL: &str = "No results found.";

/// Render search results as a single block of model context
pub fn format_search_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_RESULTS_SENTINEL.to_string();
    }

    results
        .iter()
        .map(|r| format!("Title: {}\nLink: {}\nSnippet: {}", r.title, r.link, r.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(n: usize) -> SearchResult {
        SearchResult {
            title: format!("Lov om ekteskap {n}"),
            link: format!("https://lovdata.no/dokument/NL/lov/1991-07-04-47/{n}"),
            snippet: format!("Utdrag {n}"),
        }
    }

    #[test]
    fn test_empty_results_yield_sentinel() {
        assert_eq!(format_search_results(&[]), "No results found.");
    }

    #[test]
    fn test_single_result_layout() {
        let r = result(1);
        assert_eq!(
            format_search_results(std::slice::from_ref(&r)),
            format!("Title: {}\nLink: {}\nSnippet: {}", r.title, r.link, r.snippet)
        );
    }

    #[test]
    fn test_results_keep_order_without_trailing_separator() {
        let formatted = format_search_results(&[result(1), result(2), result(3)]);

        let blocks: Vec<&str> = formatted.split("\n\n").collect();
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].starts_with("Title: Lov om ekteskap 1"));
        assert!(blocks[2].starts_with("Title: Lov om ekteskap 3"));
        assert!(!formatted.ends_with('\n'));
    }

    #[test]
    fn test_empty_snippet_keeps_label() {
        let r = SearchResult {
            title: "Arveloven".to_string(),
            link: "https://lovdata.no/arveloven".to_string(),
            snippet: String::new(),
        };
        assert!(format_search_results(&[r]).ends_with("Snippet: "));
    }
}
