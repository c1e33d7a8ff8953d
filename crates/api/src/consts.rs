/// Response header carrying the conversation thread id
pub const THREAD_ID_HEADER: &str = "x-thread-id";

/// Appended to a streamed answer that could not be finished
pub const APOLOGY_MESSAGE: &str = "\n\nBeklager, noe gikk galt. Vennligst prøv igjen.";

/// Maximum length of a chat message, in characters
pub const MAX_MESSAGE_LENGTH: usize = 32_000;

/// Maximum length of a direct search query, in characters
pub const MAX_QUERY_LENGTH: usize = 1_000;

/// File-citation markers such as `【4:0†source】`
pub const CITATION_MARKER_PATTERN: &str = r"【[^】]*†[^】]*】";

/// Longest unclosed citation marker held back while waiting for its end, in bytes
pub const MAX_PENDING_MARKER_BYTES: usize = 256;

/// Maximum length of a thread id accepted from clients
pub const MAX_THREAD_ID_LENGTH: usize = 128;
