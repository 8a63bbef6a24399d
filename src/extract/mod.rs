//! Display text recovery for the raw conversational artifacts of a record.
//!
//! Every function here is total: malformed or missing input degrades to one
//! of the sentinel strings, never to an error.

mod query;
mod recovery;
mod response;
mod tools;


pub use self::query::{NOT_AVAILABLE, QueryShape, extract_query, extract_user_message};
pub use self::response::extract_response;
pub use self::tools::extract_tools;

use crate::model::{EvaluationRecord, ExtractedContent, RAW_QUERY, RAW_RESPONSE, RAW_TOOLS_USED};

pub fn extract_content(record: &EvaluationRecord) -> ExtractedContent {
    let query_text = match record.prompt_text() {
        Some(prompt) => prompt.to_string(),
        None => extract_query(record.raw(RAW_QUERY)),
    };

    ExtractedContent {
        query_text,
        response_text: extract_response(record.raw(RAW_RESPONSE).unwrap_or_default()),
        tools_used_text: extract_tools(record.raw(RAW_TOOLS_USED).unwrap_or_default()),
    }
}
