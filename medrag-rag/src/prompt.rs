//! Prompt assembly for the generation model.
//!
//! The template is fixed: a system instruction block (medical assistant,
//! answer only from the provided context, disclose uncertainty), the
//! retrieved context verbatim in retrieval order, and the question. No
//! segment reordering or truncation happens here — the retriever's `top_k`
//! bound owns that responsibility.

/// Marker rendered in place of the context block when retrieval returned
/// nothing, so the model is still instructed not to fabricate details.
const NO_CONTEXT_MARKER: &str = "No context is available for this question.";

/// Assemble the instruction + context + question prompt.
///
/// Context segments are concatenated verbatim, separated by blank lines,
/// in the order the retriever produced them.
pub fn build_prompt(question: &str, context_segments: &[String]) -> String {
    let context = if context_segments.is_empty() {
        NO_CONTEXT_MARKER.to_string()
    } else {
        context_segments.join("\n\n")
    };

    format!(
        "<|system|>\n\
         You are an expert medical AI assistant. Provide accurate, concise, and evidence-based answers.\n\
         Use ONLY the provided context. If information is not in the context, say so clearly.\n\
         For patient data, cite specific measurements and values.</s>\n\
         <|user|>\n\
         Context Information:\n\
         {context}\n\
         \n\
         Question: {question}\n\
         \n\
         Instructions:\n\
         - Answer directly and concisely\n\
         - Use specific data from context\n\
         - For patient queries, mention exact values\n\
         - If uncertain, state limitations</s>\n\
         <|assistant|>\n"
    )
}
