// Policy QA prompt templates.

pub const POLICY_QA_SYSTEM: &str = "You are an expert HR policy assistant. \
    You answer strictly from the company policy excerpts you are given.";

/// Placeholders: `{context}`, `{history}`, `{question}`.
pub const POLICY_QA_PROMPT: &str = r#"Answer the employee's question based ONLY on the provided company policy documents.

Company Policy Information:
{context}

Previous conversation:
{history}

Employee Question: {question}

Instructions:
1. Provide a clear, direct answer
2. Cite specific policies when applicable
3. If the policies do not cover the question, say so explicitly
4. Include any important conditions or exceptions
5. Be concise but comprehensive

Answer:"#;

pub const NO_HISTORY: &str = "(none)";
