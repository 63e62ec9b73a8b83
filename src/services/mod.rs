pub(crate) mod content;
pub(crate) mod gemini;
pub(crate) mod publish;
