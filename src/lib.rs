// Green GPT backend: an ecology true/false quiz service backed by an
// LLM, with a recovery parser that turns free-form model replies into
// validated questions.

pub mod api;
pub mod categories;
pub mod config;
pub mod db;
pub mod gamification;
pub mod json_extract;
pub mod llm;
pub mod metrics;
pub mod modes;
pub mod question;
