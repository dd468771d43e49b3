// LLM job control. Jobs run in an external worker; this service only flips
// their status flag.

pub mod cancel;
pub mod handlers;
