// handlers/mod.rs - HTTP surface
//
// public    - no authentication (/, /health)
// cashcards - HTTP Basic authentication required (/cashcards/**)
//
// Handlers stay thin: they pull the Principal injected by
// middleware::auth, call CardService, and translate its outcome
// into a status code.
pub mod cashcards;
pub mod public;
