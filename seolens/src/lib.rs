// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    AuditOptions, InitPaths, initialize, load_urls_from_file, load_urls_from_source, merge_urls,
    parse_url_line, run_audit, site_from_urls,
};
