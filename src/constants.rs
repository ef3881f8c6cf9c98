pub mod cache {

    pub const SEARCH_TTL_SECONDS: u64 = 30;

    pub const SEARCH_MAX_ENTRIES: usize = 500;

    pub const IDENTIFIER_TTL_SECONDS: u64 = 2 * 60 * 60;

    pub const IDENTIFIER_MAX_ENTRIES: usize = 100;
}

pub mod limits {

    pub const MAX_SEARCH_PAGES: u32 = 3;

    pub const LOAD_MORE_PAGES: u32 = 2;

    pub const INITIAL_RENDER_LIMIT: usize = 25;

    pub const RENDER_LIMIT_STEP: usize = 25;

    pub const DEFAULT_HOURS_WINDOW: f64 = 24.0;
}

pub mod intervals {
    use std::time::Duration;

    pub const RENDER_COALESCE: Duration = Duration::from_millis(50);

    pub const HIGHLIGHT_EXPIRY: Duration = Duration::from_secs(8);

    pub const REFRESH_DEFAULT_SECONDS: u64 = 60;
}
