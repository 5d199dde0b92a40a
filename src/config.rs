const DEFAULT_BOOKS_PER_PAGE: i64 = 10;

/// Runtime configuration for the engine. Loaded from the environment by the
/// binary; library users can construct it directly.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Page size used by the parameter-free feed/explore variants.
    pub books_per_page: i64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            books_per_page: DEFAULT_BOOKS_PER_PAGE,
        }
    }
}

impl CoreConfig {
    pub fn from_env() -> Self {
        let books_per_page = std::env::var("BOOKS_PER_PAGE")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_BOOKS_PER_PAGE);
        Self { books_per_page }
    }
}
