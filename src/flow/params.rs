//! Inflow graph build parameters

/// How the full-raster pass is executed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BuildStrategy {
    /// Single thread, row-major
    Serial,
    /// Rows processed on the rayon thread pool
    Parallel,
    /// Parallel once the raster reaches `parallel_threshold` cells
    #[default]
    Auto,
}

impl BuildStrategy {
    pub fn all() -> &'static [Self] {
        &[Self::Serial, Self::Parallel, Self::Auto]
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Serial => "Single-threaded pass",
            Self::Parallel => "Row-parallel pass (rayon)",
            Self::Auto => "Parallel for large rasters",
        }
    }
}

impl std::fmt::Display for BuildStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serial => write!(f, "serial"),
            Self::Parallel => write!(f, "parallel"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BuildParams {
    pub strategy: BuildStrategy,
    /// Cell count at which `Auto` switches to the parallel pass.
    /// Below this the thread pool overhead dominates.
    pub parallel_threshold: usize,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            strategy: BuildStrategy::Auto,
            parallel_threshold: 65_536, // 256x256
        }
    }
}

impl BuildParams {
    pub fn serial() -> Self {
        Self { strategy: BuildStrategy::Serial, ..Default::default() }
    }

    pub fn parallel() -> Self {
        Self { strategy: BuildStrategy::Parallel, ..Default::default() }
    }

    /// Whether a raster of `cell_count` cells should be built in parallel.
    pub fn resolve(&self, cell_count: usize) -> bool {
        match self.strategy {
            BuildStrategy::Serial => false,
            BuildStrategy::Parallel => true,
            BuildStrategy::Auto => cell_count >= self.parallel_threshold,
        }
    }
}
