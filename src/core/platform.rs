//! Host platform family.
//!
//! Model sources ship in one variant per OS family; the family also decides
//! executable suffixes for toolchain output.

/// OS family the models are compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Unix,
    Windows,
}

impl Platform {
    /// Detect the platform this process runs on.
    pub fn host() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    /// Name of the per-platform model source subdirectory.
    pub fn source_dir_name(&self) -> &'static str {
        match self {
            Platform::Unix => "unix",
            Platform::Windows => "win",
        }
    }

    /// Suffix appended to executables built by native toolchains.
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            Platform::Unix => "",
            Platform::Windows => ".exe",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source_dir_name())
    }
}
