/// Measured ratio between the extracted size of an engine bundle and its
/// compressed archive.
pub const DEFAULT_COMPRESSION_RATIO: f32 = 2.615_820_4;

/// What the extraction progress fraction is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProgressBasis {
    /// `extracted / archive_size / compression_ratio`.
    #[default]
    ExtractedBytes,
    /// `compressed bytes consumed / archive_size`.
    CompressedBytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub compression_ratio: f32,
    pub basis: ProgressBasis,
    pub delete_source: bool,
    pub preserve_permissions: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            compression_ratio: DEFAULT_COMPRESSION_RATIO,
            basis: ProgressBasis::default(),
            delete_source: false,
            preserve_permissions: false,
        }
    }
}

impl ExtractOptions {
    /// Non-positive or non-finite ratios are ignored.
    pub fn compression_ratio(mut self, ratio: f32) -> Self {
        if ratio.is_finite() && ratio > 0.0 {
            self.compression_ratio = ratio;
        }
        self
    }

    pub fn progress_basis(mut self, basis: ProgressBasis) -> Self {
        self.basis = basis;
        self
    }

    /// Remove the archive after a fully successful extraction.
    pub fn delete_source(mut self, delete: bool) -> Self {
        self.delete_source = delete;
        self
    }

    /// Apply each entry's mode bits, masked to `0o755`. Unix only.
    pub fn preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }

    pub(crate) fn fraction(&self, extracted: u64, consumed: u64, archive_size: u64) -> f32 {
        let size = archive_size as f64;
        let fraction = match self.basis {
            ProgressBasis::ExtractedBytes => extracted as f64 / size / self.compression_ratio as f64,
            ProgressBasis::CompressedBytes => consumed as f64 / size,
        };
        fraction.clamp(0.0, 1.0) as f32
    }
}
