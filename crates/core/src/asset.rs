use std::sync::Arc;

use crate::params::GenerationParams;

/// One image produced by a generation request.
///
/// Assets from the same request share their [`GenerationParams`].
#[derive(Debug, Clone)]
pub struct GeneratedAsset {
    filename: String,
    source_name: String,
    index: u32,
    data: Vec<u8>,
    params: Arc<GenerationParams>,
}

impl GeneratedAsset {
    pub(crate) fn new(
        filename: String,
        source_name: String,
        index: u32,
        data: Vec<u8>,
        params: Arc<GenerationParams>,
    ) -> Self {
        Self {
            filename,
            source_name,
            index,
            data,
            params,
        }
    }

    /// Generated name, `{YYYYmmdd_HHMMSS}_{host}_p{index}.png`.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Entry name inside the response archive.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Position of this sample within its request.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Encoded image bytes as returned by the service.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Parameters of the request that produced this asset.
    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Seed the service used for this sample; consecutive samples add 1.
    pub fn seed(&self) -> u64 {
        self.params.parameters().seed + u64::from(self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assets_share_params() {
        let params = Arc::new(GenerationParams::builder("fox").seed(100).build().unwrap());
        let a = GeneratedAsset::new("a.png".into(), "image_0.png".into(), 0, vec![1], Arc::clone(&params));
        let b = GeneratedAsset::new("b.png".into(), "image_1.png".into(), 1, vec![2], Arc::clone(&params));

        assert_eq!(Arc::strong_count(&params), 3);
        assert_eq!(a.params(), b.params());
        assert_eq!(a.seed(), 100);
        assert_eq!(b.seed(), 101);
        assert_eq!(b.index(), 1);
        assert_eq!(b.source_name(), "image_1.png");
        assert_eq!(b.into_data(), vec![2]);
    }
}
