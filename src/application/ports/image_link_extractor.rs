use url::Url;

pub trait ImageLinkExtractor: Send + Sync {
    /// Returns every image reference in document order, resolved against
    /// `base`. References that cannot be resolved are dropped.
    fn extract(&self, html: &str, base: &Url) -> Vec<Url>;
}
