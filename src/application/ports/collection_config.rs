/// How stored vectors are compared with a query. Scores are always
/// "higher is closer".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
    DotProduct,
}

#[derive(Debug, Clone)]
pub struct CollectionConfig {
    pub vector_dimensions: u64,
    pub distance_metric: DistanceMetric,
}

impl CollectionConfig {
    pub fn new(vector_dimensions: u64) -> Self {
        Self {
            vector_dimensions,
            distance_metric: DistanceMetric::default(),
        }
    }

    pub fn with_distance_metric(mut self, distance_metric: DistanceMetric) -> Self {
        self.distance_metric = distance_metric;
        self
    }
}
