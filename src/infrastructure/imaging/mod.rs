mod grayscale_converter;

pub use grayscale_converter::GrayscaleConverter;
