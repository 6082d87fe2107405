pub mod acquisition;
pub mod conversion;
pub mod delivery;
pub mod exchangerate_api;
pub mod fawaz;
pub mod fetcher;
pub mod rate_source;

pub use acquisition::{RateAcquisitionController, RateBoard, RateEvent};
pub use conversion::{convert, convert_all, ConversionInput, ConversionTable};
pub use rate_source::{RateFetcher, RateNormalizer, RateSourceDescriptor, RateSourceRegistry};
