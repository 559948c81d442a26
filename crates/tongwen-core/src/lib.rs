pub mod conversion;
pub mod converter;
pub mod dict;
pub mod error;
pub mod segment;

pub use conversion::{Conversion, ConversionChain};
pub use converter::{ConvertError, Converter, ConverterBuilder, ConverterError, DictSource};
pub use dict::{Backend, DictError, DictGroup, DictRef, Dictionary, PhraseDictionary};
pub use error::ErrorKind;
pub use segment::{MaxMatchSegmenter, Token};
