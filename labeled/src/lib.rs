mod buffer;
mod dataset;
mod dim;
mod dimensions;
mod errors;
mod exchange;
mod key;
mod layout;
mod mask;
mod ops;
mod variable;

#[cfg(test)]
mod testing;

pub use buffer::Element;

pub use dataset::Dataset;
pub use dataset::DatasetView;

pub use dim::Dim;
pub use dimensions::Dimensions;

pub use errors::Error;
pub use errors::Result;

pub use exchange::ArrayExchange;

pub use key::Key;
pub use key::Role;

pub use mask::Mask;
pub use mask::MaskView;

pub use variable::Variable;
pub use variable::VariableView;
