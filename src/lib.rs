pub mod value;
pub mod record;
pub mod options;
pub mod error;

pub mod sanitize;
pub mod path;
pub mod expand;
pub mod attributes;
pub mod message;
pub mod duration;
pub mod mapper;

pub mod sink;
pub mod noop_sink;
pub mod device;
pub mod layer;
pub mod env;
pub mod init;

pub use device::EcsDevice;
pub use mapper::EcsMapper;
pub use options::FormatterOptions;
pub use record::{LogRecord, Severity};
pub use value::{ErrorValue, Value};
