//! Backend adapters implementing [`DriverSession`](crate::driver::DriverSession).

pub mod fantoccini;

pub use self::fantoccini::WebDriverBackend;
