// Shared client plumbing
pub mod base;
pub mod factory;

// Source clients
pub mod fc2;
pub mod javlibrary;
pub mod missav;
pub mod tokyolib;

pub use factory::create_api;
pub use fc2::Fc2Api;
pub use javlibrary::JavLibraryApi;
pub use missav::MissAvApi;
pub use tokyolib::TokyoLibApi;
